//! Email delivery of finished mashups.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;
use tracing::{debug, info};

use mashup_core::SmtpConfig;

const SUBJECT: &str = "Your mashup file";
const BODY: &str = "Hello,\n\nYour mashup is attached as a zip file.\n\nEnjoy!";
const IMPLICIT_TLS_PORT: u16 = 465;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("SMTP credentials are not configured")]
    MissingCredentials,

    #[error("Invalid email address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("Failed to build email: {0}")]
    Build(String),

    #[error("Failed to send email: {0}")]
    Transport(String),
}

/// Sends a single attachment to a recipient.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(
        &self,
        recipient: &str,
        attachment: Vec<u8>,
        filename: &str,
    ) -> Result<(), MailError>;
}

/// SMTP mailer. STARTTLS on every port except 465, which uses implicit TLS.
pub struct SmtpMailer {
    config: SmtpConfig,
}

impl SmtpMailer {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }

    fn credentials(&self) -> Result<Credentials, MailError> {
        match (&self.config.username, &self.config.password) {
            (Some(user), Some(pass)) if !user.is_empty() && !pass.is_empty() => {
                Ok(Credentials::new(user.clone(), pass.clone()))
            }
            _ => Err(MailError::MissingCredentials),
        }
    }

    fn transport(
        &self,
        credentials: Credentials,
    ) -> Result<AsyncSmtpTransport<Tokio1Executor>, MailError> {
        let builder = if self.config.port == IMPLICIT_TLS_PORT {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&self.config.server)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.server)
        }
        .map_err(|e| MailError::Transport(e.to_string()))?;

        Ok(builder
            .port(self.config.port)
            .credentials(credentials)
            .build())
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(
        &self,
        recipient: &str,
        attachment: Vec<u8>,
        filename: &str,
    ) -> Result<(), MailError> {
        let credentials = self.credentials()?;
        let message = build_message(&self.config.sender(), recipient, attachment, filename)?;
        let transport = self.transport(credentials)?;

        debug!(server = %self.config.server, port = self.config.port, "Sending mashup email");
        transport
            .send(message)
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;

        info!(recipient, filename, "Mashup email sent");
        Ok(())
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, MailError> {
    address
        .trim()
        .parse()
        .map_err(|e: lettre::address::AddressError| MailError::InvalidAddress {
            address: address.to_string(),
            reason: e.to_string(),
        })
}

/// Builds the delivery message: a plain-text body plus the zip attachment.
pub fn build_message(
    sender: &str,
    recipient: &str,
    attachment: Vec<u8>,
    filename: &str,
) -> Result<Message, MailError> {
    let content_type =
        ContentType::parse("application/zip").map_err(|e| MailError::Build(e.to_string()))?;

    Message::builder()
        .from(parse_mailbox(sender)?)
        .to(parse_mailbox(recipient)?)
        .subject(SUBJECT)
        .multipart(
            MultiPart::mixed()
                .singlepart(SinglePart::plain(BODY.to_string()))
                .singlepart(Attachment::new(filename.to_string()).body(attachment, content_type)),
        )
        .map_err(|e| MailError::Build(e.to_string()))
}
