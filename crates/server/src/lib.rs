pub mod api;
pub mod archive;
pub mod form;
pub mod mailer;
pub mod state;

pub use api::create_router;
pub use mailer::{MailError, Mailer, SmtpMailer};
pub use state::AppState;
