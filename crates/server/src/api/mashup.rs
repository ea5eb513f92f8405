use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Form,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use mashup_core::{MashupError, MashupRequest};

use super::pages;
use crate::archive::{self, ArchiveError, ARCHIVE_ENTRY};
use crate::form::{MashupForm, ValidSubmission};
use crate::mailer::MailError;
use crate::state::AppState;

/// Why a validated submission could not be delivered.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("Failed to prepare output directory: {0}")]
    Scratch(#[from] std::io::Error),

    #[error("{0}")]
    Pipeline(#[from] MashupError),

    #[error("{0}")]
    Archive(#[from] ArchiveError),

    #[error("{0}")]
    Mail(#[from] MailError),
}

pub async fn index() -> Html<String> {
    Html(pages::form_page(&MashupForm::default(), &[]))
}

pub async fn submit(
    State(state): State<Arc<AppState>>,
    Form(form): Form<MashupForm>,
) -> Response {
    let submission = match form.validate() {
        Ok(submission) => submission,
        Err(errors) => {
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Html(pages::form_page(&form, &errors)),
            )
                .into_response();
        }
    };

    match deliver(&state, &submission).await {
        Ok(()) => (StatusCode::OK, Html(pages::success_page(&submission.email))).into_response(),
        Err(e) => {
            warn!(singer = %submission.singer, "Mashup delivery failed: {}", e);
            let message = format!("Failed to create or send mashup: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(pages::failure_page(&form, &message)),
            )
                .into_response()
        }
    }
}

/// Runs the pipeline in a private directory, zips the result and mails it.
async fn deliver(state: &AppState, submission: &ValidSubmission) -> Result<(), DeliveryError> {
    let mut builder = tempfile::Builder::new();
    builder.prefix("mashup_web_");
    let scratch = match state.scratch_root() {
        Some(root) => {
            tokio::fs::create_dir_all(root).await?;
            builder.tempdir_in(root)?
        }
        None => builder.tempdir()?,
    };

    let request = MashupRequest::new(
        submission.singer.clone(),
        submission.video_count,
        submission.clip_seconds,
        scratch.path().join(ARCHIVE_ENTRY),
    )?;

    let output = state.runner().run(&request).await?;
    let attachment = archive::zip_file(&output, ARCHIVE_ENTRY).await?;
    let archive_name = state.archive_name();

    state
        .mailer()
        .send(&submission.email, attachment, &archive_name)
        .await?;

    info!(singer = %submission.singer, email = %submission.email, "Mashup delivered");
    Ok(())
}
