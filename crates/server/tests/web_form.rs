//! Web front end tests against the in-process router.

mod common;

use std::io::{Cursor, Read};

use axum::http::StatusCode;
use common::TestFixture;
use mashup_core::{Config, MashupError};
use mashup_server::MailError;

fn valid_fields<'a>() -> Vec<(&'a str, &'a str)> {
    vec![
        ("singer", "Sharry Maan"),
        ("video_count", "12"),
        ("clip_duration", "25"),
        ("email", "you@example.com"),
    ]
}

fn unzip_single(bytes: &[u8]) -> (String, Vec<u8>) {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes.to_vec())).unwrap();
    assert_eq!(archive.len(), 1);
    let mut entry = archive.by_index(0).unwrap();
    let mut contents = Vec::new();
    entry.read_to_end(&mut contents).unwrap();
    (entry.name().to_string(), contents)
}

#[tokio::test]
async fn test_health() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/health").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["status"], "ok");
}

#[tokio::test]
async fn test_config_redacts_password() {
    let mut config = Config::default();
    config.smtp.username = Some("me@example.com".into());
    config.smtp.password = Some("hunter2".into());
    let fixture = TestFixture::with_config(config).await;

    let response = fixture.get("/config").await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(!response.text.contains("hunter2"));
    let json = response.json();
    assert_eq!(json["smtp"]["password_configured"], true);
    assert_eq!(json["smtp"]["from"], "me@example.com");
}

#[tokio::test]
async fn test_index_renders_form() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/").await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.text.contains("<form method=\"post\" action=\"/mashup\">"));
    assert!(response.text.contains("value=\"12\""));
    assert!(response.text.contains("value=\"25\""));
}

#[tokio::test]
async fn test_validation_errors_are_aggregated() {
    let fixture = TestFixture::new().await;
    let response = fixture
        .post_form(
            "/mashup",
            &[
                ("singer", ""),
                ("video_count", "5"),
                ("clip_duration", "10"),
                ("email", "not-an-email"),
            ],
        )
        .await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    for message in [
        "Singer name is required.",
        "Number of videos must be greater than 10.",
        "Duration must be greater than 20 seconds.",
        "Please provide a valid email address.",
    ] {
        assert!(response.text.contains(message), "missing: {message}");
    }
    // Submitted values are kept.
    assert!(response.text.contains("value=\"not-an-email\""));

    assert!(fixture.runner.recorded_requests().await.is_empty());
    assert!(fixture.mailer.sent().await.is_empty());
}

#[tokio::test]
async fn test_success_emails_zip() {
    let fixture = TestFixture::new().await;
    fixture.runner.set_output(b"ID3 the mashup").await;

    let response = fixture.post_form("/mashup", &valid_fields()).await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.text.contains("sent to you@example.com"));

    let requests = fixture.runner.recorded_requests().await;
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].singer(), "Sharry Maan");
    assert_eq!(requests[0].video_count(), 12);
    assert_eq!(requests[0].clip_seconds(), 25);
    assert!(requests[0].output_path().ends_with("mashup.mp3"));

    let sent = fixture.mailer.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].recipient, "you@example.com");
    assert_eq!(sent[0].filename, "mashup_mashup.zip");

    let (name, contents) = unzip_single(&sent[0].attachment);
    assert_eq!(name, "mashup.mp3");
    assert_eq!(contents, b"ID3 the mashup");

    assert!(fixture.scratch_leftovers().is_empty());
}

#[tokio::test]
async fn test_archive_prefix_from_config() {
    let mut config = Config::default();
    config.server.archive_prefix = "102303".into();
    let fixture = TestFixture::with_config(config).await;

    let response = fixture.post_form("/mashup", &valid_fields()).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(fixture.mailer.sent().await[0].filename, "102303_mashup.zip");
}

#[tokio::test]
async fn test_pipeline_failure_is_rendered() {
    let fixture = TestFixture::new().await;
    fixture
        .runner
        .set_next_error(MashupError::NoCandidatesFound)
        .await;

    let response = fixture.post_form("/mashup", &valid_fields()).await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.text.contains(
        "Failed to create or send mashup: No videos found for the provided singer name."
    ));
    assert!(fixture.mailer.sent().await.is_empty());
    assert!(fixture.scratch_leftovers().is_empty());
}

#[tokio::test]
async fn test_mail_failure_is_rendered() {
    let fixture = TestFixture::new().await;
    fixture
        .mailer
        .set_next_error(MailError::MissingCredentials)
        .await;

    let response = fixture.post_form("/mashup", &valid_fields()).await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response
        .text
        .contains("Failed to create or send mashup: SMTP credentials are not configured"));
    assert_eq!(fixture.runner.recorded_requests().await.len(), 1);
    assert!(fixture.scratch_leftovers().is_empty());
}
