//! HTTP upload tests
//!
//! Runs `HttpUploader` against a wiremock report API.

use crate::common::{mock_report_server, TestDatabase};
use assert_matches::assert_matches;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;
use water_report_sync::shared::ReportPayload;
use water_report_sync::sync::{HttpUploader, ReportUploader, UploadError};
use water_report_sync::{QueueError, ReportInput, SubmitOutcome};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn payload() -> ReportPayload {
    ReportPayload {
        client_ref: Uuid::new_v4(),
        location: "Lalung village".to_string(),
        issue_type: "contamination".to_string(),
        description: "Water is discoloured after rain".to_string(),
        contact: String::new(),
        reported_at: Utc::now(),
    }
}

fn uploader(server: &MockServer) -> HttpUploader {
    HttpUploader::new(&server.uri(), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_created_is_success() {
    let server = mock_report_server(201).await;
    assert!(uploader(&server).upload(&payload()).await.is_ok());
}

#[tokio::test]
async fn test_unprocessable_is_permanent() {
    let server = mock_report_server(422).await;
    let err = uploader(&server).upload(&payload()).await.unwrap_err();

    assert_matches!(err, UploadError::Rejected { status: 422, .. });
    assert!(err.is_permanent());
}

#[tokio::test]
async fn test_unavailable_is_transient() {
    let server = mock_report_server(503).await;
    let err = uploader(&server).upload(&payload()).await.unwrap_err();

    assert_eq!(err, UploadError::Server { status: 503 });
    assert!(!err.is_permanent());
}

#[tokio::test]
async fn test_request_carries_idempotency_key_and_camel_case_body() {
    let report = payload();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/reports"))
        .and(header("Idempotency-Key", report.client_ref.to_string().as_str()))
        .and(body_partial_json(serde_json::json!({
            "location": "Lalung village",
            "issueType": "contamination",
        })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    uploader(&server).upload(&report).await.unwrap();
}

#[tokio::test]
async fn test_unreachable_server_is_network_error() {
    let server = MockServer::start().await;
    let uri = server.uri();
    drop(server);

    let uploader = HttpUploader::new(&uri, Duration::from_secs(2)).unwrap();
    let err = uploader.upload(&payload()).await.unwrap_err();
    assert_matches!(err, UploadError::Network(_) | UploadError::Timeout);
}

#[tokio::test]
async fn test_queue_delivers_through_http() {
    let server = mock_report_server(201).await;
    let fixture = TestDatabase::new().await;
    let queue = fixture.queue(false, Arc::new(uploader(&server)));

    queue
        .submit(&ReportInput::new("Rangapara", "no_supply"))
        .await
        .unwrap();
    queue
        .submit(&ReportInput::new("Lalung", "leak"))
        .await
        .unwrap();

    let summary = queue.run_sync_pass().await.unwrap();
    assert!(summary.is_clean());
    assert_eq!(summary.succeeded, 2);
    crate::assert_pending!(queue, 0);
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_online_submit_sends_immediately() {
    let server = mock_report_server(201).await;
    let fixture = TestDatabase::new().await;
    let queue = fixture.queue(true, Arc::new(uploader(&server)));

    let outcome = queue
        .submit(&ReportInput::new("Lalung", "leak"))
        .await
        .unwrap();

    assert_eq!(outcome, SubmitOutcome::SentImmediately);
    crate::assert_pending!(queue, 0);
}

#[tokio::test]
async fn test_online_submit_rejected_is_not_queued() {
    let server = mock_report_server(400).await;
    let fixture = TestDatabase::new().await;
    let queue = fixture.queue(true, Arc::new(uploader(&server)));

    let result = queue.submit(&ReportInput::new("Lalung", "leak")).await;

    crate::assert_err!(result, QueueError::Rejected(_));
    crate::assert_pending!(queue, 0);
}

#[tokio::test]
async fn test_online_submit_falls_back_to_queue_on_server_error() {
    let server = mock_report_server(500).await;
    let fixture = TestDatabase::new().await;
    let queue = fixture.queue(true, Arc::new(uploader(&server)));

    let outcome = queue
        .submit(&ReportInput::new("Lalung", "leak"))
        .await
        .unwrap();

    assert_matches!(outcome, SubmitOutcome::Queued { .. });
    crate::assert_pending!(queue, 1);
}
