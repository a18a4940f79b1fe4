//! Queue flow tests
//!
//! Submission, sync, and reconnect behavior of `ReportQueue` over a real
//! SQLite file.

use crate::common::{ScriptedUploader, TestDatabase};
use assert_matches::assert_matches;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;
use water_report_sync::local_db::LocalDatabase;
use water_report_sync::offline::ConnectivityMonitor;
use water_report_sync::sync::{SyncEvent, SyncSummary};
use water_report_sync::{QueueError, ReportInput, ReportQueue, SubmitOutcome};

fn report(location: &str) -> ReportInput {
    ReportInput::new(location, "leak")
        .with_description("Hand pump leaking near the school")
        .with_contact("+91 98765 43210")
}

#[tokio::test]
async fn test_offline_submissions_sync_on_reconnect() {
    let fixture = TestDatabase::new().await;
    let uploader = Arc::new(ScriptedUploader::new());
    let queue = fixture.queue(false, uploader.clone());

    crate::assert_ok!(queue.submit(&report("Lalung")).await);
    crate::assert_ok!(queue.submit(&report("Rangapara")).await);
    crate::assert_pending!(queue, 2);

    let mut events = queue.subscribe_sync_events();
    let reconnect = queue.spawn_reconnect_sync();
    queue.set_online(true);

    let summary = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if let Ok(SyncEvent::Finished(summary)) = events.recv().await {
                return summary;
            }
        }
    })
    .await
    .expect("sync pass should finish");

    assert_eq!(summary, SyncSummary { attempted: 2, succeeded: 2, failed: 0 });
    crate::assert_pending!(queue, 0);
    assert_eq!(uploader.attempts(), vec!["Lalung", "Rangapara"]);
    reconnect.abort();
}

#[tokio::test]
async fn test_sync_preserves_enqueue_order() {
    let fixture = TestDatabase::new().await;
    let uploader = Arc::new(ScriptedUploader::new());
    let queue = fixture.queue(false, uploader.clone());

    for location in ["t1", "t2", "t3"] {
        queue.submit(&report(location)).await.unwrap();
    }

    queue.run_sync_pass().await.unwrap();
    assert_eq!(uploader.attempts(), vec!["t1", "t2", "t3"]);
}

#[tokio::test]
async fn test_partial_failure_keeps_only_failed_record() {
    let fixture = TestDatabase::new().await;
    let uploader = Arc::new(ScriptedUploader::new());
    uploader.fail_location("#2");
    let queue = fixture.queue(false, uploader.clone());

    for location in ["#1", "#2", "#3"] {
        queue.submit(&report(location)).await.unwrap();
    }

    let summary = queue.run_sync_pass().await.unwrap();
    assert_eq!(summary, SyncSummary { attempted: 3, succeeded: 2, failed: 1 });

    let remaining = queue.list_pending().await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].location, "#2");
    assert_eq!(remaining[0].attempts, 1);
}

#[tokio::test]
async fn test_validation_gate_touches_nothing() {
    let fixture = TestDatabase::new().await;
    let uploader = Arc::new(ScriptedUploader::new());
    let queue = fixture.queue(true, uploader.clone());

    let result = queue
        .submit(&ReportInput::new("", "leak").with_description("missing location"))
        .await;

    crate::assert_err!(result, QueueError::Validation(_));
    assert!(uploader.attempts().is_empty());
    crate::assert_pending!(queue, 0);
}

#[tokio::test]
async fn test_failed_immediate_send_reuses_idempotency_key() {
    let fixture = TestDatabase::new().await;
    let uploader = Arc::new(ScriptedUploader::new());
    uploader.set_fail_all(true);
    let queue = fixture.queue(true, uploader.clone());

    let outcome = queue.submit(&report("Lalung")).await.unwrap();
    assert_matches!(outcome, SubmitOutcome::Queued { .. });
    let queued_ref = queue.list_pending().await.unwrap()[0].client_ref;

    uploader.set_fail_all(false);
    queue.run_sync_pass().await.unwrap();

    let delivered = uploader.delivered();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].client_ref, queued_ref);
}

#[tokio::test]
async fn test_concurrent_passes_never_double_process() {
    let fixture = TestDatabase::new().await;
    let uploader = Arc::new(ScriptedUploader::new());
    let queue = fixture.queue(false, uploader.clone());

    for i in 0..10 {
        queue.submit(&report(&format!("village-{}", i))).await.unwrap();
    }

    let (first, second) = tokio::join!(queue.run_sync_pass(), queue.run_sync_pass());

    let mut delivered = 0;
    for result in [first, second] {
        match result {
            Ok(summary) => delivered += summary.succeeded,
            Err(e) => assert!(e.is_retry_later(), "unexpected error: {:?}", e),
        }
    }

    assert_eq!(delivered, 10);
    assert_eq!(uploader.attempts().len(), 10);
    crate::assert_pending!(queue, 0);
}

#[tokio::test]
async fn test_queue_survives_restart() {
    let fixture = TestDatabase::new().await;
    let path = fixture.path();

    {
        let db = Arc::new(LocalDatabase::open(&path).await.unwrap());
        let queue = ReportQueue::new(
            Arc::clone(&db),
            ConnectivityMonitor::new(false),
            Arc::new(ScriptedUploader::new()),
        );
        queue.submit(&report("before restart")).await.unwrap();
        db.close().await;
    }

    let uploader = Arc::new(ScriptedUploader::new());
    let queue = ReportQueue::new(
        Arc::new(LocalDatabase::open(&path).await.unwrap()),
        ConnectivityMonitor::new(true),
        uploader.clone(),
    );

    let summary = queue.run_sync_pass().await.unwrap();
    assert_eq!(summary.succeeded, 1);
    assert_eq!(uploader.attempts(), vec!["before restart"]);
}

#[tokio::test]
async fn test_stats_track_failures() {
    let fixture = TestDatabase::new().await;
    let uploader = Arc::new(ScriptedUploader::new());
    uploader.set_fail_all(true);
    let queue = fixture.queue(false, uploader.clone());

    queue.submit(&report("Lalung")).await.unwrap();
    queue.run_sync_pass().await.unwrap();
    queue.run_sync_pass().await.unwrap();

    let stats = queue.stats().await.unwrap();
    assert_eq!(stats.pending_reports, 1);
    assert_eq!(stats.failed_attempts, 2);
    assert!(stats.last_sync_time.is_some());
}
