/*!
 * Tests for the job state machine and progress stores
 */

use std::sync::Arc;
use std::time::Duration;

use slidelingo::errors::ProgressError;
use slidelingo::progress::{
    InMemoryProgressStore, JobState, ProgressBarTracker, ProgressTracker, ProgressUpdate,
};

#[test]
fn test_transitions_withTerminalStates_shouldOnlyAllowRestart() {
    for terminal in [JobState::Completed, JobState::Error] {
        assert!(terminal.is_terminal());
        assert!(terminal.can_transition_to(JobState::Starting));
        assert!(!terminal.can_transition_to(JobState::InProgress));
        assert!(!terminal.can_transition_to(JobState::Completed));
    }
    assert!(!JobState::NotFound.can_transition_to(JobState::InProgress));
    assert!(JobState::InProgress.can_transition_to(JobState::InProgress));
}

#[test]
fn test_update_withSkippedStart_shouldRejectTransition() {
    let store = InMemoryProgressStore::new(Duration::from_secs(60));
    let result = store.update("job", ProgressUpdate::new(JobState::InProgress, 10, "working"));

    match result {
        Err(ProgressError::InvalidTransition { from, to, .. }) => {
            assert_eq!(from, "not_found");
            assert_eq!(to, "in_progress");
        }
        other => panic!("expected invalid transition, got {:?}", other),
    }
}

#[test]
fn test_update_withResubmittedJob_shouldRestartFromTerminal() {
    let store = InMemoryProgressStore::new(Duration::from_secs(60));
    store.update("job", ProgressUpdate::new(JobState::Starting, 0, "start")).unwrap();
    store.update("job", ProgressUpdate::new(JobState::Error, 0, "failed")).unwrap();

    let record = store
        .update("job", ProgressUpdate::new(JobState::Starting, 0, "again"))
        .unwrap();
    assert_eq!(record.status, JobState::Starting);
    assert_eq!(store.get("job").message, "again");
}

#[test]
fn test_get_withExpiredRecord_shouldReportNotFound() {
    let store = InMemoryProgressStore::new(Duration::from_millis(20));
    store.update("job", ProgressUpdate::new(JobState::Starting, 0, "start")).unwrap();
    assert_eq!(store.len(), 1);

    std::thread::sleep(Duration::from_millis(40));

    assert_eq!(store.get("job").status, JobState::NotFound);
    assert_eq!(store.evict_expired(), 1);
    assert!(store.is_empty());
}

#[test]
fn test_sweeper_withShortTtl_shouldEvictInBackground() {
    tokio_test::block_on(async {
        let store = Arc::new(InMemoryProgressStore::new(Duration::from_millis(10)));
        store.update("job", ProgressUpdate::new(JobState::Starting, 0, "start")).unwrap();

        let sweeper = store.spawn_sweeper(Duration::from_millis(5));
        tokio::time::sleep(Duration::from_millis(50)).await;
        sweeper.abort();

        assert_eq!(store.evict_expired(), 0);
        assert!(store.is_empty());
    });
}

#[test]
fn test_progress_bar_tracker_withLifecycle_shouldMirrorStore() {
    let tracker = ProgressBarTracker::new();
    tracker.update("cli", ProgressUpdate::new(JobState::Starting, 0, "start")).unwrap();
    tracker.update("cli", ProgressUpdate::new(JobState::InProgress, 55, "half")).unwrap();
    let record = tracker
        .update("cli", ProgressUpdate::new(JobState::Completed, 100, "done"))
        .unwrap();
    tracker.finish();

    assert_eq!(record.progress, 100);
    assert_eq!(tracker.get("cli").status, JobState::Completed);
}

#[test]
fn test_record_withUnknownJob_shouldSerializeWithoutTimestamp() {
    let store = InMemoryProgressStore::new(Duration::from_secs(60));
    let value = serde_json::to_value(store.get("missing")).unwrap();
    assert_eq!(
        value,
        serde_json::json!({"progress": 0, "status": "not_found", "message": "Job not found"})
    );
}

#[test]
fn test_sweeper_withZeroInterval_shouldKeepEvicting() {
    tokio_test::block_on(async {
        let store = Arc::new(InMemoryProgressStore::new(Duration::from_millis(10)));
        store.update("job", ProgressUpdate::new(JobState::Starting, 0, "start")).unwrap();

        let sweeper = store.spawn_sweeper(Duration::ZERO);
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(!sweeper.is_finished(), "sweeper task stopped");
        sweeper.abort();
        assert_eq!(store.evict_expired(), 0);
    });
}

#[test]
fn test_update_deserialize_withFractionalProgress_shouldRoundIntoRange() {
    let update: ProgressUpdate =
        serde_json::from_value(serde_json::json!({"progress": 33.5, "status": "in_progress"})).unwrap();
    assert_eq!(update.progress, 34);

    let over: ProgressUpdate =
        serde_json::from_value(serde_json::json!({"progress": 250, "status": "in_progress"})).unwrap();
    assert_eq!(over.progress, 100);

    let under: ProgressUpdate =
        serde_json::from_value(serde_json::json!({"progress": -3.2, "status": "starting"})).unwrap();
    assert_eq!(under.progress, 0);
}
