//! Sync controller behavior: mutual exclusion, polling and failure handling

use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use pretty_assertions::assert_eq;

use pipeline_dashboard::dashboard::{
    CheckOutcome, SyncController, SyncError, SyncPhase, SyncTrigger,
};
use pipeline_dashboard::shared::ApiError;

use crate::common::{changed_check, wait_for_phase, FakeSyncApi};

#[tokio::test]
async fn test_manual_sync_rejected_while_check_in_flight() {
    let api = Arc::new(FakeSyncApi::gated());
    let controller = SyncController::new(api.clone());

    let background = controller.clone();
    let check = tokio::spawn(async move { background.check_and_sync().await });
    wait_for_phase(&controller, SyncPhase::Checking).await;

    assert_matches!(
        controller.trigger_sync().await,
        Err(SyncError::Busy { phase: SyncPhase::Checking })
    );
    assert_eq!(controller.check_and_sync().await, CheckOutcome::Skipped);
    assert_eq!(api.manual_calls(), 0);
    assert_eq!(api.auto_calls(), 1);

    api.release(1);
    assert_eq!(check.await.unwrap(), CheckOutcome::Unchanged);

    api.release(1);
    let outcome = controller.trigger_sync().await.unwrap();
    assert_eq!(outcome.trigger, SyncTrigger::Manual);
    assert_eq!(api.manual_calls(), 1);

    let stats = controller.stats().await;
    assert_eq!(stats.skipped, 2);
}

#[tokio::test]
async fn test_check_rejected_while_manual_sync_in_flight() {
    let api = Arc::new(FakeSyncApi::gated());
    let controller = SyncController::new(api.clone());

    let manual = controller.clone();
    let sync = tokio::spawn(async move { manual.trigger_sync().await });
    wait_for_phase(&controller, SyncPhase::Syncing).await;

    assert_eq!(controller.check_and_sync().await, CheckOutcome::Skipped);
    assert_eq!(api.auto_calls(), 0);

    api.release(1);
    assert!(sync.await.unwrap().is_ok());
    assert_eq!(controller.state().await.records_synced, 10);
}

#[tokio::test(start_paused = true)]
async fn test_polling_checks_immediately_then_every_interval() {
    let api = Arc::new(FakeSyncApi::new());
    let controller = SyncController::new(api.clone());

    let handle = controller.start_polling(Duration::from_secs(30), |_| {});
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(api.auto_calls(), 1);

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(api.auto_calls(), 2);

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(api.auto_calls(), 3);

    handle.stop();
}

#[tokio::test(start_paused = true)]
async fn test_ticks_skipped_while_check_in_flight() {
    let api = Arc::new(FakeSyncApi::gated());
    let controller = SyncController::new(api.clone());

    let handle = controller.start_polling(Duration::from_secs(1), |_| {});
    tokio::time::sleep(Duration::from_millis(5_500)).await;

    assert_eq!(api.auto_calls(), 1);
    assert_eq!(controller.state().await.phase, SyncPhase::Checking);
    assert!(controller.stats().await.skipped >= 4);

    handle.stop();
    api.release(1);
    wait_for_phase(&controller, SyncPhase::Idle).await;
}

#[tokio::test(start_paused = true)]
async fn test_stop_lets_in_flight_check_finish() {
    let api = Arc::new(FakeSyncApi::gated());
    let controller = SyncController::new(api.clone());

    let handle = controller.start_polling(Duration::from_secs(30), |_| {});
    wait_for_phase(&controller, SyncPhase::Checking).await;

    assert!(handle.stop());
    assert!(!handle.stop(), "second stop should be a no-op");
    assert!(!handle.is_active());

    api.release(1);
    wait_for_phase(&controller, SyncPhase::Idle).await;
    assert!(controller.state().await.last_checked_at.is_some());

    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(api.auto_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_stop_still_reports_in_flight_change() {
    let api = Arc::new(FakeSyncApi::gated());
    api.set_auto(Ok(changed_check(77)));
    let controller = SyncController::new(api.clone());
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

    let handle = controller.start_polling(Duration::from_secs(30), move |outcome| {
        let _ = tx.send(outcome.clone());
    });
    wait_for_phase(&controller, SyncPhase::Checking).await;
    assert!(handle.stop());

    api.release(1);
    wait_for_phase(&controller, SyncPhase::Idle).await;
    assert_eq!(controller.state().await.records_synced, 77);

    let outcome = tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("on_changed called")
        .expect("channel open");
    assert_eq!(outcome.records_synced, 77);
    assert_eq!(outcome.trigger, SyncTrigger::Automatic);
    assert!(rx.try_recv().is_err(), "change reported once");
}

#[tokio::test(start_paused = true)]
async fn test_dropping_handle_stops_polling() {
    let api = Arc::new(FakeSyncApi::new());
    let controller = SyncController::new(api.clone());

    let handle = controller.start_polling(Duration::from_secs(10), |_| {});
    tokio::time::sleep(Duration::from_millis(10)).await;
    drop(handle);

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(api.auto_calls(), 1);
}

#[tokio::test]
async fn test_background_failure_is_absorbed_then_recovers() {
    let api = Arc::new(FakeSyncApi::new());
    let controller = SyncController::new(api.clone());

    api.set_auto(Err(ApiError::transport("connection refused")));
    assert_matches!(controller.check_and_sync().await, CheckOutcome::Failed(_));

    let state = controller.state().await;
    assert_eq!(state.phase, SyncPhase::Error);
    assert!(state.last_error.is_some());
    assert!(state.last_checked_at.is_none());

    api.set_auto(Ok(changed_check(132)));
    assert_matches!(
        controller.check_and_sync().await,
        CheckOutcome::Changed(ref outcome) if outcome.records_synced == 132
    );

    let state = controller.state().await;
    assert_eq!(state.phase, SyncPhase::Idle);
    assert_eq!(state.records_synced, 132);
    assert!(state.last_error.is_none());

    let stats = controller.stats().await;
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.changed, 1);
}

#[tokio::test]
async fn test_manual_failure_is_returned_once() {
    let api = Arc::new(FakeSyncApi::new());
    let controller = SyncController::new(api.clone());
    api.set_manual(Err(ApiError::server(500, "Spreadsheet not found or not shared")));

    let err = controller.trigger_sync().await.unwrap_err();
    assert_eq!(err.user_message(), "Spreadsheet not found or not shared");
    assert_eq!(api.manual_calls(), 1);
    assert_eq!(controller.state().await.phase, SyncPhase::Error);
}

#[tokio::test]
async fn test_on_changed_sees_manual_syncs() {
    let api = Arc::new(FakeSyncApi::new());
    let controller = SyncController::new(api.clone());
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

    let handle = controller.start_polling(Duration::from_secs(3_600), move |outcome| {
        let _ = tx.send(outcome.clone());
    });
    for _ in 0..1_000 {
        if controller.stats().await.unchanged == 1 {
            break;
        }
        tokio::task::yield_now().await;
    }

    controller.trigger_sync().await.unwrap();
    let outcome = tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("on_changed called")
        .expect("channel open");
    assert_eq!(outcome.trigger, SyncTrigger::Manual);
    assert_eq!(outcome.records_synced, 10);

    handle.stop();
}
