use std::sync::Arc;

use cdc::concurrency::shutdown::create_shutdown_channel;
use cdc::coordinator::TableSnapshotPhase;
use cdc::error::{ErrorKind, TransferError};
use cdc::sink::memory::MemorySinker;
use cdc::storage::memory::MemoryStorage;
use cdc::supervisor::Supervisor;
use cdc::transfer_error;
use cdc::types::{ChangeKind, Position, TransferId};
use cdc::workers::base::{Worker, WorkerHandle};
use cdc::workers::transfer::{TransferWorker, WorkerPhase};
use cdc_config::shared::BadRecordPolicy;
use cdc_telemetry::init_test_tracing;
use rand::random;

use crate::common::coordinator::NotifyingCoordinator;
use crate::common::sink::TestSinkWrapper;
use crate::common::storage::ScriptedStorage;
use crate::common::transfer::{create_transfer_config, table_config, user_row, users_table};
use crate::common::wait_until;

mod common;

#[tokio::test(flavor = "multi_thread")]
async fn snapshot_then_incremental_preserves_order() {
    init_test_tracing();

    let storage = MemoryStorage::new();
    storage
        .insert_table_rows(users_table(), vec![user_row(1, "alice"), user_row(2, "bob")])
        .await;

    let coordinator = NotifyingCoordinator::new();
    let sinker = TestSinkWrapper::wrap(MemorySinker::new());

    let transfer_id: TransferId = random();
    let config = create_transfer_config(transfer_id, vec![table_config("public", "users")]);

    let supervisor = Supervisor::new(config, storage.clone(), sinker.clone(), coordinator.clone());
    let shutdown_tx = supervisor.shutdown_tx();

    let snapshot_done = coordinator
        .notify_on_table_state(transfer_id, users_table(), TableSnapshotPhase::Done)
        .await;

    let run = tokio::spawn(supervisor.run());

    // Only once the snapshot is complete do we produce incremental changes, so the
    // expected delivery order is fully determined.
    snapshot_done.notified().await;

    storage
        .push_change(users_table(), ChangeKind::Insert, user_row(3, "carol"), None)
        .await;
    let last_position = storage
        .push_change(users_table(), ChangeKind::Insert, user_row(4, "dave"), None)
        .await;

    let delivered = sinker.wait_for_items_count(4).await;
    delivered.notified().await;

    shutdown_tx.shutdown().unwrap();
    run.await.unwrap().unwrap();

    let items = sinker.items().await;
    assert_eq!(items.len(), 4);

    assert_eq!(items[0].kind, ChangeKind::SnapshotInsert);
    assert_eq!(items[0].columns, user_row(1, "alice"));
    assert_eq!(items[1].kind, ChangeKind::SnapshotInsert);
    assert_eq!(items[1].columns, user_row(2, "bob"));
    assert_eq!(items[2].kind, ChangeKind::Insert);
    assert_eq!(items[2].columns, user_row(3, "carol"));
    assert_eq!(items[3].kind, ChangeKind::Insert);
    assert_eq!(items[3].columns, user_row(4, "dave"));

    // The checkpoint ends at the last pushed change.
    assert_eq!(coordinator.position(transfer_id).await, Some(last_position));
}

#[tokio::test(flavor = "multi_thread")]
async fn worker_phases_progress_through_lifecycle() {
    init_test_tracing();

    let storage = MemoryStorage::new();
    storage
        .insert_table_rows(users_table(), vec![user_row(1, "alice")])
        .await;

    let coordinator = NotifyingCoordinator::new();
    let sinker = TestSinkWrapper::wrap(MemorySinker::new());

    let transfer_id: TransferId = random();
    let config = create_transfer_config(transfer_id, vec![table_config("public", "users")]);

    let (shutdown_tx, shutdown_rx) = create_shutdown_channel();
    let worker = TransferWorker::new(
        Arc::new(config),
        storage,
        sinker.clone(),
        coordinator,
        shutdown_rx,
    );

    let handle = worker.start().await.unwrap();
    let state = handle.state();

    state.wait_for_phase(WorkerPhase::Incremental).await;

    shutdown_tx.shutdown().unwrap();
    handle.wait().await.unwrap();

    assert_eq!(state.phase().await, WorkerPhase::Stopped);
    // The sinker is closed exactly once at worker teardown.
    assert_eq!(sinker.close_calls().await, 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn stale_changes_are_dropped_on_resume() {
    init_test_tracing();

    let storage = ScriptedStorage::new(MemoryStorage::new());
    storage
        .memory()
        .push_change(users_table(), ChangeKind::Insert, user_row(1, "alice"), None)
        .await;
    let anchor = storage
        .memory()
        .push_change(users_table(), ChangeKind::Insert, user_row(2, "bob"), None)
        .await;
    // The source replays everything from the beginning, simulating an arbitrary
    // redelivery window behind the checkpoint.
    storage.replay_from_zero().await;

    let coordinator = NotifyingCoordinator::new();
    let sinker = TestSinkWrapper::wrap(MemorySinker::new());

    let transfer_id: TransferId = random();
    let config = create_transfer_config(transfer_id, vec![]);

    let (shutdown_tx, shutdown_rx) = create_shutdown_channel();
    let worker = TransferWorker::new(
        Arc::new(config),
        storage.clone(),
        sinker.clone(),
        coordinator.clone(),
        shutdown_rx,
    );
    let handle = worker.start().await.unwrap();

    // Wait for the anchor commit before producing, so the new change is guaranteed to
    // fall after the worker's start position.
    wait_until("transfer anchored", || async {
        coordinator.position(transfer_id).await == Some(anchor)
    })
    .await;

    let fresh_position = storage
        .memory()
        .push_change(users_table(), ChangeKind::Insert, user_row(3, "carol"), None)
        .await;

    let delivered = sinker.wait_for_items_count(1).await;
    delivered.notified().await;

    shutdown_tx.shutdown().unwrap();
    handle.wait().await.unwrap();

    // The replayed items at or below the committed position were never redelivered.
    let items = sinker.items().await;
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].position, fresh_position);
    assert_eq!(coordinator.position(transfer_id).await, Some(fresh_position));
}

#[tokio::test(flavor = "multi_thread")]
async fn stale_changes_pass_through_when_filtering_is_disabled() {
    init_test_tracing();

    let storage = ScriptedStorage::new(MemoryStorage::new());
    storage
        .memory()
        .push_change(users_table(), ChangeKind::Insert, user_row(1, "alice"), None)
        .await;
    let anchor = storage
        .memory()
        .push_change(users_table(), ChangeKind::Insert, user_row(2, "bob"), None)
        .await;
    storage.replay_from_zero().await;

    let coordinator = NotifyingCoordinator::new();
    let sinker = TestSinkWrapper::wrap(MemorySinker::new());

    let transfer_id: TransferId = random();
    let mut config = create_transfer_config(transfer_id, vec![]);
    config.drop_stale_on_resume = false;

    let (shutdown_tx, shutdown_rx) = create_shutdown_channel();
    let worker = TransferWorker::new(
        Arc::new(config),
        storage.clone(),
        sinker.clone(),
        coordinator.clone(),
        shutdown_rx,
    );
    let handle = worker.start().await.unwrap();

    wait_until("transfer anchored", || async {
        coordinator.position(transfer_id).await == Some(anchor)
    })
    .await;

    let fresh_position = storage
        .memory()
        .push_change(users_table(), ChangeKind::Insert, user_row(3, "carol"), None)
        .await;

    let delivered = sinker.wait_for_items_count(3).await;
    delivered.notified().await;

    shutdown_tx.shutdown().unwrap();
    handle.wait().await.unwrap();

    // Duplicates flow through to the sink, but the checkpoint still only moves
    // forward.
    assert_eq!(sinker.items().await.len(), 3);
    assert_eq!(coordinator.position(transfer_id).await, Some(fresh_position));
}

#[tokio::test(flavor = "multi_thread")]
async fn malformed_records_are_skipped_by_default() {
    init_test_tracing();

    let storage = MemoryStorage::new();
    let coordinator = NotifyingCoordinator::new();
    let sinker = TestSinkWrapper::wrap(MemorySinker::new());

    let transfer_id: TransferId = random();
    let config = create_transfer_config(transfer_id, vec![]);

    let (shutdown_tx, shutdown_rx) = create_shutdown_channel();
    let worker = TransferWorker::new(
        Arc::new(config),
        storage.clone(),
        sinker.clone(),
        coordinator.clone(),
        shutdown_rx,
    );
    let handle = worker.start().await.unwrap();

    wait_until("transfer anchored", || async {
        coordinator.position(transfer_id).await == Some(Position::ZERO)
    })
    .await;

    // An insert without columns is malformed and must be skipped, not delivered and
    // not fail the run.
    storage
        .push_change(users_table(), ChangeKind::Insert, vec![], None)
        .await;
    let valid_position = storage
        .push_change(users_table(), ChangeKind::Insert, user_row(1, "alice"), None)
        .await;

    let delivered = sinker.wait_for_items_count(1).await;
    delivered.notified().await;

    shutdown_tx.shutdown().unwrap();
    handle.wait().await.unwrap();

    let items = sinker.items().await;
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].position, valid_position);
}

#[tokio::test(flavor = "multi_thread")]
async fn malformed_records_fail_the_run_when_configured_to_abort() {
    init_test_tracing();

    let storage = MemoryStorage::new();
    let coordinator = NotifyingCoordinator::new();
    let sinker = TestSinkWrapper::wrap(MemorySinker::new());

    let transfer_id: TransferId = random();
    let mut config = create_transfer_config(transfer_id, vec![]);
    config.bad_records = BadRecordPolicy::Abort;

    let (_shutdown_tx, shutdown_rx) = create_shutdown_channel();
    let worker = TransferWorker::new(
        Arc::new(config),
        storage.clone(),
        sinker.clone(),
        coordinator.clone(),
        shutdown_rx,
    );
    let handle = worker.start().await.unwrap();
    let state = handle.state();

    wait_until("transfer anchored", || async {
        coordinator.position(transfer_id).await == Some(Position::ZERO)
    })
    .await;

    storage
        .push_change(users_table(), ChangeKind::Insert, vec![], None)
        .await;

    let err = handle.wait().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidData);
    // Aborting on a bad record is a run failure, never a service-terminating one.
    assert!(!err.is_fatal());
    assert_eq!(state.phase().await, WorkerPhase::Failed);

    // Nothing was delivered and the checkpoint did not move.
    assert!(sinker.items().await.is_empty());
    assert_eq!(coordinator.position(transfer_id).await, Some(Position::ZERO));
}

#[tokio::test(flavor = "multi_thread")]
async fn fatal_sink_error_fails_the_worker_as_fatal() {
    init_test_tracing();

    let storage = MemoryStorage::new();
    storage
        .insert_table_rows(users_table(), vec![user_row(1, "alice")])
        .await;

    let coordinator = NotifyingCoordinator::new();
    let sinker = TestSinkWrapper::wrap(MemorySinker::new());
    sinker
        .fail_next_push(transfer_error!(
            ErrorKind::DestinationRejected,
            "Destination rejects all further writes"
        ))
        .await;

    let transfer_id: TransferId = random();
    let config = create_transfer_config(transfer_id, vec![table_config("public", "users")]);

    let (_shutdown_tx, shutdown_rx) = create_shutdown_channel();
    let worker = TransferWorker::new(
        Arc::new(config),
        storage,
        sinker.clone(),
        coordinator,
        shutdown_rx,
    );
    let handle = worker.start().await.unwrap();

    let err = handle.wait().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DestinationRejected);
    assert!(err.is_fatal());
}
