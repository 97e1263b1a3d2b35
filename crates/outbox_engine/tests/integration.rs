//! Integration tests for the offline queue and replay engine.

use outbox_engine::{
    ApiClient, ApiError, ApiRequest, ApiResponse, ConnectivityMonitor, ConnectivityState,
    MockClient, OfflineService, SyncConfig, SyncEngine, WriteInterceptor,
};
use outbox_queue::{JournalStore, MemoryStore, Method, QueueStore};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn offline_monitor() -> Arc<ConnectivityMonitor> {
    Arc::new(ConnectivityMonitor::new(
        ConnectivityState::Offline,
        Duration::ZERO,
    ))
}

#[test]
fn scenario_a_queued_order_replays_on_reconnect() {
    let client = Arc::new(MockClient::new());
    let store = Arc::new(MemoryStore::new());
    let interceptor = WriteInterceptor::new(
        Arc::clone(&client),
        Arc::clone(&store),
        offline_monitor(),
    );

    // Offline: the POST fails at the transport and is diverted.
    client.set_default(Err(ApiError::Connection("offline".into())));
    let response = interceptor
        .send(ApiRequest::write(
            Method::Post,
            "/api/orders",
            Some(br#"{"items":[1,2,3]}"#.to_vec()),
        ))
        .unwrap();
    assert_eq!(response.status, 202);
    assert!(response.queued);
    assert_eq!(store.len(), 1);

    // Reconnect: the remote accepts the replay.
    client.set_default(Ok(ApiResponse::ok()));
    let engine = SyncEngine::new(SyncConfig::default(), Arc::clone(&client), Arc::clone(&store));
    let report = engine.run().unwrap();

    assert_eq!(report.succeeded, 1);
    assert_eq!(report.failed, 0);
    assert_eq!(report.remaining, 0);
    assert!(store.is_empty());

    let replayed = client.calls().pop().unwrap();
    assert_eq!(replayed.url, "/api/orders");
    assert_eq!(replayed.body.as_deref(), Some(&br#"{"items":[1,2,3]}"#[..]));
}

#[test]
fn scenario_b_middle_failure_does_not_block_the_rest() {
    let client = Arc::new(MockClient::new());
    let store = Arc::new(MemoryStore::new());
    store.enqueue(Method::Post, "/api/m1", None).unwrap();
    store.enqueue(Method::Post, "/api/m2", None).unwrap();
    store.enqueue(Method::Post, "/api/m3", None).unwrap();

    client.push_outcome("/api/m2", Ok(ApiResponse::new(500, b"boom".to_vec())));

    let engine = SyncEngine::new(
        SyncConfig::default().with_retry_ceiling(1),
        Arc::clone(&client),
        Arc::clone(&store),
    );
    let report = engine.run().unwrap();

    assert_eq!(report.succeeded, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(report.remaining, 0);

    // Replay was attempted strictly in m1 → m2 → m3 order.
    let urls: Vec<_> = client.calls().into_iter().map(|c| c.url).collect();
    assert_eq!(urls, vec!["/api/m1", "/api/m2", "/api/m3"]);

    // The terminal failure stays queryable.
    let failures = engine.terminal_failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].mutation.url, "/api/m2");
}

/// A client that enqueues a fourth mutation into the store while the first
/// replay call of a pass is in flight.
struct EnqueuingClient {
    store: Arc<MemoryStore>,
    injected: AtomicBool,
    calls: AtomicUsize,
}

impl ApiClient for EnqueuingClient {
    fn execute(&self, _request: &ApiRequest, _timeout: Duration) -> Result<ApiResponse, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.injected.swap(true, Ordering::SeqCst) {
            self.store.enqueue(Method::Post, "/api/m4", None).unwrap();
        }
        Ok(ApiResponse::ok())
    }
}

#[test]
fn scenario_c_mid_pass_enqueue_waits_for_the_next_pass() {
    let store = Arc::new(MemoryStore::new());
    store.enqueue(Method::Post, "/api/m1", None).unwrap();
    store.enqueue(Method::Post, "/api/m2", None).unwrap();
    store.enqueue(Method::Post, "/api/m3", None).unwrap();

    let client = Arc::new(EnqueuingClient {
        store: Arc::clone(&store),
        injected: AtomicBool::new(false),
        calls: AtomicUsize::new(0),
    });
    let engine = SyncEngine::new(SyncConfig::default(), Arc::clone(&client), Arc::clone(&store));

    let report = engine.run().unwrap();
    assert_eq!(report.succeeded, 3);
    assert_eq!(report.remaining, 1); // m4 was not part of the snapshot
    assert_eq!(client.calls.load(Ordering::SeqCst), 3);

    let next = engine.run().unwrap();
    assert_eq!(next.succeeded, 1);
    assert_eq!(next.remaining, 0);
}

/// A client slow enough that a second trigger lands mid-pass.
struct SlowClient {
    delay: Duration,
    calls: AtomicUsize,
}

impl ApiClient for SlowClient {
    fn execute(&self, _request: &ApiRequest, _timeout: Duration) -> Result<ApiResponse, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(self.delay);
        Ok(ApiResponse::ok())
    }
}

#[test]
fn simultaneous_triggers_coalesce_into_one_pass() {
    let store = Arc::new(MemoryStore::new());
    for i in 0..3 {
        store
            .enqueue(Method::Post, &format!("/api/m{i}"), None)
            .unwrap();
    }

    let client = Arc::new(SlowClient {
        delay: Duration::from_millis(80),
        calls: AtomicUsize::new(0),
    });
    let engine = Arc::new(SyncEngine::new(
        SyncConfig::default(),
        Arc::clone(&client),
        Arc::clone(&store),
    ));

    let background = {
        let engine = Arc::clone(&engine);
        std::thread::spawn(move || engine.run().unwrap())
    };
    std::thread::sleep(Duration::from_millis(30));

    // Second trigger while the pass is in flight: a no-op.
    let coalesced = engine.run().unwrap();
    assert!(coalesced.coalesced);
    assert_eq!(coalesced.succeeded, 0);

    let report = background.join().unwrap();
    assert!(!report.coalesced);
    assert_eq!(report.succeeded, 3);

    // No replay call was duplicated.
    assert_eq!(client.calls.load(Ordering::SeqCst), 3);
}

#[test]
fn cancellation_mid_pass_leaves_the_rest_for_the_next_trigger() {
    let store = Arc::new(MemoryStore::new());
    for i in 0..4 {
        store
            .enqueue(Method::Post, &format!("/api/m{i}"), None)
            .unwrap();
    }

    let client = Arc::new(SlowClient {
        delay: Duration::from_millis(60),
        calls: AtomicUsize::new(0),
    });
    let engine = Arc::new(SyncEngine::new(
        SyncConfig::default(),
        Arc::clone(&client),
        Arc::clone(&store),
    ));

    let background = {
        let engine = Arc::clone(&engine);
        std::thread::spawn(move || engine.run().unwrap())
    };
    std::thread::sleep(Duration::from_millis(30));
    engine.cancel();

    let report = background.join().unwrap();
    // The in-flight call finished; everything after it was skipped.
    assert!(report.succeeded >= 1);
    assert!(report.remaining >= 1);
    assert_eq!(
        report.succeeded as usize + report.remaining,
        4,
        "no record may be lost by cancellation"
    );

    let next = engine.run().unwrap();
    assert_eq!(next.remaining, 0);
    assert_eq!(next.succeeded as usize, 4 - report.succeeded as usize);
}

#[test]
fn offline_writes_survive_a_restart_and_replay_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("queue.jsonl");

    // First process lifetime: queue three writes while offline.
    {
        let client = Arc::new(MockClient::new());
        client.set_default(Err(ApiError::Connection("offline".into())));
        let store = Arc::new(JournalStore::open(&path).unwrap());
        let interceptor = WriteInterceptor::new(
            Arc::clone(&client),
            Arc::clone(&store),
            offline_monitor(),
        );

        for i in 0..3 {
            let response = interceptor
                .send(ApiRequest::write(
                    Method::Put,
                    format!("/api/products/{i}"),
                    Some(format!("{{\"seq\":{i}}}").into_bytes()),
                ))
                .unwrap();
            assert!(response.queued);
        }
    }

    // Second process lifetime: reconnect and drain.
    let client = Arc::new(MockClient::new());
    let store = Arc::new(JournalStore::open(&path).unwrap());
    assert_eq!(store.len(), 3);

    let engine = SyncEngine::new(SyncConfig::default(), Arc::clone(&client), Arc::clone(&store));
    let report = engine.run().unwrap();
    assert_eq!(report.succeeded, 3);
    assert!(store.is_empty());

    let urls: Vec<_> = client.calls().into_iter().map(|c| c.url).collect();
    assert_eq!(
        urls,
        vec!["/api/products/0", "/api/products/1", "/api/products/2"]
    );
}

#[test]
fn service_replays_through_a_debounced_reconnect() {
    let client = Arc::new(MockClient::new());
    let store = Arc::new(MemoryStore::new());
    let monitor = Arc::new(ConnectivityMonitor::new(
        ConnectivityState::Offline,
        Duration::from_millis(30),
    ));
    let mut service = OfflineService::new(
        SyncConfig::default(),
        Arc::clone(&client),
        Arc::clone(&store),
        Arc::clone(&monitor),
    );
    service.init(None);
    store.enqueue(Method::Post, "/api/orders", None).unwrap();

    // A flap that reverts within the window triggers nothing.
    monitor.report_online();
    monitor.report_offline();
    std::thread::sleep(Duration::from_millis(50));
    assert_eq!(monitor.settle(), None);
    assert_eq!(client.call_count(), 0);

    // A persisted transition does.
    monitor.report_online();
    std::thread::sleep(Duration::from_millis(50));
    assert_eq!(monitor.settle(), Some(ConnectivityState::Online));
    assert_eq!(client.call_count(), 1);
    assert!(store.is_empty());
}
