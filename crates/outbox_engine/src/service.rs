//! Application composition root.

use crate::client::ApiClient;
use crate::config::SyncConfig;
use crate::connectivity::{ConnectivityMonitor, Subscription};
use crate::engine::SyncEngine;
use crate::interceptor::WriteInterceptor;
use crate::worker::{register_asset_worker, WorkerRegistrar};
use outbox_queue::QueueStore;
use std::sync::Arc;
use tracing::{info, warn};

/// Explicitly constructed offline service.
///
/// The service wires the monitor, queue, interceptor, and engine together
/// and owns their lifecycle. It is meant to live in the application's
/// startup composition root and be handed to consumers by reference; there
/// is no global instance and no implicit initialization.
pub struct OfflineService<C: ApiClient + 'static, S: QueueStore + 'static> {
    monitor: Arc<ConnectivityMonitor>,
    engine: Arc<SyncEngine<C, S>>,
    interceptor: Arc<WriteInterceptor<C, S>>,
    online_subscription: Option<Subscription>,
}

impl<C: ApiClient + 'static, S: QueueStore + 'static> OfflineService<C, S> {
    /// Builds the service over an existing client, store, and monitor.
    pub fn new(
        config: SyncConfig,
        client: Arc<C>,
        store: Arc<S>,
        monitor: Arc<ConnectivityMonitor>,
    ) -> Self {
        let interceptor = Arc::new(
            WriteInterceptor::new(
                Arc::clone(&client),
                Arc::clone(&store),
                Arc::clone(&monitor),
            )
            .with_timeout(config.replay_timeout),
        );
        let engine = Arc::new(SyncEngine::new(config, client, store));

        Self {
            monitor,
            engine,
            interceptor,
            online_subscription: None,
        }
    }

    /// Starts the service.
    ///
    /// Registers the asset worker (failure is non-fatal) and subscribes
    /// the engine to OFFLINE→ONLINE transitions. Errors inside the
    /// observer are logged and never propagate into the monitor.
    pub fn init(&mut self, registrar: Option<&dyn WorkerRegistrar>) {
        if let Some(registrar) = registrar {
            register_asset_worker(registrar);
        }

        let engine = Arc::clone(&self.engine);
        let subscription = self.monitor.on_online(move || match engine.run() {
            Ok(report) if report.coalesced => {}
            Ok(report) => info!(
                succeeded = report.succeeded,
                failed = report.failed,
                remaining = report.remaining,
                "reconnect sync pass finished"
            ),
            Err(err) => warn!(error = %err, "reconnect sync pass aborted"),
        });
        self.online_subscription = Some(subscription);
    }

    /// Stops the service.
    ///
    /// Unsubscribes from connectivity transitions and cancels any running
    /// pass; the in-flight replay call is allowed to finish.
    pub fn dispose(&mut self) {
        self.online_subscription.take();
        self.engine.cancel();
    }

    /// The interceptor consumers route their write calls through.
    pub fn interceptor(&self) -> &Arc<WriteInterceptor<C, S>> {
        &self.interceptor
    }

    /// The replay engine, for manual triggers and failure queries.
    pub fn engine(&self) -> &Arc<SyncEngine<C, S>> {
        &self.engine
    }

    /// The connectivity monitor, for UI-facing state queries.
    pub fn monitor(&self) -> &Arc<ConnectivityMonitor> {
        &self.monitor
    }
}

impl<C: ApiClient + 'static, S: QueueStore + 'static> Drop for OfflineService<C, S> {
    fn drop(&mut self) {
        self.dispose();
    }
}
