//! Write-call interception.

use crate::client::{ApiClient, ApiError, ApiRequest, ApiResponse};
use crate::connectivity::{ConnectivityMonitor, ConnectivityState};
use outbox_queue::QueueStore;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Attaches authentication context to outbound requests.
///
/// Authentication itself is an external collaborator concern; the
/// interceptor only guarantees the hook runs before every call, original
/// and replayed alike.
pub trait AuthProvider: Send + Sync {
    /// Decorates a request with authentication context.
    fn authorize(&self, request: &mut ApiRequest);
}

/// Auth provider that leaves requests untouched.
#[derive(Debug, Default)]
pub struct NoAuth;

impl AuthProvider for NoAuth {
    fn authorize(&self, _request: &mut ApiRequest) {}
}

/// Wraps every outgoing call and diverts offline write failures into the
/// durable queue.
///
/// The interceptor recovers exactly one failure class: a transport error
/// on a write verb while the monitor reports OFFLINE becomes an enqueued
/// mutation plus a synthetic `202 {queued: true}` response. Everything
/// else (4xx/5xx responses, read failures, write failures while the
/// platform still claims to be online) propagates to the caller
/// unchanged.
pub struct WriteInterceptor<C: ApiClient, S: QueueStore> {
    client: Arc<C>,
    store: Arc<S>,
    monitor: Arc<ConnectivityMonitor>,
    auth: Arc<dyn AuthProvider>,
    timeout: Duration,
}

impl<C: ApiClient, S: QueueStore> WriteInterceptor<C, S> {
    /// Creates an interceptor with no auth decoration and a 15s timeout.
    pub fn new(client: Arc<C>, store: Arc<S>, monitor: Arc<ConnectivityMonitor>) -> Self {
        Self {
            client,
            store,
            monitor,
            auth: Arc::new(NoAuth),
            timeout: Duration::from_secs(15),
        }
    }

    /// Sets the auth provider.
    pub fn with_auth(mut self, auth: Arc<dyn AuthProvider>) -> Self {
        self.auth = auth;
        self
    }

    /// Sets the per-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sends a request, queueing it if it fails for lack of connectivity.
    ///
    /// # Errors
    ///
    /// Returns the client's own error for every failure that is not an
    /// offline write: the interceptor never masks genuine errors.
    pub fn send(&self, mut request: ApiRequest) -> Result<ApiResponse, ApiError> {
        self.auth.authorize(&mut request);

        match self.client.execute(&request, self.timeout) {
            Ok(response) => Ok(response),
            Err(err) => {
                let offline = self.monitor.current_state() == ConnectivityState::Offline;
                let method = request.verb.write_method();

                if let (true, Some(method)) = (offline, method) {
                    match self.store.enqueue(method, &request.url, request.body.clone()) {
                        Ok(id) => {
                            info!(%id, method = %method, url = %request.url, "write queued while offline");
                            return Ok(ApiResponse::accepted_queued());
                        }
                        Err(store_err) => {
                            // The storage failure stays local; the caller
                            // sees the original connectivity error.
                            warn!(error = %store_err, url = %request.url, "failed to queue offline write");
                        }
                    }
                }
                Err(err)
            }
        }
    }
}
