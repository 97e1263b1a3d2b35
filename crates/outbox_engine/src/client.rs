//! Outbound API client abstraction.
//!
//! The engine does not define a new wire protocol; it reuses whichever
//! authenticated HTTP calls the surrounding application already makes.
//! The actual HTTP stack is abstracted behind [`ApiClient`] so different
//! implementations (reqwest, ureq, a platform fetch bridge, mocks) can be
//! plugged in.

use outbox_queue::Method;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::collections::VecDeque;
use std::time::Duration;
use thiserror::Error;

/// The verb of an outbound call.
///
/// Read verbs are carried so the interceptor can refuse to queue them;
/// only [`Verb::Write`] calls are ever diverted into the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    /// A GET request.
    Get,
    /// A HEAD request.
    Head,
    /// A queueable write request.
    Write(Method),
}

impl Verb {
    /// Returns the write method, or `None` for read verbs.
    pub fn write_method(&self) -> Option<Method> {
        match self {
            Verb::Write(method) => Some(*method),
            _ => None,
        }
    }

    /// Returns the verb as an uppercase HTTP method string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Head => "HEAD",
            Verb::Write(method) => method.as_str(),
        }
    }
}

/// An outbound API request.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    /// The request verb.
    pub verb: Verb,
    /// Target URL.
    pub url: String,
    /// Request headers, in insertion order.
    pub headers: Vec<(String, String)>,
    /// Opaque request body.
    pub body: Option<Vec<u8>>,
}

impl ApiRequest {
    /// Builds a GET request.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            verb: Verb::Get,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Builds a write request.
    pub fn write(method: Method, url: impl Into<String>, body: Option<Vec<u8>>) -> Self {
        Self {
            verb: Verb::Write(method),
            url: url.into(),
            headers: Vec::new(),
            body,
        }
    }

    /// Appends a header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// An API response.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: Vec<u8>,
    /// True when this is a synthetic response for a queued offline write.
    pub queued: bool,
}

impl ApiResponse {
    /// Builds a response with the given status and body.
    pub fn new(status: u16, body: Vec<u8>) -> Self {
        Self {
            status,
            body,
            queued: false,
        }
    }

    /// Builds a plain 200 response with an empty body.
    pub fn ok() -> Self {
        Self::new(200, Vec::new())
    }

    /// Builds the synthetic accepted result for a queued offline write.
    ///
    /// Calling code receives this instead of an error so it need not
    /// special-case offline behavior.
    pub fn accepted_queued() -> Self {
        Self {
            status: 202,
            body: Vec::new(),
            queued: true,
        }
    }

    /// Returns true for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Transport-level failures of an outbound call.
///
/// HTTP status outcomes are not errors; they come back as [`ApiResponse`]
/// values and propagate to the caller unchanged.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// The connection could not be established or was lost mid-call.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The call exceeded its timeout.
    #[error("request timed out")]
    Timeout,
}

/// An authenticated HTTP client.
///
/// Implement this trait to bridge the engine to the application's existing
/// API client. Implementations must apply the given timeout to the whole
/// call and report it as [`ApiError::Timeout`].
pub trait ApiClient: Send + Sync {
    /// Executes a request, returning the response or a transport failure.
    fn execute(&self, request: &ApiRequest, timeout: Duration) -> Result<ApiResponse, ApiError>;
}

/// A scripted client for testing.
///
/// Outcomes are queued per URL and consumed in order; URLs with no script
/// fall back to a configurable default (initially a 200). Every executed
/// request is recorded so tests can assert call order and count.
pub struct MockClient {
    scripted: Mutex<HashMap<String, VecDeque<Result<ApiResponse, ApiError>>>>,
    default: Mutex<Result<ApiResponse, ApiError>>,
    calls: Mutex<Vec<ApiRequest>>,
}

impl MockClient {
    /// Creates a client that answers 200 to everything.
    pub fn new() -> Self {
        Self {
            scripted: Mutex::new(HashMap::new()),
            default: Mutex::new(Ok(ApiResponse::ok())),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Queues an outcome for the next call to `url`.
    pub fn push_outcome(&self, url: &str, outcome: Result<ApiResponse, ApiError>) {
        self.scripted
            .lock()
            .entry(url.to_string())
            .or_default()
            .push_back(outcome);
    }

    /// Sets the fallback outcome for unscripted URLs.
    pub fn set_default(&self, outcome: Result<ApiResponse, ApiError>) {
        *self.default.lock() = outcome;
    }

    /// Returns every request executed so far, in call order.
    pub fn calls(&self) -> Vec<ApiRequest> {
        self.calls.lock().clone()
    }

    /// Returns the number of executed requests.
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

impl Default for MockClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ApiClient for MockClient {
    fn execute(&self, request: &ApiRequest, _timeout: Duration) -> Result<ApiResponse, ApiError> {
        self.calls.lock().push(request.clone());

        if let Some(queue) = self.scripted.lock().get_mut(&request.url) {
            if let Some(outcome) = queue.pop_front() {
                return outcome;
            }
        }
        self.default.lock().clone()
    }
}
