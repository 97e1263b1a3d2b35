//! Debounced connectivity state relay.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Whether the platform currently reports a usable network connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityState {
    /// The platform reports a connection.
    Online,
    /// The platform reports no connection.
    Offline,
}

impl ConnectivityState {
    /// Returns true for the online state.
    pub fn is_online(&self) -> bool {
        matches!(self, ConnectivityState::Online)
    }
}

type Callback = Arc<dyn Fn() + Send + Sync>;

struct Observer {
    id: u64,
    fires_on: ConnectivityState,
    callback: Callback,
}

struct MonitorInner {
    state: ConnectivityState,
    pending: Option<(ConnectivityState, Instant)>,
    observers: Vec<Observer>,
    next_id: u64,
}

/// Relays platform online/offline signals to registered observers.
///
/// Platform callbacks feed the monitor through [`report`]; the monitor
/// itself never touches platform APIs, so tests can drive transitions
/// deterministically.
///
/// A reported change commits (updates the authoritative state and fires
/// observers) only once it has persisted past the debounce window. A flap
/// that reverts within the window never reaches observers. A zero window
/// commits synchronously.
///
/// Observer callbacks run synchronously on the call that commits the
/// transition; there are no background threads.
///
/// [`report`]: ConnectivityMonitor::report
pub struct ConnectivityMonitor {
    inner: Arc<Mutex<MonitorInner>>,
    debounce: Duration,
}

impl ConnectivityMonitor {
    /// Creates a monitor with the given initial state and debounce window.
    ///
    /// The initial state is the platform's connectivity flag read once at
    /// construction.
    pub fn new(initial: ConnectivityState, debounce: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MonitorInner {
                state: initial,
                pending: None,
                observers: Vec::new(),
                next_id: 0,
            })),
            debounce,
        }
    }

    /// Returns the authoritative connectivity state.
    pub fn current_state(&self) -> ConnectivityState {
        self.inner.lock().state
    }

    /// Feeds a platform connectivity signal into the monitor.
    pub fn report(&self, state: ConnectivityState) {
        let to_fire = {
            let mut inner = self.inner.lock();
            let mut fired = Self::commit_elapsed(&mut inner, self.debounce);

            if state == inner.state {
                // Flap reverted before the window elapsed.
                inner.pending = None;
            } else if self.debounce.is_zero() {
                fired.extend(Self::commit(&mut inner, state));
            } else if !matches!(inner.pending, Some((p, _)) if p == state) {
                inner.pending = Some((state, Instant::now()));
            }
            fired
        };

        for callback in to_fire {
            callback();
        }
    }

    /// Reports the platform going online.
    pub fn report_online(&self) {
        self.report(ConnectivityState::Online);
    }

    /// Reports the platform going offline.
    pub fn report_offline(&self) {
        self.report(ConnectivityState::Offline);
    }

    /// Commits a pending change whose debounce window has elapsed.
    ///
    /// Returns the committed state, or `None` if nothing settled.
    pub fn settle(&self) -> Option<ConnectivityState> {
        let (settled, to_fire) = {
            let mut inner = self.inner.lock();
            match Self::take_elapsed(&mut inner, self.debounce) {
                Some(target) => (Some(target), Self::commit(&mut inner, target)),
                None => (None, Vec::new()),
            }
        };

        for callback in to_fire {
            callback();
        }
        settled
    }

    /// Registers an observer for OFFLINE→ONLINE transitions.
    ///
    /// Dropping the returned [`Subscription`] unregisters the observer.
    pub fn on_online(&self, callback: impl Fn() + Send + Sync + 'static) -> Subscription {
        self.subscribe(ConnectivityState::Online, Arc::new(callback))
    }

    /// Registers an observer for ONLINE→OFFLINE transitions.
    ///
    /// Dropping the returned [`Subscription`] unregisters the observer.
    pub fn on_offline(&self, callback: impl Fn() + Send + Sync + 'static) -> Subscription {
        self.subscribe(ConnectivityState::Offline, Arc::new(callback))
    }

    fn subscribe(&self, fires_on: ConnectivityState, callback: Callback) -> Subscription {
        let mut inner = self.inner.lock();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.observers.push(Observer {
            id,
            fires_on,
            callback,
        });
        Subscription {
            inner: Arc::clone(&self.inner),
            id,
        }
    }

    fn commit(inner: &mut MonitorInner, state: ConnectivityState) -> Vec<Callback> {
        inner.state = state;
        inner.pending = None;
        inner
            .observers
            .iter()
            .filter(|o| o.fires_on == state)
            .map(|o| Arc::clone(&o.callback))
            .collect()
    }

    /// Takes a pending change whose window has elapsed, if any.
    fn take_elapsed(inner: &mut MonitorInner, debounce: Duration) -> Option<ConnectivityState> {
        match inner.pending {
            Some((target, since)) if since.elapsed() >= debounce => {
                inner.pending = None;
                Some(target)
            }
            _ => None,
        }
    }

    fn commit_elapsed(inner: &mut MonitorInner, debounce: Duration) -> Vec<Callback> {
        match Self::take_elapsed(inner, debounce) {
            Some(target) => Self::commit(inner, target),
            None => Vec::new(),
        }
    }
}

/// Handle for a registered connectivity observer.
///
/// The observer stays registered for the lifetime of the subscription;
/// dropping it (or calling [`cancel`](Subscription::cancel)) removes it.
pub struct Subscription {
    inner: Arc<Mutex<MonitorInner>>,
    id: u64,
}

impl Subscription {
    /// Explicitly unregisters the observer.
    pub fn cancel(self) {
        // Drop does the work.
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.inner.lock().observers.retain(|o| o.id != self.id);
    }
}
