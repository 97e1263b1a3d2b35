//! Background asset-worker registration.

use tracing::{info, warn};

/// Installs the background worker that serves cached static assets.
///
/// The worker is an external collaborator registered once at startup.
pub trait WorkerRegistrar: Send + Sync {
    /// Attempts to install the worker, returning a reason on failure.
    fn register(&self) -> Result<(), String>;
}

/// Registers the asset-caching worker, logging the outcome.
///
/// A failed registration is logged and otherwise ignored; it never blocks
/// the rest of the system. Returns whether registration succeeded.
pub fn register_asset_worker(registrar: &dyn WorkerRegistrar) -> bool {
    match registrar.register() {
        Ok(()) => {
            info!("asset worker registered");
            true
        }
        Err(reason) => {
            warn!(%reason, "asset worker registration failed; continuing without cached assets");
            false
        }
    }
}
