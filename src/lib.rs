//! Offline Sync
//!
//! Hierarchical offline-content selection and sync engine: a course -> tab ->
//! file selection tree with tri-state checkboxes, storage projection for
//! uncommitted changes, SQLite-backed sync settings and a background sync job
//! driver.

pub mod config;
pub mod db;
pub mod errors;
pub mod external;
pub mod models;
pub mod orchestrator;
pub mod progress;
pub mod reconciler;
pub mod selection;
pub mod storage;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub use config::Config;
pub use errors::{Result, SyncError};
pub use orchestrator::{Collaborators, EngineEvent, SyncOrchestrator, SyncPhase};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over `log_level`. Does nothing if a subscriber is already set.
pub fn init_tracing(log_level: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let installed = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok();

    if installed {
        tracing::info!("Tracing initialized at level {}", log_level);
    }
}
