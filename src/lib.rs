//! wxmap: weather for a selected point on a map
//!
//! Turns location selections (map clicks and place-name searches) into
//! de-duplicated, auto-refreshing fetches of current conditions, a 5-day
//! forecast and active alerts, reconciled into one consistent view state.
//! Rendering is left to the caller, which reads `service::Snapshot`s and sends
//! intents through a `service::ServiceHandle`.

pub mod config;
pub mod coordinator;
pub mod data;
pub mod refresh;
pub mod service;

pub use config::{Config, ConfigError, Units};
pub use coordinator::{FetchCoordinator, ViewState, FETCH_ERROR_MESSAGE};
pub use data::{Location, LocationKey};
pub use service::{SearchStatus, ServiceHandle, Snapshot};

/// Installs a fmt subscriber filtered by `RUST_LOG`, defaulting to `info`
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();
}
