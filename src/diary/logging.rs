//! Optional log output for hosts embedding the diary core.
//!
//! The library itself only emits `tracing` events. A shell that wants them on
//! stderr calls [`init_logging`] once at startup; `RUST_LOG`, when set,
//! overrides the given default level.

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Installs a fmt subscriber writing to stderr.
///
/// Returns false if a global subscriber was already installed, in which case
/// nothing changes.
pub fn init_logging(default_level: Level) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.as_str().to_lowercase()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .is_ok()
}
