use tracing_subscriber::EnvFilter;

/// Installs a compact fmt subscriber. `RUST_LOG` overrides
/// `default_filter`.
///
/// Returns false when a global subscriber was already installed, in which
/// case nothing changes.
pub fn init_logging(default_filter: &str) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .try_init()
        .is_ok()
}
