use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// `RUST_LOG`-style directive, e.g. `skillpath_engine=debug`.
pub fn log_level_from_env() -> String {
    std::env::var("SKILLPATH_LOG").unwrap_or_else(|_| "info".to_string())
}

/// Installs a stdout subscriber. Returns false when one is already installed,
/// so both a host binary and the test suite may call it.
pub fn init_tracing(log_level: &str) -> bool {
    let env_filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let stdout_layer = fmt::layer().with_target(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .try_init()
        .is_ok()
}
