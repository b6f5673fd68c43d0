use tracing_subscriber::{fmt, EnvFilter};

/// Initialize tracing output on stderr, leaving stdout to the progress
/// bars. Filter comes from `RUST_LOG`, defaulting to `info`.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
