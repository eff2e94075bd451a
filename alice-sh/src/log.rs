use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Installs a global fmt subscriber filtered by `RUST_LOG`, defaulting to `info`.
///
/// Records from the `log` crate are forwarded as well. Calling this more than once is a no-op.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .try_init();
}
