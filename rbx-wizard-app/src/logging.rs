//! Logging setup

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install a stderr `fmt` subscriber.
///
/// `RUST_LOG` takes precedence over `default_filter` (e.g. `"info"`,
/// `"rbx_wizard_core=debug"`). Records emitted through `log` by the library
/// crates are captured as well. Calling this twice is harmless; the second call
/// keeps the first subscriber.
pub fn init_logging(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let installed = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true),
        )
        .with(filter)
        .try_init();

    if installed.is_ok() {
        tracing::debug!("Logging initialized");
    }
}
