//! Logging initialization.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` takes precedence; `default_directive` is used when it is unset
/// or unparsable. Calling this twice is harmless: the second install fails
/// quietly and the first subscriber stays active.
///
/// # Example
/// ```
/// lumen_core::init_logging("info,lumen=debug");
/// tracing::info!("Renderer initialized");
/// ```
pub fn init_logging(default_directive: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .try_init();
}
