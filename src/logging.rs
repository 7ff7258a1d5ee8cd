//! Diagnostics for hook processes
//!
//! Everything goes to stderr: the host treats a hook's stdout as
//! conversation context.

use tracing_subscriber::EnvFilter;

/// Default filter level: `debug` when verbose, `warn` otherwise
pub fn default_level(debug: bool) -> tracing::Level {
    if debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    }
}

/// Initialize stderr logging. `RUST_LOG` overrides the default level.
/// Calling it twice is harmless.
pub fn init(debug: bool) {
    let env_filter = EnvFilter::builder()
        .with_default_directive(default_level(debug).into())
        .from_env_lossy();

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(false)
        .try_init();
}
