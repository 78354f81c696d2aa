// --- File: crates/calgraph_common/src/logging.rs ---
//! Logging utilities for the calgraph workspace.
//!
//! Log output goes to stderr so it never interleaves with the console's
//! menus and prompts on stdout.

use tracing::{error, info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber at the default level (WARN).
///
/// An interactive console should stay quiet unless asked otherwise;
/// `RUST_LOG` still overrides this.
pub fn init() {
    init_with_level(Level::WARN);
}

/// Initialize the tracing subscriber with a specific log level.
///
/// The level applies to all `calgraph*` targets. Calling this twice is
/// harmless; the second call leaves the first subscriber in place.
///
/// # Examples
///
/// ```
/// use calgraph_common::logging;
///
/// logging::init_with_level(tracing::Level::DEBUG);
/// ```
pub fn init_with_level(level: Level) {
    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = format!("calgraph={}", level).parse() {
        filter = filter.add_directive(directive);
    }

    // Use try_init to handle the case where a global default subscriber has already been set
    let result = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_file(true)
                .with_line_number(true),
        )
        .with(filter)
        .try_init();

    if result.is_ok() {
        info!("Logging initialized at level: {}", level);
    }
}

/// Log an error with context at the ERROR level.
pub fn log_error<E: std::fmt::Display>(error: E, context: &str) {
    error!("{}: {}", context, error);
}

/// Log a result, with different messages for success and error cases.
///
/// Returns the original result, allowing this function to be used in a chain.
pub fn log_result<T, E: std::fmt::Display>(
    result: Result<T, E>,
    success_message: &str,
    error_context: &str,
) -> Result<T, E> {
    match &result {
        Ok(_) => info!("{}", success_message),
        Err(e) => error!("{}: {}", error_context, e),
    }
    result
}
