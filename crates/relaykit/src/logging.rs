//! Logging setup for tools embedding relaykit.
//!
//! Applications with their own `tracing` subscriber should configure it
//! directly; [`init_logging`] is a convenience for the bundled examples and
//! for small tools with no tracing setup of their own. The level can be
//! overridden at runtime through [`ENV_LOG_LEVEL`].

use std::str::FromStr;

use tracing::level_filters::LevelFilter;

/// Environment variable overriding the log level (`trace`..`error`, `off`).
pub const ENV_LOG_LEVEL: &str = "RELAYKIT_LOG";

/// Output format for [`init_logging`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable single-line output.
    #[default]
    Text,
    /// One JSON object per event, for log shippers.
    Json,
}

/// Install a process-global subscriber writing to stderr.
///
/// `default_level` applies unless `RELAYKIT_LOG` names a valid level.
/// Calling this when a subscriber is already installed is a no-op.
pub fn init_logging(format: LogFormat, default_level: LevelFilter) {
    let level = std::env::var(ENV_LOG_LEVEL)
        .ok()
        .as_deref()
        .and_then(parse_level)
        .unwrap_or(default_level);

    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .with_ansi(false)
        .with_target(false);

    match format {
        LogFormat::Text => {
            let _ = builder.try_init();
        }
        LogFormat::Json => {
            let _ = builder.json().try_init();
        }
    }
}

/// Parse a `RELAYKIT_LOG` value; unparseable values are ignored so a typo
/// falls back to the caller's default rather than silencing output.
fn parse_level(value: &str) -> Option<LevelFilter> {
    LevelFilter::from_str(value.trim()).ok()
}
