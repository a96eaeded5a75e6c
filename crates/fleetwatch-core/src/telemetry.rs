//! Tracing initialisation for the process hosting the dashboard.
//!
//! The UI shell calls [`init_tracing`] once at start-up. Later calls are
//! ignored because the global subscriber can only be installed once.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Output shape of log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable single lines.
    #[default]
    Text,
    /// Newline-delimited JSON, for log aggregation.
    Json,
}

/// Install the global subscriber.
///
/// `RUST_LOG` wins when set; otherwise `level` is the default verbosity.
/// Returns `false` when a subscriber was already installed.
pub fn init_tracing(format: LogFormat, level: Level) -> bool {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    let registry = tracing_subscriber::registry().with(env_filter);
    match format {
        LogFormat::Json => registry
            .with(fmt::layer().with_target(false).json())
            .try_init()
            .is_ok(),
        LogFormat::Text => registry
            .with(fmt::layer().with_target(false))
            .try_init()
            .is_ok(),
    }
}
