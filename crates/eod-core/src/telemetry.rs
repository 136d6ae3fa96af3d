//! Tracing subscriber setup
//!
//! Library code only emits `tracing` events. Binaries and tests call
//! [`init`] once to decide where they go.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing_subscriber::EnvFilter;

/// Log line format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

impl FromStr for LogFormat {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(TelemetryError::UnknownFormat(other.to_string())),
        }
    }
}

/// Subscriber setup failure
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// Filter directive did not parse
    #[error("invalid log filter {filter:?}: {reason}")]
    InvalidFilter { filter: String, reason: String },

    /// Format name not recognised
    #[error("unknown log format {0:?} (expected text or json)")]
    UnknownFormat(String),
}

/// Install the global subscriber
///
/// `RUST_LOG` wins over `filter` when set. Returns `Ok(false)` if a
/// subscriber was already installed, so calling it twice is harmless.
///
/// # Errors
/// `TelemetryError::InvalidFilter` if `filter` is not a valid directive
pub fn init(filter: &str, format: LogFormat) -> Result<bool, TelemetryError> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(from_env) => from_env,
        Err(_) => EnvFilter::try_new(filter).map_err(|e| TelemetryError::InvalidFilter {
            filter: filter.to_string(),
            reason: e.to_string(),
        })?,
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true);
    let installed = match format {
        LogFormat::Text => builder.try_init().is_ok(),
        LogFormat::Json => builder.json().try_init().is_ok(),
    };
    if installed {
        tracing::debug!(%format, "telemetry initialised");
    }
    Ok(installed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_parsing() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("text".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert!(matches!(
            "xml".parse::<LogFormat>(),
            Err(TelemetryError::UnknownFormat(_))
        ));
    }

    #[test]
    fn second_init_is_harmless() {
        let _ = init("debug", LogFormat::Text);
        assert!(!init("info", LogFormat::Json).unwrap());
    }
}
