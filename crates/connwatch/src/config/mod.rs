//! Environment configuration for connwatch.
//!
//! Every behaviour-affecting parameter is read from `CONNCHK_*` variables.
//! A missing required value or an unparsable one is a startup error; the
//! process must not start serving with a half-valid configuration.

mod duration;
mod env;
mod types;

pub use duration::parse_duration;
pub use env::EnvReader;
pub use types::{
    DetectorMode, ProbeAddr, SenderConfig, ServerConfig, TelegramConfig, TwilioConfig,
    DEFAULT_DEBOUNCE_THRESHOLD, DEFAULT_GRACE_PERIOD, DEFAULT_HEARTBEAT_INTERVAL,
    DEFAULT_NOTIFY_TIMEOUT,
};

use thiserror::Error;

/// Configuration errors, all fatal at startup
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("missing required setting {key}")]
    Missing { key: String },

    #[error("invalid value `{value}` for {key}: {reason}")]
    Invalid { key: String, value: String, reason: String },

    #[error("{key} must be strictly positive")]
    NotPositive { key: String },
}

impl ConfigError {
    pub(crate) fn invalid(key: &str, value: &str, reason: impl ToString) -> Self {
        Self::Invalid { key: key.to_string(), value: value.to_string(), reason: reason.to_string() }
    }
}
