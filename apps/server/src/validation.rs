//! Boundary validation for subscription requests and SMS keywords.

use connwatch::Channel;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("unknown channel")]
    UnknownChannel,
    #[error("invalid endpoint")]
    InvalidEndpoint,
    #[error("invalid sms delivery report")]
    InvalidSmsReport,
}

/// Check a `channel`/`endpoint` pair. Only `sms` with an international
/// number (leading `+`) is accepted.
pub fn validate_subscription(
    channel: Option<&str>,
    endpoint: Option<&str>,
) -> Result<(Channel, String), ValidationError> {
    let channel = match channel {
        Some("sms") => Channel::Sms,
        _ => return Err(ValidationError::UnknownChannel),
    };

    match endpoint {
        Some(endpoint) if endpoint.starts_with('+') && endpoint.len() > 1 => {
            Ok((channel, endpoint.to_string()))
        }
        _ => Err(ValidationError::InvalidEndpoint),
    }
}

/// Keyword in an inbound SMS
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmsCommand {
    Start,
    Stop,
}

pub fn parse_sms_command(body: &str) -> Option<SmsCommand> {
    match body.trim().to_lowercase().as_str() {
        "start" | "unstop" => Some(SmsCommand::Start),
        "stop" => Some(SmsCommand::Stop),
        _ => None,
    }
}
