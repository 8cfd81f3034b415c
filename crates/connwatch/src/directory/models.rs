use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::DirectoryError;

/// Communication medium used to reach a subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// Endpoint is an international phone number
    Sms,
}

impl Channel {
    pub const ALL: [Channel; 1] = [Channel::Sms];

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Sms => "sms",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sms" => Ok(Channel::Sms),
            other => Err(format!("unknown channel `{other}`")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Active,
    Inactive,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Inactive => "inactive",
        }
    }
}

impl FromStr for SubscriptionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(SubscriptionStatus::Active),
            "inactive" => Ok(SubscriptionStatus::Inactive),
            other => Err(format!("unknown subscription status `{other}`")),
        }
    }
}

/// Subscription model, unique per (channel, endpoint)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub channel: Channel,
    pub endpoint: String,
    pub status: SubscriptionStatus,
}

impl Subscription {
    /// Decode a `(channel, endpoint, status)` row
    pub(crate) fn from_row(row: &libsql::Row) -> Result<Self, DirectoryError> {
        let channel: String = row.get(0)?;
        let endpoint: String = row.get(1)?;
        let status: String = row.get(2)?;

        if endpoint.trim().is_empty() {
            return Err(DirectoryError::Malformed("empty endpoint".to_string()));
        }

        Ok(Self {
            channel: channel.parse().map_err(DirectoryError::Malformed)?,
            endpoint,
            status: status.parse().map_err(DirectoryError::Malformed)?,
        })
    }
}

/// Audit entry for one down episode, keyed by its start
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownRecord {
    pub down_at: DateTime<Utc>,
    pub reason: String,
    pub up_at: Option<DateTime<Utc>>,
}

/// Storage representation of timestamps: microseconds since the epoch
pub(crate) fn to_micros(at: DateTime<Utc>) -> i64 {
    at.timestamp_micros()
}

pub(crate) fn from_micros(micros: i64) -> Result<DateTime<Utc>, DirectoryError> {
    DateTime::from_timestamp_micros(micros)
        .ok_or_else(|| DirectoryError::Malformed(format!("timestamp {micros} out of range")))
}
