use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

use super::{ConfigError, EnvReader};
use crate::ENV_PREFIX;

pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(2);
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(10);
pub const DEFAULT_DEBOUNCE_THRESHOLD: u32 = 3;
pub const DEFAULT_NOTIFY_TIMEOUT: Duration = Duration::from_secs(10);

/// Address dialled by the active probe, validated as `host:port`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeAddr(String);

impl ProbeAddr {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ProbeAddr {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (host, port) = s.rsplit_once(':').ok_or("expected host:port")?;
        if host.is_empty() || host == "[]" {
            return Err("missing host".to_string());
        }
        if host.contains(':') && !(host.starts_with('[') && host.ends_with(']')) {
            return Err("IPv6 hosts must be bracketed, e.g. [::1]:80".to_string());
        }
        let port: u16 = port.parse().map_err(|_| format!("invalid port `{port}`"))?;
        if port == 0 {
            return Err("port 0 is not dialable".to_string());
        }
        Ok(Self(s.to_string()))
    }
}

impl fmt::Display for ProbeAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How the server decides whether the link is alive
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectorMode {
    /// The peer pings `/ping`; silence longer than interval + grace is down
    Passive,
    /// The server dials the peer on every tick
    Active { probe_addr: ProbeAddr },
}

/// Administrator chat channel
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub receiver: i64,
}

/// SMS provider used for subscriber fan-out
#[derive(Debug, Clone)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: String,
    pub from_phone: String,
}

/// Settings for `--mode server`
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
    pub heartbeat_interval: Duration,
    pub grace_period: Duration,
    pub debounce_threshold: u32,
    pub detector: DetectorMode,
    pub database_path: PathBuf,
    /// Temporarily disable the evaluation loop; the HTTP surface keeps serving
    pub notification_disabled: bool,
    pub notify_timeout: Duration,
    pub telegram: TelegramConfig,
    pub twilio: TwilioConfig,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_reader(&EnvReader::from_env(ENV_PREFIX))
    }

    pub fn from_reader<F>(env: &EnvReader<F>) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let debounce_threshold =
            env.with_default("DEBOUNCE_THRESHOLD", DEFAULT_DEBOUNCE_THRESHOLD)?;
        if debounce_threshold == 0 {
            return Err(ConfigError::NotPositive { key: env.key("DEBOUNCE_THRESHOLD") });
        }

        let detector = match env.raw("DETECTOR").map(|m| m.to_ascii_lowercase()).as_deref() {
            None | Some("passive") => DetectorMode::Passive,
            Some("active") => DetectorMode::Active { probe_addr: env.required("PROBE_ADDR")? },
            Some(other) => {
                return Err(ConfigError::invalid(
                    &env.key("DETECTOR"),
                    other,
                    "expected `passive` or `active`",
                ));
            }
        };

        Ok(Self {
            listen_addr: env.required("SERVER_LISTEN_ADDR")?,
            heartbeat_interval: env
                .positive_duration("HEARTBEAT_INTERVAL", DEFAULT_HEARTBEAT_INTERVAL)?,
            grace_period: env.positive_duration("GRACE_PERIOD", DEFAULT_GRACE_PERIOD)?,
            debounce_threshold,
            detector,
            database_path: env.required("DATABASE_PATH")?,
            notification_disabled: env.flag("NOTIFICATION_DISABLED", false)?,
            notify_timeout: env.positive_duration("NOTIFY_TIMEOUT", DEFAULT_NOTIFY_TIMEOUT)?,
            telegram: TelegramConfig {
                bot_token: env.required("NOTIFY_TELEGRAM_BOT_TOKEN")?,
                receiver: env.required("NOTIFY_TELEGRAM_RECEIVER")?,
            },
            twilio: TwilioConfig {
                account_sid: env.required("NOTIFY_TWILIO_ACCOUNT_SID")?,
                auth_token: env.required("NOTIFY_TWILIO_AUTH_TOKEN")?,
                from_phone: env.required("NOTIFY_TWILIO_FROM_PHONE")?,
            },
        })
    }
}

impl fmt::Display for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let detector = match &self.detector {
            DetectorMode::Passive => "passive".to_string(),
            DetectorMode::Active { probe_addr } => format!("active ({probe_addr})"),
        };
        writeln!(f, "Server Configuration:")?;
        writeln!(f, "  Listen Address: {}", self.listen_addr)?;
        writeln!(f, "  Detector: {detector}")?;
        writeln!(f, "  Heartbeat Interval: {:?}", self.heartbeat_interval)?;
        writeln!(f, "  Grace Period: {:?}", self.grace_period)?;
        writeln!(f, "  Debounce Threshold: {}", self.debounce_threshold)?;
        writeln!(f, "  Database: {}", self.database_path.display())?;
        writeln!(f, "  Notifications Disabled: {}", self.notification_disabled)?;
        Ok(())
    }
}

/// Settings for `--mode sender`
#[derive(Debug, Clone)]
pub struct SenderConfig {
    pub ping_to_addr: Url,
    pub heartbeat_interval: Duration,
}

impl SenderConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_reader(&EnvReader::from_env(ENV_PREFIX))
    }

    pub fn from_reader<F>(env: &EnvReader<F>) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let ping_to_addr: Url = env.required("PING_TO_ADDR")?;
        if !matches!(ping_to_addr.scheme(), "http" | "https") {
            return Err(ConfigError::invalid(
                &env.key("PING_TO_ADDR"),
                ping_to_addr.as_str(),
                "scheme must be http or https",
            ));
        }

        Ok(Self {
            ping_to_addr,
            heartbeat_interval: env
                .positive_duration("HEARTBEAT_INTERVAL", DEFAULT_HEARTBEAT_INTERVAL)?,
        })
    }

    /// `{ping_to_addr}/ping`, tolerating a trailing slash on the base
    pub fn ping_url(&self) -> Url {
        let mut url = self.ping_to_addr.clone();
        let path = format!("{}/ping", url.path().trim_end_matches('/'));
        url.set_path(&path);
        url
    }
}
