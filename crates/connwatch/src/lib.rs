//! connwatch - liveness monitoring for a single watched link
//!
//! A watched peer either pings us (passive heartbeat) or is dialled by us
//! (active probe). The detector turns those signals into an up/down verdict
//! with debounce, and the dispatcher fans the two transitions out to a fixed
//! administrator chat and to every active SMS subscriber.

pub mod config;
pub mod detector;
pub mod directory;
pub mod heartbeat;
pub mod monitor;
pub mod notify;

// Re-export main types
pub use config::{ConfigError, DetectorMode, SenderConfig, ServerConfig};
pub use detector::{Detector, DownError, LivenessState};
pub use directory::{Channel, Directory, DirectoryError, LibsqlDirectory, Subscription};
pub use heartbeat::Heartbeat;
pub use monitor::Monitor;
pub use notify::{Dispatch, Dispatcher, Sender};

/// Prefix shared by every environment variable the service reads
pub const ENV_PREFIX: &str = "CONNCHK";

/// Prefix of every notification subject
pub const SUBJECT_TAG: &str = "[CONNCHK]";
