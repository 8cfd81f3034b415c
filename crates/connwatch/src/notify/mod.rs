//! Notification fan-out.
//!
//! The [`Dispatcher`] turns detector verdicts into at most one "down" and one
//! "up" message per episode and hands them to [`Sender`] implementations:
//! Telegram for the administrator, Twilio SMS for directory subscribers.

pub mod dispatcher;
pub mod message;
pub mod sender;
pub mod telegram;
pub mod twilio;

pub use dispatcher::{AlertState, Dispatch, DispatchReport, Dispatcher};
pub use message::Notification;
pub use sender::{DeliveryError, MessageId, Sender};
pub use telegram::TelegramSender;
pub use twilio::TwilioSender;
