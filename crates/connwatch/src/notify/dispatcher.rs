//! Down/up alert state machine with best-effort fan-out.
//!
//! # States
//! - `Quiet`: no alert outstanding
//! - `Alerting`: a down alert went out, waiting for recovery
//!
//! # Transitions
//! ```text
//! Quiet    --down (debounced)--> Alerting   sends "DOWN"
//! Alerting --up----------------> Quiet      sends "UP" with episode duration
//! ```
//! Down-while-Alerting and Up-while-Quiet are no-ops, which is what keeps a
//! long outage from producing one message per evaluation tick.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tracing::{debug, error, info, warn};

use super::message::{self, Notification};
use super::sender::{DeliveryError, MessageId, Sender};
use super::telegram::TelegramSender;
use super::twilio::TwilioSender;
use crate::config::ServerConfig;
use crate::detector::DownError;
use crate::directory::{Channel, Directory};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertState {
    Quiet,
    Alerting { since: DateTime<Utc> },
}

/// Outcome of one background fan-out
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub admin_delivered: bool,
    pub subscribers_delivered: usize,
    pub subscribers_failed: usize,
    pub directory_failures: usize,
}

/// Handle on a spawned fan-out. Dropping it detaches the tasks.
#[derive(Debug)]
pub struct Dispatch {
    handle: JoinHandle<DispatchReport>,
    audit: JoinHandle<()>,
}

impl Dispatch {
    /// Wait for every delivery and for the audit record
    pub async fn wait(self) -> Result<DispatchReport, JoinError> {
        let report = self.handle.await?;
        self.audit.await?;
        Ok(report)
    }
}

#[derive(Clone)]
struct AdminRoute {
    sender: Arc<dyn Sender>,
    recipient: String,
}

enum Audit {
    Down { at: DateTime<Utc>, reason: String },
    Up { down_at: DateTime<Utc>, up_at: DateTime<Utc> },
}

enum Target {
    Admin,
    Subscriber { channel: Channel, endpoint: String },
}

/// Sends at most one down and one up notification per outage.
///
/// Owned by the single evaluation loop, so the alert state needs no lock.
pub struct Dispatcher {
    admin: AdminRoute,
    channels: Vec<(Channel, Arc<dyn Sender>)>,
    directory: Arc<dyn Directory>,
    already_down_at: Option<DateTime<Utc>>,
    last_audit: Option<watch::Receiver<bool>>,
}

impl Dispatcher {
    pub fn new(
        directory: Arc<dyn Directory>,
        admin_sender: Arc<dyn Sender>,
        admin_recipient: impl Into<String>,
    ) -> Self {
        Self {
            admin: AdminRoute { sender: admin_sender, recipient: admin_recipient.into() },
            channels: Vec::new(),
            directory,
            already_down_at: None,
            last_audit: None,
        }
    }

    /// Fan subscribers of `channel` out through `sender`
    pub fn with_channel(mut self, channel: Channel, sender: Arc<dyn Sender>) -> Self {
        self.channels.retain(|(existing, _)| *existing != channel);
        self.channels.push((channel, sender));
        self
    }

    /// Telegram admin chat plus Twilio SMS subscribers, as configured
    pub fn from_config(
        config: &ServerConfig,
        directory: Arc<dyn Directory>,
    ) -> Result<Self, DeliveryError> {
        let telegram = TelegramSender::new(&config.telegram.bot_token, config.notify_timeout)?;
        let twilio = TwilioSender::new(&config.twilio, config.notify_timeout)?;

        Ok(Self::new(directory, Arc::new(telegram), config.telegram.receiver.to_string())
            .with_channel(Channel::Sms, Arc::new(twilio)))
    }

    pub fn state(&self) -> AlertState {
        match self.already_down_at {
            Some(since) => AlertState::Alerting { since },
            None => AlertState::Quiet,
        }
    }

    /// Handle a Down verdict. Fires only for debounced verdicts while quiet.
    pub fn down(&mut self, verdict: &DownError) -> Option<Dispatch> {
        let Some(down_at) = verdict.down_since() else {
            debug!(failures = verdict.consecutive_failures(), "down verdict below debounce threshold");
            return None;
        };
        if self.already_down_at.is_some() {
            return None;
        }

        self.already_down_at = Some(down_at);
        let reason = verdict.to_string();
        info!(%down_at, %reason, "link went down, notifying");

        let note = message::down_notification(down_at, &reason);
        Some(self.fan_out(note, Audit::Down { at: down_at, reason }))
    }

    /// Handle an Up verdict. Fires only when a down alert is outstanding.
    pub fn up(&mut self, now: DateTime<Utc>) -> Option<Dispatch> {
        let down_at = self.already_down_at.take()?;
        info!(%down_at, duration = %message::format_duration(now - down_at), "link came back up, notifying");

        let note = message::up_notification(down_at, now);
        Some(self.fan_out(note, Audit::Up { down_at, up_at: now }))
    }

    fn fan_out(&mut self, note: Notification, audit: Audit) -> Dispatch {
        let admin = self.admin.clone();
        let channels = self.channels.clone();
        let directory = self.directory.clone();

        // an up record must never land before the down record it closes
        let previous = self.last_audit.take();
        let (audit_done, audit_rx) = watch::channel(false);
        self.last_audit = Some(audit_rx);
        let audit = tokio::spawn(write_audit(directory.clone(), audit, previous, audit_done));

        let handle = tokio::spawn(async move {
            let note = Arc::new(note);
            let mut report = DispatchReport::default();
            let mut deliveries = JoinSet::new();

            // admin first so a slow directory never delays it
            deliveries.spawn(deliver(admin.sender, note.clone(), admin.recipient, Target::Admin));

            for (channel, sender) in channels {
                let subscriptions = match directory.list_active(channel).await {
                    Ok(subscriptions) => subscriptions,
                    Err(e) => {
                        error!(%channel, error = %e, "cannot list subscribers, skipping channel");
                        report.directory_failures += 1;
                        continue;
                    }
                };

                for subscription in subscriptions {
                    let target = Target::Subscriber { channel, endpoint: subscription.endpoint.clone() };
                    deliveries.spawn(deliver(sender.clone(), note.clone(), subscription.endpoint, target));
                }
            }

            while let Some(joined) = deliveries.join_next().await {
                match joined {
                    Ok((Target::Admin, Ok(_))) => report.admin_delivered = true,
                    Ok((Target::Admin, Err(e))) => {
                        warn!(error = %e, "failed to notify administrator");
                    }
                    Ok((Target::Subscriber { .. }, Ok(_))) => report.subscribers_delivered += 1,
                    Ok((Target::Subscriber { channel, endpoint }, Err(e))) => {
                        warn!(%channel, %endpoint, error = %e, "failed to notify subscriber");
                        report.subscribers_failed += 1;
                    }
                    Err(e) => {
                        error!(error = %e, "delivery task aborted");
                        report.subscribers_failed += 1;
                    }
                }
            }

            debug!(?report, "fan-out finished");
            report
        });

        Dispatch { handle, audit }
    }
}

async fn write_audit(
    directory: Arc<dyn Directory>,
    audit: Audit,
    previous: Option<watch::Receiver<bool>>,
    done: watch::Sender<bool>,
) {
    if let Some(mut previous) = previous {
        // a dropped sender means the earlier write is finished or gone
        let _ = previous.wait_for(|finished| *finished).await;
    }

    match audit {
        Audit::Down { at, reason } => {
            if let Err(e) = directory.record_down(at, &reason).await {
                warn!(error = %e, "failed to record down episode");
            }
        }
        Audit::Up { down_at, up_at } => {
            if let Err(e) = directory.record_up(down_at, up_at).await {
                warn!(error = %e, "failed to close down episode");
            }
        }
    }

    let _ = done.send(true);
}

async fn deliver(
    sender: Arc<dyn Sender>,
    note: Arc<Notification>,
    recipient: String,
    target: Target,
) -> (Target, Result<MessageId, DeliveryError>) {
    let result = sender.send(&note.subject, &note.body, &recipient).await;
    if let Ok(id) = &result {
        debug!(provider = sender.name(), message_id = %id, "notification delivered");
    }
    (target, result)
}
