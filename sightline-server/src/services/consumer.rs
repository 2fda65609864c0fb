//! Background notification fan-out
//!
//! One consumer task per process reads [`NotificationEvent`]s from the
//! broker subscription, resolves recipients and dispatches one message per
//! recipient.
//!
//! State machine: `Idle -> Resolving -> Dispatching -> Idle`, terminal
//! `Stopped`. Two ways to stop:
//!
//! - closing the broker: buffered events are drained, then `Stopped`
//! - cancelling the token: the in-flight event finishes, anything still
//!   buffered is abandoned, then `Stopped`

use futures::future::join_all;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use sightline_common::models::Recipient;
use sightline_common::{NotificationEvent, NotificationSubscription};

use crate::mailer::{EmailSender, MailError};
use crate::services::resolver::SighterResolver;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumerState {
    Idle,
    Resolving,
    Dispatching,
    Stopped,
}

/// Counters returned when the consumer task ends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Events whose recipients were resolved
    pub events_processed: u64,
    /// Events dropped because resolution failed
    pub events_dropped: u64,
    pub messages_sent: u64,
    /// Sends that errored or timed out
    pub messages_failed: u64,
}

pub struct NotificationConsumer {
    resolver: Arc<SighterResolver>,
    sender: Arc<dyn EmailSender>,
    template: String,
    dispatch_timeout: Duration,
}

/// Handle to a running consumer task
pub struct ConsumerHandle {
    join: JoinHandle<DispatchStats>,
    state: watch::Receiver<ConsumerState>,
}

impl ConsumerHandle {
    pub fn state(&self) -> ConsumerState {
        *self.state.borrow()
    }

    /// Receiver for observing state transitions
    pub fn watch_state(&self) -> watch::Receiver<ConsumerState> {
        self.state.clone()
    }

    /// Wait for the task to end
    ///
    /// Safe to call again if a previous wait was cut short by a timeout.
    pub async fn wait(&mut self) -> Result<DispatchStats, JoinError> {
        (&mut self.join).await
    }
}

impl NotificationConsumer {
    pub fn new(
        resolver: Arc<SighterResolver>,
        sender: Arc<dyn EmailSender>,
        template: impl Into<String>,
        dispatch_timeout: Duration,
    ) -> Self {
        Self {
            resolver,
            sender,
            template: template.into(),
            dispatch_timeout,
        }
    }

    /// Start the consumer loop on the tokio runtime
    pub fn spawn(self, subscription: NotificationSubscription, cancel: CancellationToken) -> ConsumerHandle {
        let (state_tx, state_rx) = watch::channel(ConsumerState::Idle);
        let join = tokio::spawn(self.run(subscription, cancel, state_tx));
        ConsumerHandle { join, state: state_rx }
    }

    async fn run(
        self,
        mut subscription: NotificationSubscription,
        cancel: CancellationToken,
        state: watch::Sender<ConsumerState>,
    ) -> DispatchStats {
        let mut stats = DispatchStats::default();
        info!(template = %self.template, "Notification consumer started");

        loop {
            let event = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("Notification consumer cancelled, abandoning buffered events");
                    break;
                }
                event = subscription.recv() => match event {
                    Some(event) => event,
                    None => {
                        info!("Notification broker closed and drained");
                        break;
                    }
                },
            };

            self.handle_event(&event, &state, &mut stats).await;
            state.send_replace(ConsumerState::Idle);
        }

        state.send_replace(ConsumerState::Stopped);
        info!(
            events_processed = stats.events_processed,
            events_dropped = stats.events_dropped,
            messages_sent = stats.messages_sent,
            messages_failed = stats.messages_failed,
            "Notification consumer stopped"
        );
        stats
    }

    async fn handle_event(
        &self,
        event: &NotificationEvent,
        state: &watch::Sender<ConsumerState>,
        stats: &mut DispatchStats,
    ) {
        state.send_replace(ConsumerState::Resolving);
        let recipients = match self.resolver.resolve(event.animal_id).await {
            Ok(recipients) => recipients,
            Err(e) => {
                error!(
                    sighting_id = %event.sighting_id,
                    animal_id = %event.animal_id,
                    error = %e,
                    "Failed to resolve recipients, dropping event"
                );
                stats.events_dropped += 1;
                return;
            }
        };
        stats.events_processed += 1;

        if recipients.is_empty() {
            debug!(sighting_id = %event.sighting_id, "No recipients for event");
            return;
        }

        state.send_replace(ConsumerState::Dispatching);
        let outcomes = join_all(recipients.iter().map(|r| self.dispatch(r, event))).await;

        let sent = outcomes.iter().filter(|ok| **ok).count() as u64;
        let failed = outcomes.len() as u64 - sent;
        stats.messages_sent += sent;
        stats.messages_failed += failed;

        info!(
            sighting_id = %event.sighting_id,
            animal_id = %event.animal_id,
            sent,
            failed,
            "Dispatched sighting notifications"
        );
    }

    async fn dispatch(&self, recipient: &Recipient, event: &NotificationEvent) -> bool {
        let data = json!({
            "recipient_name": recipient.display_name,
            "animal_id": event.animal_id.to_string(),
            "sighting_id": event.sighting_id.to_string(),
            "observed_at": event.observed_time.to_rfc3339(),
            "latitude": event.location.latitude,
            "longitude": event.location.longitude,
        });

        let send = self.sender.send(&recipient.email, &self.template, &data);
        let result = match tokio::time::timeout(self.dispatch_timeout, send).await {
            Ok(result) => result,
            Err(_) => Err(MailError::Timeout),
        };

        match result {
            Ok(()) => {
                debug!(sighting_id = %event.sighting_id, user_id = %recipient.user_id, "Notification sent");
                true
            }
            Err(e) => {
                warn!(
                    sighting_id = %event.sighting_id,
                    user_id = %recipient.user_id,
                    error = %e,
                    "Notification dispatch failed"
                );
                false
            }
        }
    }
}
