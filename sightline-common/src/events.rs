//! Notification events and the in-process broker
//!
//! The broker decouples sighting ingestion (many concurrent producers) from
//! notification dispatch (a single long-lived consumer). It is an explicit
//! value handed to both sides; there is no process-wide channel.
//!
//! Shutdown is cooperative: [`NotificationBroker::close`] flips a flag that
//! producers check before sending and signals the subscription, which then
//! closes the receiving half, drains whatever was already buffered and
//! reports end-of-stream. A publish racing with `close` either lands in the
//! buffer (and is drained) or fails with [`BrokerError::Closed`]; it is never
//! silently lost or blocked.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::geo::Coordinate;
use crate::models::SightingRecord;

/// Published once for every persisted sighting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationEvent {
    pub sighting_id: Uuid,
    pub animal_id: Uuid,
    pub reporter_id: Uuid,
    pub location: Coordinate,
    pub observed_time: DateTime<Utc>,
}

impl NotificationEvent {
    pub fn from_record(record: &SightingRecord) -> Self {
        Self {
            sighting_id: record.id,
            animal_id: record.animal_id,
            reporter_id: record.reporter_id,
            location: record.location,
            observed_time: record.observed_time,
        }
    }
}

/// Broker errors
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum BrokerError {
    /// The broker has been closed; the event was not queued
    #[error("notification broker is closed")]
    Closed,
}

/// Producer side of the single-topic notification channel
///
/// Cheap to clone; all clones share the same channel and closed state.
/// The channel is unbounded so publishing never waits on the consumer.
#[derive(Clone, Debug)]
pub struct NotificationBroker {
    tx: mpsc::UnboundedSender<NotificationEvent>,
    closed: Arc<AtomicBool>,
    shutdown: CancellationToken,
}

/// Consumer side of the channel
///
/// Exactly one exists per broker, so delivery is FIFO and at-most-once.
#[derive(Debug)]
pub struct NotificationSubscription {
    rx: mpsc::UnboundedReceiver<NotificationEvent>,
    shutdown: CancellationToken,
    draining: bool,
}

impl NotificationBroker {
    /// Create a broker and its only subscription
    pub fn new() -> (Self, NotificationSubscription) {
        let (tx, rx) = mpsc::unbounded_channel();
        let shutdown = CancellationToken::new();

        let broker = Self {
            tx,
            closed: Arc::new(AtomicBool::new(false)),
            shutdown: shutdown.clone(),
        };
        let subscription = NotificationSubscription {
            rx,
            shutdown,
            draining: false,
        };

        (broker, subscription)
    }

    /// Queue an event for the consumer without waiting
    ///
    /// Fails with [`BrokerError::Closed`] once [`close`](Self::close) has been
    /// called or the subscription has been dropped.
    pub fn publish(&self, event: NotificationEvent) -> Result<(), BrokerError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(BrokerError::Closed);
        }
        self.tx.send(event).map_err(|_| BrokerError::Closed)
    }

    /// Stop accepting events and let the consumer drain what is buffered
    ///
    /// Returns `true` for the call that actually closed the broker; later
    /// calls are no-ops returning `false`.
    pub fn close(&self) -> bool {
        if self.closed.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.shutdown.cancel();
        true
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl NotificationSubscription {
    /// Receive the next event in publish order
    ///
    /// Returns `None` once the broker is closed and the buffer is drained, or
    /// when every broker handle has been dropped.
    pub async fn recv(&mut self) -> Option<NotificationEvent> {
        if !self.draining {
            tokio::select! {
                biased;
                event = self.rx.recv() => return event,
                () = self.shutdown.cancelled() => {
                    // Rejects further sends while keeping buffered events readable
                    self.rx.close();
                    self.draining = true;
                }
            }
        }
        self.rx.recv().await
    }
}
