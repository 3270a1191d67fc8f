//! Document-ready notifications and the at-least-once delivery channel.
//!
//! Each published event becomes a [`Delivery`] that must be acknowledged.
//! `nack` re-enqueues the delivery with an incremented attempt counter until
//! `max_attempts`, after which it lands on a dead-letter queue the operator
//! can drain; `reject` skips retry entirely for failures no redelivery can
//! fix. Redelivery is safe because every downstream write is an idempotent
//! upsert keyed by deterministic chunk ids.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::PipelineError;

/// Payload of a document-ready notification.
///
/// `name` is the source id: the key under which the document source holds
/// the raw text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentReady {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<EventTimestamp>,
}

/// Producer-supplied timestamp; producers send either JSON form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum EventTimestamp {
    Text(String),
    Numeric(i64),
}

impl std::fmt::Display for EventTimestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventTimestamp::Text(value) => f.write_str(value),
            EventTimestamp::Numeric(value) => write!(f, "{value}"),
        }
    }
}

/// One delivery attempt of a notification.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub id: Uuid,
    /// 1 on first delivery.
    pub attempt: u32,
    pub received_at: DateTime<Utc>,
    pub event: DocumentReady,
}

/// In-process notification channel with ack/nack redelivery and a bounded
/// dead-letter queue.
#[derive(Clone)]
pub struct NotificationChannel {
    tx: flume::Sender<Delivery>,
    rx: flume::Receiver<Delivery>,
    dead_tx: flume::Sender<Delivery>,
    dead_rx: flume::Receiver<Delivery>,
    max_attempts: u32,
}

impl NotificationChannel {
    pub fn new(max_attempts: u32) -> Self {
        let (tx, rx) = flume::unbounded();
        let (dead_tx, dead_rx) = flume::unbounded();
        Self {
            tx,
            rx,
            dead_tx,
            dead_rx,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Enqueues an event for delivery; returns the delivery id.
    pub fn publish(&self, event: DocumentReady) -> Uuid {
        let delivery = Delivery {
            id: Uuid::new_v4(),
            attempt: 1,
            received_at: Utc::now(),
            event,
        };
        let id = delivery.id;
        // Receiver lives in self, so the channel cannot be closed here.
        let _ = self.tx.send(delivery);
        id
    }

    /// Decodes a raw JSON payload and enqueues it.
    pub fn publish_json(&self, payload: &str) -> Result<Uuid, PipelineError> {
        let event: DocumentReady = serde_json::from_str(payload)
            .map_err(|err| PipelineError::InvalidInput(format!("bad notification: {err}")))?;
        Ok(self.publish(event))
    }

    /// Awaits the next delivery; `None` once all senders are gone.
    pub async fn recv(&self) -> Option<Delivery> {
        self.rx.recv_async().await.ok()
    }

    /// Marks a delivery as fully processed.
    pub fn ack(&self, delivery: &Delivery) {
        tracing::debug!(
            delivery_id = %delivery.id,
            source_id = %delivery.event.name,
            attempt = delivery.attempt,
            "acknowledged"
        );
    }

    /// Requeues for redelivery, or dead-letters once attempts are exhausted.
    pub fn nack(&self, mut delivery: Delivery) {
        if delivery.attempt >= self.max_attempts {
            tracing::warn!(
                delivery_id = %delivery.id,
                source_id = %delivery.event.name,
                attempts = delivery.attempt,
                "delivery attempts exhausted, dead-lettering"
            );
            let _ = self.dead_tx.send(delivery);
            return;
        }
        delivery.attempt += 1;
        tracing::debug!(
            delivery_id = %delivery.id,
            source_id = %delivery.event.name,
            attempt = delivery.attempt,
            "redelivering"
        );
        let _ = self.tx.send(delivery);
    }

    /// Routes a delivery straight to the dead-letter queue.
    pub fn reject(&self, delivery: Delivery) {
        tracing::warn!(
            delivery_id = %delivery.id,
            source_id = %delivery.event.name,
            "rejected without retry"
        );
        let _ = self.dead_tx.send(delivery);
    }

    /// Dead-lettered deliveries, in arrival order.
    pub fn dead_letters(&self) -> &flume::Receiver<Delivery> {
        &self.dead_rx
    }

    /// Deliveries currently waiting to be received.
    pub fn pending(&self) -> usize {
        self.rx.len()
    }
}
