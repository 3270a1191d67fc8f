//! Turning document-ready notifications into indexed, retrievable chunks.
//!
//! * [`notifications`] — the at-least-once delivery channel with
//!   ack/nack/dead-letter semantics.
//! * [`sources`] — where raw document text is read from.
//! * [`pipeline`] — the coordinator that runs one event through
//!   read → chunk → embed → persist.

pub mod notifications;
pub mod pipeline;
pub mod sources;

pub use notifications::{Delivery, DocumentReady, EventTimestamp, NotificationChannel};
pub use pipeline::{Document, IngestReport, IngestionPipeline};
pub use sources::{DirSource, DocumentSource, MemorySource};
