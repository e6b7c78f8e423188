// src/delivery/mod.rs
//! Batch delivery
//!
//! This module turns buffered records into compressed batch POSTs:
//!
//! - **Scheduler**: periodic flush driver with synchronous cancellation
//! - **Envelope**: wire structures combining metadata and a window of events
//! - **Compressor**: gzip request-body compression
//! - **Transport**: drain, assemble, compress, fire-and-forget send
//!
//! # Delivery contract
//!
//! Single attempt per batch. The buffer is cleared when a batch is drained,
//! never on server acknowledgement; a failed request goes to the error sink
//! and the batch is lost.

pub mod compress;
pub mod envelope;
pub mod scheduler;
pub mod transport;

// Re-export commonly used types
pub use compress::{CompressionLevel, Compressor};
pub use envelope::{BaseAttributes, BatchEnvelope, SessionAttribute};
pub use scheduler::DeliveryScheduler;
pub use transport::{Transport, TransportStats};
