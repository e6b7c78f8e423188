// src/lib.rs
//! Session-replay batching and delivery client
//!
//! Accumulates opaque session-replay records from a host-provided recorder,
//! enriches batches with environment metadata and ships them periodically
//! (and on visibility loss) to a telemetry endpoint as gzip-compressed JSON.
//!
//! # Architecture
//!
//! - **controller**: lifecycle orchestration and visibility handling
//! - **session**: session state machine, event buffer, recorder seam
//! - **delivery**: flush scheduling, envelope assembly, compression, HTTP
//! - **metadata**: browser/device/OS classification from host signals
//! - **config**: immutable constructor options
//! - **utils**: errors and shared helpers
//!
//! # Delivery semantics
//!
//! Best-effort, at-most-one-attempt per batch: records are drained from the
//! buffer as a batch is handed to the network layer and never requeued. No
//! operation in this crate fails toward the host page.

// Public module exports
pub mod config;
pub mod controller;
pub mod delivery;
pub mod metadata;
pub mod session;
pub mod utils;

// Re-export commonly used types
pub use config::{RecorderOptions, DEFAULT_SEND_INTERVAL};
pub use controller::{SnapshotRecorder, Teardown, Visibility};
pub use delivery::{BatchEnvelope, Compressor, TransportStats};
pub use metadata::{environment_info, BrowserMetaInfo, EnvironmentProbe, StaticEnvironment};
pub use session::{EmitFn, EventBuffer, InputSampling, Recorder, SamplingConfig, StopHandle};
pub use utils::errors::{CourierError, Result};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
