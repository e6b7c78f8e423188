// src/session/mod.rs
//! Session lifecycle and event accumulation
//!
//! - **Buffer**: append-only, drainable queue of opaque records
//! - **Recorder**: host-provided capture capability seam
//! - **Session**: Idle/Active state machine owning id, recorder handle and
//!   flush timer

pub mod buffer;
pub mod recorder;
pub mod session;

// Re-export commonly used types
pub use buffer::{BufferStats, EventBuffer};
pub use recorder::{EmitFn, InputSampling, Recorder, SamplingConfig, StopHandle};
pub use session::RecordingSession;
