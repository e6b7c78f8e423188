// src/session/recorder.rs
//! Recorder capability seam
//!
//! The DOM recorder is a host-provided dependency: any component that can be
//! started with an emit callback plus a sampling configuration and returns a
//! stop capability. The core never interprets the records it emits.

use serde_json::Value;
use std::sync::Arc;

/// Callback through which the recorder emits opaque event records
pub type EmitFn = Arc<dyn Fn(Value) + Send + Sync>;

/// Input coalescing strategy for the recorder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSampling {
    /// Capture every input mutation
    All,

    /// Coalesce to the final value of an input burst
    LastValue,
}

/// Sampling and packaging configuration handed to the recorder at start
#[derive(Debug, Clone)]
pub struct SamplingConfig {
    /// Capture mouse-move events
    pub mousemove: bool,

    /// Scroll sampling throttle (milliseconds)
    pub scroll_throttle_ms: u64,

    /// Media interaction throttle (milliseconds)
    pub media_throttle_ms: u64,

    /// Input coalescing strategy
    pub input: InputSampling,

    /// Capture canvas contents
    pub record_canvas: bool,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            mousemove: false,
            scroll_throttle_ms: 150,
            media_throttle_ms: 800,
            input: InputSampling::LastValue,
            record_canvas: true,
        }
    }
}

/// Host-provided recorder capability
pub trait Recorder: Send + Sync {
    /// Start capturing; emitted records flow through `emit` until the
    /// returned handle is stopped.
    fn start(&self, emit: EmitFn, config: &SamplingConfig) -> StopHandle;
}

impl<F> Recorder for F
where
    F: Fn(EmitFn, &SamplingConfig) -> StopHandle + Send + Sync,
{
    fn start(&self, emit: EmitFn, config: &SamplingConfig) -> StopHandle {
        self(emit, config)
    }
}

/// Idempotent stop capability returned by [`Recorder::start`].
///
/// `stop` consumes the inner closure; further calls are no-ops, so stopping
/// a handle that already ran (or was never armed) is always safe.
pub struct StopHandle(Option<Box<dyn FnOnce() + Send>>);

impl StopHandle {
    /// Wrap a teardown closure
    pub fn new(stop: impl FnOnce() + Send + 'static) -> Self {
        Self(Some(Box::new(stop)))
    }

    /// Handle for recorders with nothing to tear down
    pub fn noop() -> Self {
        Self(None)
    }

    /// Stop the recorder; safe to call any number of times
    pub fn stop(&mut self) {
        if let Some(stop) = self.0.take() {
            stop();
        }
    }
}

impl std::fmt::Debug for StopHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("StopHandle")
            .field(&self.0.as_ref().map(|_| "armed"))
            .finish()
    }
}
