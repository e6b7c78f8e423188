// src/config.rs
//! Constructor configuration
//!
//! Options are consumed when the controller is built and immutable for its
//! lifetime.

use crate::session::recorder::SamplingConfig;
use serde_json::Value;
use std::time::Duration;

/// Default flush period between batch sends
pub const DEFAULT_SEND_INTERVAL: Duration = Duration::from_millis(4000);

/// Recorder options
#[derive(Debug, Clone)]
pub struct RecorderOptions {
    /// Destination endpoint for batch POSTs
    pub api_url: String,

    /// Tag embedded in every envelope
    pub project_name: String,

    /// Optional stable device identifier embedded in every envelope
    pub device_id: Option<String>,

    /// Arbitrary user-supplied object merged into every envelope's metadata
    pub metadata: Value,

    /// Flush period; defaults to [`DEFAULT_SEND_INTERVAL`]
    pub send_events_interval: Duration,

    /// Recorder sampling configuration
    pub sampling: SamplingConfig,
}

impl RecorderOptions {
    /// Options with defaults for everything but the required fields
    pub fn new(api_url: impl Into<String>, project_name: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            project_name: project_name.into(),
            device_id: None,
            metadata: Value::Object(Default::default()),
            send_events_interval: DEFAULT_SEND_INTERVAL,
            sampling: SamplingConfig::default(),
        }
    }

    /// Set the stable device identifier
    pub fn with_device_id(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = Some(device_id.into());
        self
    }

    /// Set the user-supplied metadata object
    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = metadata;
        self
    }

    /// Override the flush period
    pub fn with_send_interval(mut self, interval: Duration) -> Self {
        self.send_events_interval = interval;
        self
    }

    /// Override the recorder sampling configuration
    pub fn with_sampling(mut self, sampling: SamplingConfig) -> Self {
        self.sampling = sampling;
        self
    }
}
