// src/delivery/envelope.rs
//! Batch envelope wire structures
//!
//! One envelope is assembled per send and never persisted. Event records are
//! carried opaquely in `session_attribute.data`.

use crate::metadata::BrowserMetaInfo;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Device, browser, session and project metadata attached to every batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaseAttributes {
    #[serde(flatten)]
    pub browser: BrowserMetaInfo,

    /// Identifier of the session the batch belongs to
    pub session_id: String,

    /// Client wall clock at send time (milliseconds since epoch)
    pub client_timestamp: i64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,

    pub project_name: String,

    /// Page origin, empty when the host exposes none
    pub origin: String,

    /// User-supplied metadata object from the options
    pub metadata: Value,
}

/// The flushed window: identity, bounds and drained records
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionAttribute {
    /// Fresh unique token per send
    pub batch_id: String,

    /// Start of the window being flushed (milliseconds since epoch)
    pub start_timestamp: i64,

    /// Time of the send (milliseconds since epoch)
    pub end_timestamp: i64,

    /// Drained event records in insertion order
    pub data: Vec<Value>,
}

/// Body of one batch POST
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchEnvelope {
    pub base_attributes: BaseAttributes,
    pub session_attribute: SessionAttribute,
}
