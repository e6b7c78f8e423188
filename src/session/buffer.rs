// src/session/buffer.rs
//! Append-only, drainable event buffer
//!
//! Holds the opaque records emitted by the recorder for the current session
//! window. Append always succeeds; drain atomically takes everything in
//! insertion order, so no record is both sent and retained, and a record
//! appended after a drain belongs to the next batch.

use parking_lot::Mutex;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};

/// Ordered buffer of opaque event records
pub struct EventBuffer {
    events: Mutex<Vec<Value>>,
    append_count: AtomicU64,
    drain_count: AtomicU64,
}

impl EventBuffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            append_count: AtomicU64::new(0),
            drain_count: AtomicU64::new(0),
        }
    }

    /// Append a record (O(1), never fails)
    pub fn append(&self, record: Value) {
        self.events.lock().push(record);
        self.append_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Take all buffered records in insertion order, leaving the buffer empty
    pub fn drain(&self) -> Vec<Value> {
        let drained = std::mem::take(&mut *self.events.lock());
        self.drain_count
            .fetch_add(drained.len() as u64, Ordering::Relaxed);
        drained
    }

    /// Discard all buffered records without counting them as drained
    pub fn clear(&self) {
        self.events.lock().clear();
    }

    /// Current number of buffered records
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Check if the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// Get buffer statistics
    pub fn stats(&self) -> BufferStats {
        BufferStats {
            append_count: self.append_count.load(Ordering::Relaxed),
            drain_count: self.drain_count.load(Ordering::Relaxed),
            buffered: self.len(),
        }
    }
}

impl Default for EventBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Buffer statistics
#[derive(Debug, Clone)]
pub struct BufferStats {
    /// Total records appended
    pub append_count: u64,

    /// Total records handed to the transport
    pub drain_count: u64,

    /// Records currently buffered
    pub buffered: usize,
}
