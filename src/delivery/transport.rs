// src/delivery/transport.rs
//! Batch assembly and fire-and-forget delivery
//!
//! A flush drains the buffer, attaches environment metadata, serializes and
//! gzip-compresses the envelope, and spawns a single non-retried POST. The
//! buffer is cleared at drain time, so delivery outcome never affects buffer
//! state: a failed request is logged and the batch is lost by design.

use crate::config::RecorderOptions;
use crate::delivery::compress::Compressor;
use crate::delivery::envelope::{BaseAttributes, BatchEnvelope, SessionAttribute};
use crate::metadata::{environment_info, EnvironmentProbe};
use crate::session::buffer::EventBuffer;
use crate::utils::errors::{CourierError, Result};
use chrono::Utc;
use reqwest::header::{CONTENT_ENCODING, CONTENT_TYPE};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};
use ulid::Ulid;

/// Cap on a single delivery attempt so spawned sends cannot pile up
const SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Batch transport
pub struct Transport {
    client: reqwest::Client,
    options: Arc<RecorderOptions>,
    buffer: Arc<EventBuffer>,
    environment: Arc<dyn EnvironmentProbe>,
    compressor: Compressor,
    counters: Arc<TransportCounters>,
}

#[derive(Default)]
struct TransportCounters {
    batches_dispatched: AtomicU64,
    events_dispatched: AtomicU64,
    send_failures: AtomicU64,
}

impl Transport {
    /// Create a new transport
    pub fn new(
        options: Arc<RecorderOptions>,
        buffer: Arc<EventBuffer>,
        environment: Arc<dyn EnvironmentProbe>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(SEND_TIMEOUT)
            .build()
            .map_err(|e| CourierError::ClientBuild(e.to_string()))?;

        Ok(Self {
            client,
            options,
            buffer,
            environment,
            compressor: Compressor::default(),
            counters: Arc::new(TransportCounters::default()),
        })
    }

    /// Flush the current window.
    ///
    /// Returns the end timestamp of the flushed window when a batch was
    /// taken from the buffer, `None` when the buffer was empty (in which
    /// case nothing is constructed and no network activity happens). Never
    /// fails toward the caller: encode errors are logged and the batch is
    /// dropped.
    pub fn flush(&self, session_id: &str, window_start_ms: i64) -> Option<i64> {
        let events = self.buffer.drain();
        if events.is_empty() {
            return None;
        }

        let end_timestamp = Utc::now().timestamp_millis();
        let batch_id = Ulid::new().to_string();
        let event_count = events.len();

        let envelope = BatchEnvelope {
            base_attributes: BaseAttributes {
                browser: environment_info(self.environment.as_ref()),
                session_id: session_id.to_string(),
                client_timestamp: end_timestamp,
                device_id: self.options.device_id.clone(),
                project_name: self.options.project_name.clone(),
                origin: self.environment.origin().unwrap_or_default(),
                metadata: self.options.metadata.clone(),
            },
            session_attribute: SessionAttribute {
                batch_id: batch_id.clone(),
                start_timestamp: window_start_ms,
                end_timestamp,
                data: events,
            },
        };

        match self.encode(&envelope) {
            Ok(body) => {
                debug!(
                    "Dispatching batch {} ({} events, {} bytes compressed)",
                    batch_id,
                    event_count,
                    body.len()
                );
                self.counters
                    .batches_dispatched
                    .fetch_add(1, Ordering::Relaxed);
                self.counters
                    .events_dispatched
                    .fetch_add(event_count as u64, Ordering::Relaxed);
                self.dispatch(body, batch_id);
            }
            Err(e) => {
                // Batch already drained; dropped like a failed send
                error!("Failed to encode batch {}: {}", batch_id, e);
                self.counters.send_failures.fetch_add(1, Ordering::Relaxed);
            }
        }

        Some(end_timestamp)
    }

    /// Serialize and compress an envelope into a request body
    fn encode(&self, envelope: &BatchEnvelope) -> Result<Vec<u8>> {
        let json = serde_json::to_vec(envelope)
            .map_err(|e| CourierError::Serialization(e.to_string()))?;
        self.compressor.compress(&json)
    }

    /// Spawn the POST without awaiting it; single attempt, no retry
    fn dispatch(&self, body: Vec<u8>, batch_id: String) {
        let request = self
            .client
            .post(&self.options.api_url)
            .header(CONTENT_TYPE, "application/json")
            .header(CONTENT_ENCODING, "gzip")
            .body(body);
        let counters = Arc::clone(&self.counters);

        tokio::spawn(async move {
            match request.send().await {
                // Any HTTP status is accepted; only transport-level
                // errors count as failures
                Ok(response) => {
                    debug!("Batch {} delivered ({})", batch_id, response.status());
                }
                Err(e) => {
                    counters.send_failures.fetch_add(1, Ordering::Relaxed);
                    error!("Failed to send batch {}: {}", batch_id, e);
                }
            }
        });
    }

    /// Get transport statistics
    pub fn stats(&self) -> TransportStats {
        TransportStats {
            batches_dispatched: self.counters.batches_dispatched.load(Ordering::Relaxed),
            events_dispatched: self.counters.events_dispatched.load(Ordering::Relaxed),
            send_failures: self.counters.send_failures.load(Ordering::Relaxed),
        }
    }
}

/// Transport statistics
#[derive(Debug, Clone, Default)]
pub struct TransportStats {
    /// Batches handed to the network layer
    pub batches_dispatched: u64,

    /// Events contained in dispatched batches
    pub events_dispatched: u64,

    /// Encode errors plus transport-level send errors
    pub send_failures: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delivery::compress::Compressor;
    use crate::metadata::StaticEnvironment;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_environment() -> Arc<StaticEnvironment> {
        Arc::new(StaticEnvironment {
            user_agent: Some(
                "Mozilla/5.0 (Windows NT 10.0) Chrome/120.0.0.0 Safari/537.36".to_string(),
            ),
            screen: Some((1920, 1080)),
            origin: Some("https://app.example.com".to_string()),
        })
    }

    fn transport_for(url: &str, buffer: Arc<EventBuffer>) -> Transport {
        let options = Arc::new(
            RecorderOptions::new(format!("{}/v1/events", url), "checkout")
                .with_metadata(json!({"tenant": "acme"})),
        );
        Transport::new(options, buffer, test_environment()).unwrap()
    }

    #[tokio::test]
    async fn test_flush_empty_buffer_is_silent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/events"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let buffer = Arc::new(EventBuffer::new());
        let transport = transport_for(&server.uri(), Arc::clone(&buffer));

        assert!(transport.flush("session-1", 0).is_none());
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(transport.stats().batches_dispatched, 0);
    }

    #[tokio::test]
    async fn test_flush_posts_compressed_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/events"))
            .and(header("content-type", "application/json"))
            .and(header("content-encoding", "gzip"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let buffer = Arc::new(EventBuffer::new());
        buffer.append(json!({"kind": "snapshot"}));
        buffer.append(json!({"kind": "mutation"}));
        let transport = transport_for(&server.uri(), Arc::clone(&buffer));

        let end = transport.flush("session-1", 1_700_000_000_000);
        assert!(end.is_some());
        assert!(buffer.is_empty());

        tokio::time::sleep(Duration::from_millis(200)).await;

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);

        let body = Compressor::default().decompress(&requests[0].body).unwrap();
        let envelope: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(envelope["base_attributes"]["project_name"], "checkout");
        assert_eq!(envelope["base_attributes"]["session_id"], "session-1");
        assert_eq!(envelope["base_attributes"]["browser_type"], "chrome");
        assert_eq!(envelope["base_attributes"]["metadata"]["tenant"], "acme");
        assert_eq!(
            envelope["session_attribute"]["start_timestamp"],
            1_700_000_000_000_i64
        );
        assert_eq!(
            envelope["session_attribute"]["data"].as_array().unwrap().len(),
            2
        );

        let stats = transport.stats();
        assert_eq!(stats.batches_dispatched, 1);
        assert_eq!(stats.events_dispatched, 2);
        assert_eq!(stats.send_failures, 0);
    }

    #[tokio::test]
    async fn test_failed_send_is_dropped_not_retried() {
        // Port 9 is discard; connections will fail
        let buffer = Arc::new(EventBuffer::new());
        buffer.append(json!({"kind": "snapshot"}));
        let transport = transport_for("http://127.0.0.1:9", Arc::clone(&buffer));

        assert!(transport.flush("session-1", 0).is_some());
        // Buffer was cleared at drain time regardless of delivery outcome
        assert!(buffer.is_empty());

        tokio::time::sleep(Duration::from_millis(300)).await;

        let stats = transport.stats();
        assert_eq!(stats.batches_dispatched, 1);
        assert_eq!(stats.send_failures, 1);
    }

    #[tokio::test]
    async fn test_fresh_batch_id_per_send() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(2)
            .mount(&server)
            .await;

        let buffer = Arc::new(EventBuffer::new());
        let transport = transport_for(&server.uri(), Arc::clone(&buffer));

        buffer.append(json!(1));
        transport.flush("session-1", 0);
        buffer.append(json!(2));
        transport.flush("session-1", 0);

        tokio::time::sleep(Duration::from_millis(200)).await;

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 2);

        let ids: Vec<String> = requests
            .iter()
            .map(|r| {
                let body = Compressor::default().decompress(&r.body).unwrap();
                let envelope: serde_json::Value = serde_json::from_slice(&body).unwrap();
                envelope["session_attribute"]["batch_id"]
                    .as_str()
                    .unwrap()
                    .to_string()
            })
            .collect();
        assert_ne!(ids[0], ids[1]);
    }
}
