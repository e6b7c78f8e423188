// src/delivery/scheduler.rs
//! Periodic flush scheduler
//!
//! Drives the transport while a session is active. Cancellation is
//! synchronous and definitive: after `cancel` returns, no queued tick runs,
//! so a stale timer can never touch the buffer of a newer session.

use crate::delivery::transport::Transport;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Periodic flush driver for one session
pub struct DeliveryScheduler {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl DeliveryScheduler {
    /// Spawn the flush loop.
    ///
    /// `window_start` is shared with the owning session: each dispatched
    /// batch advances it to that batch's end timestamp, so consecutive
    /// windows tile the session without gaps.
    pub fn start(
        interval: Duration,
        transport: Arc<Transport>,
        session_id: String,
        window_start: Arc<AtomicI64>,
    ) -> Self {
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick of a tokio interval completes immediately
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = token.cancelled() => {
                        debug!("Flush scheduler for session {} cancelled", session_id);
                        break;
                    }
                    _ = ticker.tick() => {
                        let start = window_start.load(Ordering::Acquire);
                        if let Some(end) = transport.flush(&session_id, start) {
                            window_start.store(end, Ordering::Release);
                        }
                    }
                }
            }
        });

        Self { cancel, handle }
    }

    /// Stop the loop; no flush fires after this returns
    pub fn cancel(&self) {
        self.cancel.cancel();
        self.handle.abort();
    }
}

impl Drop for DeliveryScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}
