// src/controller.rs
//! Top-level lifecycle controller
//!
//! Wires the recording session, scheduler and transport together and reacts
//! to page-visibility transitions: hidden stops the session (forcing a final
//! flush), visible starts a fresh one with a new identifier and window. All
//! state is instance-owned, so independent controllers can coexist in one
//! process.

use crate::config::RecorderOptions;
use crate::delivery::transport::{Transport, TransportStats};
use crate::metadata::EnvironmentProbe;
use crate::session::buffer::EventBuffer;
use crate::session::recorder::Recorder;
use crate::session::session::RecordingSession;
use crate::utils::errors::Result;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Host page-visibility state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    Hidden,
}

/// Session-replay snapshot recorder
pub struct SnapshotRecorder {
    session: Arc<RecordingSession>,
    transport: Arc<Transport>,
    buffer: Arc<EventBuffer>,
}

impl SnapshotRecorder {
    /// Build a controller from options plus the host-provided recorder
    /// capability and environment probe.
    pub fn new(
        options: RecorderOptions,
        recorder: Arc<dyn Recorder>,
        environment: Arc<dyn EnvironmentProbe>,
    ) -> Result<Self> {
        let options = Arc::new(options);
        let buffer = Arc::new(EventBuffer::new());
        let transport = Arc::new(Transport::new(
            Arc::clone(&options),
            Arc::clone(&buffer),
            environment,
        )?);
        let session = Arc::new(RecordingSession::new(
            options,
            Arc::clone(&buffer),
            Arc::clone(&transport),
            recorder,
        ));

        Ok(Self {
            session,
            transport,
            buffer,
        })
    }

    /// Start recording and follow visibility transitions from the host.
    ///
    /// Every transition to [`Visibility::Hidden`] stops the session; every
    /// transition back to visible starts a new one (fresh identifier and
    /// window), including when one is already active.
    pub fn start_snapshot_recording(
        &self,
        mut visibility: watch::Receiver<Visibility>,
    ) -> Teardown {
        self.session.start();

        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let session = Arc::clone(&self.session);

        let listener = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    changed = visibility.changed() => {
                        if changed.is_err() {
                            // Host dropped the sender; nothing more to follow
                            break;
                        }
                        let state = *visibility.borrow_and_update();
                        debug!("Visibility changed: {:?}", state);
                        match state {
                            Visibility::Hidden => session.stop(),
                            Visibility::Visible => session.start(),
                        }
                    }
                }
            }
        });

        Teardown {
            cancel,
            listener,
            session: Arc::clone(&self.session),
        }
    }

    /// Explicit external stop: final flush, recorder stop, timer cancel,
    /// buffer reset.
    pub fn stop_recording(&self) {
        self.session.stop();
    }

    /// Whether a session is currently active
    pub fn is_active(&self) -> bool {
        self.session.is_active()
    }

    /// Identifier of the active session, if any
    pub fn current_session_id(&self) -> Option<String> {
        self.session.current_session_id()
    }

    /// Start timestamp of the active session (milliseconds), if any
    pub fn current_session_start(&self) -> Option<i64> {
        self.session.current_session_start()
    }

    /// Records currently buffered
    pub fn buffered_events(&self) -> usize {
        self.buffer.len()
    }

    /// Delivery statistics
    pub fn transport_stats(&self) -> TransportStats {
        self.transport.stats()
    }
}

/// Capability returned by [`SnapshotRecorder::start_snapshot_recording`].
///
/// Tearing down cancels the flush timer and the visibility listener but
/// does NOT stop an active session's recorder handle. This mirrors the
/// historical contract of the embedding API; callers wanting a full stop use
/// [`SnapshotRecorder::stop_recording`] instead.
pub struct Teardown {
    cancel: CancellationToken,
    listener: JoinHandle<()>,
    session: Arc<RecordingSession>,
}

impl Teardown {
    /// Cancel the flush timer and unsubscribe from visibility changes
    pub fn teardown(self) {
        self.cancel.cancel();
        self.listener.abort();
        self.session.cancel_flush_timer();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::StaticEnvironment;
    use crate::session::recorder::{EmitFn, SamplingConfig, StopHandle};
    use parking_lot::Mutex;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct FakeRecorder {
        emitters: Mutex<Vec<EmitFn>>,
        stops: Arc<AtomicUsize>,
    }

    impl FakeRecorder {
        fn new() -> Self {
            Self {
                emitters: Mutex::new(Vec::new()),
                stops: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn emit(&self, record: serde_json::Value) {
            let emitters = self.emitters.lock();
            emitters.last().expect("recorder not started").as_ref()(record);
        }
    }

    impl Recorder for FakeRecorder {
        fn start(&self, emit: EmitFn, _config: &SamplingConfig) -> StopHandle {
            self.emitters.lock().push(emit);
            let stops = Arc::clone(&self.stops);
            StopHandle::new(move || {
                stops.fetch_add(1, Ordering::SeqCst);
            })
        }
    }

    fn controller_fixture() -> (SnapshotRecorder, Arc<FakeRecorder>) {
        let recorder = Arc::new(FakeRecorder::new());
        let controller = SnapshotRecorder::new(
            RecorderOptions::new("http://127.0.0.1:9/v1/events", "checkout")
                .with_send_interval(Duration::from_millis(4000)),
            Arc::clone(&recorder) as Arc<dyn Recorder>,
            Arc::new(StaticEnvironment::default()),
        )
        .unwrap();
        (controller, recorder)
    }

    #[tokio::test]
    async fn test_visibility_transitions_rotate_sessions() {
        let (controller, _recorder) = controller_fixture();
        let (tx, rx) = watch::channel(Visibility::Visible);

        let teardown = controller.start_snapshot_recording(rx);
        let first_id = controller.current_session_id().unwrap();
        let first_start = controller.current_session_start().unwrap();

        tx.send(Visibility::Hidden).unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!controller.is_active());

        tokio::time::sleep(Duration::from_millis(5)).await;
        tx.send(Visibility::Visible).unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(controller.is_active());

        let second_id = controller.current_session_id().unwrap();
        let second_start = controller.current_session_start().unwrap();
        assert_ne!(first_id, second_id);
        assert_ne!(first_start, second_start);

        teardown.teardown();
        controller.stop_recording();
    }

    #[tokio::test]
    async fn test_hidden_forces_final_flush() {
        let (controller, recorder) = controller_fixture();
        let (tx, rx) = watch::channel(Visibility::Visible);

        let _teardown = controller.start_snapshot_recording(rx);
        recorder.emit(json!({"kind": "snapshot"}));

        tx.send(Visibility::Hidden).unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(controller.transport_stats().batches_dispatched, 1);
        assert_eq!(controller.buffered_events(), 0);
        assert_eq!(recorder.stops.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_teardown_leaves_recorder_running() {
        let (controller, recorder) = controller_fixture();
        let (tx, rx) = watch::channel(Visibility::Visible);

        let teardown = controller.start_snapshot_recording(rx);
        teardown.teardown();

        // Timer and listener are gone, but the session and its recorder
        // handle survive until an explicit stop
        assert!(controller.is_active());
        assert_eq!(recorder.stops.load(Ordering::SeqCst), 0);

        tx.send(Visibility::Hidden).ok();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(controller.is_active());

        controller.stop_recording();
        assert_eq!(recorder.stops.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_recording_silences_timer() {
        let (controller, recorder) = controller_fixture();
        let (_tx, rx) = watch::channel(Visibility::Visible);

        let _teardown = controller.start_snapshot_recording(rx);
        controller.stop_recording();
        recorder.emit(json!({"kind": "late"}));

        tokio::time::advance(Duration::from_millis(30_000)).await;
        tokio::task::yield_now().await;

        assert_eq!(controller.transport_stats().batches_dispatched, 0);
    }
}
