// src/session/session.rs
//! Recording session state machine
//!
//! Owns the session identifier, the recorder stop capability and the flush
//! scheduler. At most one session is active per instance; starting while
//! active runs the full stop path first, so two sessions never accumulate.

use crate::config::RecorderOptions;
use crate::delivery::scheduler::DeliveryScheduler;
use crate::delivery::transport::Transport;
use crate::session::buffer::EventBuffer;
use crate::session::recorder::{EmitFn, Recorder, StopHandle};
use chrono::Utc;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};
use ulid::Ulid;

enum SessionState {
    Idle,
    Active(ActiveSession),
}

struct ActiveSession {
    session_id: String,
    started_at_ms: i64,
    window_start: Arc<AtomicI64>,
    stop_handle: StopHandle,
    scheduler: DeliveryScheduler,
}

/// One recording session at a time: Idle <-> Active
pub struct RecordingSession {
    state: Mutex<SessionState>,
    buffer: Arc<EventBuffer>,
    transport: Arc<Transport>,
    recorder: Arc<dyn Recorder>,
    options: Arc<RecorderOptions>,
}

impl RecordingSession {
    /// Create an idle session holder
    pub fn new(
        options: Arc<RecorderOptions>,
        buffer: Arc<EventBuffer>,
        transport: Arc<Transport>,
        recorder: Arc<dyn Recorder>,
    ) -> Self {
        Self {
            state: Mutex::new(SessionState::Idle),
            buffer,
            transport,
            recorder,
            options,
        }
    }

    /// Start recording.
    ///
    /// Re-entry rule: an already active session is fully stopped first
    /// (final flush, recorder stop, buffer reset) before the new one begins
    /// with a fresh identifier.
    pub fn start(&self) {
        let mut state = self.state.lock();
        if let SessionState::Active(active) = std::mem::replace(&mut *state, SessionState::Idle) {
            debug!("Re-entrant start: stopping session {} first", active.session_id);
            self.stop_active(active);
        }

        let session_id = Ulid::new().to_string();
        let started_at_ms = Utc::now().timestamp_millis();

        let sink = Arc::clone(&self.buffer);
        let emit: EmitFn = Arc::new(move |record| sink.append(record));
        let stop_handle = self.recorder.start(emit, &self.options.sampling);

        let window_start = Arc::new(AtomicI64::new(started_at_ms));
        let scheduler = DeliveryScheduler::start(
            self.options.send_events_interval,
            Arc::clone(&self.transport),
            session_id.clone(),
            Arc::clone(&window_start),
        );

        info!("Recording session {} started", session_id);
        *state = SessionState::Active(ActiveSession {
            session_id,
            started_at_ms,
            window_start,
            stop_handle,
            scheduler,
        });
    }

    /// Stop recording; no-op when idle
    pub fn stop(&self) {
        let mut state = self.state.lock();
        if let SessionState::Active(active) = std::mem::replace(&mut *state, SessionState::Idle) {
            self.stop_active(active);
        }
    }

    fn stop_active(&self, mut active: ActiveSession) {
        // Cancel first: a tick arriving mid-stop must not race the final
        // flush or the buffer reset
        active.scheduler.cancel();

        let window_start = active.window_start.load(Ordering::Acquire);
        self.transport.flush(&active.session_id, window_start);

        active.stop_handle.stop();
        // Unconditional reset, delivery outcome notwithstanding
        self.buffer.clear();

        info!("Recording session {} stopped", active.session_id);
    }

    /// Cancel the active session's flush timer without stopping the
    /// recorder or flushing.
    ///
    /// Exists for [`Teardown`](crate::controller::Teardown), which
    /// deliberately leaves an active recorder running.
    pub fn cancel_flush_timer(&self) {
        let state = self.state.lock();
        if let SessionState::Active(active) = &*state {
            active.scheduler.cancel();
        }
    }

    /// Whether a session is currently active
    pub fn is_active(&self) -> bool {
        matches!(&*self.state.lock(), SessionState::Active(_))
    }

    /// Identifier of the active session, if any
    pub fn current_session_id(&self) -> Option<String> {
        match &*self.state.lock() {
            SessionState::Active(active) => Some(active.session_id.clone()),
            SessionState::Idle => None,
        }
    }

    /// Start timestamp of the active session (milliseconds), if any
    pub fn current_session_start(&self) -> Option<i64> {
        match &*self.state.lock() {
            SessionState::Active(active) => Some(active.started_at_ms),
            SessionState::Idle => None,
        }
    }
}
