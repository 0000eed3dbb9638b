//! Recording session lifecycle.
//!
//! Owns the two-state recording machine (`Idle` -> `Recording` -> `Idle`)
//! and accumulates capture fragments in arrival order. One session is active
//! at a time; starting a new recording clears the previous session's chunks.

use anyhow::Result;
use std::time::Instant;

use super::capture::{CaptureObserver, CaptureSource};
use crate::upload::UploadPayload;

/// Current state of the recording lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No capture in progress (initial state)
    Idle,
    /// Microphone held, fragments accumulating
    Recording,
}

/// One recording attempt: state, ordered fragments, and the capture start
/// instant. Cleared when a new recording begins.
#[derive(Debug)]
pub struct RecordingSession {
    state: SessionState,
    chunks: Vec<Vec<u8>>,
    started_at: Option<Instant>,
}

impl RecordingSession {
    fn new() -> Self {
        Self {
            state: SessionState::Idle,
            chunks: Vec::new(),
            started_at: None,
        }
    }

    /// Resets the session for a new recording attempt.
    fn begin(&mut self) {
        self.chunks.clear();
        self.started_at = Some(Instant::now());
        self.state = SessionState::Recording;
    }
}

impl CaptureObserver for RecordingSession {
    fn on_fragment(&mut self, data: Vec<u8>) {
        // Should not occur by construction, but fragments outside a
        // recording must not leak into the next session's payload.
        if self.state != SessionState::Recording {
            tracing::warn!("Dropping {} byte fragment received while idle", data.len());
            return;
        }
        self.chunks.push(data);
    }

    fn on_finalized(&mut self) {
        tracing::debug!(
            "Capture finalized after {} fragments",
            self.chunks.len()
        );
        self.state = SessionState::Idle;
    }
}

/// Drives the recording lifecycle over a capture source.
///
/// `start` acquires the microphone and begins a fresh session; `stop`
/// finalizes the capture and assembles the accumulated fragments into an
/// upload payload. Both are state-gated: start while recording and stop
/// while idle are logged no-ops.
pub struct RecordingController<S: CaptureSource> {
    source: S,
    session: RecordingSession,
}

impl<S: CaptureSource> RecordingController<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            session: RecordingSession::new(),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.session.state
    }

    /// Instant the active session's capture began, if recording.
    pub fn started_at(&self) -> Option<Instant> {
        self.session.started_at
    }

    /// Starts a new recording session.
    ///
    /// A start while already recording is rejected as a no-op; the active
    /// session is left untouched. On device denial or error the controller
    /// remains idle and the error is propagated for the caller to surface.
    pub fn start(&mut self) -> Result<()> {
        if self.session.state == SessionState::Recording {
            tracing::warn!("Start requested while already recording; ignoring");
            return Ok(());
        }

        self.source.start()?;
        self.session.begin();
        tracing::info!("Recording started");
        Ok(())
    }

    /// Stops the active recording and assembles the upload payload.
    ///
    /// All fragments are delivered before the finalize notification, so the
    /// payload always contains the complete capture. Returns `None` when no
    /// recording is active; no device signal is sent in that case.
    pub fn stop(&mut self) -> Result<Option<UploadPayload>> {
        if self.session.state != SessionState::Recording {
            tracing::debug!("Stop requested while idle; ignoring");
            return Ok(None);
        }

        self.source.stop(&mut self.session)?;

        let payload = UploadPayload::assemble(&self.session.chunks);
        tracing::info!(
            "Recording stopped: {} fragments, {} bytes",
            self.session.chunks.len(),
            payload.len()
        );
        Ok(Some(payload))
    }
}
