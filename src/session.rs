//! Recording session orchestration
//!
//! Fans lifecycle calls out to the sibling encoders of one recording. All
//! encoders in a session share a single muxer; the muxer only starts once
//! every sibling has registered its track, so stop requests are issued to
//! every encoder before any worker is joined.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::encoder::EncoderCore;
use crate::error::{PipelineError, PipelineResult};
use crate::muxer::Muxer;

/// Current state of a recording session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// No recording in progress
    Idle,
    /// Currently recording
    Recording,
    /// Recording finished and all encoders released
    Complete,
}

/// Manages the encoders of one multi-track recording
pub struct RecordingSession {
    muxer: Arc<dyn Muxer>,
    encoders: Vec<Arc<EncoderCore>>,
    state: SessionState,
}

impl RecordingSession {
    /// Create a session around the shared muxer
    pub fn new(muxer: Arc<dyn Muxer>) -> Self {
        Self {
            muxer,
            encoders: Vec::new(),
            state: SessionState::Idle,
        }
    }

    /// Add an encoder track to the session. Only valid while idle.
    pub fn add_encoder(&mut self, encoder: Arc<EncoderCore>) -> PipelineResult<()> {
        if self.state != SessionState::Idle {
            return Err(PipelineError::InvalidState(
                "cannot add encoders while recording".to_string(),
            ));
        }
        tracing::info!("adding {:?} encoder to session", encoder.media_kind());
        self.encoders.push(encoder);
        Ok(())
    }

    /// The shared muxer
    pub fn muxer(&self) -> Arc<dyn Muxer> {
        self.muxer.clone()
    }

    /// Current session state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The session's encoders
    pub fn encoders(&self) -> &[Arc<EncoderCore>] {
        &self.encoders
    }

    /// Spawn, prepare and start every encoder
    pub fn start(&mut self) -> PipelineResult<()> {
        if self.state != SessionState::Idle {
            return Err(PipelineError::InvalidState(
                "session already started".to_string(),
            ));
        }
        if self.encoders.is_empty() {
            return Err(PipelineError::InvalidState(
                "session has no encoders".to_string(),
            ));
        }

        tracing::info!("starting recording session ({} tracks)", self.encoders.len());
        for (index, encoder) in self.encoders.iter().enumerate() {
            if let Err(error) = encoder.spawn() {
                self.release_encoders(index);
                return Err(error);
            }
            if let Err(error) = encoder.prepare() {
                self.release_encoders(index + 1);
                return Err(error);
            }
        }
        for encoder in &self.encoders {
            encoder.start();
        }

        self.state = SessionState::Recording;
        Ok(())
    }

    /// Tear down the first `count` encoders after a failed start. `stop` only
    /// reaches a capturing worker, so each spawned worker is cycled through a
    /// regular start/stop and joined; no thread outlives the error.
    fn release_encoders(&self, count: usize) {
        tracing::error!("session start failed, releasing {} encoder(s)", count);
        for encoder in &self.encoders[..count] {
            encoder.start();
            encoder.stop();
            encoder.join();
        }
    }

    /// Stop every encoder and wait for their shutdown sequences to finish.
    /// Stop requests are issued to all siblings first: an encoder blocked on
    /// muxer startup only unblocks once its siblings drain too.
    pub fn stop(&mut self) -> PipelineResult<()> {
        if self.state != SessionState::Recording {
            return Err(PipelineError::InvalidState(
                "session is not recording".to_string(),
            ));
        }

        tracing::info!("stopping recording session");
        for encoder in &self.encoders {
            encoder.stop();
        }
        for encoder in &self.encoders {
            encoder.join();
        }

        self.state = SessionState::Complete;
        tracing::info!("recording session complete");
        Ok(())
    }
}
