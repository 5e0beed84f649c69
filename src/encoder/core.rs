//! Encoder core engine
//!
//! One `EncoderCore` per media track. It owns the codec session, runs a
//! dedicated worker thread for the encode→drain→mux sequencing, and holds a
//! shared reference to the muxer all sibling encoders write into.
//!
//! Producers interact with the core from their own threads (`start`, `stop`,
//! `frame_available`, `encode`); the worker observes those signals under a
//! single per-instance mutex/condvar pair and performs all draining and the
//! four-step shutdown sequence itself.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};
use serde::{Deserialize, Serialize};

use crate::codec::{Codec, InputStatus, OutputStatus, DEQUEUE_TIMEOUT_US};
use crate::error::{PipelineError, PipelineResult};
use crate::format::{MediaKind, SampleFlags};
use crate::muxer::Muxer;
use crate::sink::FrameSink;

use super::clock::{PtsTracker, SampleClock, SystemSampleClock};
use super::driver::{EncoderDriver, EndOfStream};
use super::EncoderListener;

/// Consecutive empty output polls before a drain pass gives up
/// (not applied once end-of-stream has been signaled; the final EOS buffer
/// must eventually arrive).
const MAX_EMPTY_POLLS: u32 = 5;

/// Poll interval while waiting for sibling tracks to register with the muxer
const MUXER_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Lifecycle phase of an encoder instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Constructed, codec not yet configured
    Idle,
    /// Codec configured and started, not yet capturing
    Preparing,
    /// Accepting frames
    Capturing,
    /// Stop requested, worker has not begun teardown yet
    StopRequested,
    /// Worker is running the shutdown sequence
    Draining,
    /// Terminal; all resources released
    Released,
}

/// Producer/worker shared state, guarded by the per-instance mutex
struct ControlState {
    phase: Phase,
    /// True from `start()` until the EOS buffer has been drained (or release)
    capturing: bool,
    /// Stop wins: once set, the worker runs shutdown at its next observation
    stop_requested: bool,
    /// Outstanding drain requests; collapsed counter, not a queue
    pending_drains: u32,
    /// Set by the worker once its counters are reset and it can accept
    /// start/stop
    worker_ready: bool,
}

struct Inner {
    control: Mutex<ControlState>,
    cond: Condvar,
    codec: Arc<dyn Codec>,
    muxer: Arc<dyn Muxer>,
    driver: Arc<dyn EncoderDriver>,
    listener: Arc<dyn EncoderListener>,
    clock: Arc<dyn SampleClock>,
    /// Exactly one EOS marker per instance lifetime
    eos_sent: AtomicBool,
    /// Set when a terminal error is recorded; breaks bounded muxer waits
    aborted: AtomicBool,
    last_error: Mutex<Option<PipelineError>>,
}

impl Inner {
    fn is_capturing(&self) -> bool {
        self.control.lock().capturing
    }

    fn set_capturing(&self, capturing: bool) {
        self.control.lock().capturing = capturing;
    }

    fn set_phase(&self, phase: Phase) {
        self.control.lock().phase = phase;
    }

    fn record_error(&self, error: PipelineError) {
        tracing::error!("encoder terminal error: {}", error);
        self.aborted.store(true, Ordering::SeqCst);
        let mut slot = self.last_error.lock();
        if slot.is_none() {
            *slot = Some(error);
        }
    }

    /// Queue one input buffer, retrying on TryAgainLater while capturing.
    /// An empty payload is the end-of-stream marker; at most one is ever
    /// queued.
    fn queue_input(&self, data: &[u8], presentation_time_us: i64) -> PipelineResult<()> {
        // Claim the EOS marker before dequeuing: every dequeued input slot
        // must be queued back, so a duplicate request has to bail out here
        if data.is_empty() && self.eos_sent.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        while self.is_capturing() {
            match self.codec.dequeue_input_buffer(DEQUEUE_TIMEOUT_US)? {
                InputStatus::Available(index) => {
                    if data.is_empty() {
                        tracing::debug!("queueing EOS marker buffer");
                        return self.codec.queue_input_buffer(
                            index,
                            data,
                            presentation_time_us,
                            SampleFlags::end_of_stream(),
                        );
                    }
                    return self.codec.queue_input_buffer(
                        index,
                        data,
                        presentation_time_us,
                        SampleFlags::default(),
                    );
                }
                InputStatus::TryAgainLater => {}
            }
        }
        Ok(())
    }
}

/// Per-track encoder engine
///
/// Construction is two-phase: [`new`](EncoderCore::new) builds the instance
/// without side effects, [`spawn`](EncoderCore::spawn) starts the worker
/// thread and returns once it is ready to receive `start`/`stop`.
pub struct EncoderCore {
    inner: Arc<Inner>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl EncoderCore {
    /// Create an encoder over the given codec session, shared muxer, driver
    /// and listener. No thread is started here.
    pub fn new(
        codec: Arc<dyn Codec>,
        muxer: Arc<dyn Muxer>,
        driver: Arc<dyn EncoderDriver>,
        listener: Arc<dyn EncoderListener>,
    ) -> Self {
        Self::with_clock(codec, muxer, driver, listener, Arc::new(SystemSampleClock::new()))
    }

    /// Like [`new`](EncoderCore::new) with an explicit sample clock
    pub fn with_clock(
        codec: Arc<dyn Codec>,
        muxer: Arc<dyn Muxer>,
        driver: Arc<dyn EncoderDriver>,
        listener: Arc<dyn EncoderListener>,
        clock: Arc<dyn SampleClock>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                control: Mutex::new(ControlState {
                    phase: Phase::Idle,
                    capturing: false,
                    stop_requested: false,
                    pending_drains: 0,
                    worker_ready: false,
                }),
                cond: Condvar::new(),
                codec,
                muxer,
                driver,
                listener,
                clock,
                eos_sent: AtomicBool::new(false),
                aborted: AtomicBool::new(false),
                last_error: Mutex::new(None),
            }),
            worker: Mutex::new(None),
        }
    }

    /// Kind of track this encoder produces
    pub fn media_kind(&self) -> MediaKind {
        self.inner.driver.media_kind()
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> Phase {
        self.inner.control.lock().phase
    }

    /// Terminal error recorded by the worker, if any
    pub fn last_error(&self) -> Option<PipelineError> {
        self.inner.last_error.lock().clone()
    }

    /// Start the dedicated worker thread. Blocks until the worker has
    /// initialized and reset its counters, so `start`/`stop` issued after
    /// this returns are guaranteed to be observed.
    pub fn spawn(&self) -> PipelineResult<()> {
        let mut guard = self.worker.lock();
        if guard.is_some() {
            return Err(PipelineError::InvalidState(
                "worker already spawned".to_string(),
            ));
        }

        let inner = self.inner.clone();
        let name = match self.inner.driver.media_kind() {
            MediaKind::Video => "video-encoder",
            MediaKind::Audio => "audio-encoder",
        };
        let handle = std::thread::Builder::new()
            .name(name.to_string())
            .spawn(move || Worker::new(inner).run())
            .map_err(|e| PipelineError::Configuration(format!("failed to spawn worker: {}", e)))?;
        *guard = Some(handle);
        drop(guard);

        // Wait for the worker to announce readiness
        let mut control = self.inner.control.lock();
        while !control.worker_ready {
            self.inner.cond.wait(&mut control);
        }
        Ok(())
    }

    /// Configure and start the codec from the driver's format. Must run
    /// before any frame is fed. A failure here is fatal for the instance.
    pub fn prepare(&self) -> PipelineResult<()> {
        {
            let control = self.inner.control.lock();
            if control.phase != Phase::Idle {
                return Err(PipelineError::InvalidState(format!(
                    "prepare called in phase {:?}",
                    control.phase
                )));
            }
        }

        let format = self.inner.driver.format()?;
        self.inner
            .codec
            .configure(&format)
            .map_err(|e| PipelineError::Configuration(e.to_string()))?;
        self.inner
            .codec
            .start()
            .map_err(|e| PipelineError::Configuration(e.to_string()))?;

        self.inner.eos_sent.store(false, Ordering::SeqCst);
        self.inner.set_phase(Phase::Preparing);
        tracing::info!("encoder prepared ({:?})", self.media_kind());

        let listener = self.inner.listener.clone();
        let kind = self.media_kind();
        if catch_unwind(AssertUnwindSafe(|| listener.on_prepared(kind))).is_err() {
            tracing::error!("on_prepared listener panicked");
        }
        Ok(())
    }

    /// Begin capturing. Idempotent; a no-op once a stop has been requested.
    pub fn start(&self) {
        let mut control = self.inner.control.lock();
        if control.phase == Phase::Released {
            tracing::warn!("start ignored: encoder already released");
            return;
        }
        if control.capturing || control.stop_requested {
            return;
        }
        control.capturing = true;
        control.phase = Phase::Capturing;
        self.inner.cond.notify_all();
        tracing::info!("encoder capturing ({:?})", self.inner.driver.media_kind());
    }

    /// Request the worker to run the shutdown sequence. Non-blocking and
    /// idempotent; a no-op when not capturing.
    pub fn stop(&self) {
        let mut control = self.inner.control.lock();
        if !control.capturing || control.stop_requested {
            return;
        }
        control.stop_requested = true;
        control.phase = Phase::StopRequested;
        self.inner.cond.notify_all();
        tracing::info!("encoder stop requested ({:?})", self.inner.driver.media_kind());
    }

    /// Signal that at least one unit of new output is worth draining.
    /// Returns `false` (with no state change) when the encoder is not
    /// capturing or a stop has been requested; the frame will be dropped.
    pub fn frame_available(&self) -> bool {
        let mut control = self.inner.control.lock();
        if !control.capturing || control.stop_requested {
            return false;
        }
        control.pending_drains += 1;
        self.inner.cond.notify_all();
        true
    }

    /// Explicit buffer hand-off path. No-op unless capturing. An empty
    /// payload is the end-of-stream marker; exactly one is ever queued.
    pub fn encode(&self, data: &[u8], presentation_time_us: i64) -> PipelineResult<()> {
        self.inner.queue_input(data, presentation_time_us)
    }

    /// Block until the worker has finished its shutdown sequence. Call after
    /// [`stop`](EncoderCore::stop); the worker never exits on its own.
    pub fn join(&self) {
        if let Some(handle) = self.worker.lock().take() {
            if handle.join().is_err() {
                tracing::error!("encoder worker panicked");
            }
        }
    }
}

impl FrameSink for EncoderCore {
    fn push_frame(&self, data: &[u8], presentation_time_us: i64) -> PipelineResult<()> {
        self.encode(data, presentation_time_us)?;
        self.frame_available();
        Ok(())
    }

    fn notify_frame(&self) -> bool {
        self.frame_available()
    }
}

/// Worker-thread state: track registration and timestamp bookkeeping only
/// the drain loop touches.
struct Worker {
    inner: Arc<Inner>,
    pts: PtsTracker,
    track_index: Option<usize>,
    muxer_started: bool,
}

impl Worker {
    fn new(inner: Arc<Inner>) -> Self {
        Self {
            inner,
            pts: PtsTracker::new(),
            track_index: None,
            muxer_started: false,
        }
    }

    fn run(mut self) {
        {
            let mut control = self.inner.control.lock();
            control.stop_requested = false;
            control.pending_drains = 0;
            control.worker_ready = true;
            self.inner.cond.notify_all();
        }
        tracing::debug!("encoder worker running");

        loop {
            let stop_requested;
            {
                let mut control = self.inner.control.lock();
                stop_requested = control.stop_requested;
                let drain_requested = control.pending_drains > 0;
                if drain_requested {
                    control.pending_drains -= 1;
                }
                if !stop_requested && !drain_requested {
                    self.inner.cond.wait(&mut control);
                    continue;
                }
            }

            if stop_requested {
                self.shutdown();
                break;
            }

            if let Err(error) = self.drain() {
                self.inner.record_error(error);
                self.release();
                break;
            }
        }

        let mut control = self.inner.control.lock();
        control.stop_requested = true;
        control.capturing = false;
        control.phase = Phase::Released;
        tracing::debug!("encoder worker exited");
    }

    /// Fixed four-step teardown: drain, signal EOS, drain the EOS buffer,
    /// release. Steps are never skipped; a failing step is recorded and the
    /// remaining steps still run.
    fn shutdown(&mut self) {
        tracing::info!("running encoder shutdown sequence");
        self.inner.set_phase(Phase::Draining);
        if let Err(error) = self.drain() {
            self.inner.record_error(error);
        }
        if let Err(error) = self.signal_end_of_stream() {
            self.inner.record_error(error);
        }
        if let Err(error) = self.drain() {
            self.inner.record_error(error);
        }
        self.release();
    }

    /// Deliver the end-of-stream marker the way the driver's input path
    /// requires.
    fn signal_end_of_stream(&mut self) -> PipelineResult<()> {
        match self.inner.driver.end_of_stream() {
            EndOfStream::Signal => {
                if self.inner.eos_sent.swap(true, Ordering::SeqCst) {
                    return Ok(());
                }
                tracing::debug!("signaling end of input stream");
                self.inner.codec.signal_end_of_input_stream()
            }
            EndOfStream::EmptyBuffer => {
                let pts = self.pts.next_us(self.inner.clock.now_us());
                self.inner.queue_input(&[], pts)
            }
        }
    }

    /// One drain pass: pull encoded output until the codec starves (5 empty
    /// polls), the EOS buffer arrives, or capturing ends.
    fn drain(&mut self) -> PipelineResult<()> {
        let mut empty_polls = 0u32;

        while self.inner.is_capturing() {
            match self.inner.codec.dequeue_output_buffer(DEQUEUE_TIMEOUT_US)? {
                OutputStatus::TryAgainLater => {
                    // Once EOS is in flight the final flagged buffer must
                    // arrive; keep polling for it
                    if !self.inner.eos_sent.load(Ordering::SeqCst) {
                        empty_polls += 1;
                        if empty_polls >= MAX_EMPTY_POLLS {
                            break;
                        }
                    }
                }
                OutputStatus::FormatChanged => self.register_track()?,
                OutputStatus::Unexpected(status) => {
                    tracing::debug!("ignoring unexpected dequeue status {}", status);
                }
                OutputStatus::Available { index, mut info } => {
                    let raw = self.inner.codec.output_buffer(index)?;
                    let payload = match self.inner.driver.transform(&raw) {
                        Some(transformed) => {
                            info.size = transformed.len();
                            transformed
                        }
                        None => raw,
                    };
                    if info.flags.codec_config {
                        // Config data is not a sample
                        info.size = 0;
                    }

                    if info.size != 0 {
                        empty_polls = 0;
                        if !self.muxer_started {
                            return Err(PipelineError::Protocol(
                                "sized output before track registration".to_string(),
                            ));
                        }
                        let track_index = self.track_index.ok_or_else(|| {
                            PipelineError::Protocol("track index missing".to_string())
                        })?;
                        info.presentation_time_us = self.pts.next_us(self.inner.clock.now_us());
                        let size = info.size.min(payload.len());
                        self.inner
                            .muxer
                            .write_sample_data(track_index, &payload[..size], &info)?;
                    }

                    self.inner.codec.release_output_buffer(index, false)?;

                    if info.flags.end_of_stream {
                        tracing::debug!("end-of-stream buffer drained");
                        self.inner.set_capturing(false);
                        break;
                    }
                }
            }
        }
        Ok(())
    }

    /// Handle the one-time output format report: register this track with
    /// the shared muxer and wait for all sibling tracks to be registered.
    fn register_track(&mut self) -> PipelineResult<()> {
        if self.muxer_started {
            return Err(PipelineError::Protocol(
                "output format changed twice".to_string(),
            ));
        }

        let format = self.inner.codec.output_format()?;
        let track_index = self.inner.muxer.add_track(&format)?;
        self.track_index = Some(track_index);
        self.muxer_started = true;
        tracing::info!("track {} registered ({})", track_index, format.mime);

        if !self.inner.muxer.start()? {
            // Siblings are still registering; poll until muxing begins.
            // A recorded error or a stop request both abort the wait, so a
            // sibling that never registers cannot wedge this worker.
            while !self.inner.muxer.is_started() {
                let abort = self.inner.aborted.load(Ordering::SeqCst)
                    || self.inner.control.lock().stop_requested;
                if abort {
                    return Err(PipelineError::Muxer(
                        "aborted while waiting for muxer start".to_string(),
                    ));
                }
                std::thread::sleep(MUXER_POLL_INTERVAL);
            }
        }
        tracing::info!("muxer started, track {} live", track_index);
        Ok(())
    }

    /// Release all resources; the only way out of the worker. Failures are
    /// logged and never abort the remaining cleanup.
    fn release(&mut self) {
        tracing::info!("releasing encoder resources");

        let listener = self.inner.listener.clone();
        let kind = self.inner.driver.media_kind();
        if catch_unwind(AssertUnwindSafe(|| listener.on_stopped(kind))).is_err() {
            tracing::error!("on_stopped listener panicked");
        }

        self.inner.set_capturing(false);

        if let Err(error) = self.inner.codec.stop() {
            tracing::error!("codec stop failed: {}", error);
        }
        if let Err(error) = self.inner.codec.release() {
            tracing::error!("codec release failed: {}", error);
        }

        if self.muxer_started {
            if let Err(error) = self.inner.muxer.stop() {
                tracing::error!("muxer stop failed: {}", error);
            }
        }
    }
}
