//! Shared test doubles: scripted codec session, recording muxer, fake clock.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use muxpipe::{
    BufferInfo, Codec, InputStatus, MediaFormat, Muxer, OutputStatus, PipelineError,
    PipelineResult, SampleClock, SampleFlags,
};

pub fn init_logs() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "muxpipe=debug".into()),
        )
        .try_init();
}

/// Clock that replays a scripted sequence of raw readings, then falls back
/// to an incrementing counter.
pub struct FakeClock {
    readings: Mutex<VecDeque<i64>>,
    fallback: AtomicI64,
}

impl FakeClock {
    pub fn new(readings: &[i64]) -> Self {
        Self {
            readings: Mutex::new(readings.iter().copied().collect()),
            fallback: AtomicI64::new(1_000_000),
        }
    }

    pub fn push(&self, reading: i64) {
        self.readings.lock().push_back(reading);
    }
}

impl SampleClock for FakeClock {
    fn now_us(&self) -> i64 {
        self.readings
            .lock()
            .pop_front()
            .unwrap_or_else(|| self.fallback.fetch_add(10, Ordering::SeqCst))
    }
}

/// Codec session driven by a script of output statuses.
///
/// An exhausted script reads as `TryAgainLater`. Queueing an EOS input (or
/// calling `signal_end_of_input_stream`) automatically appends an
/// EOS-flagged output buffer, so shutdown drains complete on their own.
pub struct ScriptedCodec {
    outputs: Mutex<VecDeque<OutputStatus>>,
    buffers: Mutex<HashMap<usize, Vec<u8>>>,
    next_buffer: AtomicUsize,
    output_format: MediaFormat,
    pub output_polls: AtomicUsize,
    pub input_polls: AtomicUsize,
    pub released_buffers: Mutex<Vec<usize>>,
    pub queued_inputs: Mutex<Vec<(Vec<u8>, i64, SampleFlags)>>,
    pub eos_signals: AtomicUsize,
    input_try_agains: AtomicUsize,
    next_input_slot: AtomicUsize,
    configure_fails: AtomicBool,
    pub configured: AtomicBool,
    pub started: AtomicBool,
    pub stopped: AtomicBool,
    pub released: AtomicBool,
}

impl ScriptedCodec {
    pub fn new(output_format: MediaFormat) -> Self {
        Self {
            outputs: Mutex::new(VecDeque::new()),
            buffers: Mutex::new(HashMap::new()),
            next_buffer: AtomicUsize::new(0),
            output_format,
            output_polls: AtomicUsize::new(0),
            input_polls: AtomicUsize::new(0),
            released_buffers: Mutex::new(Vec::new()),
            queued_inputs: Mutex::new(Vec::new()),
            eos_signals: AtomicUsize::new(0),
            input_try_agains: AtomicUsize::new(0),
            next_input_slot: AtomicUsize::new(0),
            configure_fails: AtomicBool::new(false),
            configured: AtomicBool::new(false),
            started: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
            released: AtomicBool::new(false),
        }
    }

    /// Make the next `count` input dequeues report `TryAgainLater`
    pub fn set_input_try_agains(&self, count: usize) {
        self.input_try_agains.store(count, Ordering::SeqCst);
    }

    /// Script a format-changed report
    pub fn push_format_changed(&self) {
        self.outputs.lock().push_back(OutputStatus::FormatChanged);
    }

    /// Script an out-of-contract status code
    pub fn push_unexpected(&self, status: i32) {
        self.outputs
            .lock()
            .push_back(OutputStatus::Unexpected(status));
    }

    /// Make `configure` fail, as a broken codec would at prepare time
    pub fn fail_configure(&self) {
        self.configure_fails.store(true, Ordering::SeqCst);
    }

    /// Script an encoded output buffer
    pub fn push_output(&self, payload: &[u8], flags: SampleFlags) {
        let index = self.next_buffer.fetch_add(1, Ordering::SeqCst);
        self.buffers.lock().insert(index, payload.to_vec());
        self.outputs.lock().push_back(OutputStatus::Available {
            index,
            info: BufferInfo {
                offset: 0,
                size: payload.len(),
                presentation_time_us: 0,
                flags,
            },
        });
    }

    fn push_eos_output(&self) {
        self.push_output(&[], SampleFlags::end_of_stream());
    }
}

impl Codec for ScriptedCodec {
    fn configure(&self, _format: &MediaFormat) -> PipelineResult<()> {
        if self.configure_fails.load(Ordering::SeqCst) {
            return Err(PipelineError::Codec("codec rejected format".to_string()));
        }
        self.configured.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn start(&self) -> PipelineResult<()> {
        self.started.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn dequeue_input_buffer(&self, _timeout_us: u64) -> PipelineResult<InputStatus> {
        self.input_polls.fetch_add(1, Ordering::SeqCst);
        let pending = self.input_try_agains.load(Ordering::SeqCst);
        if pending > 0 {
            self.input_try_agains.store(pending - 1, Ordering::SeqCst);
            return Ok(InputStatus::TryAgainLater);
        }
        Ok(InputStatus::Available(
            self.next_input_slot.fetch_add(1, Ordering::SeqCst),
        ))
    }

    fn queue_input_buffer(
        &self,
        _index: usize,
        data: &[u8],
        presentation_time_us: i64,
        flags: SampleFlags,
    ) -> PipelineResult<()> {
        self.queued_inputs
            .lock()
            .push((data.to_vec(), presentation_time_us, flags));
        if flags.end_of_stream {
            self.push_eos_output();
        }
        Ok(())
    }

    fn dequeue_output_buffer(&self, _timeout_us: u64) -> PipelineResult<OutputStatus> {
        self.output_polls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .outputs
            .lock()
            .pop_front()
            .unwrap_or(OutputStatus::TryAgainLater))
    }

    fn output_format(&self) -> PipelineResult<MediaFormat> {
        Ok(self.output_format.clone())
    }

    fn output_buffer(&self, index: usize) -> PipelineResult<Vec<u8>> {
        Ok(self.buffers.lock().get(&index).cloned().unwrap_or_default())
    }

    fn release_output_buffer(&self, index: usize, _render: bool) -> PipelineResult<()> {
        self.released_buffers.lock().push(index);
        Ok(())
    }

    fn signal_end_of_input_stream(&self) -> PipelineResult<()> {
        self.eos_signals.fetch_add(1, Ordering::SeqCst);
        self.push_eos_output();
        Ok(())
    }

    fn stop(&self) -> PipelineResult<()> {
        self.stopped.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn release(&self) -> PipelineResult<()> {
        self.released.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Muxer that starts once the expected number of tracks has registered and
/// records every sample write.
pub struct RecordingMuxer {
    expected_tracks: usize,
    tracks: Mutex<Vec<MediaFormat>>,
    started: AtomicBool,
    pub start_calls: AtomicUsize,
    pub stop_calls: AtomicUsize,
    pub writes: Mutex<Vec<(usize, Vec<u8>, BufferInfo)>>,
}

impl RecordingMuxer {
    pub fn new(expected_tracks: usize) -> Self {
        Self {
            expected_tracks,
            tracks: Mutex::new(Vec::new()),
            started: AtomicBool::new(false),
            start_calls: AtomicUsize::new(0),
            stop_calls: AtomicUsize::new(0),
            writes: Mutex::new(Vec::new()),
        }
    }

    pub fn track_count(&self) -> usize {
        self.tracks.lock().len()
    }

    pub fn write_count(&self) -> usize {
        self.writes.lock().len()
    }

    pub fn written_timestamps(&self, track_index: usize) -> Vec<i64> {
        self.writes
            .lock()
            .iter()
            .filter(|(track, _, _)| *track == track_index)
            .map(|(_, _, info)| info.presentation_time_us)
            .collect()
    }
}

impl Muxer for RecordingMuxer {
    fn add_track(&self, format: &MediaFormat) -> PipelineResult<usize> {
        let mut tracks = self.tracks.lock();
        tracks.push(format.clone());
        Ok(tracks.len() - 1)
    }

    fn start(&self) -> PipelineResult<bool> {
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        if self.tracks.lock().len() >= self.expected_tracks {
            self.started.store(true, Ordering::SeqCst);
        }
        Ok(self.started.load(Ordering::SeqCst))
    }

    fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    fn write_sample_data(
        &self,
        track_index: usize,
        data: &[u8],
        info: &BufferInfo,
    ) -> PipelineResult<()> {
        assert!(self.is_started(), "write before muxer start");
        self.writes
            .lock()
            .push((track_index, data.to_vec(), info.clone()));
        Ok(())
    }

    fn stop(&self) -> PipelineResult<()> {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
