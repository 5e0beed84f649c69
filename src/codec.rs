//! Codec capability trait
//!
//! Abstraction over a hardware/software encoder session. The encoding
//! algorithm itself lives behind this seam; the pipeline only sequences
//! configure/feed/drain/release calls against it.
//!
//! Implementations must be internally synchronized: input-side calls arrive
//! on producer threads while the drain loop pulls output on the encoder's
//! worker thread.

use crate::error::PipelineResult;
use crate::format::{BufferInfo, MediaFormat, SampleFlags};

/// Timeout for a single dequeue call against the codec, in microseconds
/// (10 ms).
pub const DEQUEUE_TIMEOUT_US: u64 = 10_000;

/// Result of asking the codec for a free input slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputStatus {
    /// A free input buffer, identified by its slot index
    Available(usize),
    /// No input slot freed up within the timeout
    TryAgainLater,
}

/// Result of asking the codec for the next encoded output unit
#[derive(Debug, Clone, PartialEq)]
pub enum OutputStatus {
    /// An encoded buffer is ready at the given slot index
    Available { index: usize, info: BufferInfo },
    /// No output produced within the timeout
    TryAgainLater,
    /// The output format is now known; reported exactly once, before any
    /// data buffer
    FormatChanged,
    /// Any other status; callers ignore it and keep polling
    Unexpected(i32),
}

/// An encoder session
///
/// Mirrors the dequeue/queue/release protocol of platform codec APIs.
/// Sessions are owned by exactly one [`EncoderCore`](crate::EncoderCore).
pub trait Codec: Send + Sync {
    /// Apply the stream configuration. Must be called before `start`.
    fn configure(&self, format: &MediaFormat) -> PipelineResult<()>;

    /// Start the session. Input may be queued once this returns.
    fn start(&self) -> PipelineResult<()>;

    /// Wait up to `timeout_us` for a free input slot.
    fn dequeue_input_buffer(&self, timeout_us: u64) -> PipelineResult<InputStatus>;

    /// Queue `data` into the input slot at `index` with the given timestamp
    /// and flags. An empty payload with the end-of-stream flag is the EOS
    /// marker.
    fn queue_input_buffer(
        &self,
        index: usize,
        data: &[u8],
        presentation_time_us: i64,
        flags: SampleFlags,
    ) -> PipelineResult<()>;

    /// Wait up to `timeout_us` for the next output unit.
    fn dequeue_output_buffer(&self, timeout_us: u64) -> PipelineResult<OutputStatus>;

    /// The negotiated output format. Only valid after `FormatChanged` has
    /// been reported.
    fn output_format(&self) -> PipelineResult<MediaFormat>;

    /// Copy out the payload of the output slot at `index`.
    fn output_buffer(&self, index: usize) -> PipelineResult<Vec<u8>>;

    /// Hand the output slot at `index` back to the codec.
    fn release_output_buffer(&self, index: usize, render: bool) -> PipelineResult<()>;

    /// Mark end of input for surface-fed sessions, where no explicit input
    /// buffer exists to carry the EOS flag.
    fn signal_end_of_input_stream(&self) -> PipelineResult<()>;

    /// Stop the session. No further queueing is valid.
    fn stop(&self) -> PipelineResult<()>;

    /// Release all session resources. The session is unusable afterwards.
    fn release(&self) -> PipelineResult<()>;
}
