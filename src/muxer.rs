//! Muxer capability trait
//!
//! Abstraction over the container writer that interleaves the encoded tracks
//! into one output. A single muxer instance is shared by all sibling
//! encoders of a recording; each encoder registers exactly one track.

use crate::error::PipelineResult;
use crate::format::{BufferInfo, MediaFormat};

/// A shared multi-track container writer
///
/// Implementations must serialize `add_track`/`start` internally: whichever
/// encoder registers its track last will be the one whose `start()` call
/// actually starts muxing, and the others poll `is_started` until it flips.
/// `start()` must therefore tolerate redundant calls, and `is_started` must
/// be wait-free (it is polled from drain loops).
pub trait Muxer: Send + Sync {
    /// Register one track. Returns the track index used for sample writes.
    /// Invalid once the muxer has started.
    fn add_track(&self, format: &MediaFormat) -> PipelineResult<usize>;

    /// Start muxing if every registered encoder has added its track.
    /// Returns `true` if this call (or an earlier one) started the muxer,
    /// `false` if tracks are still outstanding.
    fn start(&self) -> PipelineResult<bool>;

    /// Whether muxing has started. Wait-free.
    fn is_started(&self) -> bool;

    /// Write one encoded sample to the given track. Only valid after the
    /// muxer has started.
    fn write_sample_data(
        &self,
        track_index: usize,
        data: &[u8],
        info: &BufferInfo,
    ) -> PipelineResult<()>;

    /// Stop muxing and finalize the container. Each registered encoder calls
    /// this once during its release; implementations refcount internally and
    /// finalize when the last track stops.
    fn stop(&self) -> PipelineResult<()>;
}
