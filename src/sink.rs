//! Frame sink trait
//!
//! The producer-facing edge of the pipeline: capture sources hand raw
//! encodable input to a sink without knowing anything about the encoder
//! behind it.

use crate::error::PipelineResult;

/// Accepts raw encodable input from a producer
///
/// Two delivery styles are supported, matching the two encoder input paths:
/// explicit buffer hand-off via [`push_frame`](FrameSink::push_frame), and
/// fire-and-forget notification via [`notify_frame`](FrameSink::notify_frame)
/// for producers that deliver pixels through a side channel (e.g. a render
/// surface) and only need to tell the encoder that output is worth draining.
pub trait FrameSink: Send + Sync {
    /// Hand off one raw sample at the given presentation timestamp.
    fn push_frame(&self, data: &[u8], presentation_time_us: i64) -> PipelineResult<()>;

    /// Signal that at least one new unit of output is worth draining.
    /// Returns `false` if the sink is no longer accepting frames (not
    /// capturing, or a stop has been requested) and the frame will be
    /// dropped.
    fn notify_frame(&self) -> bool;
}
