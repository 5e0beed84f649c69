//! Encoder driver trait
//!
//! Media-type specialization for [`EncoderCore`](super::EncoderCore). A
//! driver supplies the codec configuration at prepare time, tells the core
//! how end-of-stream is signaled for its input path, and may post-process
//! encoded payloads before they reach the muxer. The core composes with a
//! driver instead of being subclassed per media type.

use crate::error::PipelineResult;
use crate::format::{MediaFormat, MediaKind};

/// How end-of-input is delivered to the codec
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndOfStream {
    /// The codec is surface-fed; call its direct end-of-input signal
    Signal,
    /// The codec is buffer-fed; queue an empty EOS-flagged input buffer
    EmptyBuffer,
}

/// Per-media-type configuration and specialization
pub trait EncoderDriver: Send + Sync {
    /// Kind of track this driver produces
    fn media_kind(&self) -> MediaKind;

    /// Codec configuration applied at `prepare()`
    fn format(&self) -> PipelineResult<MediaFormat>;

    /// How the shutdown sequence signals end-of-stream for this input path
    fn end_of_stream(&self) -> EndOfStream;

    /// Optional transform applied to each encoded payload before it is
    /// written to the muxer (e.g. a rotation fix-up). Returning `None` keeps
    /// the payload as-is.
    fn transform(&self, _payload: &[u8]) -> Option<Vec<u8>> {
        None
    }
}
