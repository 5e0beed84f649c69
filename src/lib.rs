//! muxpipe - encoder-to-muxer pipeline coordination.
//!
//! Drives hardware/software encoder sessions from raw frames to a
//! container-ready bitstream, synchronizing lifecycle with a shared muxer
//! that interleaves the encoded tracks. The codec and the container writer
//! are abstract capabilities ([`Codec`], [`Muxer`]); this crate owns the
//! sequencing between them: per-track worker threads, drain loops,
//! first-track-ready coordination, stop/EOS protocol and monotonic
//! presentation timestamps.

pub mod codec;
pub mod config;
pub mod encoder;
pub mod error;
pub mod format;
pub mod muxer;
pub mod session;
pub mod sink;

pub use codec::{Codec, InputStatus, OutputStatus, DEQUEUE_TIMEOUT_US};
pub use config::{AudioConfig, VideoConfig};
pub use encoder::{
    AudioDriver, EncoderCore, EncoderDriver, EncoderListener, EndOfStream, NoopListener, Phase,
    SampleClock, VideoDriver,
};
pub use error::{PipelineError, PipelineResult};
pub use format::{BufferInfo, MediaFormat, MediaKind, SampleFlags};
pub use muxer::Muxer;
pub use session::{RecordingSession, SessionState};
pub use sink::FrameSink;
