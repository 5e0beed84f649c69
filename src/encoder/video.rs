//! Video encoder driver
//!
//! Surface-fed H.264 specialization: pixels reach the codec through a render
//! surface, so producers only call `notify_frame()` and end-of-stream is a
//! direct signal on the codec session.

use crate::config::VideoConfig;
use crate::error::PipelineResult;
use crate::format::{MediaFormat, MediaKind};

use super::driver::{EncoderDriver, EndOfStream};

/// H.264 MIME type
pub const VIDEO_MIME_TYPE: &str = "video/avc";

/// Driver for a surface-fed video track
pub struct VideoDriver {
    config: VideoConfig,
}

impl VideoDriver {
    pub fn new(config: VideoConfig) -> Self {
        Self { config }
    }

    /// The configuration this driver was built from
    pub fn config(&self) -> &VideoConfig {
        &self.config
    }
}

impl EncoderDriver for VideoDriver {
    fn media_kind(&self) -> MediaKind {
        MediaKind::Video
    }

    fn format(&self) -> PipelineResult<MediaFormat> {
        let bit_rate = self.config.effective_bit_rate();
        tracing::info!(
            "Video format: {}x{} @ {}fps, bitrate={:.2}Mbps",
            self.config.width,
            self.config.height,
            self.config.frame_rate,
            bit_rate as f32 / 1024.0 / 1024.0
        );
        Ok(
            MediaFormat::video(VIDEO_MIME_TYPE, self.config.width, self.config.height)
                .with_frame_rate(self.config.frame_rate)
                .with_bit_rate(bit_rate)
                .with_key_frame_interval(self.config.key_frame_interval),
        )
    }

    fn end_of_stream(&self) -> EndOfStream {
        EndOfStream::Signal
    }
}
