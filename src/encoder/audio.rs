//! Audio encoder driver
//!
//! Buffer-fed AAC specialization: producers hand PCM buffers to the encoder
//! via `push_frame()`, and end-of-stream is a synthetic empty input buffer
//! carrying the EOS flag.

use crate::config::AudioConfig;
use crate::error::PipelineResult;
use crate::format::{MediaFormat, MediaKind};

use super::driver::{EncoderDriver, EndOfStream};

/// AAC MIME type
pub const AUDIO_MIME_TYPE: &str = "audio/mp4a-latm";

/// Driver for a buffer-fed audio track
pub struct AudioDriver {
    config: AudioConfig,
}

impl AudioDriver {
    pub fn new(config: AudioConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AudioConfig {
        &self.config
    }
}

impl EncoderDriver for AudioDriver {
    fn media_kind(&self) -> MediaKind {
        MediaKind::Audio
    }

    fn format(&self) -> PipelineResult<MediaFormat> {
        tracing::info!(
            "Audio format: {}Hz, {} channel(s), bitrate={}bps",
            self.config.sample_rate,
            self.config.channel_count,
            self.config.bit_rate
        );
        Ok(
            MediaFormat::audio(AUDIO_MIME_TYPE, self.config.sample_rate, self.config.channel_count)
                .with_bit_rate(self.config.bit_rate),
        )
    }

    fn end_of_stream(&self) -> EndOfStream {
        EndOfStream::EmptyBuffer
    }
}
