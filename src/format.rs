//! Media format and sample metadata types
//!
//! Shared descriptions of encoded streams, passed between drivers, codec
//! sessions and the muxer.

use serde::{Deserialize, Serialize};

/// Kind of media carried by a track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Audio,
}

/// Description of an encoded stream
///
/// Built by a driver to configure the codec, and reported back by the codec
/// once the actual output parameters are known (the reported variant is what
/// gets registered with the muxer).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaFormat {
    /// Media kind
    pub kind: MediaKind,

    /// MIME type, e.g. "video/avc" or "audio/mp4a-latm"
    pub mime: String,

    /// Frame width in pixels (video only)
    pub width: Option<u32>,

    /// Frame height in pixels (video only)
    pub height: Option<u32>,

    /// Frames per second (video only)
    pub frame_rate: Option<u32>,

    /// Key-frame interval in seconds (video only)
    pub key_frame_interval: Option<u32>,

    /// Sample rate in Hz (audio only)
    pub sample_rate: Option<u32>,

    /// Channel count (audio only)
    pub channel_count: Option<u16>,

    /// Target bitrate in bits per second
    pub bit_rate: Option<u32>,
}

impl MediaFormat {
    /// Create a video format
    pub fn video(mime: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            kind: MediaKind::Video,
            mime: mime.into(),
            width: Some(width),
            height: Some(height),
            frame_rate: None,
            key_frame_interval: None,
            sample_rate: None,
            channel_count: None,
            bit_rate: None,
        }
    }

    /// Create an audio format
    pub fn audio(mime: impl Into<String>, sample_rate: u32, channel_count: u16) -> Self {
        Self {
            kind: MediaKind::Audio,
            mime: mime.into(),
            width: None,
            height: None,
            frame_rate: None,
            key_frame_interval: None,
            sample_rate: Some(sample_rate),
            channel_count: Some(channel_count),
            bit_rate: None,
        }
    }

    /// Set the target bitrate
    pub fn with_bit_rate(mut self, bit_rate: u32) -> Self {
        self.bit_rate = Some(bit_rate);
        self
    }

    /// Set the frame rate
    pub fn with_frame_rate(mut self, frame_rate: u32) -> Self {
        self.frame_rate = Some(frame_rate);
        self
    }

    /// Set the key-frame interval in seconds
    pub fn with_key_frame_interval(mut self, seconds: u32) -> Self {
        self.key_frame_interval = Some(seconds);
        self
    }
}

/// Flags attached to an encoded sample
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleFlags {
    /// Payload is codec configuration data (SPS/PPS etc.), not a sample
    pub codec_config: bool,

    /// Sample is a sync/key frame
    pub key_frame: bool,

    /// No further samples follow on this track
    pub end_of_stream: bool,
}

impl SampleFlags {
    /// Flags for an end-of-stream marker buffer
    pub fn end_of_stream() -> Self {
        Self {
            end_of_stream: true,
            ..Self::default()
        }
    }
}

/// Metadata for one output buffer returned by the codec
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BufferInfo {
    /// Start offset of valid data within the buffer
    pub offset: usize,

    /// Number of valid bytes
    pub size: usize,

    /// Presentation timestamp in microseconds
    pub presentation_time_us: i64,

    /// Sample flags
    pub flags: SampleFlags,
}
