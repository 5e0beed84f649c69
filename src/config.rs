//! Encoder configuration
//!
//! Logical recording configuration for the per-media-type drivers. Drivers
//! translate these into the [`MediaFormat`](crate::MediaFormat) handed to the
//! codec at prepare time.

use serde::{Deserialize, Serialize};

/// Default frame rate for video encoding
pub const DEFAULT_FRAME_RATE: u32 = 30;

/// Bits-per-pixel constant used to derive a bitrate when none is configured
pub const DEFAULT_BITS_PER_PIXEL: f32 = 0.5;

/// Default key-frame interval in seconds
pub const DEFAULT_KEY_FRAME_INTERVAL: u32 = 5;

/// Configuration for a video track
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoConfig {
    /// Frame width in pixels
    pub width: u32,

    /// Frame height in pixels
    pub height: u32,

    /// Frames per second
    #[serde(default = "default_frame_rate")]
    pub frame_rate: u32,

    /// Target bitrate in bits per second; derived from frame size and rate
    /// when not set
    pub bit_rate: Option<u32>,

    /// Key-frame interval in seconds
    #[serde(default = "default_key_frame_interval")]
    pub key_frame_interval: u32,
}

fn default_frame_rate() -> u32 {
    DEFAULT_FRAME_RATE
}

fn default_key_frame_interval() -> u32 {
    DEFAULT_KEY_FRAME_INTERVAL
}

impl VideoConfig {
    /// Create a configuration with default rate control for the given frame
    /// size
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            frame_rate: DEFAULT_FRAME_RATE,
            bit_rate: None,
            key_frame_interval: DEFAULT_KEY_FRAME_INTERVAL,
        }
    }

    /// Effective bitrate: the configured value, or bpp × fps × width × height
    pub fn effective_bit_rate(&self) -> u32 {
        self.bit_rate.unwrap_or_else(|| {
            (DEFAULT_BITS_PER_PIXEL
                * self.frame_rate as f32
                * self.width as f32
                * self.height as f32) as u32
        })
    }
}

/// Configuration for an audio track
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioConfig {
    /// Sample rate in Hz
    pub sample_rate: u32,

    /// Number of channels
    pub channel_count: u16,

    /// Target bitrate in bits per second
    #[serde(default = "default_audio_bit_rate")]
    pub bit_rate: u32,
}

fn default_audio_bit_rate() -> u32 {
    64_000
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            channel_count: 1,
            bit_rate: default_audio_bit_rate(),
        }
    }
}
