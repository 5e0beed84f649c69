//! Encoder engine and media-type drivers
//!
//! This module implements the per-track encoding pipeline:
//! - `EncoderCore` engine: state machine, worker thread, drain loop
//! - `EncoderDriver` trait with video (surface-fed) and audio (buffer-fed)
//!   specializations
//! - presentation timestamp generation and repair

pub mod audio;
pub mod clock;
pub mod core;
pub mod driver;
pub mod video;

pub use audio::AudioDriver;
pub use clock::{PtsTracker, SampleClock, SystemSampleClock};
pub use core::{EncoderCore, Phase};
pub use driver::{EncoderDriver, EndOfStream};
pub use video::VideoDriver;

use crate::format::MediaKind;

/// Lifecycle callbacks exposed to the embedding application
///
/// Both callbacks fire synchronously on whichever thread drives the
/// transition: `on_prepared` at the end of `prepare()`, `on_stopped` from the
/// worker during release. Panics raised inside a listener are caught and
/// logged; a misbehaving listener cannot corrupt the shutdown sequence.
pub trait EncoderListener: Send + Sync {
    /// The encoder's codec has been configured and started
    fn on_prepared(&self, _kind: MediaKind) {}

    /// The encoder has released its resources
    fn on_stopped(&self, _kind: MediaKind) {}
}

/// Listener that ignores all callbacks
pub struct NoopListener;

impl EncoderListener for NoopListener {}
