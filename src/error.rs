//! Error types and handling
//!
//! Common error types used across the pipeline.

use thiserror::Error;

/// Pipeline-wide error type
#[derive(Error, Debug, Clone)]
pub enum PipelineError {
    /// Codec creation or configuration failed during `prepare()`.
    /// Fatal to the encoder instance; callers must not reuse it.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The codec/muxer protocol was violated (e.g. a second output format
    /// change, or a sized sample arriving before track registration).
    /// Terminal for the encoder instance.
    #[error("protocol violation: {0}")]
    Protocol(String),

    /// A codec session call failed.
    #[error("codec error: {0}")]
    Codec(String),

    /// A muxer call failed.
    #[error("muxer error: {0}")]
    Muxer(String),

    /// An operation was issued against an encoder that has already been
    /// released, or a second `spawn()` was attempted.
    #[error("invalid state: {0}")]
    InvalidState(String),
}

/// Result type alias using PipelineError
pub type PipelineResult<T> = Result<T, PipelineError>;
