//! Error types for rendering and remote fetches.

use thiserror::Error;

/// A render entry point failed.
///
/// Fetch failures never surface here: media and avatars recover locally.
#[derive(Debug, Error)]
pub enum RenderError {
    /// A drawing fault was caught by the fault barrier around a render call.
    #[error("panic while drawing {what}")]
    Panicked { what: &'static str },

    /// The caller went away before the pipeline finished.
    #[error("render cancelled")]
    Cancelled,

    /// Embedded assets could not be parsed.
    #[error("invalid embedded asset: {0}")]
    Asset(String),

    /// Encoding the finished bitmap failed.
    #[error("encode: {0}")]
    Encode(String),
}

/// Why a remote image could not be used.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("unsupported address: {0}")]
    Address(String),

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("unexpected status {0}")]
    Status(u16),

    #[error("body exceeds {limit} bytes")]
    TooLarge { limit: u64 },

    #[error("payload is not an image ({0})")]
    NotAnImage(String),

    #[error("decode: {0}")]
    Decode(String),
}
