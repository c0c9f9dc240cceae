//! Error types for strata-fetch.

use std::io;

use thiserror::Error;

/// Every failure the engine can surface.
///
/// Retry policies do not look at the variant: a full disk consumes the same
/// retry budget as a dropped connection. The last error of an exhausted
/// policy is returned unchanged.
#[derive(Debug, Error)]
pub enum Error {
    /// Connect, request or body-read failure reported by the HTTP client.
    #[error("network error: {0}")]
    Network(String),

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { url: String, status: u16 },

    /// The body ended before the requested range was complete.
    #[error("stream ended early: expected {expected} bytes, got {received}")]
    Truncated { expected: u64, received: u64 },

    #[error("server did not declare a content length for {url}")]
    MissingContentLength { url: String },

    #[error("file I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("download task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("invalid options: {0}")]
    InvalidOptions(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    /// A sibling segment failed and this one stopped early. Its temp file
    /// keeps every byte received so far.
    #[error("cancelled after a sibling segment failed")]
    Cancelled,
}

impl Error {
    pub(crate) fn network<E: std::error::Error>(e: E) -> Self { Error::Network(e.to_string()) }
}

pub type Result<T> = std::result::Result<T, Error>;
