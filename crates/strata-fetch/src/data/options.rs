use std::fmt;
use std::time::Duration;

use super::progress::ProgressCallback;
use crate::core::RetryPolicy;
use crate::error::{Error, Result};

/// Configuration for a stream download.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use strata_fetch::{DownloadOptions, RetryPolicy};
///
/// let options = DownloadOptions::default()
///     .chunk_size(1024 * 1024)
///     .chunks_per_part(8)
///     .max_in_flight(8)
///     .chunk_retry(RetryPolicy::new(3, Duration::from_secs(1)));
/// assert_eq!(options.part_size(), Some(8 * 1024 * 1024));
/// ```
#[derive(Clone)]
pub struct DownloadOptions {
    /// Bytes per chunk, the unit of one range request.
    ///
    /// Default: 512 KiB
    pub chunk_size: u64,

    /// Chunks per part. A part spans `chunk_size * chunks_per_part` bytes.
    ///
    /// Default: 10
    pub chunks_per_part: u64,

    /// Parts allowed to run their chunk phase at the same time.
    ///
    /// Default: 4
    pub max_concurrent_parts: usize,

    /// Range requests allowed to be open at the same time across the whole
    /// stream. A request holds its slot while its body streams, and gives it
    /// back while it waits out a retry backoff.
    ///
    /// Default: 16
    pub max_in_flight: usize,

    /// Size of the write buffer between the response body and a temp file,
    /// and of the copy buffer used during assembly.
    ///
    /// Default: 64 KiB
    pub read_buffer_size: usize,

    /// Wraps each range request.
    ///
    /// Default: 5 retries, 3s apart
    pub chunk_retry: RetryPolicy,

    /// Wraps the whole chunk phase of a part.
    ///
    /// Default: 5 retries, 5s apart
    pub part_retry: RetryPolicy,

    /// Wraps one complete attempt at the stream, probe included.
    ///
    /// Default: 5 retries, 5s apart
    pub stream_retry: RetryPolicy,

    /// Invoked on phase changes and after every body read.
    ///
    /// Default: None
    pub on_progress: Option<ProgressCallback>,
}

impl fmt::Debug for DownloadOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DownloadOptions")
            .field("chunk_size", &self.chunk_size)
            .field("chunks_per_part", &self.chunks_per_part)
            .field("max_concurrent_parts", &self.max_concurrent_parts)
            .field("max_in_flight", &self.max_in_flight)
            .field("read_buffer_size", &self.read_buffer_size)
            .field("chunk_retry", &self.chunk_retry)
            .field("part_retry", &self.part_retry)
            .field("stream_retry", &self.stream_retry)
            .field("on_progress", &self.on_progress.as_ref().map(|_| "{ ... }"))
            .finish()
    }
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            chunk_size:           512 * 1024,
            chunks_per_part:      10,
            max_concurrent_parts: 4,
            max_in_flight:        16,
            read_buffer_size:     64 * 1024,
            chunk_retry:          RetryPolicy::new(5, Duration::from_secs(3)),
            part_retry:           RetryPolicy::new(5, Duration::from_secs(5)),
            stream_retry:         RetryPolicy::new(5, Duration::from_secs(5)),
            on_progress:          None,
        }
    }
}

impl DownloadOptions {
    #[must_use]
    pub fn chunk_size(mut self, chunk_size: u64) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    #[must_use]
    pub fn chunks_per_part(mut self, chunks_per_part: u64) -> Self {
        self.chunks_per_part = chunks_per_part;
        self
    }

    #[must_use]
    pub fn max_concurrent_parts(mut self, max_concurrent_parts: usize) -> Self {
        self.max_concurrent_parts = max_concurrent_parts;
        self
    }

    #[must_use]
    pub fn max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight;
        self
    }

    #[must_use]
    pub fn read_buffer_size(mut self, read_buffer_size: usize) -> Self {
        self.read_buffer_size = read_buffer_size;
        self
    }

    #[must_use]
    pub fn chunk_retry(mut self, policy: RetryPolicy) -> Self {
        self.chunk_retry = policy;
        self
    }

    #[must_use]
    pub fn part_retry(mut self, policy: RetryPolicy) -> Self {
        self.part_retry = policy;
        self
    }

    #[must_use]
    pub fn stream_retry(mut self, policy: RetryPolicy) -> Self {
        self.stream_retry = policy;
        self
    }

    /// Use the same policy at every level.
    #[must_use]
    pub fn retry(self, policy: RetryPolicy) -> Self {
        self.chunk_retry(policy).part_retry(policy).stream_retry(policy)
    }

    #[must_use]
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(&super::Progress) + Send + Sync + 'static,
    {
        self.on_progress = Some(std::sync::Arc::new(callback));
        self
    }

    /// Bytes per part, or `None` if the product overflows.
    pub fn part_size(&self) -> Option<u64> { self.chunk_size.checked_mul(self.chunks_per_part) }

    /// Reject settings that would make partitioning or the limiters hang.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::InvalidOptions("chunk_size must be greater than 0".into()));
        }
        if self.chunks_per_part == 0 {
            return Err(Error::InvalidOptions("chunks_per_part must be greater than 0".into()));
        }
        if self.part_size().is_none() {
            return Err(Error::InvalidOptions(format!(
                "chunk_size {} times chunks_per_part {} overflows",
                self.chunk_size, self.chunks_per_part
            )));
        }
        if self.max_concurrent_parts == 0 {
            return Err(Error::InvalidOptions("max_concurrent_parts must be greater than 0".into()));
        }
        if self.max_in_flight == 0 {
            return Err(Error::InvalidOptions("max_in_flight must be greater than 0".into()));
        }
        if self.read_buffer_size == 0 {
            return Err(Error::InvalidOptions("read_buffer_size must be greater than 0".into()));
        }
        Ok(())
    }
}
