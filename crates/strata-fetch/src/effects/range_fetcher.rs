use std::future::Future;
use std::path::Path;

use bytes::Bytes;
use futures_util::StreamExt;
use tokio::fs::OpenOptions;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::fs::file_len;
use super::http::{BoxStream, HttpClient};
use super::limiter::InFlightLimiter;
use crate::core::accepts_range_status;
use crate::data::{Interval, ProgressReporter, ResourceDescriptor, SegmentState};
use crate::error::{Error, Result};

/// Default size of the write buffer in front of a segment file.
const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Fetches one interval of a resource into a segment file, resuming from
/// whatever the file already holds.
///
/// The file only ever grows. A fetch that fails halfway leaves every byte it
/// received on disk, and the next fetch of the same interval asks only for
/// the rest.
pub struct RangeFetcher<'a, C> {
    client:           &'a C,
    resource:         &'a ResourceDescriptor,
    read_buffer_size: usize,
    limiter:          Option<&'a InFlightLimiter>,
    progress:         Option<&'a ProgressReporter>,
    cancel:           Option<&'a CancellationToken>,
}

impl<'a, C: HttpClient> RangeFetcher<'a, C> {
    pub fn new(client: &'a C, resource: &'a ResourceDescriptor) -> Self {
        Self {
            client,
            resource,
            read_buffer_size: DEFAULT_BUFFER_SIZE,
            limiter: None,
            progress: None,
            cancel: None,
        }
    }

    #[must_use]
    pub fn with_buffer_size(mut self, read_buffer_size: usize) -> Self {
        self.read_buffer_size = read_buffer_size.max(1);
        self
    }

    /// Hold a request slot of `limiter` while connected.
    #[must_use]
    pub fn with_limiter(mut self, limiter: &'a InFlightLimiter) -> Self {
        self.limiter = Some(limiter);
        self
    }

    #[must_use]
    pub(crate) fn with_progress(mut self, progress: &'a ProgressReporter) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Stop with [`Error::Cancelled`] once `cancel` fires.
    ///
    /// The token is checked while waiting for a request slot, for the
    /// response and between body frames. Bytes already received are flushed
    /// to the file before the fetch returns.
    #[must_use]
    pub fn with_cancel(mut self, cancel: &'a CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Bring the file at `path` up to the full length of `interval`.
    ///
    /// Returns the number of bytes appended by this call; `0` means the file
    /// was already complete and no request was sent.
    pub async fn fetch(&self, interval: &Interval, path: &Path) -> Result<u64> {
        let expected = interval.len();
        let on_disk = match SegmentState::classify(file_len(path).await?, expected) {
            SegmentState::Complete => {
                debug!(path = %path.display(), "segment already complete");
                return Ok(0);
            }
            state => state.on_disk(expected),
        };

        let range = interval.byte_range(on_disk);
        let _permit = match self.limiter {
            Some(limiter) => Some(self.or_cancelled(limiter.request()).await?),
            None => None,
        };

        debug!(url = %self.resource.url, %range, path = %path.display(), "requesting range");
        let response = self
            .or_cancelled(async {
                self.client
                    .get(&self.resource.url, &self.resource.headers, Some(range))
                    .await
                    .map_err(Error::network)
            })
            .await?;

        if !accepts_range_status(response.status, range.first) {
            return Err(Error::UnexpectedStatus {
                url:    self.resource.url.clone(),
                status: response.status,
            });
        }

        let file = OpenOptions::new().create(true).append(true).open(path).await?;
        let mut writer = BufWriter::with_capacity(self.read_buffer_size, file);

        let remaining = range.len();
        let copied = copy_body(response.body, &mut writer, remaining, self.progress, self.cancel).await;
        let flushed = writer.flush().await;
        let received = copied?;
        flushed?;

        if received < remaining {
            return Err(Error::Truncated {
                expected: remaining,
                received,
            });
        }
        Ok(received)
    }

    /// Await `fut` unless the token fires first. Nothing that touches the
    /// segment file may go through here.
    async fn or_cancelled<T>(&self, fut: impl Future<Output = Result<T>>) -> Result<T> {
        let Some(cancel) = self.cancel else { return fut.await };
        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(Error::Cancelled),
            result = fut => result,
        }
    }
}

/// Copy at most `limit` bytes of `body` into `writer`.
///
/// Bytes past `limit` are dropped, so a server that overshoots the range
/// cannot grow a segment past its interval. Cancellation is only observed
/// between frames, never halfway through a write.
async fn copy_body<E, W>(
    mut body: BoxStream<'static, std::result::Result<Bytes, E>>,
    writer: &mut W,
    limit: u64,
    progress: Option<&ProgressReporter>,
    cancel: Option<&CancellationToken>,
) -> Result<u64>
where
    E: std::error::Error,
    W: AsyncWrite + Unpin,
{
    let mut written = 0u64;
    while written < limit {
        let next = match cancel {
            Some(cancel) => tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(Error::Cancelled),
                frame = body.next() => frame,
            },
            None => body.next().await,
        };
        let Some(frame) = next else { break };
        let frame = frame.map_err(Error::network)?;

        let take = (frame.len() as u64).min(limit - written);
        writer.write_all(&frame[..take as usize]).await?;
        written += take;

        if let Some(progress) = progress {
            progress.advance(take);
        }
    }
    Ok(written)
}
