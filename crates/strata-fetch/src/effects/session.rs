use std::path::PathBuf;
use std::sync::Arc;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use super::http::HttpClient;
use super::limiter::InFlightLimiter;
use super::range_fetcher::RangeFetcher;
use crate::data::{DownloadOptions, ProgressReporter, ResourceDescriptor, SegmentPath};
use crate::error::{Error, Result};

/// State shared by every task of one stream download attempt.
pub(crate) struct Session<C> {
    pub(crate) client:   Arc<C>,
    pub(crate) resource: ResourceDescriptor,
    pub(crate) options:  DownloadOptions,
    pub(crate) limiter:  InFlightLimiter,
    pub(crate) progress: ProgressReporter,
    /// Fired when a part fails for good. Every part attempt works under a
    /// child of this token.
    pub(crate) cancel:   CancellationToken,
}

impl<C: HttpClient> Session<C> {
    pub(crate) fn new(client: Arc<C>, resource: ResourceDescriptor, options: DownloadOptions, total: u64) -> Self {
        let limiter = InFlightLimiter::new(options.max_concurrent_parts, options.max_in_flight);
        let progress = ProgressReporter::new(options.on_progress.clone(), Some(total));
        Self {
            client,
            resource,
            options,
            limiter,
            progress,
            cancel: CancellationToken::new(),
        }
    }

    /// Temp file holding the bytes of the segment at `path`.
    pub(crate) fn temp_file(&self, path: &SegmentPath) -> PathBuf { path.temp_file(&self.resource.destination) }

    /// A fetcher bound to this session's limits and progress that stops
    /// once `cancel` fires.
    pub(crate) fn fetcher<'a>(&'a self, cancel: &'a CancellationToken) -> RangeFetcher<'a, C> {
        RangeFetcher::new(self.client.as_ref(), &self.resource)
            .with_buffer_size(self.options.read_buffer_size)
            .with_limiter(&self.limiter)
            .with_progress(&self.progress)
            .with_cancel(cancel)
    }
}

/// Wait for every task in `tasks`.
///
/// On the first failure `cancel` is fired and the remaining siblings are
/// drained, not aborted: each stops at its next cancellation point with its
/// segment file flushed and closed. None of them touches the disk once this
/// returns. The first error other than [`Error::Cancelled`] is returned.
pub(crate) async fn join_all<T: 'static>(
    tasks: &mut JoinSet<Result<T>>,
    cancel: &CancellationToken,
) -> Result<Vec<T>> {
    let mut values = Vec::with_capacity(tasks.len());
    let mut failure: Option<Error> = None;
    while let Some(joined) = tasks.join_next().await {
        match joined.map_err(Error::from).and_then(|result| result) {
            Ok(value) => values.push(value),
            Err(e) => {
                cancel.cancel();
                let replace = match &failure {
                    None => true,
                    Some(Error::Cancelled) => !matches!(e, Error::Cancelled),
                    Some(_) => false,
                };
                if replace {
                    failure = Some(e);
                }
            }
        }
    }
    match failure {
        Some(e) => Err(e),
        None => Ok(values),
    }
}
