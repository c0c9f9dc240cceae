use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info};

use super::assemble::assemble;
use super::checkpoint;
use super::fs::file_len;
use super::http::HttpClient;
use super::layout::bytes_on_disk;
use super::parts::download_parts;
use super::session::Session;
use crate::core::{is_success, partition};
use crate::data::{
    Checkpoint, DownloadOptions, FetchPhase, Interval, ProgressReporter, ResourceDescriptor, SegmentPath, SegmentState,
};
use crate::error::{Error, Result};

/// What a call to [`StreamDownloadEngine::download`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The destination now holds all `bytes` of the resource.
    Downloaded { bytes: u64 },
    /// The destination already existed; nothing was requested.
    AlreadyPresent,
}

/// Downloads one resource as parts of chunks, resuming from temp files left
/// by earlier runs with the same layout.
///
/// The destination is written exactly once, by renaming the fully assembled
/// root aggregate onto it. An existing destination is trusted as complete
/// whatever its size.
pub struct StreamDownloadEngine<C: HttpClient> {
    client:  Arc<C>,
    options: DownloadOptions,
}

impl<C: HttpClient + 'static> StreamDownloadEngine<C> {
    pub fn new(client: C) -> Self { Self::shared(Arc::new(client)) }

    /// Create an engine around a client that is also used elsewhere.
    pub fn shared(client: Arc<C>) -> Self {
        Self {
            client,
            options: DownloadOptions::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: DownloadOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &DownloadOptions { &self.options }

    /// Download `resource` to its destination.
    ///
    /// Each attempt probes the length again, then continues from the temp
    /// files on disk. Failed attempts are retried under the stream policy.
    pub async fn download(&self, resource: &ResourceDescriptor) -> Result<Outcome> {
        self.options.validate()?;

        if tokio::fs::try_exists(&resource.destination).await? {
            info!(destination = %resource.destination.display(), "destination exists, skipping");
            ProgressReporter::new(self.options.on_progress.clone(), None).emit(FetchPhase::Skipped);
            return Ok(Outcome::AlreadyPresent);
        }

        info!(url = %resource.url, destination = %resource.destination.display(), "download started");
        let this = self;
        let outcome = self
            .options
            .stream_retry
            .run(SegmentPath::root(), move || this.attempt(resource))
            .await?;
        info!(destination = %resource.destination.display(), ?outcome, "download finished");
        Ok(outcome)
    }

    async fn attempt(&self, resource: &ResourceDescriptor) -> Result<Outcome> {
        ProgressReporter::new(self.options.on_progress.clone(), None).emit(FetchPhase::Probing);
        let total = self.probe(resource).await?;
        debug!(url = %resource.url, total, "probed content length");

        if let Some(parent) = resource.destination.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let layout = Checkpoint::new(resource.url.clone(), total, &self.options);
        checkpoint::reconcile(&resource.destination, &layout).await?;

        let staging = SegmentPath::root().temp_file(&resource.destination);
        let session = Arc::new(Session::new(
            Arc::clone(&self.client),
            resource.clone(),
            self.options.clone(),
            total,
        ));

        if total == 0 {
            tokio::fs::File::create(&staging).await?;
        } else {
            let part_size = self
                .options
                .part_size()
                .ok_or_else(|| Error::InvalidOptions("part size overflows".into()))?;
            let parts: Vec<Interval> = partition(1, total, part_size).collect();
            let children: Vec<(PathBuf, u64)> = parts
                .iter()
                .map(|part| (session.temp_file(&SegmentPath::root().child(part)), part.len()))
                .collect();

            let on_disk = bytes_on_disk(&resource.destination, &parts, self.options.chunk_size).await?;
            info!(total, on_disk, parts = parts.len(), "downloading parts");
            session.progress.start(on_disk);

            if !SegmentState::classify(file_len(&staging).await?, total).is_complete() {
                download_parts(Arc::clone(&session), &parts).await?;
                debug!(on_disk = session.progress.bytes(), "all parts on disk");
            }

            session.progress.emit(FetchPhase::Assembling);
            assemble(&staging, &children, self.options.read_buffer_size).await?;
        }

        tokio::fs::rename(&staging, &resource.destination).await?;
        checkpoint::clear(&resource.destination).await?;
        session.progress.emit(FetchPhase::Completed);
        Ok(Outcome::Downloaded { bytes: total })
    }

    /// Learn the content length with a plain `GET`, leaving the body unread.
    async fn probe(&self, resource: &ResourceDescriptor) -> Result<u64> {
        let response = self
            .client
            .get(&resource.url, &resource.headers, None)
            .await
            .map_err(Error::network)?;

        if !is_success(response.status) {
            return Err(Error::UnexpectedStatus {
                url:    resource.url.clone(),
                status: response.status,
            });
        }
        response.content_length.ok_or_else(|| Error::MissingContentLength {
            url: resource.url.clone(),
        })
    }
}
