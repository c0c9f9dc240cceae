use std::path::PathBuf;
use std::sync::Arc;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::assemble::assemble;
use super::fs::file_len;
use super::http::HttpClient;
use super::session::{Session, join_all};
use crate::core::partition;
use crate::data::{Interval, SegmentPath, SegmentState};
use crate::error::{Error, Result};

/// Download one part as a set of concurrent chunk fetches, then concatenate
/// the chunk files into the part file.
///
/// Every chunk is retried on its own under the chunk policy. If a chunk
/// exhausts its retries `cancel` is fired, the other chunks of the part stop
/// early and the error is returned to the part-level retry. `cancel` should
/// be a fresh child token for every call.
pub(crate) async fn download_chunks<C>(
    session: Arc<Session<C>>,
    part: Interval,
    cancel: CancellationToken,
) -> Result<()>
where
    C: HttpClient + 'static,
{
    let part_path = SegmentPath::root().child(&part);
    let part_file = session.temp_file(&part_path);

    let chunks: Vec<Interval> = partition(part.start, part.end, session.options.chunk_size).collect();
    let children: Vec<(PathBuf, u64)> = chunks
        .iter()
        .map(|chunk| (session.temp_file(&part_path.child(chunk)), chunk.len()))
        .collect();

    if SegmentState::classify(file_len(&part_file).await?, part.len()).is_complete() {
        debug!(segment = %part_path, "part already assembled");
        return assemble(&part_file, &children, session.options.read_buffer_size).await;
    }

    let mut tasks = JoinSet::new();
    for (chunk, (path, _)) in chunks.into_iter().zip(&children) {
        let session = Arc::clone(&session);
        let path = path.clone();
        let label = part_path.child(&chunk);
        let cancel = cancel.clone();

        tasks.spawn(async move {
            let policy = session.options.chunk_retry;
            let (session, chunk, path, cancel) = (&session, &chunk, &path, &cancel);
            let fetched = policy
                .run_until(cancel, &label, move || async move {
                    session.fetcher(cancel).fetch(chunk, path).await
                })
                .await?;
            debug!(segment = %label, fetched, "chunk done");
            Ok::<_, Error>(())
        });
    }
    join_all(&mut tasks, &cancel).await?;

    assemble(&part_file, &children, session.options.read_buffer_size).await
}
