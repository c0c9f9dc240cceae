use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::info;

use super::chunks::download_chunks;
use super::http::HttpClient;
use super::session::{Session, join_all};
use crate::data::{Interval, SegmentPath};
use crate::error::{Error, Result};

/// Download every part into its part file.
///
/// Parts run concurrently up to `max_concurrent_parts`; a part keeps its
/// slot across its own retries. A part that exhausts the part policy fires
/// the session token, which stops the remaining parts, and fails the attempt.
pub(crate) async fn download_parts<C>(session: Arc<Session<C>>, parts: &[Interval]) -> Result<()>
where
    C: HttpClient + 'static,
{
    let mut tasks = JoinSet::new();
    for &part in parts {
        let session = Arc::clone(&session);

        tasks.spawn(async move {
            let _slot = tokio::select! {
                biased;
                () = session.cancel.cancelled() => return Err(Error::Cancelled),
                slot = session.limiter.part() => slot?,
            };
            let label = SegmentPath::root().child(&part);
            info!(segment = %label, start = part.start, end = part.end, "part started");

            let policy = session.options.part_retry;
            let shared = &session;
            policy
                .run_until(&shared.cancel, &label, move || {
                    download_chunks(Arc::clone(shared), part, shared.cancel.child_token())
                })
                .await?;

            info!(segment = %label, "part finished");
            Ok::<_, Error>(())
        });
    }
    join_all(&mut tasks, &session.cancel).await?;
    Ok(())
}
