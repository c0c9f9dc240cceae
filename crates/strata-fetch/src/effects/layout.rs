use std::path::Path;

use super::fs::file_len;
use crate::core::partition;
use crate::data::{Interval, SegmentPath, SegmentState};
use crate::error::Result;

/// Bytes of the stream already held in temp files under `destination`.
///
/// A complete root aggregate counts in full. Otherwise every part counts
/// its own file when that is complete and the sum of its chunk files when
/// not, each capped at its interval length.
pub(crate) async fn bytes_on_disk(destination: &Path, parts: &[Interval], chunk_size: u64) -> Result<u64> {
    let root = SegmentPath::root();
    let total: u64 = parts.iter().map(Interval::len).sum();
    if SegmentState::classify(file_len(&root.temp_file(destination)).await?, total).is_complete() {
        return Ok(total);
    }

    let mut bytes = 0;
    for part in parts {
        let part_path = root.child(part);
        let state = SegmentState::classify(file_len(&part_path.temp_file(destination)).await?, part.len());
        if state.is_complete() {
            bytes += part.len();
            continue;
        }

        for chunk in partition(part.start, part.end, chunk_size) {
            let on_disk = file_len(&part_path.child(&chunk).temp_file(destination)).await?;
            bytes += SegmentState::classify(on_disk, chunk.len()).on_disk(chunk.len());
        }
    }
    Ok(bytes)
}
