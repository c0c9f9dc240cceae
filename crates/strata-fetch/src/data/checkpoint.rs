use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::options::DownloadOptions;
use super::segment::SegmentPath;

/// The layout that produced the temp files of a download.
///
/// Segment files only name their position in the hierarchy, so the bytes in
/// `video.mp4.part.1.2` mean something only for the resource length and
/// sizes they were cut with. The checkpoint is stored next to the root
/// aggregate and leftovers are resumed only while it still matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub url:             String,
    pub content_length:  u64,
    pub chunk_size:      u64,
    pub chunks_per_part: u64,
}

impl Checkpoint {
    pub fn new(url: impl Into<String>, content_length: u64, options: &DownloadOptions) -> Self {
        Self {
            url: url.into(),
            content_length,
            chunk_size: options.chunk_size,
            chunks_per_part: options.chunks_per_part,
        }
    }

    /// `video.mp4.part.json` for `video.mp4`.
    pub fn path(destination: &Path) -> PathBuf {
        let mut name = SegmentPath::root().temp_file(destination).into_os_string();
        name.push(".json");
        PathBuf::from(name)
    }
}
