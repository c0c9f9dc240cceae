use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

use super::interval::Interval;

/// Position of a segment in the part/chunk hierarchy.
///
/// A path is the list of 1-based sibling ordinals walked from the root:
/// `[]` is the root aggregate, `[2]` is part 2 and `[2, 7]` is chunk 7 of
/// part 2. Temp file names are derived from it by [`SegmentPath::temp_file`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SegmentPath(Vec<u64>);

impl SegmentPath {
    pub fn root() -> Self { Self::default() }

    /// Path of `interval` as a child of this segment.
    pub fn child(&self, interval: &Interval) -> Self {
        let mut ordinals = self.0.clone();
        ordinals.push(interval.ordinal());
        Self(ordinals)
    }

    pub fn depth(&self) -> usize { self.0.len() }

    pub fn ordinals(&self) -> &[u64] { &self.0 }

    /// Temp file holding this segment's bytes for `destination`.
    ///
    /// `video.mp4` yields `video.mp4.part` for the root, `video.mp4.part.2`
    /// for part 2 and `video.mp4.part.2.7` for its chunk 7. Levels are dot
    /// separated so that part 1 chunk 23 and part 12 chunk 3 never share a name.
    pub fn temp_file(&self, destination: &Path) -> PathBuf {
        let mut name = OsString::from(destination.as_os_str());
        name.push(".part");
        for ordinal in &self.0 {
            name.push(format!(".{ordinal}"));
        }
        PathBuf::from(name)
    }
}

impl fmt::Display for SegmentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.as_slice() {
            [] => write!(f, "stream"),
            [part] => write!(f, "part {part}"),
            [part, chunk] => write!(f, "part {part} chunk {chunk}"),
            ordinals => {
                let joined: Vec<String> = ordinals.iter().map(u64::to_string).collect();
                write!(f, "segment {}", joined.join("."))
            }
        }
    }
}

/// Where a segment's temp file stands relative to its interval.
///
/// The `Concatenated` stage has no variant: once a segment's bytes are in its
/// parent, its file is gone and the parent is the one that is complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentState {
    NotStarted,
    InProgress { on_disk: u64 },
    Complete,
}

impl SegmentState {
    /// Classify a temp file of length `on_disk` (`None` if absent) for an
    /// interval of `expected` bytes.
    pub fn classify(on_disk: Option<u64>, expected: u64) -> Self {
        match on_disk {
            None => SegmentState::NotStarted,
            Some(len) if len >= expected => SegmentState::Complete,
            Some(len) => SegmentState::InProgress { on_disk: len },
        }
    }

    /// Bytes of the interval already held on disk.
    pub fn on_disk(&self, expected: u64) -> u64 {
        match self {
            SegmentState::NotStarted => 0,
            SegmentState::InProgress { on_disk } => *on_disk,
            SegmentState::Complete => expected,
        }
    }

    pub fn is_complete(&self) -> bool { matches!(self, SegmentState::Complete) }
}
