use std::fmt;

/// A contiguous byte range of the remote resource.
///
/// Bounds are 1-based and inclusive: the first byte of the resource is `1`
/// and an interval covering the whole of a 10-byte resource is `1..=10`.
/// Conversion to the 0-based wire form happens in [`Interval::byte_range`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Interval {
    /// Position among its siblings (0-based).
    pub index: u64,
    /// First byte (1-based, inclusive).
    pub start: u64,
    /// Last byte (1-based, inclusive).
    pub end:   u64,
}

impl Interval {
    pub const fn new(index: u64, start: u64, end: u64) -> Self { Self { index, start, end } }

    /// Number of bytes covered.
    pub const fn len(&self) -> u64 { self.end - self.start + 1 }

    /// Always `false`: an interval covers at least one byte.
    pub const fn is_empty(&self) -> bool { false }

    /// 1-based sibling position, as used in temp file names and logs.
    pub const fn ordinal(&self) -> u64 { self.index + 1 }

    /// Wire range for the bytes of this interval not yet on disk.
    ///
    /// `on_disk` is the number of leading bytes already stored; the request
    /// starts right after them.
    pub const fn byte_range(&self, on_disk: u64) -> ByteRange {
        ByteRange {
            first: self.start - 1 + on_disk,
            last:  self.end - 1,
        }
    }
}

/// A single HTTP byte range, 0-based and inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ByteRange {
    pub first: u64,
    pub last:  u64,
}

impl ByteRange {
    pub const fn len(&self) -> u64 { self.last - self.first + 1 }

    pub const fn is_empty(&self) -> bool { false }

    /// Returns `true` if the two ranges share at least one byte.
    pub const fn overlaps(&self, other: &ByteRange) -> bool {
        self.first <= other.last && other.first <= self.last
    }
}

/// Formats as the value of a `Range` header, e.g. `bytes=0-999`.
impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bytes={}-{}", self.first, self.last)
    }
}
