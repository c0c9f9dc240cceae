//! Immutable data types for nested range downloads.
//!
//! This module contains the resource descriptor handed in by the caller, the
//! interval and segment naming types shared by every nesting level, the
//! checkpoint that ties temp files to their layout, the download options and
//! the progress types. Nothing here performs I/O.

pub mod checkpoint;
pub mod interval;
pub mod options;
pub mod progress;
pub mod resource;
pub mod segment;

pub use checkpoint::Checkpoint;
pub use interval::{ByteRange, Interval};
pub use options::DownloadOptions;
pub use progress::{FetchPhase, Progress, ProgressCallback};
pub(crate) use progress::ProgressReporter;
pub use resource::ResourceDescriptor;
pub use segment::{SegmentPath, SegmentState};
