//! Resumable, concurrent downloads of one large HTTP resource.
//!
//! # Architecture
//!
//! This crate follows the three-layer pattern:
//! - [`data`] - Immutable descriptors, intervals, options and progress types
//! - [`core`] - Pure transformations: partitioning, retry policy, status rules
//! - [`effects`] - I/O: the HTTP client seam, range fetching, assembly and the engine
//!
//! # Download model
//!
//! A stream of `content_length` bytes is split into *parts*, and every part
//! into fixed-size *chunks*. Each chunk is fetched with one HTTP `Range`
//! request and appended to its own temp file. Completed chunks are
//! concatenated into their part's temp file, completed parts into the root
//! aggregate, which is finally renamed onto the destination.
//!
//! Every temp file only ever grows, and child files are removed only after
//! their bytes were appended to the parent. A [`Checkpoint`] next to the root
//! aggregate records the layout the files were cut with. Running the engine
//! again with the same inputs therefore resumes from whatever is on disk, and
//! a changed layout starts over instead of misreading old files.

pub mod core;
pub mod data;
pub mod effects;
mod error;

pub use self::core::{Partition, RetryPolicy, accepts_range_status, partition};
pub use data::{
    ByteRange, Checkpoint, DownloadOptions, FetchPhase, Interval, Progress, ProgressCallback,
    ResourceDescriptor, SegmentPath, SegmentState,
};
pub use effects::{
    BoxStream, HttpClient, HttpResponse, InFlightLimiter, Outcome, RangeFetcher,
    StreamDownloadEngine,
};

#[cfg(feature = "reqwest")]
pub use effects::ReqwestClient;

pub use error::{Error, Result};
