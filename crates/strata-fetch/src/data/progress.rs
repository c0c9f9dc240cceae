use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Phases of a stream download.
///
/// A download moves Probing → Downloading → Assembling → Completed. A stream
/// whose destination already exists reports `Skipped` and nothing else.
/// Retries of the whole stream return to `Probing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchPhase {
    /// Asking the server for the content length.
    #[default]
    Probing,
    /// Range requests are running.
    Downloading,
    /// Every part is on disk; the root aggregate is being built.
    Assembling,
    Completed,
    /// The destination already existed.
    Skipped,
}

impl fmt::Display for FetchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchPhase::Probing => write!(f, "Probing"),
            FetchPhase::Downloading => write!(f, "Downloading"),
            FetchPhase::Assembling => write!(f, "Assembling"),
            FetchPhase::Completed => write!(f, "Completed"),
            FetchPhase::Skipped => write!(f, "Skipped"),
        }
    }
}

/// Snapshot passed to progress callbacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    pub phase: FetchPhase,

    /// Bytes of the stream held on disk, counting what a previous run left
    /// behind as well as what this run fetched.
    pub bytes_on_disk: u64,

    /// Content length, once the probe has answered.
    pub total_bytes: Option<u64>,
}

impl Progress {
    pub fn percentage(&self) -> Option<f32> {
        self.total_bytes.map(|total| {
            if total == 0 {
                100.0
            } else {
                (self.bytes_on_disk as f32 / total as f32) * 100.0
            }
        })
    }
}

pub type ProgressCallback = Arc<dyn Fn(&Progress) + Send + Sync>;

/// Shared counter behind the progress callback.
///
/// Range fetchers running on different tasks add to it concurrently.
pub(crate) struct ProgressReporter {
    callback: Option<ProgressCallback>,
    total:    Option<u64>,
    bytes:    AtomicU64,
}

impl ProgressReporter {
    pub(crate) fn new(callback: Option<ProgressCallback>, total: Option<u64>) -> Self {
        Self {
            callback,
            total,
            bytes: AtomicU64::new(0),
        }
    }

    /// Reset the counter to what is already on disk and announce the download.
    pub(crate) fn start(&self, on_disk: u64) {
        self.bytes.store(on_disk, Ordering::Relaxed);
        self.emit(FetchPhase::Downloading);
    }

    pub(crate) fn advance(&self, bytes: u64) {
        self.bytes.fetch_add(bytes, Ordering::Relaxed);
        self.emit(FetchPhase::Downloading);
    }

    pub(crate) fn emit(&self, phase: FetchPhase) {
        if let Some(ref callback) = self.callback {
            callback(&Progress {
                phase,
                bytes_on_disk: self.bytes.load(Ordering::Relaxed),
                total_bytes: self.total,
            });
        }
    }

    pub(crate) fn bytes(&self) -> u64 { self.bytes.load(Ordering::Relaxed) }
}
