use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore, SemaphorePermit};

use crate::error::{Error, Result};

/// The bounded worker pool of one stream download.
///
/// Two independent bounds apply: how many parts run their chunk phase at
/// once, and how many range requests are open at once across all parts.
/// A part holds its slot for its whole chunk phase, retries included; a
/// request holds its slot only while it is connected.
#[derive(Debug, Clone)]
pub struct InFlightLimiter {
    parts:    Arc<Semaphore>,
    requests: Arc<Semaphore>,
}

impl InFlightLimiter {
    pub fn new(max_parts: usize, max_requests: usize) -> Self {
        Self {
            parts:    Arc::new(Semaphore::new(max_parts)),
            requests: Arc::new(Semaphore::new(max_requests)),
        }
    }

    /// Wait for a part slot.
    pub async fn part(&self) -> Result<OwnedSemaphorePermit> {
        Arc::clone(&self.parts)
            .acquire_owned()
            .await
            .map_err(|_| Error::InvalidState("part limiter closed".into()))
    }

    /// Wait for a request slot.
    pub async fn request(&self) -> Result<SemaphorePermit<'_>> {
        self.requests
            .acquire()
            .await
            .map_err(|_| Error::InvalidState("request limiter closed".into()))
    }

    /// Request slots currently free.
    pub fn available_requests(&self) -> usize { self.requests.available_permits() }

    /// Part slots currently free.
    pub fn available_parts(&self) -> usize { self.parts.available_permits() }
}
