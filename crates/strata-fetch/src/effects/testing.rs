//! In-memory HTTP double for unit tests.

use std::sync::Mutex;

use bytes::Bytes;
use futures_util::stream;

use super::http::{HttpClient, HttpResponse};
use crate::data::ByteRange;

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub(crate) struct MemoryError(pub String);

/// Serves one resource from memory and records every request.
pub(crate) struct MemoryClient {
    data:         Bytes,
    frame:        usize,
    status:       Option<u16>,
    ignore_range: bool,
    truncate_to:  Option<usize>,
    requests:     Mutex<Vec<Option<ByteRange>>>,
}

impl MemoryClient {
    pub(crate) fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data:         data.into(),
            frame:        7,
            status:       None,
            ignore_range: false,
            truncate_to:  None,
            requests:     Mutex::new(Vec::new()),
        }
    }

    /// Answer every request with `status`.
    pub(crate) fn status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Answer range requests with the whole body and `200 OK`.
    pub(crate) fn ignoring_ranges(mut self) -> Self {
        self.ignore_range = true;
        self
    }

    /// Cut every body after `len` bytes.
    pub(crate) fn truncating(mut self, len: usize) -> Self {
        self.truncate_to = Some(len);
        self
    }

    pub(crate) fn requests(&self) -> Vec<Option<ByteRange>> { self.requests.lock().unwrap().clone() }

    fn body(&self, range: Option<ByteRange>) -> (u16, Bytes) {
        match range {
            Some(range) if !self.ignore_range => {
                let first = range.first as usize;
                let last = (range.last as usize).min(self.data.len().saturating_sub(1));
                (206, self.data.slice(first..=last))
            }
            _ => (200, self.data.clone()),
        }
    }
}

impl HttpClient for MemoryClient {
    type Error = MemoryError;

    async fn get(
        &self,
        _url: &str,
        _headers: &[(String, String)],
        range: Option<ByteRange>,
    ) -> Result<HttpResponse<Self::Error>, Self::Error> {
        self.requests.lock().unwrap().push(range);

        let (status, mut body) = self.body(range);
        let status = self.status.unwrap_or(status);
        let content_length = Some(body.len() as u64);
        if let Some(len) = self.truncate_to {
            body.truncate(len);
        }

        let frames: Vec<Result<Bytes, MemoryError>> =
            body.chunks(self.frame).map(|frame| Ok(Bytes::copy_from_slice(frame))).collect();

        Ok(HttpResponse {
            status,
            content_length,
            body: Box::pin(stream::iter(frames)),
        })
    }
}

/// `len` bytes of a repeating, position-dependent pattern.
pub(crate) fn pattern(len: usize) -> Vec<u8> { (0..len).map(|i| (i % 251) as u8).collect() }
