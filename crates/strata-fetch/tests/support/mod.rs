//! Scriptable in-memory HTTP server shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use bytes::Bytes;
use futures_util::{StreamExt, stream};
use strata_fetch::{ByteRange, HttpClient, HttpResponse};

#[derive(Debug)]
pub struct TestError(pub String);

impl std::fmt::Display for TestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "{}", self.0) }
}

impl std::error::Error for TestError {}

/// One request as the server saw it.
#[derive(Debug, Clone)]
pub struct Request {
    pub range:   Option<ByteRange>,
    pub headers: Vec<(String, String)>,
}

#[derive(Debug, Clone, Copy)]
enum Fault {
    Status(u16),
    Truncate(usize),
    Disconnect,
}

/// When a range request arrived and when its body was dropped.
#[derive(Debug, Clone, Copy)]
struct Span {
    first:  u64,
    opened: Instant,
    closed: Option<Instant>,
}

#[derive(Default)]
struct Counters {
    in_flight: AtomicUsize,
    peak:      AtomicUsize,
    spans:     Mutex<Vec<Span>>,
}

/// Leaves the in-flight count when the response body is dropped.
struct InFlight {
    counters: Arc<Counters>,
    span:     Option<usize>,
}

impl InFlight {
    fn enter(counters: &Arc<Counters>, first: Option<u64>) -> Self {
        let now = counters.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        counters.peak.fetch_max(now, Ordering::SeqCst);
        let span = first.map(|first| {
            let mut spans = counters.spans.lock().unwrap();
            spans.push(Span {
                first,
                opened: Instant::now(),
                closed: None,
            });
            spans.len() - 1
        });
        Self {
            counters: Arc::clone(counters),
            span,
        }
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if let Some(index) = self.span {
            self.counters.spans.lock().unwrap()[index].closed = Some(Instant::now());
        }
        self.counters.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Serves one resource from memory.
///
/// Faults and delays are keyed by the first wire byte of a range request;
/// `None` addresses the content-length probe.
#[derive(Clone)]
pub struct TestServer {
    data:     Bytes,
    frame:    usize,
    delay:    Duration,
    faults:   Arc<Mutex<HashMap<Option<u64>, Vec<Fault>>>>,
    delays:   Arc<Mutex<HashMap<u64, Duration>>>,
    log:      Arc<Mutex<Vec<Request>>>,
    counters: Arc<Counters>,
}

impl TestServer {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data:     Bytes::from(data),
            frame:    97,
            delay:    Duration::ZERO,
            faults:   Arc::default(),
            delays:   Arc::default(),
            log:      Arc::default(),
            counters: Arc::default(),
        }
    }

    /// Hold every response for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Hold the response to the range starting at `first` for `delay`.
    pub fn delay_range(&self, first: u64, delay: Duration) {
        self.delays.lock().unwrap().insert(first, delay);
    }

    /// Answer the next `times` requests starting at `first` with `status`.
    pub fn fail_next(&self, first: Option<u64>, status: u16, times: usize) {
        self.push_faults(first, Fault::Status(status), times);
    }

    /// Cut the next `times` bodies starting at `first` after `keep` bytes.
    pub fn truncate_next(&self, first: u64, keep: usize, times: usize) {
        self.push_faults(Some(first), Fault::Truncate(keep), times);
    }

    /// Fail the next `times` requests starting at `first` before any response.
    pub fn disconnect_next(&self, first: u64, times: usize) {
        self.push_faults(Some(first), Fault::Disconnect, times);
    }

    fn push_faults(&self, first: Option<u64>, fault: Fault, times: usize) {
        let mut faults = self.faults.lock().unwrap();
        faults.entry(first).or_default().extend(std::iter::repeat_n(fault, times));
    }

    fn take_fault(&self, first: Option<u64>) -> Option<Fault> {
        let mut faults = self.faults.lock().unwrap();
        let queue = faults.get_mut(&first)?;
        if queue.is_empty() { None } else { Some(queue.remove(0)) }
    }

    pub fn requests(&self) -> Vec<Request> { self.log.lock().unwrap().clone() }

    /// Ranges of all range requests, in arrival order.
    pub fn ranges(&self) -> Vec<ByteRange> { self.requests().into_iter().filter_map(|r| r.range).collect() }

    pub fn probes(&self) -> usize { self.requests().iter().filter(|r| r.range.is_none()).count() }

    /// Most range and probe requests ever open at the same time.
    pub fn peak_in_flight(&self) -> usize { self.counters.peak.load(Ordering::SeqCst) }

    /// Range requests whose body is still open.
    pub fn in_flight(&self) -> usize { self.counters.in_flight.load(Ordering::SeqCst) }

    /// Most parts of `part_size` bytes that were busy at the same time.
    ///
    /// A part counts as busy from the arrival of its first range request to
    /// the end of its last response body.
    pub fn peak_parts(&self, part_size: u64) -> usize {
        let mut busy: HashMap<u64, (Instant, Instant)> = HashMap::new();
        for span in self.counters.spans.lock().unwrap().iter() {
            let closed = span.closed.unwrap_or_else(Instant::now);
            busy.entry(span.first / part_size)
                .and_modify(|(opened, last)| {
                    *opened = (*opened).min(span.opened);
                    *last = (*last).max(closed);
                })
                .or_insert((span.opened, closed));
        }

        // a part that ends as another starts does not overlap it
        let mut events: Vec<(Instant, i32)> =
            busy.values().flat_map(|&(opened, closed)| [(opened, 1), (closed, -1)]).collect();
        events.sort();
        let (mut now, mut peak) = (0, 0);
        for (_, delta) in events {
            now += delta;
            peak = peak.max(now);
        }
        peak as usize
    }

    pub fn reset_log(&self) { self.log.lock().unwrap().clear(); }
}

impl HttpClient for TestServer {
    type Error = TestError;

    async fn get(
        &self,
        _url: &str,
        headers: &[(String, String)],
        range: Option<ByteRange>,
    ) -> Result<HttpResponse<Self::Error>, Self::Error> {
        self.log.lock().unwrap().push(Request {
            range,
            headers: headers.to_vec(),
        });
        let first = range.map(|r| r.first);
        let guard = InFlight::enter(&self.counters, first);

        let delay = first
            .and_then(|first| self.delays.lock().unwrap().get(&first).copied())
            .unwrap_or(self.delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let fault = self.take_fault(first);
        if let Some(Fault::Disconnect) = fault {
            return Err(TestError("connection reset".into()));
        }

        let (status, mut body) = match range {
            Some(range) => {
                let last = (range.last as usize).min(self.data.len() - 1);
                (206, self.data.slice(range.first as usize..=last))
            }
            None => (200, self.data.clone()),
        };
        let content_length = Some(body.len() as u64);
        let status = match fault {
            Some(Fault::Status(status)) => status,
            Some(Fault::Truncate(keep)) => {
                body.truncate(keep);
                status
            }
            _ => status,
        };

        let frames: Vec<Result<Bytes, TestError>> =
            body.chunks(self.frame).map(|frame| Ok(Bytes::copy_from_slice(frame))).collect();
        let body = stream::iter(frames).map(move |frame| {
            let _held = &guard;
            frame
        });

        Ok(HttpResponse {
            status,
            content_length,
            body: Box::pin(body),
        })
    }
}

/// `len` bytes that differ at every offset within a 251-byte window.
pub fn pattern(len: usize) -> Vec<u8> { (0..len).map(|i| (i % 251) as u8).collect() }

/// Temp file name next to `destination`, e.g. `temp(dest, ".part.1.2")`.
pub fn temp(destination: &Path, suffix: &str) -> PathBuf {
    let mut name = destination.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

/// Names of all entries in `dir`, sorted.
pub fn entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

pub fn range(first: u64, last: u64) -> ByteRange { ByteRange { first, last } }
