//! I/O for nested range downloads.
//!
//! Everything that touches the network or the filesystem lives here: the
//! HTTP client seam, the range fetcher, segment assembly, the part and chunk
//! fan-out, and the engine that ties them together.

mod assemble;
mod checkpoint;
mod chunks;
mod engine;
mod fs;
mod http;
mod layout;
mod limiter;
mod parts;
mod range_fetcher;
mod session;
#[cfg(test)]
pub(crate) mod testing;

pub use engine::{Outcome, StreamDownloadEngine};
pub use http::{BoxStream, HttpClient, HttpResponse};
pub use limiter::InFlightLimiter;
pub use range_fetcher::RangeFetcher;

#[cfg(feature = "reqwest")]
pub use http::ReqwestClient;
