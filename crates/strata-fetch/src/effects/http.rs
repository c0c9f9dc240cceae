use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use futures_util::Stream;

use crate::data::ByteRange;

/// A boxed stream type for HTTP response bodies.
///
/// The stream yields `Result<Bytes, E>` where E is the error type from the HTTP client.
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = T> + Send + 'a>>;

/// What the engine needs from a response: status, declared length and body.
pub struct HttpResponse<E> {
    pub status:         u16,
    /// Value of `Content-Length`, if declared.
    pub content_length: Option<u64>,
    pub body:           BoxStream<'static, Result<Bytes, E>>,
}

impl<E> std::fmt::Debug for HttpResponse<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// Asynchronous HTTP client abstraction.
///
/// The engine issues nothing but `GET`s: one without a range to learn the
/// content length, then one per chunk with a single-range `Range` header.
/// Implementations follow redirects and apply timeouts on their own.
///
/// # Implementations
///
/// - [`ReqwestClient`]: Production implementation using `reqwest`
/// - In-memory doubles in tests
pub trait HttpClient: Send + Sync {
    /// Error type for HTTP operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Send a `GET` for `url` with `headers`, plus `Range: <range>` when given.
    ///
    /// Any status is returned as a response; only transport failures are
    /// errors. Body read failures surface as error items of the body stream.
    fn get(
        &self,
        url: &str,
        headers: &[(String, String)],
        range: Option<ByteRange>,
    ) -> impl Future<Output = Result<HttpResponse<Self::Error>, Self::Error>> + Send;
}

#[cfg(feature = "reqwest")]
mod reqwest_impl {
    use futures_util::TryStreamExt;
    use reqwest::header::RANGE;

    use super::*;
    use crate::error::{Error, Result};

    /// Production HTTP client implementation using reqwest.
    #[derive(Debug, Clone)]
    pub struct ReqwestClient {
        client: reqwest::Client,
    }

    impl ReqwestClient {
        /// Create a new ReqwestClient with default configuration.
        pub fn new() -> Result<Self> {
            let client = reqwest::Client::builder().build().map_err(Error::network)?;
            Ok(Self { client })
        }

        /// Wrap an already configured client (proxies, timeouts, TLS).
        pub fn from_client(client: reqwest::Client) -> Self { Self { client } }
    }

    impl HttpClient for ReqwestClient {
        type Error = reqwest::Error;

        async fn get(
            &self,
            url: &str,
            headers: &[(String, String)],
            range: Option<ByteRange>,
        ) -> std::result::Result<HttpResponse<Self::Error>, Self::Error> {
            let mut request = self.client.get(url);

            for (key, value) in headers {
                request = request.header(key.as_str(), value.as_str());
            }
            if let Some(range) = range {
                request = request.header(RANGE, range.to_string());
            }

            let response = request.send().await?;
            let status = response.status().as_u16();
            let content_length = response.content_length();
            let body = response.bytes_stream().map_ok(Bytes::from);

            Ok(HttpResponse {
                status,
                content_length,
                body: Box::pin(body),
            })
        }
    }
}

#[cfg(feature = "reqwest")]
pub use reqwest_impl::ReqwestClient;
