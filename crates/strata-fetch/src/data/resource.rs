use std::path::{Path, PathBuf};
use std::sync::Arc;

/// One downloadable stream: where it lives, where it goes, and the headers
/// to send with every request for it.
///
/// # Examples
///
/// ```
/// use strata_fetch::ResourceDescriptor;
///
/// let resource = ResourceDescriptor::new("https://cdn.example.com/v.mp4", "out/v.mp4")
///     .user_agent("strata/0.1")
///     .bearer_token("secret");
/// assert_eq!(resource.headers.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDescriptor {
    pub url:         String,
    pub destination: PathBuf,
    /// Sent with every request, the content-length probe included.
    pub headers:     Arc<[(String, String)]>,
}

impl ResourceDescriptor {
    pub fn new(url: impl Into<String>, destination: impl Into<PathBuf>) -> Self {
        Self {
            url:         url.into(),
            destination: destination.into(),
            headers:     Arc::new([]),
        }
    }

    /// Add a header, replacing any earlier one with the same name
    /// (compared case-insensitively).
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let mut headers: Vec<_> = self
            .headers
            .iter()
            .filter(|(existing, _)| !existing.eq_ignore_ascii_case(&name))
            .cloned()
            .collect();
        headers.push((name, value.into()));
        self.headers = Arc::from(headers);
        self
    }

    #[must_use]
    pub fn headers<I, K, V>(self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        headers
            .into_iter()
            .fold(self, |resource, (name, value)| resource.header(name, value))
    }

    #[must_use]
    pub fn user_agent(self, user_agent: impl Into<String>) -> Self {
        self.header("User-Agent", user_agent)
    }

    /// Set `Authorization: Bearer <token>`.
    #[must_use]
    pub fn bearer_token(self, token: impl AsRef<str>) -> Self {
        self.header("Authorization", format!("Bearer {}", token.as_ref()))
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn destination(&self) -> &Path { &self.destination }
}
