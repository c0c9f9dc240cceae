use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use home::home_dir;
use serde::Deserialize;
use strata_fetch::{DownloadOptions, RetryPolicy};

use crate::cli::App;

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:66.0) Gecko/20100101 Firefox/66.0";

/// Contents of `config.toml`. Every key is optional.
///
/// ```toml
/// user_agent = "strata/0.1"
/// proxies = ["http://127.0.0.1:8080"]
/// connect_timeout_secs = 10
///
/// [headers]
/// Referer = "https://example.com"
///
/// [download]
/// chunk_size = 524288
/// chunks_per_part = 10
///
/// [download.chunk_retry]
/// max_retries = 5
/// backoff_secs = 3
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub user_agent:           Option<String>,
    pub headers:              BTreeMap<String, String>,
    pub proxies:              Vec<String>,
    pub connect_timeout_secs: Option<u64>,
    pub download:             DownloadSection,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DownloadSection {
    pub chunk_size:           Option<u64>,
    pub chunks_per_part:      Option<u64>,
    pub max_concurrent_parts: Option<usize>,
    pub max_in_flight:        Option<usize>,
    pub read_buffer_size:     Option<usize>,
    pub chunk_retry:          Option<RetrySection>,
    pub part_retry:           Option<RetrySection>,
    pub stream_retry:         Option<RetrySection>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetrySection {
    pub max_retries:  Option<u32>,
    pub backoff_secs: Option<u64>,
}

impl RetrySection {
    fn apply(self, base: RetryPolicy) -> RetryPolicy {
        RetryPolicy::new(
            self.max_retries.unwrap_or(base.max_retries),
            self.backoff_secs.map(Duration::from_secs).unwrap_or(base.backoff),
        )
    }
}

impl FileConfig {
    /// Load the config named by `--config`, else `$STRATA_CONFIG`, else
    /// `~/.strata/config.toml`. Only the last one may be missing.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let env_path = env::var_os("STRATA_CONFIG").map(PathBuf::from);
        match explicit.map(Path::to_path_buf).or(env_path) {
            Some(path) => Self::read(&path),
            None => match default_path() {
                Some(path) if path.is_file() => Self::read(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn read(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("Failed to parse config {}", path.display()))
    }

    pub fn parse(raw: &str) -> Result<Self> { Ok(toml::from_str(raw)?) }

    /// Download options from the defaults, then this file, then the flags.
    pub fn options(&self, app: &App) -> DownloadOptions {
        let file = &self.download;
        let mut options = DownloadOptions::default();

        if let Some(chunk_size) = app.chunk_size.or(file.chunk_size) {
            options = options.chunk_size(chunk_size);
        }
        if let Some(chunks_per_part) = app.chunks_per_part.or(file.chunks_per_part) {
            options = options.chunks_per_part(chunks_per_part);
        }
        if let Some(parts) = app.parallel_parts.or(file.max_concurrent_parts) {
            options = options.max_concurrent_parts(parts);
        }
        if let Some(requests) = app.max_in_flight.or(file.max_in_flight) {
            options = options.max_in_flight(requests);
        }
        if let Some(size) = file.read_buffer_size {
            options = options.read_buffer_size(size);
        }
        if let Some(retry) = file.chunk_retry {
            options.chunk_retry = retry.apply(options.chunk_retry);
        }
        if let Some(retry) = file.part_retry {
            options.part_retry = retry.apply(options.part_retry);
        }
        if let Some(retry) = file.stream_retry {
            options.stream_retry = retry.apply(options.stream_retry);
        }
        options
    }

    /// `--user-agent`, else the file's, else a desktop browser's.
    pub fn user_agent<'a>(&'a self, app: &'a App) -> &'a str {
        app.user_agent
            .as_deref()
            .or(self.user_agent.as_deref())
            .unwrap_or(DEFAULT_USER_AGENT)
    }
}

fn default_path() -> Option<PathBuf> { home_dir().map(|home| home.join(".strata").join("config.toml")) }
