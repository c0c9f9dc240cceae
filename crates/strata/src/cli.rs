use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;

#[derive(Clone, Debug, Parser)]
#[command(name = "strata", version = env!("CARGO_PKG_VERSION"), about, long_about = None)]
pub struct App {
    /// URL of the resource to download.
    pub url: String,

    /// Destination file.
    #[arg(short, long, value_name = "PATH")]
    pub output: PathBuf,

    /// Extra request header, sent with every request (repeatable).
    #[arg(short = 'H', long = "header", value_name = "NAME:VALUE", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// Cookie file to read the `access_token` from.
    #[arg(short = 'k', long, value_name = "PATH")]
    pub cookies_file: Option<PathBuf>,

    #[arg(long, value_name = "UA")]
    pub user_agent: Option<String>,

    /// Config file [default: $STRATA_CONFIG or ~/.strata/config.toml]
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[arg(long, value_name = "BYTES")]
    pub chunk_size: Option<u64>,

    #[arg(long, value_name = "N")]
    pub chunks_per_part: Option<u64>,

    /// Parts downloaded at the same time.
    #[arg(long, value_name = "N")]
    pub parallel_parts: Option<usize>,

    /// Range requests open at the same time.
    #[arg(long, value_name = "N")]
    pub max_in_flight: Option<usize>,

    /// Hide the progress bar.
    #[arg(short, long)]
    pub quiet: bool,

    /// Log debug output.
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,
}

fn parse_header(raw: &str) -> Result<(String, String)> {
    let (name, value) = raw
        .split_once(':')
        .with_context(|| format!("header `{raw}` is not NAME:VALUE"))?;
    let name = name.trim();
    if name.is_empty() {
        bail!("header `{raw}` has an empty name");
    }
    Ok((name.to_string(), value.trim().to_string()))
}
