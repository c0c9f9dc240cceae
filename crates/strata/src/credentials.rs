use std::path::Path;

use anyhow::{Context, Result};
use strata_fetch::ResourceDescriptor;

/// Read the `access_token` cookie from a `name=value; name=value` cookie file.
pub fn access_token(cookies_file: &Path) -> Result<String> {
    let cookies = std::fs::read_to_string(cookies_file)
        .with_context(|| format!("Failed to read cookies file {}", cookies_file.display()))?;
    find_cookie(&cookies, "access_token")
        .map(str::to_string)
        .with_context(|| format!("No access_token in {}", cookies_file.display()))
}

fn find_cookie<'a>(cookies: &'a str, name: &str) -> Option<&'a str> {
    cookies
        .split(';')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}

/// Send `token` as both bearer headers the course CDN checks.
pub fn authorize(resource: ResourceDescriptor, token: &str) -> ResourceDescriptor {
    resource
        .bearer_token(token)
        .header("X-Udemy-Authorization", format!("Bearer {token}"))
}
