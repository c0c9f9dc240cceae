use std::ffi::{OsStr, OsString};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::fs::remove_if_exists;
use crate::data::{Checkpoint, SegmentPath};
use crate::error::{Error, Result};

impl Checkpoint {
    /// The checkpoint saved for `destination`, `None` if there is none.
    pub async fn load(destination: &Path) -> Result<Option<Self>> {
        let path = Self::path(destination);
        let content = match tokio::fs::read(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_slice(&content)
            .map(Some)
            .map_err(|e| Error::InvalidState(format!("invalid checkpoint {}: {e}", path.display())))
    }

    /// Store this checkpoint for `destination`, replacing any earlier one.
    pub async fn save(&self, destination: &Path) -> Result<()> {
        let path = Self::path(destination);
        let content = serde_json::to_vec_pretty(self)
            .map_err(|e| Error::InvalidState(format!("failed to serialize checkpoint: {e}")))?;

        let mut staging = path.clone().into_os_string();
        staging.push(".tmp");
        let staging = PathBuf::from(staging);
        tokio::fs::write(&staging, content).await?;
        tokio::fs::rename(&staging, &path).await?;
        Ok(())
    }
}

/// Make the temp files under `destination` safe to resume for `current`.
///
/// Leftovers are kept only if the saved checkpoint equals `current`. Any
/// other case (no checkpoint, an unreadable one, a different layout or
/// resource length) removes every temp file before `current` is saved.
pub(crate) async fn reconcile(destination: &Path, current: &Checkpoint) -> Result<()> {
    match Checkpoint::load(destination).await {
        Ok(Some(saved)) if saved == *current => return Ok(()),
        Ok(Some(saved)) => warn!(?saved, ?current, "download layout changed, discarding temp files"),
        Ok(None) => {}
        Err(e) => warn!(error = %e, "discarding temp files"),
    }

    let removed = discard_temp_files(destination).await?;
    if removed > 0 {
        info!(destination = %destination.display(), removed, "removed temp files of an earlier download");
    }
    current.save(destination).await
}

/// Remove the checkpoint once the destination is in place.
pub(crate) async fn clear(destination: &Path) -> Result<()> { remove_if_exists(&Checkpoint::path(destination)).await }

/// Remove the root aggregate and every segment file of `destination`,
/// returning how many files went.
async fn discard_temp_files(destination: &Path) -> Result<usize> {
    let Some(prefix) = SegmentPath::root().temp_file(destination).file_name().map(OsString::from) else {
        return Ok(0);
    };
    let dir = match destination.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e.into()),
    };
    let mut removed = 0;
    while let Some(entry) = entries.next_entry().await? {
        if is_temp_file(&prefix, &entry.file_name()) {
            remove_if_exists(&entry.path()).await?;
            removed += 1;
        }
    }
    Ok(removed)
}

/// `video.mp4.part` itself or `video.mp4.part.<anything>`.
fn is_temp_file(prefix: &OsStr, name: &OsStr) -> bool {
    let (prefix, name) = (prefix.as_encoded_bytes(), name.as_encoded_bytes());
    match name.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with(b"."),
        None => false,
    }
}
