use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt, BufWriter};
use tracing::debug;

use super::fs::{file_len, remove_if_exists};
use crate::error::{Error, Result};

/// Append every child file, in order, to `parent`, then delete the children.
///
/// `children` pairs each child file with the number of bytes it contributes.
/// Bytes the parent already holds are taken as appended earlier, so an
/// assembly that was cut short continues where it stopped instead of
/// duplicating data. Children are deleted only once the parent is complete
/// and synced.
pub(crate) async fn assemble(parent: &Path, children: &[(PathBuf, u64)], buffer_size: usize) -> Result<()> {
    let total: u64 = children.iter().map(|(_, len)| len).sum();
    let present = file_len(parent).await?.unwrap_or(0);
    if present > total {
        return Err(Error::InvalidState(format!(
            "{} holds {present} bytes, expected at most {total}",
            parent.display()
        )));
    }

    let file = OpenOptions::new().create(true).append(true).open(parent).await?;
    let mut writer = BufWriter::with_capacity(buffer_size.max(1), file);

    let mut offset = 0u64;
    for (child, len) in children {
        let end = offset + len;
        if present >= end {
            offset = end;
            continue;
        }

        let skip = present.saturating_sub(offset);
        let wanted = len - skip;
        debug!(child = %child.display(), parent = %parent.display(), skip, wanted, "appending segment");

        let mut reader = File::open(child).await?;
        if skip > 0 {
            reader.seek(SeekFrom::Start(skip)).await?;
        }
        let copied = tokio::io::copy(&mut reader.take(wanted), &mut writer).await?;
        if copied < wanted {
            return Err(Error::InvalidState(format!(
                "{} is short by {} bytes",
                child.display(),
                wanted - copied
            )));
        }
        offset = end;
    }

    writer.flush().await?;
    writer.into_inner().sync_all().await?;

    for (child, _) in children {
        remove_if_exists(child).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    fn children(dir: &Path, contents: &[&[u8]]) -> Vec<(PathBuf, u64)> {
        contents
            .iter()
            .enumerate()
            .map(|(i, data)| {
                let path = dir.join(format!("child.{}", i + 1));
                std::fs::write(&path, data).unwrap();
                (path, data.len() as u64)
            })
            .collect()
    }

    #[tokio::test]
    async fn test_concatenates_in_order_and_removes_children() -> Result<()> {
        let dir = tempdir()?;
        let parent = dir.path().join("parent");
        let children = children(dir.path(), &[b"abc", b"defg", b"h"]);

        assemble(&parent, &children, 2).await?;

        assert_eq!(std::fs::read(&parent)?, b"abcdefgh");
        assert!(children.iter().all(|(path, _)| !path.exists()));
        Ok(())
    }

    #[tokio::test]
    async fn test_resumes_a_half_written_parent() -> Result<()> {
        let dir = tempdir()?;
        let parent = dir.path().join("parent");
        let children = children(dir.path(), &[b"abc", b"defg", b"h"]);
        std::fs::write(&parent, b"abcde")?;

        assemble(&parent, &children, 64).await?;

        assert_eq!(std::fs::read(&parent)?, b"abcdefgh");
        Ok(())
    }

    #[tokio::test]
    async fn test_complete_parent_only_cleans_up() -> Result<()> {
        let dir = tempdir()?;
        let parent = dir.path().join("parent");
        let children = children(dir.path(), &[b"abc", b"def"]);
        std::fs::write(&parent, b"abcdef")?;
        std::fs::remove_file(&children[0].0)?;

        assemble(&parent, &children, 64).await?;

        assert_eq!(std::fs::read(&parent)?, b"abcdef");
        assert!(!children[1].0.exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_only_declared_length_is_taken() -> Result<()> {
        let dir = tempdir()?;
        let parent = dir.path().join("parent");
        let mut children = children(dir.path(), &[b"abcXX", b"def"]);
        children[0].1 = 3;

        assemble(&parent, &children, 64).await?;

        assert_eq!(std::fs::read(&parent)?, b"abcdef");
        Ok(())
    }

    #[tokio::test]
    async fn test_short_child_fails_and_is_kept() -> Result<()> {
        let dir = tempdir()?;
        let parent = dir.path().join("parent");
        let mut children = children(dir.path(), &[b"ab", b"def"]);
        children[0].1 = 3;

        let result = assemble(&parent, &children, 64).await;

        assert!(matches!(result, Err(Error::InvalidState(_))));
        assert!(children.iter().all(|(path, _)| path.exists()));
        Ok(())
    }

    #[tokio::test]
    async fn test_oversized_parent_is_rejected() -> Result<()> {
        let dir = tempdir()?;
        let parent = dir.path().join("parent");
        let children = children(dir.path(), &[b"abc"]);
        std::fs::write(&parent, b"abcdef")?;

        assert!(matches!(assemble(&parent, &children, 64).await, Err(Error::InvalidState(_))));
        Ok(())
    }
}
