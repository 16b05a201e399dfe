//! Bridge directory handling.

use std::path::Path;

use tracing::{info, warn};

/// Delete `dir` if it exists and recreate it empty.
///
/// Destructive: `init` must never be pointed at a directory holding anything
/// other than a previous bridge.
pub async fn reset_directory(dir: &Path) -> std::io::Result<()> {
    match tokio::fs::metadata(dir).await {
        Ok(meta) if meta.is_dir() => {
            warn!(dir = %dir.display(), "removing existing bridge directory");
            tokio::fs::remove_dir_all(dir).await?;
        }
        Ok(_) => {
            warn!(dir = %dir.display(), "removing file in place of bridge directory");
            tokio::fs::remove_file(dir).await?;
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    tokio::fs::create_dir_all(dir).await?;
    info!(dir = %dir.display(), "bridge directory ready");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reset_creates_missing_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("nested").join("bridge");
        reset_directory(&dir).await.unwrap();
        assert!(dir.is_dir());
    }

    #[tokio::test]
    async fn test_reset_empties_existing_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("bridge");
        std::fs::create_dir_all(dir.join(".hg")).unwrap();
        std::fs::write(dir.join("stale.txt"), "old").unwrap();

        reset_directory(&dir).await.unwrap();

        assert!(dir.is_dir());
        assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_reset_replaces_plain_file() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("bridge");
        std::fs::write(&dir, "not a dir").unwrap();
        reset_directory(&dir).await.unwrap();
        assert!(dir.is_dir());
    }
}
