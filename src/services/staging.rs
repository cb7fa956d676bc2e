use crate::services::ingest::IngestError;
use std::path::PathBuf;
use tempfile::TempPath;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};

/// Request-scoped scratch space.
///
/// Every file created through it is registered on a cleanup list that is
/// drained in reverse creation order when the area is dropped, on success,
/// error or unwinding alike.
pub struct StagingArea {
    dir: PathBuf,
    files: Vec<TempPath>,
}

impl StagingArea {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            files: Vec::new(),
        }
    }

    fn create(&mut self, suffix: &str) -> std::io::Result<(std::fs::File, PathBuf)> {
        let (file, temp_path) = tempfile::Builder::new()
            .prefix("ingest-")
            .suffix(suffix)
            .tempfile_in(&self.dir)?
            .into_parts();
        let path = temp_path.to_path_buf();
        self.files.push(temp_path);
        Ok((file, path))
    }

    /// Reserves a fresh, empty, uniquely named file for a producer such as ffmpeg
    pub fn reserve(&mut self, suffix: &str) -> std::io::Result<PathBuf> {
        self.create(suffix).map(|(_, path)| path)
    }

    /// Copies the whole stream into a new staged file, failing once more than
    /// `limit` bytes arrive.
    pub async fn stage<R>(
        &mut self,
        reader: R,
        suffix: &str,
        limit: usize,
    ) -> Result<PathBuf, IngestError>
    where
        R: AsyncRead + Unpin + Send,
    {
        let (file, path) = self.create(suffix).map_err(IngestError::Staging)?;
        let mut file = tokio::fs::File::from_std(file);
        let mut limited = reader.take(limit as u64 + 1);

        let written = tokio::io::copy(&mut limited, &mut file)
            .await
            .map_err(IngestError::Staging)?;

        if written > limit as u64 {
            self.discard_last();
            return Err(IngestError::PayloadTooLarge { limit });
        }

        file.flush().await.map_err(IngestError::Staging)?;
        tracing::debug!("Staged {} bytes at {}", written, path.display());
        Ok(path)
    }

    fn discard_last(&mut self) {
        if let Some(temp_path) = self.files.pop() {
            let path = temp_path.to_path_buf();
            if let Err(e) = temp_path.close() {
                tracing::warn!("Failed to remove staged file {}: {}", path.display(), e);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl Drop for StagingArea {
    fn drop(&mut self) {
        while !self.files.is_empty() {
            self.discard_last();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn count_files(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[tokio::test]
    async fn test_stage_copies_stream() {
        let dir = tempfile::tempdir().unwrap();
        let mut area = StagingArea::new(dir.path());

        let path = area
            .stage(&b"hello staging"[..], ".png", 1024)
            .await
            .unwrap();

        assert!(path.starts_with(dir.path()));
        assert!(path.to_string_lossy().ends_with(".png"));
        assert_eq!(std::fs::read(&path).unwrap(), b"hello staging");
        assert_eq!(area.len(), 1);
    }

    #[tokio::test]
    async fn test_paths_are_unique() {
        let dir = tempfile::tempdir().unwrap();
        let mut area = StagingArea::new(dir.path());

        let a = area.stage(&b"a"[..], ".mp4", 16).await.unwrap();
        let b = area.stage(&b"b"[..], ".mp4", 16).await.unwrap();
        let c = area.reserve(".mp4").unwrap();

        assert_ne!(a, b);
        assert_ne!(b, c);
        assert_eq!(area.len(), 3);
        assert_eq!(count_files(dir.path()), 3);
    }

    #[tokio::test]
    async fn test_limit_exceeded_removes_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut area = StagingArea::new(dir.path());

        let err = area.stage(&[0u8; 64][..], ".png", 32).await.unwrap_err();

        assert!(matches!(err, IngestError::PayloadTooLarge { limit: 32 }));
        assert!(area.is_empty());
        assert_eq!(count_files(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_exact_limit_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let mut area = StagingArea::new(dir.path());

        let path = area.stage(&[7u8; 32][..], ".png", 32).await.unwrap();
        assert_eq!(std::fs::metadata(path).unwrap().len(), 32);
    }

    #[tokio::test]
    async fn test_drop_removes_everything() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut area = StagingArea::new(dir.path());
            area.stage(&b"upload"[..], ".mp4", 64).await.unwrap();
            area.reserve(".mp4").unwrap();
            assert_eq!(count_files(dir.path()), 2);
        }
        assert_eq!(count_files(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_drop_tolerates_externally_removed_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut area = StagingArea::new(dir.path());
        let path = area.reserve(".mp4").unwrap();
        std::fs::remove_file(&path).unwrap();
        drop(area);
        assert_eq!(count_files(dir.path()), 0);
    }

    #[test]
    fn test_missing_directory_fails() {
        let mut area = StagingArea::new("/nonexistent/staging/dir");
        assert!(area.reserve(".mp4").is_err());
    }
}
