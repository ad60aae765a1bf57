//! Temporary on-disk staging for uploaded CV files.
//!
//! The backing file is deleted when the `StagedDocument` is dropped, so it is
//! released on every exit path of a pipeline run.

use std::io;
use std::path::Path;

use bytes::Bytes;
use tempfile::TempPath;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::pipeline::extractor::CvDocument;
use crate::pipeline::PipelineError;

#[derive(Debug)]
pub struct StagedDocument {
    file: File,
    path: TempPath,
    len: u64,
    pub media_type: String,
    pub filename: String,
}

impl StagedDocument {
    pub async fn new(media_type: impl Into<String>, filename: impl Into<String>) -> io::Result<Self> {
        let temp = tokio::task::spawn_blocking(|| {
            tempfile::Builder::new().prefix("cv-upload-").tempfile()
        })
        .await
        .map_err(io::Error::other)??;
        let (file, path) = temp.into_parts();

        Ok(Self {
            file: File::from_std(file),
            path,
            len: 0,
            media_type: media_type.into(),
            filename: filename.into(),
        })
    }

    /// Stages an in-memory payload in one go.
    #[cfg(test)]
    pub async fn from_bytes(
        content: &[u8],
        media_type: impl Into<String>,
        filename: impl Into<String>,
    ) -> io::Result<Self> {
        let mut staged = Self::new(media_type, filename).await?;
        staged.append(content).await?;
        Ok(staged)
    }

    pub async fn append(&mut self, chunk: &[u8]) -> io::Result<()> {
        self.file.write_all(chunk).await?;
        self.len += chunk.len() as u64;
        Ok(())
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the staged bytes back into a `CvDocument`.
    ///
    /// Pending writes are flushed first.
    pub async fn load(&mut self) -> Result<CvDocument, PipelineError> {
        self.file.flush().await.map_err(|e| {
            PipelineError::decode_failure("CV", format!("flushing staged upload: {e}"))
        })?;
        let content = tokio::fs::read(self.path()).await.map_err(|e| {
            PipelineError::decode_failure("CV", format!("reading staged upload: {e}"))
        })?;

        Ok(CvDocument {
            content: Bytes::from(content),
            media_type: self.media_type.clone(),
            filename: self.filename.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_load_returns_appended_chunks() {
        let mut staged = StagedDocument::new("application/pdf", "cv.pdf").await.unwrap();
        staged.append(b"hello ").await.unwrap();
        staged.append(b"world").await.unwrap();
        assert_eq!(staged.len(), 11);

        let doc = staged.load().await.unwrap();
        assert_eq!(&doc.content[..], b"hello world");
        assert_eq!(doc.media_type, "application/pdf");
        assert_eq!(doc.filename, "cv.pdf");
    }

    #[tokio::test]
    async fn test_large_upload_is_fully_staged() {
        let chunk = vec![b'z'; 64 * 1024];
        let mut staged = StagedDocument::new("application/pdf", "cv.pdf").await.unwrap();
        for _ in 0..16 {
            staged.append(&chunk).await.unwrap();
        }

        let doc = staged.load().await.unwrap();
        assert_eq!(doc.content.len(), 16 * 64 * 1024);
        assert!(doc.content.iter().all(|b| *b == b'z'));
    }

    #[tokio::test]
    async fn test_empty_until_written() {
        let staged = StagedDocument::new("application/pdf", "cv.pdf").await.unwrap();
        assert!(staged.is_empty());
    }

    #[tokio::test]
    async fn test_file_removed_on_drop() {
        let staged = StagedDocument::from_bytes(b"content", "text/plain", "cv.txt")
            .await
            .unwrap();
        let path = staged.path().to_path_buf();
        assert!(path.exists());

        drop(staged);
        assert!(!path.exists());
    }
}
