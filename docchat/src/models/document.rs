//! PDF document read from disk for upload.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Problems turning a path into an uploadable document.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("{} is not a PDF file", .0.display())]
    NotPdf(PathBuf),
    #[error("failed to read {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A PDF file ready to be sent as a multipart part.
#[derive(Debug, Clone)]
pub struct Document {
    /// File name reported to the backend.
    pub file_name: String,
    /// Raw file contents.
    pub bytes: Vec<u8>,
}

impl Document {
    pub const MIME_TYPE: &'static str = "application/pdf";

    /// Build a document from in-memory bytes.
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    /// Read a `.pdf` file from disk.
    pub async fn from_path(path: &Path) -> Result<Self, DocumentError> {
        if !is_pdf_path(path) {
            return Err(DocumentError::NotPdf(path.to_path_buf()));
        }

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| DocumentError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        let file_name = path
            .file_name()
            .map_or_else(|| "document.pdf".to_string(), |n| n.to_string_lossy().to_string());

        Ok(Self::new(file_name, bytes))
    }
}

fn is_pdf_path(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}
