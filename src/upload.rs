use crate::error::LoadError;
use anyhow::{Context, Result};
use std::path::Path;

pub const PDF_MEDIA_TYPE: &str = "application/pdf";

/// A single candidate file supplied by the user.
#[derive(Debug, Clone)]
pub struct Upload {
    pub name: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Upload {
            name: name.into(),
            media_type: media_type.into(),
            bytes,
        }
    }

    /// Read a file from disk, inferring its media type from the extension or the `%PDF-` magic.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes =
            std::fs::read(path).with_context(|| format!("Failed to read file: {}", path.display()))?;

        let name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("document.pdf")
            .to_string();

        let has_pdf_extension = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));

        let media_type = if has_pdf_extension || bytes.starts_with(b"%PDF-") {
            PDF_MEDIA_TYPE
        } else {
            "application/octet-stream"
        };

        Ok(Upload::new(name, media_type, bytes))
    }

    /// Reject anything that is not declared as a PDF before its bytes reach the loader.
    pub fn accept(&self) -> Result<(), LoadError> {
        if self.media_type == PDF_MEDIA_TYPE {
            Ok(())
        } else {
            Err(LoadError::UploadRejected {
                media_type: self.media_type.clone(),
            })
        }
    }
}
