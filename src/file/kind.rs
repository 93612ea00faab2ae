//! File selection and MIME classification.
//!
//! The MIME type is derived from the file extension, the same information a
//! browser upload control would report as the file's declared type.

use std::path::{Path, PathBuf};

use super::datauri::ReadError;

/// MIME type reported for extensions we do not recognise.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// MIME type accepted by PDF Studio.
pub const PDF_MIME: &str = "application/pdf";

/// Map a file extension (without the dot, any case) to a MIME type.
///
/// ```
/// use doc_studio::file::mime_for_extension;
///
/// assert_eq!(mime_for_extension("PDF"), "application/pdf");
/// assert_eq!(mime_for_extension("jpeg"), "image/jpeg");
/// assert_eq!(mime_for_extension("exe"), "application/octet-stream");
/// ```
pub fn mime_for_extension(ext: &str) -> &'static str {
    match ext.to_ascii_lowercase().as_str() {
        "pdf" => PDF_MIME,
        "png" => "image/png",
        "jpg" | "jpeg" | "jfif" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "heic" => "image/heic",
        "heif" => "image/heif",
        "tif" | "tiff" => "image/tiff",
        "svg" => "image/svg+xml",
        "txt" => "text/plain",
        _ => OCTET_STREAM,
    }
}

// ---------------------------------------------------------------------------
// Tool
// ---------------------------------------------------------------------------

/// The two tools a file can be selected for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    /// Summaries and narration of PDF documents.
    PdfStudio,
    /// Object detection in photos.
    PhotoAnalyzer,
}

impl Tool {
    /// Whether a file of type `mime` may be selected for this tool.
    pub fn accepts(self, mime: &str) -> bool {
        match self {
            Tool::PdfStudio => mime == PDF_MIME,
            Tool::PhotoAnalyzer => mime.starts_with("image/"),
        }
    }

    /// What the user should pick instead, for rejection notices.
    pub fn expected(self) -> &'static str {
        match self {
            Tool::PdfStudio => "a PDF file",
            Tool::PhotoAnalyzer => "an image file (e.g. JPG, PNG, GIF)",
        }
    }
}

// ---------------------------------------------------------------------------
// SelectedFile
// ---------------------------------------------------------------------------

/// A file the user picked: its path, display name and declared MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    path: PathBuf,
    name: String,
    mime: &'static str,
}

impl SelectedFile {
    /// Resolve a path into a selectable file.
    ///
    /// Fails with [`ReadError::Io`] when the path does not name a readable
    /// regular file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ReadError> {
        let path = path.as_ref();
        let meta = std::fs::metadata(path).map_err(|source| ReadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        if !meta.is_file() {
            return Err(ReadError::Io {
                path: path.display().to_string(),
                source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a regular file"),
            });
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let mime = path
            .extension()
            .and_then(|e| e.to_str())
            .map(mime_for_extension)
            .unwrap_or(OCTET_STREAM);

        Ok(Self {
            path: path.to_path_buf(),
            name,
            mime,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime(&self) -> &'static str {
        self.mime
    }
}
