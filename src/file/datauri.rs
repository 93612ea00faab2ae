//! Data URI encoding of user files.
//!
//! A [`DataUri`] is `data:<mime>;base64,<payload>` with the standard base64
//! alphabet and padding. It is the only form in which file content leaves the
//! process: every AI flow takes one.

use base64::{engine::general_purpose, Engine as _};
use thiserror::Error;

use super::kind::SelectedFile;

// ---------------------------------------------------------------------------
// ReadError
// ---------------------------------------------------------------------------

/// A file could not be read or represented as a data URI.
#[derive(Debug, Error)]
pub enum ReadError {
    /// The underlying read failed.
    #[error("could not read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The file exceeds the configured inline limit.
    #[error("{path} is {size} bytes; the limit is {limit} bytes")]
    TooLarge { path: String, size: u64, limit: u64 },

    /// A string claimed to be a data URI but is not one.
    #[error("malformed data URI: {0}")]
    Malformed(String),
}

// ---------------------------------------------------------------------------
// DataUri
// ---------------------------------------------------------------------------

/// An owned `data:<mime>;base64,<payload>` string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    uri: String,
    /// Byte offset of the `,` separating header and payload.
    comma: usize,
}

impl DataUri {
    const PREFIX: &'static str = "data:";
    const BASE64_MARKER: &'static str = ";base64";

    /// Encode `bytes` as a data URI of the given MIME type.
    ///
    /// ```
    /// use doc_studio::file::DataUri;
    ///
    /// let uri = DataUri::encode("text/plain", b"hi");
    /// assert_eq!(uri.as_str(), "data:text/plain;base64,aGk=");
    /// ```
    pub fn encode(mime: &str, bytes: &[u8]) -> Self {
        let payload = general_purpose::STANDARD.encode(bytes);
        let header = format!("{}{}{}", Self::PREFIX, mime, Self::BASE64_MARKER);
        let comma = header.len();
        Self {
            uri: format!("{header},{payload}"),
            comma,
        }
    }

    /// Parse an existing base64 data URI.
    pub fn parse(s: &str) -> Result<Self, ReadError> {
        if !s.starts_with(Self::PREFIX) {
            return Err(ReadError::Malformed("missing `data:` prefix".into()));
        }
        let comma = s
            .find(',')
            .ok_or_else(|| ReadError::Malformed("missing `,` separator".into()))?;
        let header = &s[..comma];
        if !header.ends_with(Self::BASE64_MARKER) {
            return Err(ReadError::Malformed("payload is not base64".into()));
        }
        if header.len() == Self::PREFIX.len() + Self::BASE64_MARKER.len() {
            return Err(ReadError::Malformed("missing MIME type".into()));
        }
        general_purpose::STANDARD
            .decode(&s[comma + 1..])
            .map_err(|e| ReadError::Malformed(e.to_string()))?;

        Ok(Self {
            uri: s.to_string(),
            comma,
        })
    }

    /// The MIME type embedded in the header.
    pub fn mime(&self) -> &str {
        &self.uri[Self::PREFIX.len()..self.comma - Self::BASE64_MARKER.len()]
    }

    /// The base64 payload.
    pub fn payload(&self) -> &str {
        &self.uri[self.comma + 1..]
    }

    /// The full URI.
    pub fn as_str(&self) -> &str {
        &self.uri
    }

    /// Decode the payload back into bytes.
    pub fn decode(&self) -> Result<Vec<u8>, ReadError> {
        general_purpose::STANDARD
            .decode(self.payload())
            .map_err(|e| ReadError::Malformed(e.to_string()))
    }
}

impl std::fmt::Display for DataUri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.uri)
    }
}

// ---------------------------------------------------------------------------
// read_data_uri
// ---------------------------------------------------------------------------

/// Read `file` from disk and encode it as a data URI.
///
/// Fails with [`ReadError::TooLarge`] above `max_bytes`, checked against the
/// file metadata before the content is read. An empty file encodes to an
/// empty payload; whether that is usable is for the flow to decide.
pub async fn read_data_uri(file: &SelectedFile, max_bytes: u64) -> Result<DataUri, ReadError> {
    let path = file.path();
    let io_err = |source| ReadError::Io {
        path: path.display().to_string(),
        source,
    };

    let size = tokio::fs::metadata(path).await.map_err(io_err)?.len();
    if size > max_bytes {
        return Err(ReadError::TooLarge {
            path: path.display().to_string(),
            size,
            limit: max_bytes,
        });
    }

    let bytes = tokio::fs::read(path).await.map_err(io_err)?;

    log::debug!(
        "encoded {} ({} bytes, {})",
        file.name(),
        bytes.len(),
        file.mime()
    );
    Ok(DataUri::encode(file.mime(), &bytes))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
