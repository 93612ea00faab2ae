//! User-facing notices and the studio error type.
//!
//! Every operation ends in either a success [`Notice`] or a
//! [`StudioError`]; the front end turns the error into an error notice with
//! [`Notice::from`]. Nothing is retried.

use thiserror::Error;

use crate::ai::{Flow, RemoteError};
use crate::file::ReadError;
use crate::speech::{SpeechError, Track};

// ---------------------------------------------------------------------------
// StudioError
// ---------------------------------------------------------------------------

/// Everything a studio operation can fail with.
#[derive(Debug, Error)]
pub enum StudioError {
    /// An operation needs a selected file and there is none.
    #[error("Please select {expected}.")]
    NoFile { expected: &'static str },

    /// The picked file's type is not accepted by this tool.
    #[error("{name} is not {expected}.")]
    InvalidFileType { name: String, expected: &'static str },

    /// The file could not be read or encoded.
    #[error(transparent)]
    Read(#[from] ReadError),

    /// An AI flow failed.
    #[error("{source}")]
    Remote {
        flow: Flow,
        #[source]
        source: RemoteError,
    },

    /// Narration failed or could not start.
    #[error(transparent)]
    Speech(#[from] SpeechError),

    /// The track has no text yet (summary not generated, text not extracted).
    #[error("There is no {0} to play yet.")]
    NothingToPlay(Track),
}

impl StudioError {
    /// Short heading for the notice shown to the user.
    pub fn title(&self) -> &'static str {
        match self {
            StudioError::NoFile { .. } => "No File Selected",
            StudioError::InvalidFileType { .. } => "Invalid File Type",
            StudioError::Read(_) => "File Read Failed",
            StudioError::Remote { flow, .. } => match flow {
                Flow::Summary => "Summary Failed",
                Flow::SpeechText => "Text Extraction Failed",
                Flow::ObjectDetection => "Analysis Failed",
            },
            StudioError::Speech(SpeechError::Unsupported) => "Unsupported Environment",
            StudioError::Speech(_) => "Speech Error",
            StudioError::NothingToPlay(_) => "Nothing To Play",
        }
    }
}

// ---------------------------------------------------------------------------
// Notice
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// A short message for the user (a toast, in a graphical front end).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub description: String,
}

impl Notice {
    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            title: title.into(),
            description: description.into(),
        }
    }

    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            title: title.into(),
            description: description.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == NoticeLevel::Error
    }
}

impl From<&StudioError> for Notice {
    fn from(err: &StudioError) -> Self {
        Notice::error(err.title(), err.to_string())
    }
}

impl From<StudioError> for Notice {
    fn from(err: StudioError) -> Self {
        Notice::from(&err)
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let marker = match self.level {
            NoticeLevel::Info => "✓",
            NoticeLevel::Error => "✗",
        };
        write!(f, "{marker} {}: {}", self.title, self.description)
    }
}
