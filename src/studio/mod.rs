//! The two tools, as sessions a front end drives.
//!
//! * [`PdfStudio`] — summary, text extraction and narration of one PDF.
//! * [`PhotoAnalyzer`] — object detection on one photo.
//! * [`Notice`] / [`StudioError`] — what the user is told after each action.
//!
//! Sessions hold no I/O of their own beyond reading the selected file; the AI
//! backend comes in as an `Arc<dyn AiFlows>` and narration as a
//! [`SpeechController`](crate::speech::SpeechController).

pub mod notice;
pub mod pdf;
pub mod photo;

pub use notice::{Notice, NoticeLevel, StudioError};
pub use pdf::{PdfStudio, TrackControls};
pub use photo::{PhotoAnalyzer, NO_OBJECTS};
