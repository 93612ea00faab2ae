//! PDF Studio session: summary, text extraction and two-track narration.
//!
//! [`PdfStudio`] holds the selected PDF, the results of the two PDF flows and
//! the [`SpeechController`]. It enforces the ordering the narration needs:
//! any narration is stopped before a new file is taken and before either
//! flow runs, so stale text is never read out.

use std::path::Path;
use std::sync::Arc;

use crate::ai::{AiFlows, Flow};
use crate::config::FileConfig;
use crate::file::{read_data_uri, SelectedFile, Tool};
use crate::speech::{EngineEvent, PlaybackSnapshot, PlaybackState, SpeechController, Track};

use super::notice::{Notice, StudioError};

// ---------------------------------------------------------------------------
// TrackControls
// ---------------------------------------------------------------------------

/// Which transport buttons of a track are usable right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TrackControls {
    pub can_play: bool,
    pub can_pause: bool,
    pub can_resume: bool,
    pub can_stop: bool,
}

// ---------------------------------------------------------------------------
// PdfStudio
// ---------------------------------------------------------------------------

pub struct PdfStudio {
    flows: Arc<dyn AiFlows>,
    speech: SpeechController,
    max_bytes: u64,

    file: Option<SelectedFile>,
    summary: Option<String>,
    summary_error: Option<String>,
    extracted_text: Option<String>,
    extraction_error: Option<String>,
}

impl PdfStudio {
    pub fn new(flows: Arc<dyn AiFlows>, speech: SpeechController, files: &FileConfig) -> Self {
        Self {
            flows,
            speech,
            max_bytes: files.max_bytes,
            file: None,
            summary: None,
            summary_error: None,
            extracted_text: None,
            extraction_error: None,
        }
    }

    /// The one-time "text-to-speech unsupported" notice, if it applies.
    pub fn take_startup_notice(&mut self) -> Option<Notice> {
        self.speech
            .take_unsupported_notice()
            .map(|e| Notice::from(StudioError::Speech(e)))
    }

    // -----------------------------------------------------------------------
    // File selection
    // -----------------------------------------------------------------------

    /// Select a new PDF.
    ///
    /// A file of the wrong type clears the selection and is reported; the
    /// previous results stay. A valid file stops narration and clears every
    /// result and error.
    pub fn select_file(&mut self, path: &Path) -> Result<Notice, StudioError> {
        let file = SelectedFile::from_path(path)?;
        if !Tool::PdfStudio.accepts(file.mime()) {
            self.file = None;
            return Err(StudioError::InvalidFileType {
                name: file.name().to_string(),
                expected: Tool::PdfStudio.expected(),
            });
        }

        self.speech.stop_all();
        self.summary = None;
        self.summary_error = None;
        self.extracted_text = None;
        self.extraction_error = None;

        log::info!("pdf studio: selected {}", file.name());
        let notice = Notice::info("File Selected", file.name());
        self.file = Some(file);
        Ok(notice)
    }

    // -----------------------------------------------------------------------
    // Flows
    // -----------------------------------------------------------------------

    /// Generate a summary of the selected PDF.
    pub async fn request_summary(&mut self) -> Result<Notice, StudioError> {
        let file = self.require_file()?;
        self.summary = None;
        self.summary_error = None;
        self.speech.stop_all();

        let result = self.run_summary(&file).await;
        match result {
            Ok(summary) => {
                self.summary = Some(summary);
                Ok(Notice::info(
                    "Summary Generated",
                    "PDF summary generated successfully.",
                ))
            }
            Err(e) => {
                self.summary_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Extract the selected PDF's text for narration.
    pub async fn request_speech_prep(&mut self) -> Result<Notice, StudioError> {
        let file = self.require_file()?;
        self.extracted_text = None;
        self.extraction_error = None;
        self.speech.stop_all();

        let result = self.run_extraction(&file).await;
        match result {
            Ok(text) => {
                self.extracted_text = Some(text);
                Ok(Notice::info("Text Extracted", "PDF text ready for playback."))
            }
            Err(e) => {
                self.extraction_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    async fn run_summary(&self, file: &SelectedFile) -> Result<String, StudioError> {
        let uri = read_data_uri(file, self.max_bytes).await?;
        let out = self
            .flows
            .summarize(&uri)
            .await
            .map_err(|source| StudioError::Remote {
                flow: Flow::Summary,
                source,
            })?;
        Ok(out.summary)
    }

    async fn run_extraction(&self, file: &SelectedFile) -> Result<String, StudioError> {
        let uri = read_data_uri(file, self.max_bytes).await?;
        let out = self
            .flows
            .extract_for_speech(&uri)
            .await
            .map_err(|source| StudioError::Remote {
                flow: Flow::SpeechText,
                source,
            })?;
        Ok(out.speech_text)
    }

    fn require_file(&self) -> Result<SelectedFile, StudioError> {
        self.file.clone().ok_or(StudioError::NoFile {
            expected: Tool::PdfStudio.expected(),
        })
    }

    // -----------------------------------------------------------------------
    // Playback
    // -----------------------------------------------------------------------

    /// Play (or resume) `track`'s text. Any narration of the other track is
    /// stopped first.
    pub fn play(&mut self, track: Track) -> Result<(), StudioError> {
        let text = match track {
            Track::FullText => self.extracted_text.as_deref(),
            Track::Summary => self.summary.as_deref(),
        }
        .ok_or(StudioError::NothingToPlay(track))?;

        self.speech.play(track, text)?;
        Ok(())
    }

    pub fn pause(&mut self, track: Track) -> Result<(), StudioError> {
        self.speech.pause(track)?;
        Ok(())
    }

    /// Stop `track`. The engine cancels globally, so the other track is
    /// stopped too.
    pub fn stop(&mut self, track: Track) {
        self.speech.stop(track);
    }

    pub fn stop_all(&mut self) {
        self.speech.stop_all();
    }

    /// Feed an engine notification to the controller; returns a notice when
    /// narration failed.
    pub fn handle_engine_event(&mut self, event: EngineEvent) -> Option<Notice> {
        self.speech
            .handle_event(event)
            .map(|e| Notice::from(StudioError::Speech(e)))
    }

    // -----------------------------------------------------------------------
    // View state
    // -----------------------------------------------------------------------

    pub fn file(&self) -> Option<&SelectedFile> {
        self.file.as_ref()
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn summary_error(&self) -> Option<&str> {
        self.summary_error.as_deref()
    }

    pub fn extracted_text(&self) -> Option<&str> {
        self.extracted_text.as_deref()
    }

    pub fn extraction_error(&self) -> Option<&str> {
        self.extraction_error.as_deref()
    }

    pub fn playback(&self) -> PlaybackSnapshot {
        self.speech.snapshot()
    }

    pub fn speech_supported(&self) -> bool {
        self.speech.is_supported()
    }

    /// Button enablement for `track`.
    ///
    /// Play needs text, an idle track and an idle sibling; pause needs the
    /// track speaking; resume needs it paused; stop needs it active. Without
    /// a speech engine nothing is usable.
    pub fn controls(&self, track: Track) -> TrackControls {
        if !self.speech.is_supported() {
            return TrackControls::default();
        }
        let has_text = match track {
            Track::FullText => self.extracted_text.is_some(),
            Track::Summary => self.summary.is_some(),
        };
        let state = self.speech.state(track);
        let sibling = self.speech.state(track.other());

        TrackControls {
            can_play: has_text && state == PlaybackState::Idle && !sibling.is_active(),
            can_pause: state == PlaybackState::Speaking,
            can_resume: state == PlaybackState::Paused,
            can_stop: state.is_active(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
