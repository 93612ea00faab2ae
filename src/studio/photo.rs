//! Photo Analyzer session: one image in, a list of object labels out.

use std::path::Path;
use std::sync::Arc;

use crate::ai::{AiFlows, Flow};
use crate::config::FileConfig;
use crate::file::{read_data_uri, SelectedFile, Tool};

use super::notice::{Notice, StudioError};

/// Shown in place of the list when the flow found nothing.
pub const NO_OBJECTS: &str = "No objects identified or the AI could not determine them.";

pub struct PhotoAnalyzer {
    flows: Arc<dyn AiFlows>,
    max_bytes: u64,
    file: Option<SelectedFile>,
    objects: Option<Vec<String>>,
    error: Option<String>,
}

impl PhotoAnalyzer {
    pub fn new(flows: Arc<dyn AiFlows>, files: &FileConfig) -> Self {
        Self {
            flows,
            max_bytes: files.max_bytes,
            file: None,
            objects: None,
            error: None,
        }
    }

    /// Select a photo. Anything but `image/*` clears the selection.
    pub fn select_file(&mut self, path: &Path) -> Result<Notice, StudioError> {
        let file = SelectedFile::from_path(path)?;
        if !Tool::PhotoAnalyzer.accepts(file.mime()) {
            self.file = None;
            return Err(StudioError::InvalidFileType {
                name: file.name().to_string(),
                expected: Tool::PhotoAnalyzer.expected(),
            });
        }

        log::info!("photo analyzer: selected {}", file.name());
        let notice = Notice::info("File Selected", file.name());
        self.file = Some(file);
        self.objects = None;
        self.error = None;
        Ok(notice)
    }

    /// Run object detection on the selected photo.
    pub async fn analyze(&mut self) -> Result<Notice, StudioError> {
        let file = self.file.clone().ok_or(StudioError::NoFile {
            expected: Tool::PhotoAnalyzer.expected(),
        })?;
        self.objects = None;
        self.error = None;

        match self.run_detection(&file).await {
            Ok(objects) => {
                log::info!("photo analyzer: {} object(s) in {}", objects.len(), file.name());
                self.objects = Some(objects);
                Ok(Notice::info("Analysis Complete", "Photo analyzed successfully."))
            }
            Err(e) => {
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    async fn run_detection(&self, file: &SelectedFile) -> Result<Vec<String>, StudioError> {
        let uri = read_data_uri(file, self.max_bytes).await?;
        let out = self
            .flows
            .detect_objects(&uri)
            .await
            .map_err(|source| StudioError::Remote {
                flow: Flow::ObjectDetection,
                source,
            })?;
        Ok(out.objects)
    }

    pub fn file(&self) -> Option<&SelectedFile> {
        self.file.as_ref()
    }

    /// Why the last analysis failed.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Labels from the last successful analysis.
    pub fn objects(&self) -> Option<&[String]> {
        self.objects.as_deref()
    }

    /// The result as shown to the user: one label per line, or
    /// [`NO_OBJECTS`] when the list is empty.
    pub fn describe(&self) -> Option<String> {
        let objects = self.objects.as_ref()?;
        if objects.is_empty() {
            return Some(NO_OBJECTS.to_string());
        }
        Some(
            objects
                .iter()
                .map(|o| format!("- {o}"))
                .collect::<Vec<_>>()
                .join("\n"),
        )
    }
}
