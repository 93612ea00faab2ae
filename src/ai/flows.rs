//! The `AiFlows` trait, its output types and `RemoteError`.
//!
//! A flow is one request/response call to the AI backend: a data URI goes
//! in, one structured output comes out. There is no retry, no streaming and
//! no caching; identical inputs call the backend again.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::file::DataUri;

// ---------------------------------------------------------------------------
// RemoteError
// ---------------------------------------------------------------------------

/// A flow call failed or returned no usable output.
///
/// Every variant renders a message fit for showing to the user.
#[derive(Debug, Clone, Error)]
pub enum RemoteError {
    /// HTTP transport or connection error.
    #[error("request to the AI service failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("the AI service did not answer in time")]
    Timeout,

    /// The service answered with a non-success status.
    #[error("the AI service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The reply could not be parsed as the expected JSON.
    #[error("could not understand the AI service reply: {0}")]
    Parse(String),

    /// The reply parsed but carried no usable content.
    #[error("the AI service returned an empty result")]
    EmptyResponse,
}

impl From<reqwest::Error> for RemoteError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            RemoteError::Timeout
        } else {
            RemoteError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// Outputs
// ---------------------------------------------------------------------------

/// Output of [`AiFlows::summarize`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryOutput {
    /// A concise summary of the document's main points.
    pub summary: String,
}

/// Output of [`AiFlows::extract_for_speech`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechTextOutput {
    /// The document's text content, ready for narration.
    #[serde(rename = "speechText")]
    pub speech_text: String,
}

/// Output of [`AiFlows::detect_objects`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectDetectionOutput {
    /// Labels of the objects identified in the photo.
    pub objects: Vec<String>,
}

// ---------------------------------------------------------------------------
// AiFlows trait
// ---------------------------------------------------------------------------

/// The three AI flows.
///
/// Implementors must be `Send + Sync` so they can be held behind an
/// `Arc<dyn AiFlows>`.
#[async_trait]
pub trait AiFlows: Send + Sync {
    /// Summarise a document.
    async fn summarize(&self, document: &DataUri) -> Result<SummaryOutput, RemoteError>;

    /// Extract a document's text for narration.
    async fn extract_for_speech(&self, document: &DataUri)
        -> Result<SpeechTextOutput, RemoteError>;

    /// List the objects visible in a photo.
    async fn detect_objects(&self, photo: &DataUri) -> Result<ObjectDetectionOutput, RemoteError>;
}
