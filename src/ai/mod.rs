//! AI flow module.
//!
//! This module provides:
//! * [`AiFlows`] — async trait with the three flows: summarize a PDF,
//!   extract a PDF's text for narration, detect objects in a photo.
//! * [`ApiFlowClient`] — OpenAI-compatible REST implementation.
//! * [`Flow`] — per-flow prompts.
//! * [`RemoteError`] — the single error kind a flow fails with.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use doc_studio::ai::{AiFlows, ApiFlowClient};
//! use doc_studio::config::AppConfig;
//! use doc_studio::file::DataUri;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AppConfig::default();
//!     let flows = ApiFlowClient::from_config(&config.ai);
//!
//!     let pdf = DataUri::encode("application/pdf", &std::fs::read("paper.pdf").unwrap());
//!     let out = flows.summarize(&pdf).await.unwrap();
//!     println!("{}", out.summary);
//! }
//! ```

pub mod client;
pub mod flows;
pub mod prompt;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use client::ApiFlowClient;
pub use flows::{AiFlows, ObjectDetectionOutput, RemoteError, SpeechTextOutput, SummaryOutput};
pub use prompt::Flow;
