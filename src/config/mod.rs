//! Configuration module for doc-studio.
//!
//! Provides `AppConfig` (top-level settings), sub-configs for the AI backend,
//! the speech engine and file handling, `AppPaths` for the platform config
//! directory, and TOML persistence via `AppConfig::load_or_init`.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{AiConfig, AppConfig, FileConfig, SpeechConfig};
