//! Doc Studio: PDF summaries, two-track narration and photo object
//! detection, driven by an AI backend.

pub mod ai;
pub mod config;
pub mod file;
pub mod shell;
pub mod speech;
pub mod studio;
