//! File input: selection, MIME classification and data URI encoding.
//!
//! * [`SelectedFile`] — a picked file with its declared MIME type.
//! * [`Tool`] — which tool a file is for; decides what is accepted.
//! * [`DataUri`] / [`read_data_uri`] — base64 data URI encoding.
//! * [`ReadError`] — everything that can go wrong on the way.

pub mod datauri;
pub mod kind;

pub use datauri::{read_data_uri, DataUri, ReadError};
pub use kind::{mime_for_extension, SelectedFile, Tool, OCTET_STREAM, PDF_MIME};
