//! Error taxonomy shared by every format reader and the document manager.
//!
//! The `Display` text of each variant is what the shell puts in its error popup,
//! so messages are written for a reader of the UI rather than a developer.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReaderError {
    /// Extension not recognized. Raised before any file I/O happens.
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// The file could not be opened by the format's engine.
    #[error("Failed to open document: {0}")]
    LoadFailure(String),

    /// Container or package document missing or malformed.
    #[error("Failed to parse document: {0}")]
    ParseError(String),

    #[error("Page {page} out of range (1-{page_count})")]
    OutOfRange { page: usize, page_count: usize },

    /// Parsing succeeded but produced no readable pages.
    #[error("No readable content found in {0}")]
    EmptyDocument(String),

    #[error("Failed to render page: {0}")]
    RenderError(String),

    #[error("No document loaded")]
    NotLoaded,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ReaderError {
    /// True for errors raised while opening a file, as opposed to querying one.
    pub fn is_load_error(&self) -> bool {
        matches!(
            self,
            ReaderError::UnsupportedFormat(_)
                | ReaderError::LoadFailure(_)
                | ReaderError::ParseError(_)
                | ReaderError::EmptyDocument(_)
                | ReaderError::Io(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ReaderError>;
