//! Owner of the single open document.
//!
//! The manager is either empty or holds one [`Document`]. Loading dispatches on the
//! file extension and only replaces the current document once the new one has been
//! fully constructed, so a failed load never disturbs the session in progress.

use crate::document::Document;
use crate::error::{ReaderError, Result};
use crate::reader::{DocumentKind, PageContent, RenderOptions, display_extension};
use std::path::Path;
use tracing::{info, warn};

#[derive(Default)]
pub struct DocumentManager {
    document: Option<Document>,
    options: RenderOptions,
}

impl DocumentManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: RenderOptions) -> Self {
        Self {
            document: None,
            options,
        }
    }

    pub fn render_options(&self) -> &RenderOptions {
        &self.options
    }

    pub fn load_document<P: AsRef<Path>>(&mut self, path: P) -> Result<&mut Document> {
        let path = path.as_ref();
        let Some(kind) = DocumentKind::from_path(path) else {
            warn!(path = %path.display(), "rejected unsupported format");
            return Err(ReaderError::UnsupportedFormat(display_extension(path)));
        };
        if !path.is_file() {
            return Err(ReaderError::LoadFailure(format!(
                "file not found: {}",
                path.display()
            )));
        }

        let document = Document::open(path, kind, &self.options).inspect_err(|e| {
            warn!(path = %path.display(), error = %e, "load failed, keeping current document");
        })?;

        if let Some(mut previous) = self.document.take() {
            info!(path = %previous.path().display(), "releasing previous document");
            previous.close();
        }
        info!(
            path = %path.display(),
            kind = kind.label(),
            pages = document.page_count(),
            "document loaded"
        );
        Ok(self.document.insert(document))
    }

    /// Releases the open document, if any.
    pub fn close(&mut self) {
        if let Some(mut document) = self.document.take() {
            info!(path = %document.path().display(), "document closed");
            document.close();
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.document.is_some()
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    pub fn document_mut(&mut self) -> Option<&mut Document> {
        self.document.as_mut()
    }

    /// The open document, or `NotLoaded`.
    pub fn current(&self) -> Result<&Document> {
        self.document.as_ref().ok_or(ReaderError::NotLoaded)
    }

    pub fn current_mut(&mut self) -> Result<&mut Document> {
        self.document.as_mut().ok_or(ReaderError::NotLoaded)
    }

    pub fn page_count(&self) -> Result<usize> {
        self.current().map(Document::page_count)
    }

    pub fn page_content(&self, page: usize) -> Result<PageContent> {
        self.current()?.page_content(page)
    }

    pub fn filename(&self) -> Option<&Path> {
        self.document.as_ref().map(Document::path)
    }
}
