//! A loaded document: one format reader plus the reading position within it.

use crate::error::{ReaderError, Result};
use crate::reader::{
    DocumentKind, FormatReader, Metadata, PageContent, RenderOptions, SearchHit, TocEntry,
};
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct Document {
    path: PathBuf,
    reader: FormatReader,
    title: String,
    current_page: usize,
}

impl Document {
    pub fn open<P: AsRef<Path>>(path: P, kind: DocumentKind, options: &RenderOptions) -> Result<Self> {
        let path = path.as_ref();
        let reader = FormatReader::open(path, kind, options)?;
        Ok(Self::from_reader(path, reader))
    }

    pub fn from_reader<P: AsRef<Path>>(path: P, reader: FormatReader) -> Self {
        let title = match reader.metadata().title.trim() {
            "" => reader.kind().default_title().to_string(),
            title => title.to_string(),
        };
        Self {
            path: path.as_ref().to_path_buf(),
            reader,
            title,
            current_page: 1,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    pub fn kind(&self) -> DocumentKind {
        self.reader.kind()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn author(&self) -> &str {
        &self.reader.metadata().author
    }

    pub fn metadata(&self) -> &Metadata {
        self.reader.metadata()
    }

    /// `"<title> by <author>"`, or just the title when the author is unknown.
    pub fn display_name(&self) -> String {
        match self.author() {
            "" => self.title.clone(),
            author => format!("{} by {}", self.title, author),
        }
    }

    pub fn page_count(&self) -> usize {
        self.reader.page_count()
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    /// Moves the reading position. Rejects pages outside `1..=page_count`.
    pub fn set_current_page(&mut self, page: usize) -> Result<()> {
        let page_count = self.page_count();
        if page == 0 || page > page_count {
            debug!(page, page_count, "rejected page change");
            return Err(ReaderError::OutOfRange { page, page_count });
        }
        self.current_page = page;
        Ok(())
    }

    pub fn page_content(&self, page: usize) -> Result<PageContent> {
        self.reader.page_content(page)
    }

    pub fn current_content(&self) -> Result<PageContent> {
        self.page_content(self.current_page)
    }

    pub fn page_text(&self, page: usize) -> Result<String> {
        self.reader.page_text(page)
    }

    pub fn toc(&self) -> Vec<TocEntry> {
        self.reader.toc()
    }

    pub fn find(&self, query: &str) -> Result<Vec<SearchHit>> {
        self.reader.find(query)
    }

    /// Releases the reader. Safe to call more than once.
    pub fn close(&mut self) {
        self.reader.close();
    }

    pub fn is_closed(&self) -> bool {
        self.reader.is_closed()
    }
}

impl Drop for Document {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::MobiReader;
    use crate::reader::mobi::PLACEHOLDER_TEXT;

    fn mobi(bytes: &[u8]) -> Document {
        Document::from_reader("shelf/book.mobi", FormatReader::Mobi(MobiReader::from_bytes(bytes)))
    }

    #[test]
    fn missing_title_uses_format_placeholder() {
        let doc = mobi(b"");
        assert_eq!(doc.title(), "MOBI Document");
        assert_eq!(doc.author(), "");
        assert_eq!(doc.display_name(), "MOBI Document");
        assert_eq!(doc.kind(), DocumentKind::Mobi);
        assert_eq!(doc.file_name(), "book.mobi");
    }

    #[test]
    fn current_page_starts_at_one_and_is_validated() {
        let text = "a quick brown fox jumps over it\n".repeat(300);
        let mut doc = mobi(text.as_bytes());
        assert_eq!(doc.current_page(), 1);
        let last = doc.page_count();
        assert!(last > 1);

        doc.set_current_page(last).unwrap();
        assert_eq!(doc.current_page(), last);

        assert!(matches!(doc.set_current_page(0), Err(ReaderError::OutOfRange { .. })));
        assert!(matches!(doc.set_current_page(last + 1), Err(ReaderError::OutOfRange { .. })));
        assert_eq!(doc.current_page(), last);
    }

    #[test]
    fn current_content_follows_position() {
        let doc = mobi(b"\x00\x01");
        assert_eq!(doc.current_content().unwrap(), PageContent::Text(PLACEHOLDER_TEXT.to_string()));
    }

    #[test]
    fn close_is_idempotent() {
        let mut doc = mobi(b"");
        doc.close();
        doc.close();
        assert!(doc.is_closed());
        assert!(matches!(doc.page_content(1), Err(ReaderError::NotLoaded)));
    }
}
