//! MOBI reader.
//!
//! There is no real MOBI/PalmDB decoder here. The reader scavenges printable text
//! runs out of the raw file and re-flows them into fixed-size pages. When nothing
//! readable survives it serves a single explanatory page instead of failing, so an
//! unparseable MOBI never blocks the reading session.

use super::{Metadata, PageContent, TocEntry, check_page, page_toc, text};
use crate::error::{ReaderError, Result};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Approximate page size in characters.
pub const PAGE_SIZE: usize = 2000;

/// Lines at or below this length are treated as binary noise.
const MIN_LINE_LEN: usize = 10;

pub const PLACEHOLDER_TEXT: &str = "MOBI content extraction not fully implemented.\n\n\
This is a placeholder for MOBI file content. A complete MOBI parser would be needed \
to properly extract and display the book content.";

pub struct MobiReader {
    metadata: Metadata,
    pages: Vec<String>,
    placeholder: bool,
    closed: bool,
}

impl MobiReader {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)
            .map_err(|e| ReaderError::LoadFailure(format!("{}: {}", path.display(), e)))?;
        let reader = Self::from_bytes(&bytes);

        if reader.placeholder {
            warn!(path = %path.display(), "no readable text in MOBI file, serving placeholder page");
        } else {
            info!(path = %path.display(), pages = reader.pages.len(), "opened MOBI");
        }
        Ok(reader)
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        let readable = extract_readable_text(bytes);
        let pages = text::chunk_words(&readable, PAGE_SIZE);
        let placeholder = pages.is_empty();
        let pages = if placeholder {
            vec![PLACEHOLDER_TEXT.to_string()]
        } else {
            pages
        };

        Self {
            metadata: Metadata::default(),
            pages,
            placeholder,
            closed: false,
        }
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// True when the file yielded no text and the placeholder page is being served.
    pub fn is_placeholder(&self) -> bool {
        self.placeholder
    }

    pub fn page_content(&self, page: usize) -> Result<PageContent> {
        self.page_text(page).map(|s| PageContent::Text(s.to_string()))
    }

    pub fn page_text(&self, page: usize) -> Result<&str> {
        if self.closed {
            return Err(ReaderError::NotLoaded);
        }
        let index = check_page(page, self.pages.len())?;
        Ok(&self.pages[index])
    }

    pub fn toc(&self) -> Vec<TocEntry> {
        page_toc(self.pages.len())
    }

    pub fn close(&mut self) {
        if !self.closed {
            self.pages.clear();
            self.closed = true;
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

/// Keeps lines of printable ASCII that are longer than [`MIN_LINE_LEN`] and contain a
/// space, with internal whitespace collapsed. Lines are separated by blank lines.
fn extract_readable_text(bytes: &[u8]) -> String {
    let printable: String = bytes
        .iter()
        .map(|&b| match b {
            0x20..=0x7E | b'\n' | b'\r' | b'\t' => b as char,
            _ => ' ',
        })
        .collect();

    printable
        .split('\n')
        .map(str::trim)
        .filter(|line| line.len() > MIN_LINE_LEN && line.contains(' '))
        .map(text::collapse_whitespace)
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_input_degrades_to_placeholder() {
        let bytes: Vec<u8> = (0..4096u32).map(|i| (i % 31) as u8).collect();
        let reader = MobiReader::from_bytes(&bytes);
        assert!(reader.is_placeholder());
        assert_eq!(reader.page_count(), 1);
        assert_eq!(reader.page_text(1).unwrap(), PLACEHOLDER_TEXT);
    }

    #[test]
    fn short_or_spaceless_lines_are_dropped() {
        let text = extract_readable_text(b"BOOKMOBI\x00\x01\nshort line\nnospacesinthislongline\n  It was a dark and stormy night.  \n");
        assert_eq!(text, "It was a dark and stormy night.");
    }

    #[test]
    fn non_printable_bytes_become_spaces() {
        let text = extract_readable_text(b"The\x00quick\xffbrown   fox jumps");
        assert_eq!(text, "The quick brown fox jumps");
    }

    #[test]
    fn long_text_is_split_into_pages() {
        let line = "lorem ipsum dolor sit amet consectetur\n";
        let bytes = line.repeat(200);
        let reader = MobiReader::from_bytes(bytes.as_bytes());
        assert!(!reader.is_placeholder());
        assert!(reader.page_count() > 1);
        for page in 1..=reader.page_count() {
            assert!(reader.page_text(page).unwrap().len() <= PAGE_SIZE);
        }
        assert!(matches!(
            reader.page_text(reader.page_count() + 1),
            Err(ReaderError::OutOfRange { .. })
        ));
    }

    #[test]
    fn closed_reader_rejects_queries() {
        let mut reader = MobiReader::from_bytes(b"");
        reader.close();
        reader.close();
        assert!(reader.is_closed());
        assert!(matches!(reader.page_text(1), Err(ReaderError::NotLoaded)));
    }
}
