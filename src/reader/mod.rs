pub mod epub;
pub mod mobi;
pub mod pdf;
pub mod text;

pub use self::epub::EpubReader;
pub use self::mobi::MobiReader;
pub use self::pdf::{PdfReader, RenderOptions};

use crate::error::{ReaderError, Result};
use std::path::Path;

/// File extensions the readers accept, without the leading dot.
pub const SUPPORTED_EXTENSIONS: [&str; 3] = ["pdf", "epub", "mobi"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    Pdf,
    Epub,
    Mobi,
}

impl DocumentKind {
    /// Picks the reader for `path` from its extension, ignoring case.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_str()?;
        Self::from_extension(ext)
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "pdf" => Some(DocumentKind::Pdf),
            "epub" => Some(DocumentKind::Epub),
            "mobi" => Some(DocumentKind::Mobi),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DocumentKind::Pdf => "PDF",
            DocumentKind::Epub => "EPUB",
            DocumentKind::Mobi => "MOBI",
        }
    }

    /// Title shown when the file carries none of its own.
    pub fn default_title(self) -> &'static str {
        match self {
            DocumentKind::Pdf => "PDF Document",
            DocumentKind::Epub => "EPUB Document",
            DocumentKind::Mobi => "MOBI Document",
        }
    }

    /// Whether pages of this kind come back as rasters instead of text.
    pub fn is_raster(self) -> bool {
        matches!(self, DocumentKind::Pdf)
    }
}

pub fn is_supported<P: AsRef<Path>>(path: P) -> bool {
    DocumentKind::from_path(path).is_some()
}

/// Human-readable list of supported formats, e.g. for an open dialog.
pub fn format_description() -> String {
    SUPPORTED_EXTENSIONS
        .iter()
        .map(|ext| ext.to_ascii_uppercase())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Extension of `path` as written, with its dot, for error messages.
pub fn display_extension<P: AsRef<Path>>(path: P) -> String {
    match path.as_ref().extension() {
        Some(ext) => format!(".{}", ext.to_string_lossy()),
        None => "(no extension)".to_string(),
    }
}

/// A rasterized page. `png` holds the encoded image exactly as the engine produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageImage {
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl PageImage {
    pub fn decode(&self) -> image::ImageResult<image::DynamicImage> {
        image::load_from_memory_with_format(&self.png, image::ImageFormat::Png)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageContent {
    Image(PageImage),
    Text(String),
}

impl PageContent {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            PageContent::Text(s) => Some(s),
            PageContent::Image(_) => None,
        }
    }

    pub fn as_image(&self) -> Option<&PageImage> {
        match self {
            PageContent::Image(img) => Some(img),
            PageContent::Text(_) => None,
        }
    }
}

/// Metadata as found in the file. Empty `title`/`author` mean the file had none;
/// the placeholder title is applied by [`crate::document::Document`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    pub title: String,
    pub author: String,
    pub language: Option<String>,
    pub publisher: Option<String>,
    pub description: Option<String>,
    pub subject: Option<String>,
    pub producer: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    /// 1-based page the entry points at.
    pub page: usize,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub page: usize,
    /// Character offset of the match within the page text.
    pub position: usize,
    pub context: String,
}

/// Validates a 1-based page number and returns the 0-based index.
pub(crate) fn check_page(page: usize, page_count: usize) -> Result<usize> {
    if page == 0 || page > page_count {
        return Err(ReaderError::OutOfRange { page, page_count });
    }
    Ok(page - 1)
}

pub(crate) fn page_toc(page_count: usize) -> Vec<TocEntry> {
    (1..=page_count)
        .map(|page| TocEntry {
            page,
            title: format!("Page {}", page),
        })
        .collect()
}

pub enum FormatReader {
    Pdf(PdfReader),
    Epub(EpubReader),
    Mobi(MobiReader),
}

impl FormatReader {
    pub fn open<P: AsRef<Path>>(path: P, kind: DocumentKind, options: &RenderOptions) -> Result<Self> {
        Ok(match kind {
            DocumentKind::Pdf => FormatReader::Pdf(PdfReader::new(path, options.clone())?),
            DocumentKind::Epub => FormatReader::Epub(EpubReader::new(path)?),
            DocumentKind::Mobi => FormatReader::Mobi(MobiReader::new(path)?),
        })
    }

    pub fn kind(&self) -> DocumentKind {
        match self {
            FormatReader::Pdf(_) => DocumentKind::Pdf,
            FormatReader::Epub(_) => DocumentKind::Epub,
            FormatReader::Mobi(_) => DocumentKind::Mobi,
        }
    }

    pub fn metadata(&self) -> &Metadata {
        match self {
            FormatReader::Pdf(r) => r.metadata(),
            FormatReader::Epub(r) => r.metadata(),
            FormatReader::Mobi(r) => r.metadata(),
        }
    }

    pub fn page_count(&self) -> usize {
        match self {
            FormatReader::Pdf(r) => r.page_count(),
            FormatReader::Epub(r) => r.page_count(),
            FormatReader::Mobi(r) => r.page_count(),
        }
    }

    pub fn page_content(&self, page: usize) -> Result<PageContent> {
        match self {
            FormatReader::Pdf(r) => r.page_content(page),
            FormatReader::Epub(r) => r.page_content(page),
            FormatReader::Mobi(r) => r.page_content(page),
        }
    }

    pub fn page_text(&self, page: usize) -> Result<String> {
        match self {
            FormatReader::Pdf(r) => r.page_text(page),
            FormatReader::Epub(r) => r.page_text(page).map(str::to_string),
            FormatReader::Mobi(r) => r.page_text(page).map(str::to_string),
        }
    }

    pub fn toc(&self) -> Vec<TocEntry> {
        match self {
            FormatReader::Pdf(r) => r.toc(),
            FormatReader::Epub(r) => r.toc(),
            FormatReader::Mobi(r) => r.toc(),
        }
    }

    /// One hit per page whose text contains `query`, case-insensitively.
    pub fn find(&self, query: &str) -> Result<Vec<SearchHit>> {
        let Some(matcher) = text::Matcher::new(query) else {
            return Ok(Vec::new());
        };
        let mut hits = Vec::new();
        for page in 1..=self.page_count() {
            let page_text = self.page_text(page)?;
            if let Some(hit) = matcher.find(page, &page_text) {
                hits.push(hit);
            }
        }
        Ok(hits)
    }

    pub fn close(&mut self) {
        match self {
            FormatReader::Pdf(r) => r.close(),
            FormatReader::Epub(r) => r.close(),
            FormatReader::Mobi(r) => r.close(),
        }
    }

    pub fn is_closed(&self) -> bool {
        match self {
            FormatReader::Pdf(r) => r.is_closed(),
            FormatReader::Epub(r) => r.is_closed(),
            FormatReader::Mobi(r) => r.is_closed(),
        }
    }
}
