use super::{Metadata, PageContent, PageImage, TocEntry, check_page, page_toc};
use crate::deps::PopplerTool;
use crate::error::{ReaderError, Result};
use lopdf::Object;
use pdf::file::FileOptions;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const DEFAULT_DPI: u32 = 150;
const MIN_DPI: u32 = 36;
const MAX_DPI: u32 = 600;

/// Rasterization settings handed to the PDF engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    pub dpi: u32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self { dpi: DEFAULT_DPI }
    }
}

impl RenderOptions {
    pub fn with_dpi(dpi: u32) -> Self {
        Self {
            dpi: dpi.clamp(MIN_DPI, MAX_DPI),
        }
    }
}

pub struct PdfReader {
    path: PathBuf,
    page_count: usize,
    metadata: Metadata,
    options: RenderOptions,
    closed: bool,
}

impl PdfReader {
    pub fn new<P: AsRef<Path>>(path: P, options: RenderOptions) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        // The pdf crate opens lazily, so this validates the file and counts pages
        // without pulling every object into memory.
        let file = FileOptions::cached()
            .open(&path)
            .map_err(|e| ReaderError::LoadFailure(e.to_string()))?;
        let page_count = file.num_pages() as usize;
        if page_count == 0 {
            return Err(ReaderError::EmptyDocument(path.display().to_string()));
        }

        let metadata = read_info_dict(&path).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "PDF info dictionary unreadable");
            Metadata::default()
        });

        info!(path = %path.display(), pages = page_count, "opened PDF");
        Ok(Self {
            path,
            page_count,
            metadata,
            options,
            closed: false,
        })
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Rasterizes page `page` (1-based) at the configured resolution.
    pub fn page_content(&self, page: usize) -> Result<PageContent> {
        self.ensure_open()?;
        check_page(page, self.page_count)?;
        self.render_page_image(page).map(PageContent::Image)
    }

    /// Extracts the text layer of page `page` (1-based).
    pub fn page_text(&self, page: usize) -> Result<String> {
        self.ensure_open()?;
        check_page(page, self.page_count)?;

        let page_arg = page.to_string();
        let stdout = PopplerTool::Pdftotext
            .run([
                OsStr::new("-f"),
                OsStr::new(&page_arg),
                OsStr::new("-l"),
                OsStr::new(&page_arg),
                OsStr::new("-layout"),
                self.path.as_os_str(),
                OsStr::new("-"),
            ])
            .map_err(|e| ReaderError::RenderError(format!("{:#}", e)))?;
        Ok(String::from_utf8_lossy(&stdout).into_owned())
    }

    pub fn toc(&self) -> Vec<TocEntry> {
        page_toc(self.page_count)
    }

    pub fn close(&mut self) {
        if !self.closed {
            debug!(path = %self.path.display(), "closing PDF");
            self.closed = true;
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(ReaderError::NotLoaded);
        }
        Ok(())
    }

    fn render_page_image(&self, page: usize) -> Result<PageImage> {
        let root = std::env::temp_dir().join(format!(
            "folio_pdf_{}_{}_{}",
            std::process::id(),
            page,
            chrono::Utc::now().timestamp_nanos_opt().unwrap_or(0)
        ));
        let page_arg = page.to_string();
        let dpi = self.options.dpi.to_string();

        PopplerTool::Pdftoppm
            .run([
                OsStr::new("-f"),
                OsStr::new(&page_arg),
                OsStr::new("-l"),
                OsStr::new(&page_arg),
                OsStr::new("-png"),
                OsStr::new("-singlefile"),
                OsStr::new("-r"),
                OsStr::new(&dpi),
                self.path.as_os_str(),
                root.as_os_str(),
            ])
            .map_err(|e| ReaderError::RenderError(format!("{:#}", e)))?;

        let png_path = root.with_extension("png");
        let png = fs::read(&png_path).map_err(|e| {
            ReaderError::RenderError(format!("rendered page missing at {}: {}", png_path.display(), e))
        })?;
        let _ = fs::remove_file(&png_path);

        let (width, height) = image::ImageReader::with_format(std::io::Cursor::new(&png), image::ImageFormat::Png)
            .into_dimensions()
            .map_err(|e| ReaderError::RenderError(format!("rendered page is not a valid PNG: {}", e)))?;

        debug!(page, width, height, dpi = self.options.dpi, "rendered PDF page");
        Ok(PageImage { png, width, height })
    }
}

/// Title, author and friends from the trailer's `/Info` dictionary.
fn read_info_dict(path: &Path) -> std::result::Result<Metadata, lopdf::Error> {
    let doc = lopdf::Document::load(path)?;
    let info = match doc.trailer.get(b"Info") {
        Ok(Object::Reference(id)) => doc.get_object(*id)?,
        Ok(other) => other,
        Err(_) => return Ok(Metadata::default()),
    };
    let dict = info.as_dict()?;

    let field = |key: &[u8]| -> Option<String> {
        let value = match dict.get(key).ok()? {
            Object::Reference(id) => doc.get_object(*id).ok()?,
            direct => direct,
        };
        let Object::String(bytes, _) = value else {
            return None;
        };
        let text = decode_text_string(bytes);
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    };

    Ok(Metadata {
        title: field(b"Title").unwrap_or_default(),
        author: field(b"Author").unwrap_or_default(),
        subject: field(b"Subject"),
        producer: field(b"Producer"),
        ..Metadata::default()
    })
}

/// Decodes a PDF text string: UTF-16BE when it carries a BOM, otherwise the bytes are
/// taken as Latin-1, which covers the printable range of PDFDocEncoding.
fn decode_text_string(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    if let Some(rest) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        return String::from_utf8_lossy(rest).to_string();
    }
    bytes.iter().map(|&b| b as char).collect()
}
