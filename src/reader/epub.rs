use super::{Metadata, PageContent, TocEntry, check_page, text};
use crate::error::{ReaderError, Result};
use percent_encoding::percent_decode_str;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use tracing::{debug, info};
use zip::ZipArchive;

const CONTAINER_PATH: &str = "META-INF/container.xml";

/// One readable spine item.
struct Chapter {
    title: Option<String>,
    text: String,
}

/// EPUB reader. Every spine chapter is flattened to plain text at open time; a
/// chapter whose text comes out empty is dropped, so pages map to non-empty chapters.
pub struct EpubReader {
    metadata: Metadata,
    chapters: Vec<Chapter>,
    closed: bool,
}

/// The parts of the OPF package document the reader needs.
#[derive(Debug, Default)]
struct Package {
    metadata: Metadata,
    /// manifest id -> (href, media-type)
    manifest: HashMap<String, (String, String)>,
    spine: Vec<String>,
}

impl EpubReader {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| ReaderError::LoadFailure(format!("{}: {}", path.display(), e)))?;
        let mut archive = ZipArchive::new(BufReader::new(file))
            .map_err(|e| ReaderError::LoadFailure(format!("not a ZIP archive: {}", e)))?;

        let container = read_entry(&mut archive, CONTAINER_PATH)
            .ok_or_else(|| ReaderError::ParseError("container.xml not found".to_string()))?;
        let opf_path = parse_container(&container)?;
        let opf = read_entry(&mut archive, &opf_path)
            .ok_or_else(|| ReaderError::ParseError(format!("package document {} not found", opf_path)))?;
        let package = parse_package(&opf)?;

        let base = opf_path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("");
        let mut chapters = Vec::new();
        for idref in &package.spine {
            let Some((href, media_type)) = package.manifest.get(idref) else {
                debug!(idref, "spine item missing from manifest");
                continue;
            };
            if media_type != "application/xhtml+xml" && media_type != "text/html" {
                continue;
            }
            let entry = resolve_href(base, href);
            let Some(html) = read_entry(&mut archive, &entry) else {
                debug!(entry, "spine item missing from archive");
                continue;
            };
            let text = text::html_to_text(&html);
            if text.is_empty() {
                continue;
            }
            chapters.push(Chapter {
                title: text::chapter_heading(&html),
                text,
            });
        }

        if chapters.is_empty() {
            return Err(ReaderError::EmptyDocument(path.display().to_string()));
        }

        info!(path = %path.display(), chapters = chapters.len(), "opened EPUB");
        Ok(Self {
            metadata: package.metadata,
            chapters,
            closed: false,
        })
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn page_count(&self) -> usize {
        self.chapters.len()
    }

    pub fn page_content(&self, page: usize) -> Result<PageContent> {
        self.page_text(page).map(|s| PageContent::Text(s.to_string()))
    }

    pub fn page_text(&self, page: usize) -> Result<&str> {
        if self.closed {
            return Err(ReaderError::NotLoaded);
        }
        let index = check_page(page, self.chapters.len())?;
        Ok(&self.chapters[index].text)
    }

    pub fn toc(&self) -> Vec<TocEntry> {
        self.chapters
            .iter()
            .enumerate()
            .map(|(i, chapter)| TocEntry {
                page: i + 1,
                title: chapter
                    .title
                    .clone()
                    .unwrap_or_else(|| format!("Chapter {}", i + 1)),
            })
            .collect()
    }

    pub fn close(&mut self) {
        if !self.closed {
            self.chapters.clear();
            self.closed = true;
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

/// Reads a ZIP entry as text, tolerating a UTF-8 BOM and percent-encoded names.
fn read_entry<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> Option<String> {
    let name = if archive.by_name(name).is_ok() {
        name.to_string()
    } else {
        percent_decode(name)?
    };
    let mut bytes = Vec::new();
    archive.by_name(&name).ok()?.read_to_end(&mut bytes).ok()?;
    let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(&bytes[..]);
    Some(String::from_utf8_lossy(bytes).into_owned())
}

fn percent_decode(name: &str) -> Option<String> {
    if !name.contains('%') {
        return None;
    }
    percent_decode_str(name)
        .decode_utf8()
        .ok()
        .map(Cow::into_owned)
}

/// Joins `href` onto the package directory, dropping any fragment and folding `.`
/// and `..` segments.
fn resolve_href(base: &str, href: &str) -> String {
    let href = href.split('#').next().unwrap_or(href);
    let mut parts: Vec<&str> = base.split('/').filter(|s| !s.is_empty()).collect();
    for segment in href.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    parts.join("/")
}

/// Extracts the `full-path` of the first rootfile in `META-INF/container.xml`.
fn parse_container(xml: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Empty(e)) | Ok(Event::Start(e)) if local_name(e.name().as_ref()) == b"rootfile" => {
                if let Some(path) = attribute(&e, b"full-path").filter(|p| !p.is_empty()) {
                    return Ok(path);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ReaderError::ParseError(format!("container.xml: {}", e))),
            _ => {}
        }
    }

    Err(ReaderError::ParseError(
        "package path not found in container.xml".to_string(),
    ))
}

fn parse_package(xml: &str) -> Result<Package> {
    // Untrimmed: entity references split text events.
    let mut reader = Reader::from_str(xml);

    let mut package = Package::default();
    let mut creators: Vec<String> = Vec::new();
    let mut saw_package = false;
    let mut in_metadata = false;
    let mut field: Option<&'static str> = None;
    let mut buf = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match local_name(e.name().as_ref()) {
                b"package" => saw_package = true,
                b"metadata" => in_metadata = true,
                b"item" => add_manifest_item(&mut package, &e),
                b"itemref" => add_spine_item(&mut package, &e),
                name if in_metadata => {
                    field = match name {
                        b"title" => Some("title"),
                        b"creator" => Some("creator"),
                        b"language" => Some("language"),
                        b"publisher" => Some("publisher"),
                        b"description" => Some("description"),
                        _ => None,
                    };
                    buf.clear();
                }
                _ => {}
            },
            Ok(Event::Empty(e)) => match local_name(e.name().as_ref()) {
                b"item" => add_manifest_item(&mut package, &e),
                b"itemref" => add_spine_item(&mut package, &e),
                _ => {}
            },
            Ok(Event::Text(e)) => {
                if field.is_some() {
                    buf.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Ok(Event::CData(e)) => {
                if field.is_some() {
                    buf.push_str(&String::from_utf8_lossy(&e));
                }
            }
            Ok(Event::GeneralRef(e)) => {
                if field.is_some() {
                    let entity = format!("&{};", String::from_utf8_lossy(e.as_ref()));
                    buf.push_str(&html_escape::decode_html_entities(&entity));
                }
            }
            Ok(Event::End(e)) => {
                let name = e.name();
                let local = local_name(name.as_ref());
                if local == b"metadata" {
                    in_metadata = false;
                }
                if let Some(current) = field.take() {
                    let value = text::collapse_whitespace(&buf);
                    let meta = &mut package.metadata;
                    match current {
                        "title" if meta.title.is_empty() => meta.title = value,
                        "creator" if !value.is_empty() => creators.push(value),
                        "language" if meta.language.is_none() => meta.language = Some(value),
                        "publisher" if meta.publisher.is_none() => meta.publisher = Some(value),
                        "description" if meta.description.is_none() => {
                            meta.description = Some(text::html_to_text(&value))
                        }
                        _ => {}
                    }
                    buf.clear();
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ReaderError::ParseError(format!("package document: {}", e))),
            _ => {}
        }
    }

    if !saw_package {
        return Err(ReaderError::ParseError(
            "package document has no <package> element".to_string(),
        ));
    }

    package.metadata.author = creators.join(", ");
    Ok(package)
}

fn add_manifest_item(package: &mut Package, e: &BytesStart) {
    let id = attribute(e, b"id").unwrap_or_default();
    if id.is_empty() {
        return;
    }
    let href = attribute(e, b"href").unwrap_or_default();
    let media_type = attribute(e, b"media-type").unwrap_or_default();
    package.manifest.insert(id, (href, media_type));
}

fn add_spine_item(package: &mut Package, e: &BytesStart) {
    if let Some(idref) = attribute(e, b"idref") {
        package.spine.push(idref);
    }
}

fn attribute(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == key)
        .map(|attr| String::from_utf8_lossy(&attr.value).into_owned())
}

/// `dc:title` -> `title`
fn local_name(name: &[u8]) -> &[u8] {
    name.iter()
        .rposition(|&b| b == b':')
        .map(|i| &name[i + 1..])
        .unwrap_or(name)
}
