use folio::deps::PopplerTool;
use folio::reader::mobi::PLACEHOLDER_TEXT;
use folio::{Command, DocumentKind, FitMode, Outcome, PageContent, ReaderError, ReadingSession};
use lopdf::{Document as PdfDocument, Object, dictionary};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

const CONTAINER: &str = r#"<?xml version="1.0"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#;

fn write_epub(path: &Path, entries: &[(&str, &str)]) {
    let mut zip = ZipWriter::new(File::create(path).unwrap());
    let options = SimpleFileOptions::default();
    zip.start_file("mimetype", options).unwrap();
    zip.write_all(b"application/epub+zip").unwrap();
    for (name, body) in entries {
        zip.start_file(*name, options).unwrap();
        zip.write_all(body.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
}

fn package(items: &[(&str, &str)]) -> String {
    let manifest: String = items
        .iter()
        .map(|(id, href)| {
            format!(r#"<item id="{id}" href="{href}" media-type="application/xhtml+xml"/>"#)
        })
        .collect();
    let spine: String = items
        .iter()
        .map(|(id, _)| format!(r#"<itemref idref="{id}"/>"#))
        .collect();
    format!(
        r#"<?xml version="1.0"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:title>Tiny Tales</dc:title>
    <dc:creator>Ann Author</dc:creator>
    <dc:creator>Bob Writer</dc:creator>
    <dc:language>en</dc:language>
  </metadata>
  <manifest>{manifest}</manifest>
  <spine>{spine}</spine>
</package>"#
    )
}

fn sample_epub(dir: &Path) -> PathBuf {
    let path = dir.join("tales.epub");
    let opf = package(&[("c1", "one.xhtml"), ("c2", "text/two.xhtml")]);
    write_epub(
        &path,
        &[
            ("META-INF/container.xml", CONTAINER),
            ("OEBPS/content.opf", &opf),
            (
                "OEBPS/one.xhtml",
                "<html><body><h1>Opening</h1><p>Hello, world.</p></body></html>",
            ),
            (
                "OEBPS/text/two.xhtml",
                "<html><body><h2>Ending</h2><p>The dragon sleeps.</p></body></html>",
            ),
        ],
    );
    path
}

fn sample_pdf(path: &Path, pages: usize, title: Option<&str>) {
    let mut doc = PdfDocument::with_version("1.5");
    let pages_id = doc.new_object_id();
    let kids: Vec<Object> = (0..pages)
        .map(|_| {
            doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
            })
            .into()
        })
        .collect();
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages as i64,
            "MediaBox" => vec![0.into(), 0.into(), 200.into(), 300.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    if let Some(title) = title {
        let info_id = doc.add_object(dictionary! {
            "Title" => Object::string_literal(title),
        });
        doc.trailer.set("Info", info_id);
    }
    doc.save(path).unwrap();
}

#[test]
fn epub_chapters_become_pages() {
    let dir = tempfile::tempdir().unwrap();
    let path = sample_epub(dir.path());

    let mut session = ReadingSession::default();
    assert_eq!(
        session.handle(Command::Open(path)).unwrap(),
        Outcome::DocumentOpened
    );
    let doc = session.document().unwrap();
    assert_eq!(doc.kind(), DocumentKind::Epub);
    assert_eq!(doc.page_count(), 2);
    assert_eq!(doc.title(), "Tiny Tales");
    assert_eq!(doc.author(), "Ann Author, Bob Writer");
    assert_eq!(doc.metadata().language.as_deref(), Some("en"));

    let toc: Vec<_> = doc.toc().into_iter().map(|e| e.title).collect();
    assert_eq!(toc, vec!["Opening", "Ending"]);

    match session.current_content().unwrap() {
        PageContent::Text(text) => assert!(text.contains("Hello, world.")),
        other => panic!("expected text, got {:?}", other),
    }
    session.handle(Command::NextPage).unwrap();
    assert!(session.current_content().unwrap().as_text().unwrap().contains("dragon"));

    let hit = session.find_next("DRAGON").unwrap().unwrap();
    assert_eq!(hit.page, 2);
}

#[test]
fn epub_page_is_exact_body_text() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("menu.epub");
    let opf = package(&[("c1", "menu.xhtml")]);
    write_epub(
        &path,
        &[
            ("META-INF/container.xml", CONTAINER),
            ("OEBPS/content.opf", &opf),
            (
                "OEBPS/menu.xhtml",
                "<html><head><script src=\"menu.js\"/></head><body><p>Fish &amp; chips</p></body></html>",
            ),
        ],
    );

    let mut session = ReadingSession::default();
    session.handle(Command::Open(path)).unwrap();
    let doc = session.document().unwrap();
    assert_eq!(doc.page_count(), 1);
    assert_eq!(
        doc.page_content(1).unwrap(),
        PageContent::Text("Fish & chips".into())
    );
}

#[test]
fn epub_without_container_is_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.epub");
    write_epub(&path, &[("OEBPS/content.opf", &package(&[]))]);

    let mut session = ReadingSession::default();
    let err = session.handle(Command::Open(path)).unwrap_err();
    assert!(matches!(err, ReaderError::ParseError(_)), "{err}");
    assert!(!session.is_loaded());
}

#[test]
fn epub_without_readable_chapters_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("blank.epub");
    let opf = package(&[("c1", "blank.xhtml"), ("c2", "missing.xhtml")]);
    write_epub(
        &path,
        &[
            ("META-INF/container.xml", CONTAINER),
            ("OEBPS/content.opf", &opf),
            ("OEBPS/blank.xhtml", "<html><body><style>p{}</style></body></html>"),
        ],
    );

    let err = ReadingSession::default()
        .handle(Command::Open(path))
        .unwrap_err();
    assert!(matches!(err, ReaderError::EmptyDocument(_)));
}

#[test]
fn zip_garbage_is_load_failure() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fake.epub");
    fs::write(&path, b"definitely not a zip").unwrap();
    let err = ReadingSession::default()
        .handle(Command::Open(path))
        .unwrap_err();
    assert!(err.is_load_error());
}

#[test]
fn pdf_page_count_metadata_and_bounds() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("three.pdf");
    sample_pdf(&path, 3, Some("Three Pages"));

    let mut session = ReadingSession::default();
    session.handle(Command::Open(path)).unwrap();
    let doc = session.document().unwrap();
    assert_eq!(doc.page_count(), 3);
    assert_eq!(doc.title(), "Three Pages");
    assert_eq!(doc.toc()[2].title, "Page 3");
    assert!(matches!(
        doc.page_content(4),
        Err(ReaderError::OutOfRange { page: 4, page_count: 3 })
    ));
    assert!(matches!(doc.page_content(0), Err(ReaderError::OutOfRange { .. })));

    if PopplerTool::Pdftoppm.locate().is_err() {
        eprintln!("pdftoppm not installed, skipping render check");
        return;
    }
    let image = session.current_content().unwrap();
    let image = image.as_image().unwrap();
    assert!(image.width > 0 && image.height > image.width);
    assert!(image.decode().is_ok());
}

#[test]
fn pdf_without_info_gets_default_title() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("untitled.pdf");
    sample_pdf(&path, 1, None);

    let mut session = ReadingSession::default();
    session.handle(Command::Open(path)).unwrap();
    assert_eq!(session.document().unwrap().title(), "PDF Document");
    assert_eq!(session.info_line(), "PDF Document");
}

#[test]
fn mobi_binary_noise_falls_back_to_placeholder() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("noise.mobi");
    fs::write(&path, (0u8..32).cycle().take(4096).collect::<Vec<_>>()).unwrap();

    let mut session = ReadingSession::default();
    session.handle(Command::Open(path)).unwrap();
    assert_eq!(session.page_count(), 1);
    assert_eq!(
        session.current_content().unwrap(),
        PageContent::Text(PLACEHOLDER_TEXT.to_string())
    );
}

#[test]
fn failed_reload_keeps_previous_document() {
    let dir = tempfile::tempdir().unwrap();
    let good = sample_epub(dir.path());
    let corrupt = dir.path().join("corrupt.pdf");
    fs::write(&corrupt, b"%PDF-1.4 truncated").unwrap();

    let mut session = ReadingSession::default();
    session.handle(Command::Open(good.clone())).unwrap();
    session.handle(Command::NextPage).unwrap();

    let err = session.handle(Command::Open(corrupt)).unwrap_err();
    assert!(err.is_load_error(), "{err}");
    assert_eq!(session.document().unwrap().path(), good.as_path());
    assert_eq!(session.current_page(), 2);
    assert!(session.current_content().unwrap().as_text().is_some());
}

#[test]
fn unsupported_extension_leaves_state_alone() {
    let dir = tempfile::tempdir().unwrap();
    let notes = dir.path().join("notes.txt");
    fs::write(&notes, "plain text").unwrap();

    let mut session = ReadingSession::default();
    let err = session.handle(Command::Open(notes)).unwrap_err();
    assert_eq!(err.to_string(), "Unsupported file format: .txt");
    assert!(!session.is_loaded());
    assert!(matches!(session.current_content(), Err(ReaderError::NotLoaded)));
}

#[test]
fn zoom_and_fit_transitions() {
    let mut session = ReadingSession::default();
    for _ in 0..20 {
        session.handle(Command::ZoomIn).unwrap();
    }
    assert_eq!(session.view().zoom(), 5.0);
    assert_eq!(session.view().status_label(), "Zoom: 500% (custom)");

    session.handle(Command::FitWidth).unwrap();
    assert_eq!(
        (session.view().fit_mode(), session.view().zoom()),
        (FitMode::Width, 1.0)
    );
    session.handle(Command::ToggleZoom).unwrap();
    assert_eq!(session.view().fit_mode(), FitMode::Page);

    session.handle(Command::ToggleWheelMode).unwrap();
    assert_eq!(session.handle(Command::Wheel(-1)).unwrap(), Outcome::ViewChanged);
    assert!((session.view().zoom() - 0.8).abs() < 1e-6);
}
