use anyhow::{Result, anyhow};
use folio::config::AppConfig;
use folio::history::{Bookmark, History, RecentDocument};
use folio::reader::{self, PageContent, TocEntry};
use folio::session::{Command, Outcome, ReadingSession};
use folio::view::FitMode;
use image::DynamicImage;
use image::imageops::FilterType;
use ratatui::layout::Rect;
use ratatui_image::Resize;
use ratatui_image::picker::Picker;
use ratatui_image::protocol::Protocol;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

#[derive(PartialEq, Clone, Copy, Debug)]
pub enum AppView {
    Library,
    Reader,
    Search,
    GoTo,
    Toc,
    Bookmarks,
    PathInput,
    FileExplorer,
    Help,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Theme {
    Default,
    Gruvbox,
    Nord,
    Sepia,
}

impl Theme {
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "gruvbox" => Theme::Gruvbox,
            "nord" => Theme::Nord,
            "sepia" => Theme::Sepia,
            _ => Theme::Default,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Theme::Default => "default",
            Theme::Gruvbox => "gruvbox",
            Theme::Nord => "nord",
            Theme::Sepia => "sepia",
        }
    }
}

/// Everything the rendered page protocol depends on.
#[derive(Clone, Copy, PartialEq, Debug)]
struct ImageKey {
    page: usize,
    zoom_percent: u32,
    fit: FitMode,
    area: (u16, u16),
    scroll: u16,
}

struct RenderedPage {
    key: ImageKey,
    protocol: Protocol,
}

pub struct App {
    pub view: AppView,
    pub previous_view: Option<AppView>,
    pub session: ReadingSession,
    pub config: AppConfig,
    history: Option<History>,
    pub recent: Vec<RecentDocument>,
    pub selected_recent_index: usize,
    pub should_quit: bool,
    pub theme: Theme,
    pub input: String,
    pub last_search: String,
    pub toc_items: Vec<TocEntry>,
    pub selected_toc_index: usize,
    pub bookmarks: Vec<Bookmark>,
    pub selected_bookmark_index: usize,
    pub status: Option<String>,
    pub error: Option<String>,
    // Explorer State
    pub explorer_path: String,
    pub explorer_results: Vec<PathBuf>,
    pub selected_explorer_index: usize,
    // Page State
    pub scroll: u16,
    pub image_picker: Picker,
    decoded: Option<(usize, DynamicImage)>,
    rendered: Option<RenderedPage>,
}

impl App {
    pub fn new(config: AppConfig) -> Self {
        let history = match History::new(&config.history_path, config.recent_limit) {
            Ok(history) => Some(history),
            Err(e) => {
                warn!(path = %config.history_path, error = %e, "recent documents unavailable");
                None
            }
        };
        let session = ReadingSession::new(config.render_options(), config.default_fit());
        let mut app = Self {
            view: AppView::Library,
            previous_view: None,
            session,
            theme: Theme::from_name(&config.theme),
            explorer_path: config.library_path.clone(),
            config,
            history,
            recent: Vec::new(),
            selected_recent_index: 0,
            should_quit: false,
            input: String::new(),
            last_search: String::new(),
            toc_items: Vec::new(),
            selected_toc_index: 0,
            bookmarks: Vec::new(),
            selected_bookmark_index: 0,
            status: None,
            error: None,
            explorer_results: Vec::new(),
            selected_explorer_index: 0,
            scroll: 0,
            image_picker: Picker::halfblocks(),
            decoded: None,
            rendered: None,
        };
        app.refresh_recent();
        app
    }

    /// Queries the terminal for a graphics protocol. Needs raw mode.
    pub fn detect_image_protocol(&mut self) {
        self.image_picker = Picker::from_query_stdio().unwrap_or_else(|e| {
            warn!(error = ?e, "terminal graphics query failed, using halfblocks");
            Picker::halfblocks()
        });
        self.rendered = None;
    }

    pub fn refresh_recent(&mut self) {
        self.recent = match &self.history {
            Some(history) => history.recent().unwrap_or_else(|e| {
                warn!(error = %e, "failed to read recent documents");
                Vec::new()
            }),
            None => Vec::new(),
        };
        if self.selected_recent_index >= self.recent.len() {
            self.selected_recent_index = self.recent.len().saturating_sub(1);
        }
    }

    pub fn show_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!(%message, "showing error");
        self.error = Some(message);
    }

    pub fn open_selected_recent(&mut self) {
        if let Some(doc) = self.recent.get(self.selected_recent_index) {
            let path = PathBuf::from(&doc.path);
            self.open_path(&path);
        }
    }

    pub fn remove_selected_recent(&mut self) {
        let Some(doc) = self.recent.get(self.selected_recent_index) else {
            return;
        };
        if let Some(history) = &self.history {
            if let Err(e) = history.remove(&doc.path) {
                warn!(error = %e, "failed to remove recent document");
            }
        }
        self.refresh_recent();
    }

    pub fn clear_recent(&mut self) {
        if let Some(history) = &self.history {
            if let Err(e) = history.clear() {
                warn!(error = %e, "failed to clear recent documents");
            }
        }
        self.selected_recent_index = 0;
        self.refresh_recent();
    }

    /// Opens `path`, recording it in the recent list and restoring the last
    /// position. A failure leaves the current document and view untouched.
    pub fn open_path(&mut self, path: &Path) {
        self.save_position();
        if let Err(e) = self.session.handle(Command::Open(path.to_path_buf())) {
            self.show_error(e.to_string());
            return;
        }
        self.reset_page_state();

        let Some(doc) = self.session.document() else {
            return;
        };
        let key = path.to_string_lossy().to_string();
        let (title, author) = (doc.title().to_string(), doc.author().to_string());
        let (kind, page_count) = (doc.kind().label(), doc.page_count());

        let mut resume = None;
        if let Some(history) = &self.history {
            if self.config.remember_position {
                resume = history.last_page(&key).ok().flatten();
            }
            if let Err(e) = history.record_open(&key, &title, &author, kind, page_count) {
                warn!(error = %e, "failed to record recent document");
            }
        }
        if let Some(page) = resume.filter(|&p| p > 1) {
            self.dispatch(Command::GoToPage(page));
        }
        info!(path = %path.display(), "opened");
        self.status = None;
        self.view = AppView::Reader;
        self.refresh_recent();
    }

    pub fn close_document(&mut self) {
        self.save_position();
        if let Err(e) = self.session.handle(Command::Close) {
            self.show_error(e.to_string());
        }
        self.reset_page_state();
        self.view = AppView::Library;
        self.refresh_recent();
    }

    pub fn dispatch(&mut self, command: Command) {
        match self.session.handle(command) {
            Ok(Outcome::PageChanged) => {
                self.scroll = 0;
                self.status = None;
            }
            Ok(_) => {}
            Err(e) => self.show_error(e.to_string()),
        }
    }

    pub fn save_position(&self) {
        let (Some(history), Some(doc)) = (&self.history, self.session.document()) else {
            return;
        };
        let key = doc.path().to_string_lossy();
        if let Err(e) = history.update_position(&key, self.session.current_page()) {
            warn!(error = %e, "failed to save reading position");
        }
    }

    fn reset_page_state(&mut self) {
        self.scroll = 0;
        self.decoded = None;
        self.rendered = None;
    }

    pub fn scroll_down(&mut self) {
        self.scroll = self.scroll.saturating_add(1);
    }

    pub fn scroll_up(&mut self) {
        self.scroll = self.scroll.saturating_sub(1);
    }

    pub fn toggle_help(&mut self) {
        if self.view == AppView::Help {
            self.view = self.previous_view.take().unwrap_or(AppView::Library);
        } else {
            self.previous_view = Some(self.view);
            self.view = AppView::Help;
        }
    }

    pub fn toggle_theme(&mut self) {
        self.theme = match self.theme {
            Theme::Default => Theme::Gruvbox,
            Theme::Gruvbox => Theme::Nord,
            Theme::Nord => Theme::Sepia,
            Theme::Sepia => Theme::Default,
        };
        self.config.theme = self.theme.name().to_string();
        if let Err(e) = self.config.save() {
            warn!(error = %e, "failed to save config");
        }
    }

    // Table of contents

    pub fn open_toc(&mut self) {
        let Some(doc) = self.session.document() else {
            return;
        };
        self.toc_items = doc.toc();
        let current = self.session.current_page();
        self.selected_toc_index = self
            .toc_items
            .iter()
            .rposition(|entry| entry.page <= current)
            .unwrap_or(0);
        self.view = AppView::Toc;
    }

    pub fn jump_to_toc(&mut self) {
        if let Some(entry) = self.toc_items.get(self.selected_toc_index) {
            let page = entry.page;
            self.dispatch(Command::GoToPage(page));
        }
        self.view = AppView::Reader;
    }

    // Bookmarks

    /// Bookmarks the current page, or removes the bookmark already there.
    pub fn toggle_bookmark(&mut self) {
        let (Some(history), Some(doc)) = (&self.history, self.session.document()) else {
            return;
        };
        let key = doc.path().to_string_lossy().to_string();
        let page = self.session.current_page();
        let title = doc
            .toc()
            .into_iter()
            .find(|entry| entry.page == page)
            .map(|entry| entry.title)
            .unwrap_or_default();
        match history.toggle_bookmark(&key, page, &title) {
            Ok(true) => self.status = Some(format!("Bookmarked page {}", page)),
            Ok(false) => self.status = Some(format!("Removed bookmark on page {}", page)),
            Err(e) => self.show_error(format!("Failed to update bookmark: {}", e)),
        }
    }

    pub fn current_page_bookmarked(&self) -> bool {
        let (Some(history), Some(doc)) = (&self.history, self.session.document()) else {
            return false;
        };
        history
            .has_bookmark(&doc.path().to_string_lossy(), self.session.current_page())
            .unwrap_or(false)
    }

    fn refresh_bookmarks(&mut self) {
        self.bookmarks = match (&self.history, self.session.document()) {
            (Some(history), Some(doc)) => history
                .bookmarks(&doc.path().to_string_lossy())
                .unwrap_or_else(|e| {
                    warn!(error = %e, "failed to read bookmarks");
                    Vec::new()
                }),
            _ => Vec::new(),
        };
        if self.selected_bookmark_index >= self.bookmarks.len() {
            self.selected_bookmark_index = self.bookmarks.len().saturating_sub(1);
        }
    }

    pub fn open_bookmarks(&mut self) {
        if !self.session.is_loaded() {
            return;
        }
        self.refresh_bookmarks();
        let current = self.session.current_page();
        self.selected_bookmark_index = self
            .bookmarks
            .iter()
            .rposition(|mark| mark.page <= current)
            .unwrap_or(0);
        self.view = AppView::Bookmarks;
    }

    pub fn jump_to_bookmark(&mut self) {
        if let Some(mark) = self.bookmarks.get(self.selected_bookmark_index) {
            let page = mark.page;
            self.dispatch(Command::GoToPage(page));
        }
        self.view = AppView::Reader;
    }

    pub fn remove_selected_bookmark(&mut self) {
        let Some(mark) = self.bookmarks.get(self.selected_bookmark_index) else {
            return;
        };
        if let Some(history) = &self.history {
            if let Err(e) = history.remove_bookmark(&mark.path, mark.page) {
                warn!(error = %e, "failed to remove bookmark");
            }
        }
        self.refresh_bookmarks();
    }

    // Search and go-to prompts

    pub fn begin_input(&mut self, view: AppView) {
        self.input.clear();
        self.view = view;
    }

    pub fn run_search(&mut self) {
        self.view = AppView::Reader;
        let query = self.input.trim();
        if query.is_empty() {
            return;
        }
        self.last_search = query.to_string();
        self.repeat_search();
    }

    /// Searches for the last submitted query from the page after the current one.
    pub fn repeat_search(&mut self) {
        if self.last_search.is_empty() {
            return;
        }
        let query = self.last_search.clone();
        match self.session.find_next(&query) {
            Ok(Some(hit)) => {
                self.dispatch(Command::GoToPage(hit.page));
                self.status = Some(format!("p.{}: {}", hit.page, hit.context));
            }
            Ok(None) => self.status = Some(format!("No match for \"{}\"", query)),
            Err(e) => self.show_error(e.to_string()),
        }
    }

    pub fn run_go_to(&mut self) {
        self.view = AppView::Reader;
        match self.input.trim().parse::<usize>() {
            Ok(page) if (1..=self.session.page_count()).contains(&page) => {
                self.dispatch(Command::GoToPage(page))
            }
            _ => {
                self.status = Some(format!(
                    "Enter a page between 1 and {}",
                    self.session.page_count()
                ))
            }
        }
    }

    // File explorer

    pub fn start_scan(&mut self) {
        self.explorer_results = Self::scan_for_documents(&self.explorer_path);
        self.selected_explorer_index = 0;
        info!(path = %self.explorer_path, found = self.explorer_results.len(), "scan finished");
        self.view = AppView::FileExplorer;
    }

    pub fn scan_for_documents<P: AsRef<Path>>(root: P) -> Vec<PathBuf> {
        let mut results: Vec<PathBuf> = WalkDir::new(root)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file() && reader::is_supported(e.path()))
            .map(|e| e.into_path())
            .collect();
        results.sort();
        results
    }

    pub fn open_selected_explorer(&mut self) {
        if let Some(path) = self.explorer_results.get(self.selected_explorer_index).cloned() {
            self.open_path(&path);
        }
    }

    // Page rendering

    /// Text of the current page, or `None` for raster pages.
    pub fn page_text(&self) -> Option<String> {
        match self.session.current_content() {
            Ok(PageContent::Text(text)) => Some(text),
            Ok(PageContent::Image(_)) => None,
            Err(e) => Some(format!("[ {} ]", e)),
        }
    }

    pub fn is_raster(&self) -> bool {
        self.session
            .document()
            .is_some_and(|doc| doc.kind().is_raster())
    }

    /// Builds the image protocol for the current page inside `area`, reusing the
    /// previous one when nothing it depends on has changed.
    pub fn prepare_page_image(&mut self, area: Rect) -> Result<Option<&Protocol>> {
        let view = self.session.view();
        let key = ImageKey {
            page: view.current_page(),
            zoom_percent: view.zoom_percent(),
            fit: view.fit_mode(),
            area: (area.width, area.height),
            scroll: self.scroll,
        };
        if self.rendered.as_ref().is_some_and(|r| r.key == key) {
            return Ok(self.rendered.as_ref().map(|r| &r.protocol));
        }

        if self.decoded.as_ref().is_none_or(|(page, _)| *page != key.page) {
            let content = self.session.current_content()?;
            let Some(page_image) = content.as_image() else {
                return Ok(None);
            };
            let decoded = page_image
                .decode()
                .map_err(|e| anyhow!("Failed to decode page {}: {}", key.page, e))?;
            self.decoded = Some((key.page, decoded));
        }
        let Some((_, image)) = self.decoded.as_ref() else {
            return Ok(None);
        };

        let (font_w, font_h) = self.image_picker.font_size();
        let viewport = (
            area.width as u32 * font_w.max(1) as u32,
            area.height as u32 * font_h.max(1) as u32,
        );
        let (w, h) = view.display_size((image.width(), image.height()), viewport);

        // Clamp scrolling to the bottom of the scaled page.
        let max_rows = h.saturating_sub(viewport.1).div_ceil(font_h.max(1) as u32);
        let scroll = (key.scroll as u32).min(max_rows);
        let top = scroll * font_h.max(1) as u32;
        let visible = (w.min(viewport.0), h.saturating_sub(top).min(viewport.1).max(1));

        let scale = w as f32 / image.width().max(1) as f32;
        let source = image.crop_imm(
            0,
            (top as f32 / scale) as u32,
            ((visible.0 as f32 / scale) as u32).max(1),
            ((visible.1 as f32 / scale) as u32).max(1),
        );
        let scaled = source.resize_exact(visible.0, visible.1, FilterType::Triangle);

        let protocol = self
            .image_picker
            .new_protocol(scaled, area, Resize::Fit(None))
            .map_err(|e| anyhow!("Failed to build image: {:?}", e))?;
        self.scroll = scroll as u16;
        let key = ImageKey {
            scroll: self.scroll,
            ..key
        };
        Ok(Some(&self.rendered.insert(RenderedPage { key, protocol }).protocol))
    }
}
