//! Toolkit-agnostic reading session.
//!
//! A [`ReadingSession`] pairs the [`DocumentManager`] with the [`ViewState`] and
//! exposes everything a UI can ask for as a [`Command`]. Shells translate their own
//! input events into commands and redraw from the session state; none of them keep
//! paging or zoom state of their own.

use crate::document::Document;
use crate::error::Result;
use crate::manager::DocumentManager;
use crate::reader::{PageContent, RenderOptions, SearchHit};
use crate::view::{FitMode, ViewState, WheelMode};
use std::path::PathBuf;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Open(PathBuf),
    Close,
    NextPage,
    PrevPage,
    FirstPage,
    LastPage,
    GoToPage(usize),
    ZoomIn,
    ZoomOut,
    SetZoom(f32),
    FitPage,
    FitWidth,
    ToggleZoom,
    ToggleWheelMode,
    Wheel(i32),
}

/// What a shell has to refresh after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing changed (e.g. paging past either end).
    Unchanged,
    /// A different page is current.
    PageChanged,
    /// Same page, new zoom or fit.
    ViewChanged,
    DocumentOpened,
    DocumentClosed,
}

pub struct ReadingSession {
    manager: DocumentManager,
    view: ViewState,
    default_fit: FitMode,
}

impl Default for ReadingSession {
    fn default() -> Self {
        Self::new(RenderOptions::default(), FitMode::Page)
    }
}

impl ReadingSession {
    pub fn new(options: RenderOptions, default_fit: FitMode) -> Self {
        let mut view = ViewState::new(FitMode::Page);
        if default_fit == FitMode::Width {
            view.fit_to_width();
        }
        Self {
            manager: DocumentManager::with_options(options),
            view,
            default_fit,
        }
    }

    pub fn handle(&mut self, command: Command) -> Result<Outcome> {
        debug!(?command, "session command");
        let command = match command {
            Command::Open(path) => return self.open(path),
            Command::Close => return Ok(self.close()),
            other => other,
        };

        let view = &mut self.view;
        let outcome = match command {
            Command::Open(_) | Command::Close => Outcome::Unchanged,
            Command::NextPage => page_outcome(view.next_page()),
            Command::PrevPage => page_outcome(view.prev_page()),
            Command::FirstPage => page_outcome(view.first_page()),
            Command::LastPage => page_outcome(view.last_page()),
            Command::GoToPage(page) => page_outcome(view.go_to_page(page)),
            Command::Wheel(steps) => {
                if view.wheel(steps) {
                    Outcome::PageChanged
                } else if steps != 0 && view.wheel_mode() == WheelMode::Zoom {
                    Outcome::ViewChanged
                } else {
                    Outcome::Unchanged
                }
            }
            Command::ZoomIn => {
                view.zoom_in();
                Outcome::ViewChanged
            }
            Command::ZoomOut => {
                view.zoom_out();
                Outcome::ViewChanged
            }
            Command::SetZoom(level) => {
                view.set_zoom(level);
                Outcome::ViewChanged
            }
            Command::FitPage => {
                view.fit_to_page();
                Outcome::ViewChanged
            }
            Command::FitWidth => {
                view.fit_to_width();
                Outcome::ViewChanged
            }
            Command::ToggleZoom => {
                view.toggle_zoom();
                Outcome::ViewChanged
            }
            Command::ToggleWheelMode => {
                view.toggle_wheel_mode();
                Outcome::ViewChanged
            }
        };

        if outcome == Outcome::PageChanged {
            self.sync_document_page()?;
        }
        Ok(outcome)
    }

    fn open(&mut self, path: PathBuf) -> Result<Outcome> {
        let page_count = self.manager.load_document(&path)?.page_count();
        self.view.reset_for(page_count);
        Ok(Outcome::DocumentOpened)
    }

    fn close(&mut self) -> Outcome {
        if !self.manager.is_loaded() {
            return Outcome::Unchanged;
        }
        self.manager.close();
        self.view.clear();
        Outcome::DocumentClosed
    }

    fn sync_document_page(&mut self) -> Result<()> {
        let page = self.view.current_page();
        self.manager.current_mut()?.set_current_page(page)
    }

    pub fn is_loaded(&self) -> bool {
        self.manager.is_loaded()
    }

    pub fn document(&self) -> Option<&Document> {
        self.manager.document()
    }

    pub fn manager(&self) -> &DocumentManager {
        &self.manager
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn default_fit(&self) -> FitMode {
        self.default_fit
    }

    pub fn current_page(&self) -> usize {
        self.view.current_page()
    }

    pub fn page_count(&self) -> usize {
        self.manager.page_count().unwrap_or(0)
    }

    /// Content of the current page.
    pub fn current_content(&self) -> Result<PageContent> {
        self.manager.page_content(self.view.current_page())
    }

    /// First hit strictly after the current page, wrapping around to the start.
    pub fn find_next(&self, query: &str) -> Result<Option<SearchHit>> {
        let hits = self.manager.current()?.find(query)?;
        let current = self.view.current_page();
        Ok(hits
            .iter()
            .find(|hit| hit.page > current)
            .or_else(|| hits.first())
            .cloned())
    }

    /// Title line for status bars: `"<title> by <author>"` or a ready prompt.
    pub fn info_line(&self) -> String {
        match self.manager.document() {
            Some(doc) => doc.display_name(),
            None => "Ready - press ? for help".to_string(),
        }
    }

    /// `"Page n of m"`, or `None` with nothing open.
    pub fn page_label(&self) -> Option<String> {
        self.manager
            .document()
            .map(|doc| format!("Page {} of {}", self.view.current_page(), doc.page_count()))
    }
}

fn page_outcome(moved: bool) -> Outcome {
    if moved {
        Outcome::PageChanged
    } else {
        Outcome::Unchanged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReaderError;
    use std::fs;

    fn mobi_file(dir: &tempfile::TempDir, name: &str, words: usize) -> PathBuf {
        let path = dir.path().join(name);
        let line = "the quick brown fox jumps over the lazy dog\n";
        fs::write(&path, line.repeat(words / 9 + 1)).unwrap();
        path
    }

    #[test]
    fn commands_without_document_are_rejected_or_noop() {
        let mut session = ReadingSession::default();
        assert_eq!(session.handle(Command::NextPage).unwrap(), Outcome::Unchanged);
        assert_eq!(session.handle(Command::Close).unwrap(), Outcome::Unchanged);
        assert!(matches!(session.current_content(), Err(ReaderError::NotLoaded)));
        assert!(session.page_label().is_none());
    }

    #[test]
    fn paging_keeps_document_in_step() {
        let dir = tempfile::tempdir().unwrap();
        let path = mobi_file(&dir, "long.mobi", 2000);
        let mut session = ReadingSession::default();

        assert_eq!(session.handle(Command::Open(path)).unwrap(), Outcome::DocumentOpened);
        let pages = session.page_count();
        assert!(pages > 2);

        assert_eq!(session.handle(Command::PrevPage).unwrap(), Outcome::Unchanged);
        assert_eq!(session.handle(Command::NextPage).unwrap(), Outcome::PageChanged);
        assert_eq!(session.document().unwrap().current_page(), 2);

        assert_eq!(session.handle(Command::LastPage).unwrap(), Outcome::PageChanged);
        assert_eq!(session.handle(Command::NextPage).unwrap(), Outcome::Unchanged);
        assert_eq!(session.document().unwrap().current_page(), pages);
        assert_eq!(session.page_label().unwrap(), format!("Page {} of {}", pages, pages));

        assert_eq!(session.handle(Command::GoToPage(pages + 1)).unwrap(), Outcome::Unchanged);
        assert_eq!(session.current_page(), pages);
    }

    #[test]
    fn zoom_commands_report_view_changes() {
        let mut session = ReadingSession::default();
        assert_eq!(session.handle(Command::FitPage).unwrap(), Outcome::ViewChanged);
        session.handle(Command::ZoomIn).unwrap();
        assert_eq!(session.view().fit_mode(), FitMode::Custom);
        session.handle(Command::FitWidth).unwrap();
        assert_eq!(session.view().zoom(), 1.0);
        assert_eq!(session.view().fit_mode(), FitMode::Width);
        session.handle(Command::SetZoom(10.0)).unwrap();
        assert_eq!(session.view().zoom(), 5.0);
    }

    #[test]
    fn default_fit_width_is_applied() {
        let session = ReadingSession::new(RenderOptions::default(), FitMode::Width);
        assert_eq!(session.view().fit_mode(), FitMode::Width);
        assert_eq!(session.default_fit(), FitMode::Width);
    }

    #[test]
    fn failed_open_keeps_session() {
        let dir = tempfile::tempdir().unwrap();
        let path = mobi_file(&dir, "first.mobi", 2000);
        let mut session = ReadingSession::default();
        session.handle(Command::Open(path.clone())).unwrap();
        session.handle(Command::NextPage).unwrap();

        let err = session.handle(Command::Open(dir.path().join("book.txt"))).unwrap_err();
        assert!(matches!(err, ReaderError::UnsupportedFormat(_)));
        assert_eq!(session.document().unwrap().path(), path.as_path());
        assert_eq!(session.current_page(), 2);
    }

    #[test]
    fn find_next_wraps_around() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("search.mobi");
        let mut text = "needle appears on the very first page here\n".to_string();
        text.push_str(&"filler words that pad the book out a lot\n".repeat(200));
        fs::write(&path, text).unwrap();

        let mut session = ReadingSession::default();
        session.handle(Command::Open(path)).unwrap();
        session.handle(Command::LastPage).unwrap();
        let hit = session.find_next("NEEDLE").unwrap().unwrap();
        assert_eq!(hit.page, 1);
        assert!(session.find_next("absent").unwrap().is_none());
    }
}
