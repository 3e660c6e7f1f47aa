//! Multi-format document reading core: PDF, EPUB and MOBI readers behind one
//! interface, a single-document manager, and the paging/zoom view state.

pub mod config;
pub mod deps;
pub mod document;
pub mod error;
pub mod history;
pub mod manager;
pub mod reader;
pub mod session;
pub mod view;

pub use document::Document;
pub use error::{ReaderError, Result};
pub use manager::DocumentManager;
pub use reader::{DocumentKind, FormatReader, Metadata, PageContent, PageImage, SearchHit, TocEntry};
pub use session::{Command, Outcome, ReadingSession};
pub use view::{FitMode, ViewState, WheelMode};
