mod app;
mod ui;

use anyhow::{Context, Result};
use app::{App, AppView};
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseEventKind,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use folio::config::{self, AppConfig};
use folio::history::History;
use folio::reader::{DocumentKind, RenderOptions};
use folio::session::Command;
use folio::Document;
use ratatui::{Terminal, backend::CrosstermBackend};
use std::path::{Path, PathBuf};
use std::{fs, io, sync::Mutex, time::Duration};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let config = AppConfig::load().unwrap_or_else(|e| {
        eprintln!("Ignoring invalid configuration: {}", e);
        AppConfig::default()
    });
    init_logging();

    match args.get(1).map(String::as_str) {
        Some("-h" | "--help") => {
            print_usage();
            return Ok(());
        }
        Some("info") => {
            let path = args.get(2).context("usage: folio info <path>")?;
            return print_info(Path::new(path), &config.render_options());
        }
        Some("recent") => return print_recent(&config),
        _ => {}
    }

    let mut app = App::new(config);
    let res = run_tui(&mut app, args.get(1).map(PathBuf::from));
    app.save_position();

    if let Err(err) = res {
        error!(error = ?err, "terminal session failed");
        println!("{:?}", err)
    }
    Ok(())
}

fn init_logging() {
    let dir = config::data_dir();
    let file = fs::create_dir_all(&dir).and_then(|_| {
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join("folio.log"))
    });
    let Ok(file) = file else {
        return;
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("FOLIO_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
}

fn print_usage() {
    println!("Usage: folio [PATH]        open a document (or browse recent documents)");
    println!("       folio info <PATH>   print metadata, page count and contents");
    println!("       folio recent        list recently opened documents");
}

fn print_info(path: &Path, options: &RenderOptions) -> Result<()> {
    let kind = DocumentKind::from_path(path).with_context(|| {
        format!(
            "Unsupported file format: {}",
            folio::reader::display_extension(path)
        )
    })?;
    let doc = Document::open(path, kind, options)?;
    let meta = doc.metadata();
    println!("File:      {}", doc.file_name());
    println!("Format:    {}", kind.label());
    println!("Title:     {}", doc.title());
    if !meta.author.is_empty() {
        println!("Author:    {}", meta.author);
    }
    for (label, value) in [
        ("Language", &meta.language),
        ("Publisher", &meta.publisher),
        ("Subject", &meta.subject),
        ("Producer", &meta.producer),
    ] {
        if let Some(value) = value {
            println!("{:<10} {}", format!("{}:", label), value);
        }
    }
    println!("Pages:     {}", doc.page_count());
    println!();
    for entry in doc.toc() {
        println!("{:>5}  {}", entry.page, entry.title);
    }
    Ok(())
}

fn print_recent(config: &AppConfig) -> Result<()> {
    let history = History::new(&config.history_path, config.recent_limit)?;
    for doc in history.recent()? {
        println!(
            "{}  [{}] {} (p.{}/{})  {}",
            doc.last_opened.format("%Y-%m-%d %H:%M"),
            doc.format,
            doc.title,
            doc.last_page,
            doc.page_count,
            doc.path
        );
    }
    Ok(())
}

fn run_tui(app: &mut App, initial: Option<PathBuf>) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    app.detect_image_protocol();
    if let Some(path) = initial {
        app.open_path(&path);
    }
    info!("terminal session started");

    let res = run_app(&mut terminal, app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    res
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    loop {
        terminal
            .draw(|f| ui::render(f, app))
            .map_err(|e| anyhow::anyhow!(e.to_string()))?;

        if event::poll(Duration::from_millis(100))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => handle_key(app, key),
                Event::Mouse(mouse) if app.view == AppView::Reader => match mouse.kind {
                    MouseEventKind::ScrollDown => app.dispatch(Command::Wheel(1)),
                    MouseEventKind::ScrollUp => app.dispatch(Command::Wheel(-1)),
                    _ => {}
                },
                _ => {}
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    if app.error.take().is_some() {
        return;
    }
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match app.view {
        AppView::Library => match key.code {
            KeyCode::Char('q') => app.should_quit = true,
            KeyCode::Char('?') => app.toggle_help(),
            KeyCode::Char('T') => app.toggle_theme(),
            KeyCode::Down | KeyCode::Char('j') => {
                if !app.recent.is_empty() {
                    app.selected_recent_index = (app.selected_recent_index + 1) % app.recent.len();
                }
            }
            KeyCode::Up | KeyCode::Char('k') => {
                if !app.recent.is_empty() {
                    app.selected_recent_index = app
                        .selected_recent_index
                        .checked_sub(1)
                        .unwrap_or(app.recent.len() - 1);
                }
            }
            KeyCode::Enter => app.open_selected_recent(),
            KeyCode::Char('d') => app.remove_selected_recent(),
            KeyCode::Char('X') => app.clear_recent(),
            KeyCode::Char('o') => {
                app.explorer_path = app.config.library_path.clone();
                app.start_scan();
            }
            KeyCode::Char('p') => app.view = AppView::PathInput,
            KeyCode::Esc if app.session.is_loaded() => app.view = AppView::Reader,
            _ => {}
        },
        AppView::Reader => match key.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                app.save_position();
                app.view = AppView::Library;
                app.refresh_recent();
            }
            KeyCode::Char('c') => app.close_document(),
            KeyCode::Char('?') => app.toggle_help(),
            KeyCode::Char('T') => app.toggle_theme(),
            KeyCode::Right | KeyCode::Char('l') | KeyCode::PageDown | KeyCode::Char(' ') => {
                app.dispatch(Command::NextPage)
            }
            KeyCode::Left | KeyCode::Char('h') | KeyCode::PageUp => {
                app.dispatch(Command::PrevPage)
            }
            KeyCode::Home => app.dispatch(Command::FirstPage),
            KeyCode::End => app.dispatch(Command::LastPage),
            KeyCode::Down | KeyCode::Char('j') => app.scroll_down(),
            KeyCode::Up | KeyCode::Char('k') => app.scroll_up(),
            KeyCode::Char('+') | KeyCode::Char('=') => app.dispatch(Command::ZoomIn),
            KeyCode::Char('-') => app.dispatch(Command::ZoomOut),
            KeyCode::Char('0') => app.dispatch(Command::SetZoom(1.0)),
            KeyCode::Char('1') => app.dispatch(Command::FitPage),
            KeyCode::Char('2') => app.dispatch(Command::FitWidth),
            KeyCode::Char('z') => app.dispatch(Command::ToggleZoom),
            KeyCode::Char('w') => app.dispatch(Command::ToggleWheelMode),
            KeyCode::Char('t') => app.open_toc(),
            KeyCode::Char('g') => app.begin_input(AppView::GoTo),
            KeyCode::Char('/') => app.begin_input(AppView::Search),
            KeyCode::Char('n') => app.repeat_search(),
            KeyCode::Char('b') => app.toggle_bookmark(),
            KeyCode::Char('B') => app.open_bookmarks(),
            _ => {}
        },
        AppView::Search | AppView::GoTo => match key.code {
            KeyCode::Enter if app.view == AppView::Search => app.run_search(),
            KeyCode::Enter => app.run_go_to(),
            KeyCode::Esc => app.view = AppView::Reader,
            KeyCode::Backspace => {
                app.input.pop();
            }
            KeyCode::Char(c) if app.view == AppView::Search || c.is_ascii_digit() => {
                app.input.push(c)
            }
            _ => {}
        },
        AppView::Toc => match key.code {
            KeyCode::Char('q') | KeyCode::Esc => app.view = AppView::Reader,
            KeyCode::Down | KeyCode::Char('j') => {
                if !app.toc_items.is_empty() {
                    app.selected_toc_index = (app.selected_toc_index + 1) % app.toc_items.len();
                }
            }
            KeyCode::Up | KeyCode::Char('k') => {
                if !app.toc_items.is_empty() {
                    app.selected_toc_index = app
                        .selected_toc_index
                        .checked_sub(1)
                        .unwrap_or(app.toc_items.len() - 1);
                }
            }
            KeyCode::Enter => app.jump_to_toc(),
            _ => {}
        },
        AppView::Bookmarks => match key.code {
            KeyCode::Char('q') | KeyCode::Esc => app.view = AppView::Reader,
            KeyCode::Down | KeyCode::Char('j') => {
                if !app.bookmarks.is_empty() {
                    app.selected_bookmark_index =
                        (app.selected_bookmark_index + 1) % app.bookmarks.len();
                }
            }
            KeyCode::Up | KeyCode::Char('k') => {
                if !app.bookmarks.is_empty() {
                    app.selected_bookmark_index = app
                        .selected_bookmark_index
                        .checked_sub(1)
                        .unwrap_or(app.bookmarks.len() - 1);
                }
            }
            KeyCode::Enter => app.jump_to_bookmark(),
            KeyCode::Char('d') => app.remove_selected_bookmark(),
            _ => {}
        },
        AppView::PathInput => match key.code {
            KeyCode::Esc => app.view = AppView::Library,
            KeyCode::Enter => {
                let path = PathBuf::from(app.explorer_path.trim());
                if path.is_dir() {
                    app.start_scan();
                } else {
                    app.open_path(&path);
                }
            }
            KeyCode::Backspace => {
                app.explorer_path.pop();
            }
            KeyCode::Char(c) => app.explorer_path.push(c),
            _ => {}
        },
        AppView::FileExplorer => match key.code {
            KeyCode::Char('q') | KeyCode::Esc => app.view = AppView::Library,
            KeyCode::Down | KeyCode::Char('j') => {
                if !app.explorer_results.is_empty() {
                    app.selected_explorer_index =
                        (app.selected_explorer_index + 1) % app.explorer_results.len();
                }
            }
            KeyCode::Up | KeyCode::Char('k') => {
                if !app.explorer_results.is_empty() {
                    app.selected_explorer_index = app
                        .selected_explorer_index
                        .checked_sub(1)
                        .unwrap_or(app.explorer_results.len() - 1);
                }
            }
            KeyCode::Enter => app.open_selected_explorer(),
            _ => {}
        },
        AppView::Help => match key.code {
            KeyCode::Char('?') | KeyCode::Char('q') | KeyCode::Esc => app.toggle_help(),
            _ => {}
        },
    }
}
