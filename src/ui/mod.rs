pub mod bookmarks;
pub mod explorer;
pub mod help;
pub mod library;
pub mod path_input;
pub mod reader;
pub mod toc;

use crate::app::{App, AppView, Theme};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

pub fn render(f: &mut Frame, app: &mut App) {
    match app.view {
        AppView::Library => library::render(f, app),
        AppView::Reader | AppView::Search | AppView::GoTo => reader::render(f, app),
        AppView::Toc => toc::render(f, app),
        AppView::Bookmarks => bookmarks::render(f, app),
        AppView::PathInput => path_input::render(f, app),
        AppView::FileExplorer => explorer::render(f, app),
        AppView::Help => {
            match app.previous_view {
                Some(AppView::Reader) => reader::render(f, app),
                _ => library::render(f, app),
            }
            help::render(f, app);
        }
    }

    if let Some(message) = app.error.as_deref() {
        render_error(f, message);
    }
}

/// (background, foreground) for a theme.
pub fn colors(theme: Theme) -> (Color, Color) {
    match theme {
        Theme::Default => (Color::Reset, Color::Reset),
        Theme::Gruvbox => (Color::Rgb(40, 40, 40), Color::Rgb(235, 219, 178)),
        Theme::Nord => (Color::Rgb(46, 52, 64), Color::Rgb(216, 222, 233)),
        Theme::Sepia => (Color::Rgb(250, 240, 230), Color::Rgb(93, 71, 139)),
    }
}

fn render_error(f: &mut Frame, message: &str) {
    let area = centered_rect(50, 30, f.area());
    f.render_widget(Clear, area);
    let p = Paragraph::new(format!("{}\n\n[any key] dismiss", message))
        .block(
            Block::default()
                .title(" Error ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
        )
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .style(Style::default().fg(Color::White).bg(Color::Black));
    f.render_widget(p, area);
}

pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
