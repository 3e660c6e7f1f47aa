use super::colors;
use crate::app::{App, AppView};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use ratatui_image::Image as ImageWidget;
use unicode_width::UnicodeWidthStr;

pub fn render(f: &mut Frame, app: &mut App) {
    let (bg, fg) = colors(app.theme);
    let prompt = matches!(app.view, AppView::Search | AppView::GoTo);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(if prompt { 3 } else { 0 }),
            Constraint::Length(1),
        ])
        .split(f.area());

    f.render_widget(Block::default().style(Style::default().bg(bg)), f.area());

    if app.is_raster() {
        render_image(f, app, chunks[0]);
    } else {
        let text = app.page_text().unwrap_or_default();
        let content = Paragraph::new(text)
            .block(Block::default().borders(Borders::NONE))
            .style(Style::default().fg(fg).bg(bg))
            .wrap(Wrap { trim: false })
            .scroll((app.scroll, 0));
        let area = chunks[0].inner(ratatui::layout::Margin::new(2, 1));
        f.render_widget(content, area);
    }

    if prompt {
        let title = if app.view == AppView::Search {
            " Find "
        } else {
            " Go to page "
        };
        let input = Paragraph::new(app.input.as_str())
            .block(Block::default().borders(Borders::ALL).title(title));
        f.render_widget(input, chunks[1]);
    }

    let view = app.session.view();
    let left = app
        .status
        .clone()
        .unwrap_or_else(|| app.session.info_line());
    let mark = if app.current_page_bookmarked() { "* " } else { "" };
    let right = format!(
        "{}{} | {} | wheel: {:?} ",
        mark,
        app.session.page_label().unwrap_or_default(),
        view.status_label(),
        view.wheel_mode()
    );
    let status_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(right.width() as u16)])
        .split(chunks[2]);
    let style = Style::default().bg(Color::Blue).fg(Color::White);
    f.render_widget(Paragraph::new(format!(" {}", left)).style(style), status_chunks[0]);
    f.render_widget(
        Paragraph::new(right).style(style).alignment(Alignment::Right),
        status_chunks[1],
    );
}

fn render_image(f: &mut Frame, app: &mut App, area: Rect) {
    match app.prepare_page_image(area) {
        Ok(Some(protocol)) => {
            let size = protocol.area();
            let x = area.x + area.width.saturating_sub(size.width) / 2;
            let draw_area = Rect::new(x, area.y, size.width.min(area.width), size.height.min(area.height));
            f.render_widget(ImageWidget::new(protocol), draw_area);
        }
        Ok(None) => {}
        Err(e) => {
            let p = Paragraph::new(format!("[ {} ]", e))
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true });
            f.render_widget(p, area);
        }
    }
}
