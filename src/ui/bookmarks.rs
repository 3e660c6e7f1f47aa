use super::colors;
use crate::app::App;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};

pub fn render(f: &mut Frame, app: &mut App) {
    let (bg, fg) = colors(app.theme);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(f.area());

    f.render_widget(Block::default().style(Style::default().bg(bg)), f.area());

    let items: Vec<ListItem> = app
        .bookmarks
        .iter()
        .enumerate()
        .map(|(i, mark)| {
            let style = if i == app.selected_bookmark_index {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(fg).bg(bg)
            };
            ListItem::new(format!(
                "{:>4}  {}  ({})",
                mark.page,
                mark.title,
                mark.created.format("%Y-%m-%d")
            ))
            .style(style)
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .title(format!(" Bookmarks ({}) ", app.bookmarks.len()))
                .borders(Borders::ALL)
                .style(Style::default().fg(fg).bg(bg)),
        )
        .highlight_style(Style::default().add_modifier(Modifier::ITALIC))
        .highlight_symbol(">> ");
    let mut list_state = ListState::default();
    if !app.bookmarks.is_empty() {
        list_state.select(Some(app.selected_bookmark_index));
    }
    f.render_stateful_widget(list, chunks[0], &mut list_state);

    let hint = if app.bookmarks.is_empty() {
        " No bookmarks yet. Press b in the reader to mark a page. "
    } else {
        " Enter: Jump | d: Delete | Esc: Back "
    };
    f.render_widget(
        Paragraph::new(hint).style(Style::default().fg(Color::DarkGray).bg(bg)),
        chunks[1],
    );
}
