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
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(f.area());

    f.render_widget(Block::default().style(Style::default().bg(bg)), f.area());

    let title = Paragraph::new(format!(
        " {} - {} document(s) ",
        app.explorer_path,
        app.explorer_results.len()
    ))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .style(Style::default().fg(fg).bg(bg)),
    );
    f.render_widget(title, chunks[0]);

    let items: Vec<ListItem> = app
        .explorer_results
        .iter()
        .enumerate()
        .map(|(i, path)| {
            let style = if i == app.selected_explorer_index {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(fg).bg(bg)
            };
            let shown = path
                .strip_prefix(&app.explorer_path)
                .unwrap_or(path)
                .to_string_lossy()
                .to_string();
            ListItem::new(shown).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .title(" Documents (Enter to Open, Esc to Back) ")
                .borders(Borders::ALL)
                .style(Style::default().fg(fg).bg(bg)),
        )
        .highlight_symbol(">> ");
    let mut state = ListState::default();
    if !app.explorer_results.is_empty() {
        state.select(Some(app.selected_explorer_index));
    }
    f.render_stateful_widget(list, chunks[1], &mut state);
}
