use super::colors;
use crate::app::App;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, List, ListItem, ListState},
};

pub fn render(f: &mut Frame, app: &mut App) {
    let (bg, fg) = colors(app.theme);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints([Constraint::Min(0)])
        .split(f.area());

    f.render_widget(Block::default().style(Style::default().bg(bg)), f.area());

    let items: Vec<ListItem> = app
        .toc_items
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let style = if i == app.selected_toc_index {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(fg).bg(bg)
            };
            ListItem::new(format!("{:>4}  {}", entry.page, entry.title)).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .title(" Contents (Enter to Jump, Esc to Back) ")
                .borders(Borders::ALL)
                .style(Style::default().fg(fg).bg(bg)),
        )
        .highlight_style(Style::default().add_modifier(Modifier::ITALIC))
        .highlight_symbol(">> ");
    let mut list_state = ListState::default();
    if !app.toc_items.is_empty() {
        list_state.select(Some(app.selected_toc_index));
    }
    f.render_stateful_widget(list, chunks[0], &mut list_state);
}
