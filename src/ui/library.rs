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
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(f.area());

    f.render_widget(Block::default().style(Style::default().bg(bg)), f.area());

    let title = Paragraph::new(format!(" Folio - {} ", app.session.info_line()))
        .block(Block::default().borders(Borders::ALL))
        .style(Style::default().fg(Color::Cyan).bg(bg).add_modifier(Modifier::BOLD));
    f.render_widget(title, chunks[0]);

    let items: Vec<ListItem> = app
        .recent
        .iter()
        .enumerate()
        .map(|(i, doc)| {
            let style = if i == app.selected_recent_index {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(fg).bg(bg)
            };
            let author = if doc.author.is_empty() {
                String::new()
            } else {
                format!(" - {}", doc.author)
            };
            ListItem::new(format!(
                "[{}] {}{}  (p.{}/{}, {})",
                doc.format,
                doc.title,
                author,
                doc.last_page,
                doc.page_count,
                doc.last_opened.format("%Y-%m-%d %H:%M")
            ))
            .style(style)
        })
        .collect();

    let block_title = if items.is_empty() {
        " Recent (empty - press o to browse) "
    } else {
        " Recent "
    };
    let list = List::new(items)
        .block(
            Block::default()
                .title(block_title)
                .borders(Borders::ALL)
                .style(Style::default().fg(fg).bg(bg)),
        )
        .highlight_symbol(">> ");
    let mut state = ListState::default();
    if !app.recent.is_empty() {
        state.select(Some(app.selected_recent_index));
    }
    f.render_stateful_widget(list, chunks[1], &mut state);

    let help = Paragraph::new(
        " [Enter] Open | [j/k] Navigate | [o] Browse | [p] Path | [d] Forget | [?] Help | [q] Quit ",
    )
    .style(Style::default().fg(fg).bg(bg));
    f.render_widget(help, chunks[2]);
}
