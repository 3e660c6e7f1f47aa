use super::colors;
use crate::app::App;
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Paragraph},
};

pub fn render(f: &mut Frame, app: &mut App) {
    let (bg, fg) = colors(app.theme);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(5)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(f.area());

    f.render_widget(Block::default().style(Style::default().bg(bg)), f.area());

    let title = Paragraph::new(" Enter a Folder to Scan or a Document to Open ")
        .block(
            Block::default()
                .borders(Borders::ALL)
                .style(Style::default().fg(fg).bg(bg)),
        )
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));
    f.render_widget(title, chunks[0]);

    let input = Paragraph::new(app.explorer_path.as_str())
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Path ")
                .style(Style::default().fg(fg).bg(bg)),
        )
        .alignment(Alignment::Left);
    f.render_widget(input, chunks[1]);

    let help = Paragraph::new(" [Enter] Open / Scan | [Esc] Cancel ")
        .alignment(Alignment::Center)
        .style(Style::default().fg(fg).bg(bg));
    let help_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(chunks[1]);
    f.render_widget(help, help_chunks[1]);
}
