use super::centered_rect;
use crate::app::App;
use folio::reader::format_description;
use ratatui::{
    Frame,
    layout::Alignment,
    style::{Color, Style},
    widgets::{Block, Borders, Clear, Paragraph},
};

pub fn render(f: &mut Frame, _app: &App) {
    let area = centered_rect(60, 70, f.area());
    f.render_widget(Clear, area);

    let formats = format!("Formats: {}", format_description());
    let help_text = vec![
        "--- GLOBAL ---",
        "? : Toggle Help",
        "q : Back / Quit",
        "T : Cycle Theme",
        "--- LIBRARY ---",
        "Enter : Open Recent",
        "d : Forget Recent",
        "X : Clear Recent List",
        "o : Browse Library Folder",
        "p : Scan Another Folder",
        "--- READER ---",
        "h/l, Left/Right, PgUp/PgDn : Previous / Next Page",
        "Home/End : First / Last Page",
        "g : Go To Page",
        "j/k : Scroll",
        "+/- : Zoom In / Out",
        "0 : Actual Size (100%)",
        "1 / 2 : Fit Page / Fit Width",
        "z : Toggle Fit / Actual Size",
        "w : Mouse Wheel Pages / Zoom",
        "t : Table of Contents",
        "b / B : Toggle Bookmark / List Bookmarks",
        "/ : Find (n repeats)",
        "c : Close Document",
        "",
        formats.as_str(),
    ];

    let p = Paragraph::new(help_text.join("\n"))
        .block(Block::default().title(" Quick Help ").borders(Borders::ALL))
        .alignment(Alignment::Left)
        .style(Style::default().fg(Color::White).bg(Color::Black));
    f.render_widget(p, area);
}
