use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::Color,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::{bold, dim, fit, render_footer, HORIZONTAL_MARGIN, VERTICAL_MARGIN};
use crate::App;

const PATH_HELP: &str = "type a path to a bank document  (enter) preview  (esc) home";
const CONFIRM_HELP: &str = "(enter/y) replace the current bank  (esc/n) pick another file";

pub fn render(app: &App, f: &mut Frame) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .split(f.area());

    let cursor = if app.pending_import.is_some() { "" } else { "█" };
    let path = Paragraph::new(Line::from(vec![
        Span::raw(app.import_path.clone()),
        Span::styled(cursor, dim()),
    ]))
    .block(Block::default().borders(Borders::ALL).title(" Import question bank "));
    f.render_widget(path, chunks[0]);

    let Some(pending) = &app.pending_import else {
        f.render_widget(
            Paragraph::new(Span::styled(
                format!(
                    "Replaces the {} questions in the current bank.",
                    app.bank.store().len()
                ),
                dim(),
            ))
            .block(Block::default().borders(Borders::ALL)),
            chunks[1],
        );
        render_footer(app, PATH_HELP, chunks[2], f);
        return;
    };

    let preview = &pending.preview;
    let width = chunks[1].width.saturating_sub(4) as usize;
    let mut lines = vec![Line::from(vec![
        Span::styled(preview.name.clone(), bold().fg(Color::Cyan)),
        Span::raw(format!("  {} questions", preview.count)),
    ])];
    lines.extend(preview.sample.iter().enumerate().map(|(i, q)| {
        let head = format!("{}. [{}] ", i + 1, q.kind);
        let room = width.saturating_sub(head.chars().count());
        Line::from(vec![Span::styled(head, dim()), Span::raw(fit(&q.text, room))])
    }));
    if preview.count > preview.sample.len() {
        lines.push(Line::from(Span::styled(
            format!("… and {} more", preview.count - preview.sample.len()),
            dim(),
        )));
    }
    f.render_widget(
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(" Preview ")),
        chunks[1],
    );

    render_footer(app, CONFIRM_HELP, chunks[2], f);
}
