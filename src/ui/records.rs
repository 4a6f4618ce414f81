use chrono::Local;
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::Color,
    text::Span,
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use super::{bold, dim, rate_style, render_footer, HORIZONTAL_MARGIN, VERTICAL_MARGIN};
use crate::App;

pub fn render(app: &App, f: &mut Frame) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(f.area());

    let log = app.bank.records();
    let title = format!(" Practice records ({}/{}) ", log.len(), log.limit());

    if log.is_empty() {
        f.render_widget(
            Paragraph::new(Span::styled("No practice sessions yet.", dim()))
                .block(Block::default().borders(Borders::ALL).title(title)),
            chunks[0],
        );
    } else {
        let header = Row::new(vec!["date", "type", "correct", "wrong", "rate"])
            .style(bold().fg(Color::Yellow));
        let rows: Vec<Row> = log
            .records()
            .iter()
            .skip(app.records_offset)
            .map(|r| {
                Row::new(vec![
                    Cell::from(r.date.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()),
                    Cell::from(r.scope.to_string()),
                    Cell::from(format!("{}/{}", r.correct, r.total)),
                    Cell::from(r.wrong.to_string()),
                    Cell::from(Span::styled(format!("{}%", r.rate), rate_style(r.rate))),
                ])
            })
            .collect();
        let table = Table::new(
            rows,
            [
                Constraint::Length(17),
                Constraint::Length(18),
                Constraint::Length(9),
                Constraint::Length(6),
                Constraint::Length(5),
            ],
        )
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(title));
        f.render_widget(table, chunks[0]);
    }

    render_footer(app, "(↑/↓) scroll  (esc) home", chunks[1], f);
}
