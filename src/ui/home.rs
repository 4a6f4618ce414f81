use drillbook::QuestionType;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::Color,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::{bold, dim, rate_style, render_footer, HORIZONTAL_MARGIN, VERTICAL_MARGIN};
use crate::App;

pub fn render(app: &App, f: &mut Frame) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(8),
            Constraint::Min(10),
            Constraint::Length(1),
        ])
        .split(f.area());

    let title = Paragraph::new(Span::styled("drillbook", bold().fg(Color::Cyan)))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::BOTTOM));
    f.render_widget(title, chunks[0]);

    let overview = app.bank.overview();
    let store = app.bank.store();
    let mut lines = vec![
        Line::from(vec![
            Span::raw("questions      "),
            Span::styled(overview.total_questions.to_string(), bold()),
        ]),
        Line::from(vec![
            Span::raw("wrong book     "),
            Span::styled(overview.wrong_questions.to_string(), bold()),
        ]),
        Line::from(vec![
            Span::raw("correct rate   "),
            Span::styled(
                format!("{}%", overview.correct_rate),
                rate_style(overview.correct_rate),
            ),
        ]),
    ];
    lines.extend(QuestionType::ALL.iter().map(|kind| {
        Line::from(Span::styled(
            format!("  {:<15}{}", kind.to_string(), store.count_by_type(*kind)),
            dim(),
        ))
    }));
    f.render_widget(
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Overview")),
        chunks[1],
    );

    let menu = [
        ("1", "practice all questions"),
        ("2", "practice single choice"),
        ("3", "practice multiple choice"),
        ("4", "practice true/false"),
        ("e", "mock exam"),
        ("w", "wrong-question book"),
        ("r", "practice records"),
        ("i", "import a question bank"),
    ];
    let menu_lines: Vec<Line> = menu
        .iter()
        .map(|(key, label)| {
            Line::from(vec![
                Span::styled(format!(" ({key}) "), bold().fg(Color::Cyan)),
                Span::raw(*label),
            ])
        })
        .collect();
    f.render_widget(
        Paragraph::new(menu_lines).block(Block::default().borders(Borders::ALL).title("Start")),
        chunks[2],
    );

    render_footer(app, "(q)uit", chunks[3], f);
}
