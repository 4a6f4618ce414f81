use drillbook::{timer::format_clock, SessionMode};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::Color,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::{bad, bold, dim, fit, rate_style, render_footer, HORIZONTAL_MARGIN, VERTICAL_MARGIN};
use crate::App;

pub fn render(app: &App, f: &mut Frame) {
    let Some(results) = app.bank.last_results() else {
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(7),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(f.area());

    let title = match results.mode {
        SessionMode::Practice => "Practice complete",
        SessionMode::Exam => "Exam submitted",
    };
    f.render_widget(
        Paragraph::new(Span::styled(title, bold().fg(Color::Cyan)))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::BOTTOM)),
        chunks[0],
    );

    let stats = results.stats;
    let mut summary = vec![
        Line::from(Span::styled(format!("{}%", stats.rate), rate_style(stats.rate))),
        Line::from(format!(
            "{} correct · {} wrong · {} of {} answered",
            stats.correct, stats.wrong, stats.answered, stats.total
        )),
        Line::from(format!("score {} / {}", results.score, results.max_score)),
    ];
    if results.mode == SessionMode::Exam {
        summary.push(Line::from(format!("time {}", format_clock(results.elapsed))));
    }
    f.render_widget(
        Paragraph::new(summary)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL)),
        chunks[1],
    );

    // Misses in queue order, looked up on the finished session.
    let width = chunks[2].width.saturating_sub(4) as usize;
    let missed: Vec<Line> = match app.session() {
        Some(session) => session
            .queue()
            .iter()
            .enumerate()
            .filter(|(_, q)| results.wrong_ids.contains(&q.id))
            .map(|(i, q)| {
                Line::from(vec![
                    Span::styled(format!("{:>3}. ", i + 1), bad()),
                    Span::raw(fit(&q.text, width.saturating_sub(5))),
                ])
            })
            .collect(),
        None => Vec::new(),
    };
    let missed = if missed.is_empty() {
        vec![Line::from(Span::styled("nothing missed", dim()))]
    } else {
        missed
    };
    f.render_widget(
        Paragraph::new(missed).block(Block::default().borders(Borders::ALL).title(" Missed ")),
        chunks[2],
    );

    render_footer(app, "(r)estart  (w)rong book  (esc) home", chunks[3], f);
}
