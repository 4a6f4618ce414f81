use chrono::Local;
use drillbook::ledger::WrongEntry;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use super::{bold, dim, fit, good, render_footer, HORIZONTAL_MARGIN, VERTICAL_MARGIN};
use crate::App;

const HELP: &str =
    "(↑/↓) select  (enter) redo  (p)ractice all  (d)elete  (c)lear  e(x)port  (esc) home";

pub fn render(app: &App, f: &mut Frame) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Min(5),
            Constraint::Length(9),
            Constraint::Length(1),
        ])
        .split(f.area());

    let entries = app.bank.ledger().entries();
    let title = format!(" Wrong-question book ({}) ", entries.len());
    let width = chunks[0].width.saturating_sub(4) as usize;

    if entries.is_empty() {
        f.render_widget(
            Paragraph::new(Span::styled("No wrong questions. Keep it up!", dim()))
                .block(Block::default().borders(Borders::ALL).title(title)),
            chunks[0],
        );
    } else {
        let items: Vec<ListItem> = entries
            .iter()
            .map(|e| {
                let head = format!("×{} [{}] ", e.wrong_count, e.question.kind);
                let room = width.saturating_sub(head.chars().count());
                ListItem::new(Line::from(vec![
                    Span::styled(head, bold().fg(Color::Red)),
                    Span::raw(fit(&e.question.text, room)),
                ]))
            })
            .collect();
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(title))
            .highlight_style(bold().add_modifier(Modifier::REVERSED));
        let mut state = ListState::default().with_selected(Some(app.wrong_cursor));
        f.render_stateful_widget(list, chunks[0], &mut state);
    }

    if let Some(entry) = entries.get(app.wrong_cursor) {
        render_detail(entry, chunks[1], f);
    }

    render_footer(app, HELP, chunks[2], f);
}

fn render_detail(entry: &WrongEntry, area: Rect, f: &mut Frame) {
    let question = &entry.question;
    let mut lines = vec![Line::from(Span::styled(question.text.clone(), bold()))];
    lines.extend(question.options.iter().map(|o| {
        let text = format!("{}. {}", o.letter, o.content);
        if question.correct_answer.contains(o.letter) {
            Line::from(Span::styled(text, good()))
        } else {
            Line::from(text)
        }
    }));
    lines.push(Line::from(Span::styled(
        format!(
            "answer {} · last missed {}",
            question.correct_answer,
            entry.wrong_time.with_timezone(&Local).format("%Y-%m-%d %H:%M")
        ),
        dim(),
    )));

    f.render_widget(
        Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL))
            .wrap(Wrap { trim: true }),
        area,
    );
}
