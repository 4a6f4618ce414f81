use drillbook::{
    session::{CellStatus, Session, SheetCell},
    SessionMode,
};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use super::{bad, bold, dim, good, render_footer, HORIZONTAL_MARGIN, VERTICAL_MARGIN};
use crate::App;

const SHEET_WIDTH: u16 = 28;
const CELLS_PER_ROW: usize = 5;

const PRACTICE_HELP: &str = "(a-h) choose  (enter) submit / next  (←/→) move  (tab) finish  (esc) home";
const EXAM_HELP: &str = "(a-h) choose  (space) mark  (←/→) move  (tab) hand in  (esc) abandon";

pub fn render(app: &App, f: &mut Frame) {
    let Some(session) = app.session() else {
        return;
    };

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(6),
            Constraint::Length(1),
        ])
        .split(f.area());

    render_header(app, session, rows[0], f);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(20), Constraint::Length(SHEET_WIDTH)])
        .split(rows[1]);
    render_question(app, session, body[0], f);
    render_sheet(&session.answer_sheet(), body[1], f);

    let help = match session.mode() {
        SessionMode::Practice => PRACTICE_HELP,
        SessionMode::Exam => EXAM_HELP,
    };
    render_footer(app, help, rows[2], f);
}

fn render_header(app: &App, session: &Session, area: Rect, f: &mut Frame) {
    let stats = session.stats();
    let mut spans = vec![
        Span::styled(
            format!("{} · {}", session.mode(), session.scope()),
            bold().fg(Color::Cyan),
        ),
        Span::raw(format!(
            "   question {}/{}   answered {}/{}",
            session.position() + 1,
            session.len(),
            stats.answered,
            stats.total
        )),
    ];
    match session.mode() {
        SessionMode::Exam => {
            spans.push(Span::styled(format!("   time {}", app.bank.timer().clock()), bold()));
        }
        SessionMode::Practice => {
            spans.push(Span::styled(
                format!("   {} right · {} wrong", stats.correct, stats.wrong),
                dim(),
            ));
        }
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_question(app: &App, session: &Session, area: Rect, f: &mut Frame) {
    let Some(question) = session.current() else {
        return;
    };
    let record = session.answer(session.position());
    let graded = record.and_then(|r| r.is_correct);
    let selected = record.and_then(|r| r.selected.as_ref());

    let mut lines = vec![
        Line::from(Span::styled(question.text.clone(), bold())),
        Line::default(),
    ];

    for option in &question.options {
        let letter = option.letter;
        let chosen = match (session.mode(), graded) {
            (SessionMode::Practice, None) => app.pending.contains(letter),
            _ => selected.is_some_and(|s| s.contains(letter)),
        };
        let style = match (session.mode(), graded) {
            (SessionMode::Practice, Some(_)) if question.correct_answer.contains(letter) => good(),
            (SessionMode::Practice, Some(_)) if chosen => bad(),
            _ if chosen => bold().fg(Color::Cyan),
            _ => Style::default(),
        };
        let mark = if chosen { "[x]" } else { "[ ]" };
        lines.push(Line::from(Span::styled(
            format!("{mark} {letter}. {}", option.content),
            style,
        )));
    }

    if session.mode() == SessionMode::Practice {
        lines.push(Line::default());
        match graded {
            Some(true) => lines.push(Line::from(Span::styled("Correct!", good()))),
            Some(false) => lines.push(Line::from(vec![
                Span::styled("Wrong. ", bad()),
                Span::raw(format!("Answer: {}", question.correct_answer)),
            ])),
            None => {}
        }
    }

    let title = format!(" {} · {} pt ", question.kind, question.score);
    let widget = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(title))
        .wrap(Wrap { trim: false });
    f.render_widget(widget, area);
}

fn cell_style(cell: &SheetCell) -> Style {
    let base = match cell.status {
        CellStatus::Unanswered => dim(),
        CellStatus::Answered => bold().fg(Color::Cyan),
        CellStatus::Correct => good(),
        CellStatus::Wrong => bad(),
    };
    if cell.current {
        base.add_modifier(Modifier::REVERSED)
    } else {
        base
    }
}

fn render_sheet(sheet: &[SheetCell], area: Rect, f: &mut Frame) {
    let lines: Vec<Line> = sheet
        .chunks(CELLS_PER_ROW)
        .map(|row| {
            Line::from(
                row.iter()
                    .flat_map(|cell| {
                        let marker = if cell.marked {
                            Span::styled("*", bold().fg(Color::Yellow))
                        } else {
                            Span::raw(" ")
                        };
                        [
                            Span::styled(format!("{:>3}", cell.index + 1), cell_style(cell)),
                            marker,
                        ]
                    })
                    .collect::<Vec<_>>(),
            )
        })
        .collect();

    let widget = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Answer sheet "),
    );
    f.render_widget(widget, area);
}
