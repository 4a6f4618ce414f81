pub mod home;
pub mod import;
pub mod quiz;
pub mod records;
pub mod results;
pub mod screen;
pub mod wrong_book;

use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::Span,
    widgets::Paragraph,
    Frame,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::App;

const HORIZONTAL_MARGIN: u16 = 2;
const VERTICAL_MARGIN: u16 = 1;

pub fn draw(app: &App, f: &mut Frame) {
    screen::current_screen(app.state).render(app, f);
}

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn dim() -> Style {
    Style::default().add_modifier(Modifier::DIM)
}

fn good() -> Style {
    bold().fg(Color::Green)
}

fn bad() -> Style {
    bold().fg(Color::Red)
}

fn rate_style(rate: u32) -> Style {
    match rate {
        r if r >= 80 => good(),
        60..=79 => bold().fg(Color::Yellow),
        _ => bad(),
    }
}

/// Cuts `text` to at most `width` terminal columns, marking the cut with `…`.
fn fit(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push('…');
    out
}

/// Key help on the bottom line, with a pending notice taking precedence.
fn render_footer(app: &App, help: &str, area: Rect, f: &mut Frame) {
    let line = match &app.notice {
        Some(notice) => Span::styled(notice.clone(), bold().fg(Color::Yellow)),
        None => Span::styled(help.to_string(), dim().add_modifier(Modifier::ITALIC)),
    };
    f.render_widget(Paragraph::new(line).alignment(Alignment::Center), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_keeps_short_text() {
        assert_eq!(fit("borrow", 10), "borrow");
    }

    #[test]
    fn fit_counts_wide_characters() {
        assert_eq!(fit("abcdefgh", 5), "abcd…");
        assert_eq!(fit("借用检查器", 5), "借用…");
    }
}
