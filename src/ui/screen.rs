use ratatui::Frame;

use crate::{
    ui::{home, import, quiz, records, results, wrong_book},
    App, AppState,
};

/// A UI Screen boundary: renders one application state
pub trait Screen {
    fn render(&self, app: &App, f: &mut Frame);
}

pub struct HomeScreen;

impl Screen for HomeScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        home::render(app, f);
    }
}

/// Practice and exam share one screen; the session mode picks the details
pub struct QuizScreen;

impl Screen for QuizScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        quiz::render(app, f);
    }
}

pub struct ResultsScreen;

impl Screen for ResultsScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        results::render(app, f);
    }
}

pub struct WrongBookScreen;

impl Screen for WrongBookScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        wrong_book::render(app, f);
    }
}

pub struct RecordsScreen;

impl Screen for RecordsScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        records::render(app, f);
    }
}

pub struct ImportScreen;

impl Screen for ImportScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        import::render(app, f);
    }
}

/// Helper to construct the appropriate screen for the current state
pub fn current_screen(state: AppState) -> Box<dyn Screen> {
    match state {
        AppState::Home => Box::new(HomeScreen),
        AppState::Quiz => Box::new(QuizScreen),
        AppState::Results => Box::new(ResultsScreen),
        AppState::WrongBook => Box::new(WrongBookScreen),
        AppState::Records => Box::new(RecordsScreen),
        AppState::Import => Box::new(ImportScreen),
    }
}
