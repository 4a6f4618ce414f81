pub mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser, Subcommand};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use drillbook::{
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore, StorageBackend},
    ledger::WrongLedger,
    logging,
    persist::{self, KeyValueStore, MemoryStore},
    records::RecordLog,
    runtime::{CrosstermEventSource, EventSource, FixedTicker, QuizEvent, Runner, Ticker},
    session::Session,
    store::{ImportPreview, QuestionStore},
    AnswerSet, Direction, PracticeScope, QuestionBank, QuestionType, QuizError, SessionMode,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    fs,
    io::{self, stdin, Write},
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

const TICK_RATE_MS: u64 = 100;
const AUTO_NEXT_DELAY: Duration = Duration::from_millis(800);

/// terminal question-bank drill with timed mock exams and a wrong-answer book
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Practice questions by type, sit shuffled mock exams against the clock, and revisit every question you got wrong."
)]
pub struct Cli {
    /// directory with single_choice.json, multiple_choice.json and true_false.json, or an exported bank document
    #[clap(short = 'q', long)]
    questions: Option<PathBuf>,

    /// where the wrong-question book and practice records are kept
    #[clap(long, value_enum)]
    storage: Option<StorageBackend>,

    /// data directory (default: $DRILLBOOK_DATA_DIR or ~/.local/state/drillbook)
    #[clap(long)]
    data_dir: Option<PathBuf>,

    /// move on automatically after answering single-choice and true/false questions in practice
    #[clap(long, num_args = 0..=1, default_missing_value = "true")]
    auto_next: Option<bool>,

    /// log at debug level
    #[clap(short, long)]
    verbose: bool,

    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// run the interactive terminal UI (default)
    Tui,
    /// validate a question bank document and print a preview (press `i` in the TUI to install one)
    Import { file: PathBuf },
    /// write the wrong-question book to a JSON file
    ExportWrong { file: Option<PathBuf> },
    /// list recent practice sessions
    Records {
        /// write the records as CSV instead
        #[clap(long)]
        csv: Option<PathBuf>,
    },
    /// show question bank and wrong-book totals
    Stats,
}

/// Config file merged with command-line overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub config: Config,
    pub data_dir: PathBuf,
}

impl Cli {
    fn settings(&self, mut config: Config) -> Settings {
        if let Some(storage) = self.storage {
            config.storage = storage;
        }
        if let Some(dir) = &self.questions {
            config.question_dir = Some(dir.clone());
        }
        if let Some(auto_next) = self.auto_next {
            config.auto_next = auto_next;
        }
        let data_dir = self
            .data_dir
            .clone()
            .or_else(AppDirs::data_dir)
            .unwrap_or_else(|| PathBuf::from("."));
        Settings { config, data_dir }
    }

    fn is_tui(&self) -> bool {
        matches!(self.command, None | Some(Command::Tui))
    }
}

/// Bundled bank unless a directory of sources or an import document is given.
fn load_store(path: Option<&Path>) -> Result<QuestionStore, QuizError> {
    match path {
        None => QuestionStore::bundled(),
        Some(dir) if dir.is_dir() => QuestionStore::load_files(dir),
        Some(file) => {
            let json = fs::read_to_string(file)?;
            Ok(QuestionStore::new(QuestionStore::parse_import(&json)?.questions))
        }
    }
}

/// Never fails: an unreadable bank leaves the store empty and unusable
/// storage falls back to memory. The returned notice says what degraded.
fn open_bank(settings: &Settings) -> (QuestionBank, Option<String>) {
    let mut notices = Vec::new();

    let store = match load_store(settings.config.question_dir.as_deref()) {
        Ok(store) => store,
        Err(e) => {
            tracing::warn!("question bank not loaded: {e}");
            notices.push(format!("question bank not loaded: {e}"));
            QuestionStore::default()
        }
    };

    let backend = settings.config.storage;
    let dir = &settings.data_dir;
    let memory = || -> Box<dyn KeyValueStore> { Box::new(MemoryStore::new()) };
    let (ledger_store, records_store) =
        match (persist::open_backend(backend, dir), persist::open_backend(backend, dir)) {
            (Ok(ledger), Ok(records)) => (ledger, records),
            (Err(e), _) | (_, Err(e)) => {
                tracing::warn!(%backend, dir = %dir.display(), "storage unavailable: {e}");
                notices.push(format!("{backend} storage unavailable, nothing will be saved"));
                (memory(), memory())
            }
        };

    let ledger = WrongLedger::open(ledger_store);
    let records = RecordLog::with_limit(records_store, settings.config.record_limit);
    tracing::info!(questions = store.len(), %backend, "question bank ready");

    let notice = (!notices.is_empty()).then(|| notices.join("; "));
    (QuestionBank::new(store, ledger, records), notice)
}

fn run_command(
    command: &Command,
    settings: &Settings,
    out: &mut dyn Write,
) -> Result<(), Box<dyn Error>> {
    match command {
        Command::Tui => {}
        Command::Import { file } => {
            let json = fs::read_to_string(file)?;
            let preview = QuestionStore::preview_import(&json)?;
            writeln!(out, "{}: {} questions", preview.name, preview.count)?;
            for (i, q) in preview.sample.iter().enumerate() {
                writeln!(out, "  {}. [{}] {}", i + 1, q.kind, q.text)?;
            }
        }
        Command::ExportWrong { file } => {
            let (bank, _) = open_bank(settings);
            let export = bank.export_wrong()?;
            let path = file.clone().unwrap_or_else(|| PathBuf::from(export.file_name()));
            fs::write(&path, export.to_json_pretty()?)?;
            writeln!(
                out,
                "exported {} questions to {}",
                export.questions.len(),
                path.display()
            )?;
        }
        Command::Records { csv } => {
            let (bank, _) = open_bank(settings);
            match csv {
                Some(path) => {
                    bank.records().write_csv(fs::File::create(path)?)?;
                    writeln!(out, "wrote {} records to {}", bank.records().len(), path.display())?;
                }
                None if bank.records().is_empty() => writeln!(out, "no practice records yet")?,
                None => {
                    for r in bank.records().records() {
                        writeln!(
                            out,
                            "{}  {:<16} {:>3}/{:<3} wrong {:<3} {:>3}%",
                            r.date.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M"),
                            r.scope.to_string(),
                            r.correct,
                            r.total,
                            r.wrong,
                            r.rate
                        )?;
                    }
                }
            }
        }
        Command::Stats => {
            let (bank, _) = open_bank(settings);
            let overview = bank.overview();
            writeln!(out, "questions:       {}", overview.total_questions)?;
            for kind in QuestionType::ALL {
                writeln!(out, "  {:<15}{}", kind.to_string(), bank.store().count_by_type(kind))?;
            }
            writeln!(out, "wrong questions: {}", overview.wrong_questions)?;
            writeln!(out, "correct rate:    {}%", overview.correct_rate)?;
            writeln!(out, "practice runs:   {}", bank.records().len())?;
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Home,
    Quiz,
    Results,
    WrongBook,
    Records,
    Import,
}

/// A validated document waiting for confirmation on the import screen.
#[derive(Debug, Clone)]
pub struct PendingImport {
    pub preview: ImportPreview,
    json: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

#[derive(Debug)]
pub struct App {
    pub bank: QuestionBank,
    pub state: AppState,
    pub auto_next: bool,
    /// Practice multiple-choice letters not yet submitted.
    pub pending: AnswerSet,
    pub notice: Option<String>,
    pub wrong_cursor: usize,
    pub records_offset: usize,
    pub export_dir: PathBuf,
    pub import_path: String,
    pub pending_import: Option<PendingImport>,
    auto_next_at: Option<Instant>,
}

impl App {
    pub fn new(bank: QuestionBank, auto_next: bool, export_dir: PathBuf) -> Self {
        Self {
            bank,
            state: AppState::Home,
            auto_next,
            pending: AnswerSet::new(),
            notice: None,
            wrong_cursor: 0,
            records_offset: 0,
            export_dir,
            import_path: String::new(),
            pending_import: None,
            auto_next_at: None,
        }
    }

    pub fn session(&self) -> Option<&Session> {
        self.bank.session()
    }

    fn enter_quiz(&mut self, started: Result<(), QuizError>) {
        self.pending = AnswerSet::new();
        self.auto_next_at = None;
        match started {
            Ok(()) => {
                self.notice = None;
                self.state = AppState::Quiz;
            }
            Err(e) => self.notice = Some(e.to_string()),
        }
    }

    fn start_practice(&mut self, scope: PracticeScope) {
        let started = self.bank.start_practice(scope).map(|_| ());
        self.enter_quiz(started);
    }

    fn start_exam(&mut self) {
        let started = self.bank.start_exam().map(|_| ());
        self.enter_quiz(started);
    }

    pub fn on_key(&mut self, key: KeyEvent, now: Instant) -> Flow {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Flow::Quit;
        }
        match self.state {
            AppState::Home => return self.on_home_key(key),
            AppState::Quiz => self.on_quiz_key(key, now),
            AppState::Results => self.on_results_key(key),
            AppState::WrongBook => self.on_wrong_book_key(key),
            AppState::Records => self.on_records_key(key),
            AppState::Import => self.on_import_key(key),
        }
        Flow::Continue
    }

    fn on_home_key(&mut self, key: KeyEvent) -> Flow {
        self.notice = None;
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return Flow::Quit,
            KeyCode::Char('1') => self.start_practice(PracticeScope::Mixed),
            KeyCode::Char('2') => {
                self.start_practice(PracticeScope::Only(QuestionType::SingleChoice))
            }
            KeyCode::Char('3') => {
                self.start_practice(PracticeScope::Only(QuestionType::MultipleChoice))
            }
            KeyCode::Char('4') => self.start_practice(PracticeScope::Only(QuestionType::TrueFalse)),
            KeyCode::Char('e') => self.start_exam(),
            KeyCode::Char('w') => {
                self.wrong_cursor = 0;
                self.state = AppState::WrongBook;
            }
            KeyCode::Char('r') => {
                self.records_offset = 0;
                self.state = AppState::Records;
            }
            KeyCode::Char('i') => {
                self.import_path.clear();
                self.pending_import = None;
                self.state = AppState::Import;
            }
            _ => {}
        }
        Flow::Continue
    }

    fn on_quiz_key(&mut self, key: KeyEvent, now: Instant) {
        let Some(session) = self.bank.session() else {
            self.state = AppState::Home;
            return;
        };
        let mode = session.mode();
        self.notice = None;

        match key.code {
            KeyCode::Esc => {
                self.bank.abandon();
                self.auto_next_at = None;
                self.state = AppState::Home;
            }
            KeyCode::Left => self.step(Direction::Prev),
            KeyCode::Right => self.step(Direction::Next),
            KeyCode::Home => self.jump(0),
            KeyCode::End => {
                let last = session.len().saturating_sub(1);
                self.jump(last);
            }
            KeyCode::Tab => self.finish(),
            KeyCode::Char(' ') if mode == SessionMode::Exam => {
                if let Err(e) = self.bank.toggle_mark() {
                    self.notice = Some(e.to_string());
                }
            }
            KeyCode::Enter => self.confirm(),
            KeyCode::Char(c) if c.is_ascii_alphabetic() => self.choose(c.to_ascii_uppercase(), now),
            _ => {}
        }
    }

    fn step(&mut self, direction: Direction) {
        self.pending = AnswerSet::new();
        self.auto_next_at = None;
        let _ = self.bank.advance(direction);
    }

    fn jump(&mut self, position: usize) {
        self.pending = AnswerSet::new();
        self.auto_next_at = None;
        let _ = self.bank.jump(position);
    }

    fn choose(&mut self, letter: char, now: Instant) {
        let Some(session) = self.bank.session() else {
            return;
        };
        let Some(question) = session.current() else {
            return;
        };
        if !question.has_option(letter) {
            return;
        }
        let single = question.kind.is_single_select();
        let last = session.is_last();

        let result = match (session.mode(), single) {
            (SessionMode::Practice, true) => self
                .bank
                .submit(AnswerSet::from_iter([letter]))
                .map(|_| {
                    if self.auto_next && !last {
                        self.auto_next_at = Some(now + AUTO_NEXT_DELAY);
                    }
                }),
            (SessionMode::Practice, false) => {
                if session.answer(session.position()).is_some_and(|a| a.is_correct.is_none()) {
                    if !self.pending.remove(letter) {
                        self.pending.insert(letter);
                    }
                }
                Ok(())
            }
            (SessionMode::Exam, true) => self.bank.submit(AnswerSet::from_iter([letter])).map(|_| ()),
            (SessionMode::Exam, false) => self.bank.toggle_option(letter),
        };
        if let Err(e) = result {
            self.notice = Some(e.to_string());
        }
    }

    fn confirm(&mut self) {
        let Some(session) = self.bank.session() else {
            return;
        };
        let graded = session
            .answer(session.position())
            .is_some_and(|a| a.is_correct.is_some());
        let last = session.is_last();

        match session.mode() {
            SessionMode::Practice if graded => {
                if last {
                    self.finish();
                } else {
                    self.step(Direction::Next);
                }
            }
            SessionMode::Practice => {
                let selection = std::mem::take(&mut self.pending);
                if let Err(e) = self.bank.submit(selection) {
                    self.notice = Some(e.to_string());
                }
            }
            SessionMode::Exam if last => {
                self.notice = Some("last question: press Tab to hand in".to_string());
            }
            SessionMode::Exam => self.step(Direction::Next),
        }
    }

    fn finish(&mut self) {
        self.auto_next_at = None;
        self.pending = AnswerSet::new();
        match self.bank.finish() {
            Ok(_) => self.state = AppState::Results,
            Err(e) => self.notice = Some(e.to_string()),
        }
    }

    fn on_results_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('r') => match self.bank.last_results().map(|r| r.mode) {
                Some(SessionMode::Exam) => self.start_exam(),
                _ => {
                    let started = self.bank.restart_practice().map(|_| ());
                    self.enter_quiz(started);
                }
            },
            KeyCode::Char('w') => {
                self.wrong_cursor = 0;
                self.state = AppState::WrongBook;
            }
            KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') => self.state = AppState::Home,
            _ => {}
        }
    }

    fn on_wrong_book_key(&mut self, key: KeyEvent) {
        let len = self.bank.ledger().len();
        self.notice = None;
        match key.code {
            KeyCode::Up => self.wrong_cursor = self.wrong_cursor.saturating_sub(1),
            KeyCode::Down => self.wrong_cursor = (self.wrong_cursor + 1).min(len.saturating_sub(1)),
            KeyCode::Enter => {
                if let Some(id) = self.selected_wrong_id() {
                    let started = self.bank.practice_wrong(&id).map(|_| ());
                    self.enter_quiz(started);
                }
            }
            KeyCode::Char('p') => self.start_practice(PracticeScope::Review),
            KeyCode::Char('d') | KeyCode::Delete => {
                if let Some(id) = self.selected_wrong_id() {
                    self.bank.remove_wrong(&id);
                    self.wrong_cursor = self.wrong_cursor.min(len.saturating_sub(2));
                }
            }
            KeyCode::Char('c') => {
                self.bank.clear_wrong();
                self.wrong_cursor = 0;
            }
            KeyCode::Char('x') => self.notice = Some(self.export_wrong()),
            KeyCode::Esc | KeyCode::Char('q') => self.state = AppState::Home,
            _ => {}
        }
    }

    fn selected_wrong_id(&self) -> Option<String> {
        self.bank
            .ledger()
            .entries()
            .get(self.wrong_cursor)
            .map(|e| e.question.id.clone())
    }

    fn export_wrong(&self) -> String {
        let written = self.bank.export_wrong().and_then(|export| {
            let path = self.export_dir.join(export.file_name());
            fs::write(&path, export.to_json_pretty()?)?;
            Ok(path)
        });
        match written {
            Ok(path) => format!("exported to {}", path.display()),
            Err(e) => e.to_string(),
        }
    }

    fn on_records_key(&mut self, key: KeyEvent) {
        let len = self.bank.records().len();
        match key.code {
            KeyCode::Up => self.records_offset = self.records_offset.saturating_sub(1),
            KeyCode::Down => {
                self.records_offset = (self.records_offset + 1).min(len.saturating_sub(1))
            }
            KeyCode::Esc | KeyCode::Char('q') => self.state = AppState::Home,
            _ => {}
        }
    }

    fn on_import_key(&mut self, key: KeyEvent) {
        self.notice = None;
        if self.pending_import.is_some() {
            match key.code {
                KeyCode::Enter | KeyCode::Char('y') => self.confirm_import(),
                KeyCode::Esc | KeyCode::Char('n') => self.pending_import = None,
                _ => {}
            }
            return;
        }
        match key.code {
            KeyCode::Esc => self.state = AppState::Home,
            KeyCode::Enter => self.preview_import(),
            KeyCode::Backspace => {
                self.import_path.pop();
            }
            KeyCode::Char(c) => self.import_path.push(c),
            _ => {}
        }
    }

    fn preview_import(&mut self) {
        let path = PathBuf::from(self.import_path.trim());
        let loaded = fs::read_to_string(&path)
            .map_err(QuizError::from)
            .and_then(|json| {
                let preview = QuestionStore::preview_import(&json)?;
                Ok(PendingImport { preview, json })
            });
        match loaded {
            Ok(pending) => self.pending_import = Some(pending),
            Err(e) => self.notice = Some(e.to_string()),
        }
    }

    fn confirm_import(&mut self) {
        let Some(pending) = self.pending_import.take() else {
            return;
        };
        match self.bank.import_document(&pending.json) {
            Ok(count) => {
                self.notice = Some(format!(
                    "imported {count} questions from {}",
                    pending.preview.name
                ));
                self.state = AppState::Home;
            }
            Err(e) => self.notice = Some(e.to_string()),
        }
    }

    /// Returns whether the screen needs a redraw.
    pub fn on_tick(&mut self, now: Instant) -> bool {
        if self.auto_next_at.is_some_and(|at| now >= at) {
            self.auto_next_at = None;
            if self.state == AppState::Quiz {
                self.step(Direction::Next);
                return true;
            }
        }
        self.state == AppState::Quiz && self.bank.timer().is_running()
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let settings = cli.settings(FileConfigStore::new().load());

    let log_dir = AppDirs::log_dir_in(&settings.data_dir);
    let _log_guard = logging::init(
        fs::create_dir_all(&log_dir).ok().map(|_| log_dir.as_path()),
        cli.verbose,
        !cli.is_tui(),
    );

    if let Some(command) = cli.command.as_ref().filter(|_| !cli.is_tui()) {
        return run_command(command, &settings, &mut io::stdout().lock());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let (bank, notice) = open_bank(&settings);
    let export_dir = std::env::current_dir().unwrap_or_else(|_| settings.data_dir.clone());
    let mut app = App::new(bank, settings.config.auto_next, export_dir);
    app.notice = notice;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );
    let outcome = start_tui(&mut terminal, &mut app, &runner);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    outcome
}

fn start_tui<B: Backend, E: EventSource, T: Ticker>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &Runner<E, T>,
) -> Result<(), Box<dyn Error>> {
    terminal.draw(|f| ui::draw(app, f))?;

    loop {
        match runner.step() {
            QuizEvent::Tick => {
                if app.on_tick(Instant::now()) {
                    terminal.draw(|f| ui::draw(app, f))?;
                }
            }
            QuizEvent::Resize => {
                terminal.draw(|f| ui::draw(app, f))?;
            }
            QuizEvent::Key(key) => {
                if app.on_key(key, Instant::now()) == Flow::Quit {
                    break;
                }
                terminal.draw(|f| ui::draw(app, f))?;
            }
        }
    }

    tracing::info!("leaving terminal ui");
    Ok(())
}
