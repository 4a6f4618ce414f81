// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod app_dirs;
pub mod bank;
pub mod checker;
pub mod config;
pub mod error;
pub mod ledger;
pub mod logging;
pub mod persist;
pub mod question;
pub mod records;
pub mod runtime;
pub mod session;
pub mod session_policy;
pub mod shuffle;
pub mod store;
pub mod timer;

pub use bank::{Overview, QuestionBank};
pub use error::{QuizError, SessionError};
pub use question::{AnswerSet, Question, QuestionOption, QuestionType};
pub use records::PracticeScope;
pub use session::{Direction, Session, SessionMode, SessionResults, SubmitOutcome};
