//! Error types shared by the question store, persistence layer and sessions.

use thiserror::Error;

/// Errors raised while loading, importing or persisting data.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizError {
    #[error("failed to load question bank `{source_name}`: {reason}")]
    Load { source_name: String, reason: String },
    #[error("import rejected: {0}")]
    MalformedImport(String),
    #[error("no questions available")]
    NoQuestions,
    #[error("the wrong-question book is empty")]
    EmptyLedger,
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

/// Caller-visible rejections of session operations. None of these leave the
/// session in a modified state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("cannot start a session without questions")]
    EmptyQueue,
    #[error("session has already been started")]
    AlreadyStarted,
    #[error("session is not in progress")]
    NotInProgress,
    #[error("position {position} is out of range (queue has {len} questions)")]
    PositionOutOfRange { position: usize, len: usize },
    #[error("select at least one option")]
    EmptySelection,
    #[error("option `{0}` is not offered by this question")]
    UnknownOption(char),
    #[error("only available in exam mode")]
    ExamOnly,
}
