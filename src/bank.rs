use crate::error::{QuizError, SessionError};
use crate::ledger::{WrongExport, WrongLedger};
use crate::question::{AnswerSet, Question, QuestionType};
use crate::records::{PracticeScope, RecordLog};
use crate::session::{Direction, Session, SessionMode, SessionResults, SubmitOutcome};
use crate::shuffle::{shuffle, RandomShuffle, ShuffleStrategy};
use crate::store::QuestionStore;
use crate::timer::ExamTimer;

/// Home screen summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Overview {
    pub total_questions: usize,
    pub wrong_questions: usize,
    pub correct_rate: u32,
}

/// Owns everything a front end needs: the question store, the persistent
/// ledger and record log, and at most one active session with its timer.
pub struct QuestionBank {
    store: QuestionStore,
    ledger: WrongLedger,
    records: RecordLog,
    shuffler: Box<dyn ShuffleStrategy>,
    timer: ExamTimer,
    session: Option<Session>,
    last_results: Option<SessionResults>,
}

impl std::fmt::Debug for QuestionBank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuestionBank")
            .field("questions", &self.store.len())
            .field("ledger", &self.ledger)
            .field("records", &self.records)
            .field("session", &self.session.as_ref().map(|s| s.mode()))
            .finish()
    }
}

impl QuestionBank {
    pub fn new(store: QuestionStore, ledger: WrongLedger, records: RecordLog) -> Self {
        Self {
            store,
            ledger,
            records,
            shuffler: Box::new(RandomShuffle),
            timer: ExamTimer::new(),
            session: None,
            last_results: None,
        }
    }

    pub fn with_shuffle(mut self, shuffler: Box<dyn ShuffleStrategy>) -> Self {
        self.shuffler = shuffler;
        self
    }

    pub fn with_timer(mut self, timer: ExamTimer) -> Self {
        self.timer = timer;
        self
    }

    pub fn store(&self) -> &QuestionStore {
        &self.store
    }

    pub fn ledger(&self) -> &WrongLedger {
        &self.ledger
    }

    pub fn records(&self) -> &RecordLog {
        &self.records
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn timer(&self) -> &ExamTimer {
        &self.timer
    }

    pub fn last_results(&self) -> Option<&SessionResults> {
        self.last_results.as_ref()
    }

    pub fn overview(&self) -> Overview {
        let total = self.store.len();
        let wrong = self.ledger.len();
        let correct_rate = if total == 0 {
            0
        } else {
            (100.0 * total.saturating_sub(wrong) as f64 / total as f64).round() as u32
        };
        Overview {
            total_questions: total,
            wrong_questions: wrong,
            correct_rate,
        }
    }

    /// Replaces the store from a user document. Any active session is
    /// dropped; on error nothing changes.
    pub fn import_document(&mut self, json: &str) -> Result<usize, QuizError> {
        let count = self.store.import_document(json)?;
        self.abandon();
        Ok(count)
    }

    /// A freshly shuffled copy of the whole store.
    pub fn exam_questions(&mut self) -> Vec<Question> {
        shuffle(self.shuffler.as_mut(), self.store.questions())
    }

    pub fn start_practice(&mut self, scope: PracticeScope) -> Result<&Session, QuizError> {
        let pool = match scope {
            PracticeScope::Mixed => self.store.questions().to_vec(),
            PracticeScope::Only(kind) => self.store.by_type(kind),
            PracticeScope::Review => self.ledger.questions(),
        };
        if pool.is_empty() {
            return Err(match scope {
                PracticeScope::Review => QuizError::EmptyLedger,
                _ if self.store.is_empty() => QuizError::NoQuestions,
                _ => SessionError::EmptyQueue.into(),
            });
        }
        let queue = shuffle(self.shuffler.as_mut(), &pool);
        self.install(Session::practice(scope), queue)
    }

    pub fn start_practice_by_type(&mut self, kind: QuestionType) -> Result<&Session, QuizError> {
        self.start_practice(PracticeScope::Only(kind))
    }

    /// Practice a single ledger entry.
    pub fn practice_wrong(&mut self, id: &str) -> Result<&Session, QuizError> {
        let question = self
            .ledger
            .get(id)
            .map(|e| e.question.clone())
            .ok_or(QuizError::EmptyLedger)?;
        self.install(Session::practice(PracticeScope::Review), vec![question])
    }

    /// New shuffled queue with the same scope as the current practice.
    pub fn restart_practice(&mut self) -> Result<&Session, QuizError> {
        let scope = self
            .session
            .as_ref()
            .filter(|s| s.mode() == SessionMode::Practice)
            .map(|s| s.scope())
            .unwrap_or(PracticeScope::Mixed);
        self.start_practice(scope)
    }

    pub fn start_exam(&mut self) -> Result<&Session, QuizError> {
        if self.store.is_empty() {
            return Err(QuizError::NoQuestions);
        }
        let paper = self.exam_questions();
        self.install(Session::exam(), paper)?;
        self.timer.start();
        self.session.as_ref().ok_or(QuizError::NoQuestions)
    }

    fn install(&mut self, mut session: Session, queue: Vec<Question>) -> Result<&Session, QuizError> {
        self.timer.stop();
        session.start(queue)?;
        self.last_results = None;
        Ok(self.session.insert(session))
    }

    fn active(&mut self) -> Result<&mut Session, SessionError> {
        self.session.as_mut().ok_or(SessionError::NotInProgress)
    }

    pub fn submit(&mut self, selected: AnswerSet) -> Result<SubmitOutcome, SessionError> {
        let position = self.active()?.position();
        self.submit_at(position, selected)
    }

    pub fn submit_at(
        &mut self,
        position: usize,
        selected: AnswerSet,
    ) -> Result<SubmitOutcome, SessionError> {
        let session = self.session.as_mut().ok_or(SessionError::NotInProgress)?;
        session.submit(position, selected, &mut self.ledger)
    }

    pub fn toggle_option(&mut self, letter: char) -> Result<(), SessionError> {
        let session = self.active()?;
        let position = session.position();
        session.toggle_option(position, letter)
    }

    pub fn toggle_mark(&mut self) -> Result<bool, SessionError> {
        let session = self.active()?;
        let position = session.position();
        session.toggle_mark(position)
    }

    pub fn advance(&mut self, direction: Direction) -> Result<usize, SessionError> {
        Ok(self.active()?.advance(direction))
    }

    pub fn jump(&mut self, position: usize) -> Result<(), SessionError> {
        self.active()?.jump(position)
    }

    /// Completes the active session and stops the exam timer.
    pub fn finish(&mut self) -> Result<SessionResults, SessionError> {
        let session = self.session.as_mut().ok_or(SessionError::NotInProgress)?;
        let mut results = session.finish(&mut self.ledger, &mut self.records)?;
        if session.mode() == SessionMode::Exam {
            results.elapsed = self.timer.stop();
        }
        self.last_results = Some(results.clone());
        Ok(results)
    }

    /// Drops the active session without recording anything.
    pub fn abandon(&mut self) {
        self.timer.stop();
        self.session = None;
    }

    pub fn remove_wrong(&mut self, id: &str) -> bool {
        self.ledger.remove(id)
    }

    pub fn clear_wrong(&mut self) {
        self.ledger.clear();
    }

    pub fn export_wrong(&self) -> Result<WrongExport, QuizError> {
        if self.ledger.is_empty() {
            return Err(QuizError::EmptyLedger);
        }
        Ok(self.ledger.export())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::MemoryStore;
    use crate::shuffle::NoShuffle;
    use assert_matches::assert_matches;
    use std::time::Duration;

    const SINGLE: &str = r#"{"questions": [
        {"question": "a?", "options": ["1", "2", "3", "4"], "answer": "A"},
        {"question": "b?", "options": ["1", "2", "3", "4"], "answer": "B"},
        {"question": "c?", "options": ["1", "2", "3", "4"], "answer": "C"}
    ]}"#;
    const TRUE_FALSE: &str = r#"{"questions": [
        {"question": "t?", "options": ["对", "错"], "answer": "对"}
    ]}"#;

    fn bank() -> QuestionBank {
        let store = QuestionStore::load(&[
            (QuestionType::SingleChoice, SINGLE),
            (QuestionType::TrueFalse, TRUE_FALSE),
        ]);
        QuestionBank::new(
            store,
            WrongLedger::open(Box::new(MemoryStore::new())),
            RecordLog::open(Box::new(MemoryStore::new())),
        )
        .with_shuffle(Box::new(NoShuffle))
        .with_timer(ExamTimer::with_interval(Duration::from_millis(5)))
    }

    #[test]
    fn practice_by_type_filters_queue() {
        let mut bank = bank();
        let session = bank.start_practice_by_type(QuestionType::TrueFalse).unwrap();
        assert_eq!(session.len(), 1);
        assert_eq!(session.queue()[0].id, "truefalse_0");
    }

    #[test]
    fn practice_without_matching_questions_fails() {
        let mut bank = bank();
        assert_matches!(
            bank.start_practice_by_type(QuestionType::MultipleChoice),
            Err(QuizError::Session(SessionError::EmptyQueue))
        );
        assert_matches!(
            bank.start_practice(PracticeScope::Review),
            Err(QuizError::EmptyLedger)
        );
    }

    #[test]
    fn empty_store_reports_no_questions() {
        let mut bank = QuestionBank::new(
            QuestionStore::default(),
            WrongLedger::open(Box::new(MemoryStore::new())),
            RecordLog::open(Box::new(MemoryStore::new())),
        );
        assert_matches!(bank.start_exam(), Err(QuizError::NoQuestions));
        assert_matches!(bank.start_practice(PracticeScope::Mixed), Err(QuizError::NoQuestions));
        assert_eq!(bank.overview().correct_rate, 0);
    }

    #[test]
    fn exam_runs_timer_until_finish() {
        let mut bank = bank();
        bank.start_exam().unwrap();
        assert!(bank.timer().is_running());

        bank.submit(AnswerSet::parse("A")).unwrap();
        std::thread::sleep(Duration::from_millis(30));
        let results = bank.finish().unwrap();

        assert!(!bank.timer().is_running());
        assert_eq!(results.stats.correct, 1);
        assert_eq!(results.stats.wrong, 3);
        assert_eq!(bank.ledger().len(), 3);
        assert_eq!(bank.last_results(), Some(&results));
    }

    #[test]
    fn new_session_stops_running_timer() {
        let mut bank = bank();
        bank.start_exam().unwrap();
        bank.start_exam().unwrap();
        assert_eq!(bank.timer().active_tickers(), 1);
        bank.start_practice(PracticeScope::Mixed).unwrap();
        assert!(!bank.timer().is_running());
        assert_eq!(bank.timer().active_tickers(), 0);
    }

    #[test]
    fn review_uses_ledger_questions() {
        let mut bank = bank();
        bank.start_practice(PracticeScope::Mixed).unwrap();
        bank.submit(AnswerSet::parse("D")).unwrap();
        bank.finish().unwrap();
        assert_eq!(bank.records().len(), 1);

        let session = bank.start_practice(PracticeScope::Review).unwrap();
        assert_eq!(session.len(), 1);
        assert_eq!(session.queue()[0].id, "single_0");
        assert_eq!(bank.store().len(), 4);

        bank.submit(AnswerSet::parse("A")).unwrap();
        bank.finish().unwrap();
        assert_eq!(bank.records().latest().unwrap().scope, PracticeScope::Review);
    }

    #[test]
    fn restart_keeps_scope() {
        let mut bank = bank();
        bank.start_practice_by_type(QuestionType::SingleChoice).unwrap();
        bank.submit(AnswerSet::parse("A")).unwrap();
        let session = bank.restart_practice().unwrap();
        assert_eq!(session.scope(), PracticeScope::Only(QuestionType::SingleChoice));
        assert_eq!(session.stats().answered, 0);
    }

    #[test]
    fn overview_counts_wrong_questions() {
        let mut bank = bank();
        bank.start_practice(PracticeScope::Mixed).unwrap();
        bank.submit(AnswerSet::parse("B")).unwrap();
        let overview = bank.overview();
        assert_eq!(overview.total_questions, 4);
        assert_eq!(overview.wrong_questions, 1);
        assert_eq!(overview.correct_rate, 75);
    }

    #[test]
    fn import_drops_active_session() {
        let mut bank = bank();
        bank.start_exam().unwrap();
        let doc = r#"{"questions": [{"question": "x", "options": ["a", "b"], "right_answer": "AB"}]}"#;
        assert_eq!(bank.import_document(doc).unwrap(), 1);
        assert!(bank.session().is_none());
        assert!(!bank.timer().is_running());
        assert_eq!(bank.store().questions()[0].kind, QuestionType::MultipleChoice);
    }

    #[test]
    fn bad_import_keeps_everything() {
        let mut bank = bank();
        bank.start_practice(PracticeScope::Mixed).unwrap();
        assert_matches!(bank.import_document("{}"), Err(QuizError::MalformedImport(_)));
        assert!(bank.session().is_some());
        assert_eq!(bank.store().len(), 4);
    }

    #[test]
    fn export_requires_entries() {
        let mut bank = bank();
        assert_matches!(bank.export_wrong(), Err(QuizError::EmptyLedger));
        bank.start_practice(PracticeScope::Mixed).unwrap();
        bank.submit(AnswerSet::parse("B")).unwrap();
        assert_eq!(bank.export_wrong().unwrap().questions.len(), 1);
    }

    #[test]
    fn practice_single_wrong_entry() {
        let mut bank = bank();
        bank.start_practice(PracticeScope::Mixed).unwrap();
        bank.submit(AnswerSet::parse("B")).unwrap();
        let session = bank.practice_wrong("single_0").unwrap();
        assert_eq!(session.len(), 1);
        assert_matches!(bank.practice_wrong("nope"), Err(QuizError::EmptyLedger));
    }

    #[test]
    fn operations_without_session_are_rejected() {
        let mut bank = bank();
        assert_eq!(bank.submit(AnswerSet::parse("A")), Err(SessionError::NotInProgress));
        assert_eq!(bank.toggle_mark(), Err(SessionError::NotInProgress));
        assert_eq!(bank.finish().unwrap_err(), SessionError::NotInProgress);
    }
}
