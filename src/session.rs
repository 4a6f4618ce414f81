use crate::error::SessionError;
use crate::ledger::WrongLedger;
use crate::question::{AnswerSet, Question};
use crate::records::{PracticeRecord, PracticeScope, RecordLog};
use crate::session_policy;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
pub enum SessionMode {
    Practice,
    Exam,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    NotStarted,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Prev,
    Next,
}

/// Per-position answer state. `selected == None` means unanswered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub selected: Option<AnswerSet>,
    #[serde(rename = "isCorrect")]
    pub is_correct: Option<bool>,
    #[serde(rename = "correctAnswer")]
    pub correct_answer: AnswerSet,
}

impl AnswerRecord {
    pub(crate) fn empty(question: &Question) -> Self {
        Self {
            selected: None,
            is_correct: None,
            correct_answer: question.correct_answer.clone(),
        }
    }

    pub fn is_answered(&self) -> bool {
        self.selected.is_some() || self.is_correct.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SessionStats {
    pub total: usize,
    pub answered: usize,
    pub correct: usize,
    pub wrong: usize,
    pub rate: u32,
}

/// Percentage rounded half away from zero; zero when nothing was answered.
pub fn rate(correct: usize, answered: usize) -> u32 {
    if answered == 0 {
        0
    } else {
        ((100 * correct) as f64 / answered as f64).round() as u32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Correct,
    Incorrect,
    /// Exam selection stored; graded on finish.
    Recorded,
    /// Practice position already has an answer; nothing changed.
    AlreadyAnswered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellStatus {
    Unanswered,
    Answered,
    Correct,
    Wrong,
}

/// One square of the review grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetCell {
    pub index: usize,
    pub status: CellStatus,
    pub current: bool,
    pub marked: bool,
}

/// Terminal snapshot produced by `finish`.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionResults {
    pub mode: SessionMode,
    pub stats: SessionStats,
    pub score: u32,
    pub max_score: u32,
    pub wrong_ids: Vec<String>,
    pub elapsed: Duration,
    pub record: Option<PracticeRecord>,
}

/// Question queue with per-position answers, shared by practice and exam.
/// Mode-specific behaviour lives in `session_policy`.
#[derive(Debug, Clone)]
pub struct Session {
    pub(crate) mode: SessionMode,
    pub(crate) scope: PracticeScope,
    pub(crate) phase: Phase,
    pub(crate) queue: Vec<Question>,
    pub(crate) position: usize,
    pub(crate) answers: Vec<AnswerRecord>,
    pub(crate) marks: BTreeSet<usize>,
    pub(crate) started_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn practice(scope: PracticeScope) -> Self {
        Self::new(SessionMode::Practice, scope)
    }

    pub fn exam() -> Self {
        Self::new(SessionMode::Exam, PracticeScope::Mixed)
    }

    fn new(mode: SessionMode, scope: PracticeScope) -> Self {
        Self {
            mode,
            scope,
            phase: Phase::NotStarted,
            queue: Vec::new(),
            position: 0,
            answers: Vec::new(),
            marks: BTreeSet::new(),
            started_at: None,
        }
    }

    pub fn start(&mut self, queue: Vec<Question>) -> Result<(), SessionError> {
        if self.phase != Phase::NotStarted {
            return Err(SessionError::AlreadyStarted);
        }
        if queue.is_empty() {
            return Err(SessionError::EmptyQueue);
        }
        self.answers = queue.iter().map(AnswerRecord::empty).collect();
        self.queue = queue;
        self.position = 0;
        self.marks.clear();
        self.started_at = Some(Utc::now());
        self.phase = Phase::InProgress;
        tracing::info!(mode = %self.mode, scope = %self.scope, len = self.queue.len(), "session started");
        Ok(())
    }

    /// Practice: grades immediately, misses go to the ledger, answers are final.
    /// Exam: replaces the pending selection; grading waits for `finish`.
    pub fn submit(
        &mut self,
        position: usize,
        selected: AnswerSet,
        ledger: &mut WrongLedger,
    ) -> Result<SubmitOutcome, SessionError> {
        session_policy::apply_submit(self, position, selected, ledger)
    }

    /// Adds or removes one letter from a pending exam selection. Removing the
    /// last letter leaves the position unanswered.
    pub fn toggle_option(&mut self, position: usize, letter: char) -> Result<(), SessionError> {
        if self.mode != SessionMode::Exam {
            return Err(SessionError::ExamOnly);
        }
        self.ensure_in_progress()?;
        self.ensure_in_range(position)?;
        let question = &self.queue[position];
        if !question.has_option(letter) {
            return Err(SessionError::UnknownOption(letter));
        }

        let record = &mut self.answers[position];
        let mut selection = record.selected.take().unwrap_or_default();
        if !selection.remove(letter) {
            selection.insert(letter);
        }
        record.selected = (!selection.is_empty()).then_some(selection);
        Ok(())
    }

    /// Moves the cursor one step, clamped to the queue.
    pub fn advance(&mut self, direction: Direction) -> usize {
        let last = self.queue.len().saturating_sub(1);
        self.position = match direction {
            Direction::Prev => self.position.saturating_sub(1),
            Direction::Next => (self.position + 1).min(last),
        };
        self.position
    }

    pub fn jump(&mut self, position: usize) -> Result<(), SessionError> {
        self.ensure_in_range(position)?;
        self.position = position;
        Ok(())
    }

    /// Flips the review mark on `position`; returns whether it is now marked.
    pub fn toggle_mark(&mut self, position: usize) -> Result<bool, SessionError> {
        if self.mode != SessionMode::Exam {
            return Err(SessionError::ExamOnly);
        }
        self.ensure_in_progress()?;
        self.ensure_in_range(position)?;
        if self.marks.remove(&position) {
            Ok(false)
        } else {
            self.marks.insert(position);
            Ok(true)
        }
    }

    /// Ends the session. Fails without side effects unless in progress.
    pub fn finish(
        &mut self,
        ledger: &mut WrongLedger,
        log: &mut RecordLog,
    ) -> Result<SessionResults, SessionError> {
        self.ensure_in_progress()?;
        let results = session_policy::apply_finish(self, ledger, log);
        self.phase = Phase::Completed;
        self.marks.clear();
        tracing::info!(
            mode = %self.mode,
            correct = results.stats.correct,
            wrong = results.stats.wrong,
            rate = results.stats.rate,
            "session finished"
        );
        Ok(results)
    }

    pub fn stats(&self) -> SessionStats {
        let answered = self.answers.iter().filter(|a| a.is_answered()).count();
        let correct = self
            .answers
            .iter()
            .filter(|a| a.is_correct == Some(true))
            .count();
        let wrong = self
            .answers
            .iter()
            .filter(|a| a.is_correct == Some(false))
            .count();
        SessionStats {
            total: self.queue.len(),
            answered,
            correct,
            wrong,
            rate: rate(correct, answered),
        }
    }

    pub fn answer_sheet(&self) -> Vec<SheetCell> {
        self.answers
            .iter()
            .enumerate()
            .map(|(index, a)| SheetCell {
                index,
                status: match (a.is_correct, &a.selected) {
                    (Some(true), _) => CellStatus::Correct,
                    (Some(false), _) => CellStatus::Wrong,
                    (None, Some(_)) => CellStatus::Answered,
                    (None, None) => CellStatus::Unanswered,
                },
                current: index == self.position,
                marked: self.marks.contains(&index),
            })
            .collect()
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at
            .and_then(|t| (Utc::now() - t).to_std().ok())
            .unwrap_or_default()
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    pub fn scope(&self) -> PracticeScope {
        self.scope
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_in_progress(&self) -> bool {
        self.phase == Phase::InProgress
    }

    pub fn queue(&self) -> &[Question] {
        &self.queue
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn is_last(&self) -> bool {
        self.position + 1 >= self.queue.len()
    }

    pub fn current(&self) -> Option<&Question> {
        self.queue.get(self.position)
    }

    pub fn answer(&self, position: usize) -> Option<&AnswerRecord> {
        self.answers.get(position)
    }

    pub fn answers(&self) -> &[AnswerRecord] {
        &self.answers
    }

    pub fn is_marked(&self, position: usize) -> bool {
        self.marks.contains(&position)
    }

    pub fn marks(&self) -> impl Iterator<Item = usize> + '_ {
        self.marks.iter().copied()
    }

    pub(crate) fn ensure_in_progress(&self) -> Result<(), SessionError> {
        if self.phase == Phase::InProgress {
            Ok(())
        } else {
            Err(SessionError::NotInProgress)
        }
    }

    pub(crate) fn ensure_in_range(&self, position: usize) -> Result<(), SessionError> {
        if position < self.queue.len() {
            Ok(())
        } else {
            Err(SessionError::PositionOutOfRange {
                position,
                len: self.queue.len(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::MemoryStore;
    use crate::question::{QuestionOption, QuestionType};
    use assert_matches::assert_matches;

    fn question(id: &str, answer: &str) -> Question {
        Question {
            id: id.to_string(),
            text: format!("question {id}"),
            kind: QuestionType::SingleChoice,
            options: (0..4).map(|i| QuestionOption::at(i, "x")).collect(),
            correct_answer: AnswerSet::parse(answer),
            score: 1,
        }
    }

    fn queue() -> Vec<Question> {
        vec![question("q0", "A"), question("q1", "B"), question("q2", "C")]
    }

    fn sinks() -> (WrongLedger, RecordLog) {
        (
            WrongLedger::open(Box::new(MemoryStore::new())),
            RecordLog::open(Box::new(MemoryStore::new())),
        )
    }

    #[test]
    fn start_rejects_empty_queue() {
        let mut s = Session::practice(PracticeScope::Mixed);
        assert_eq!(s.start(vec![]), Err(SessionError::EmptyQueue));
        assert_eq!(s.phase(), Phase::NotStarted);
    }

    #[test]
    fn start_twice_is_rejected() {
        let mut s = Session::exam();
        s.start(queue()).unwrap();
        assert_eq!(s.start(queue()), Err(SessionError::AlreadyStarted));
    }

    #[test]
    fn fresh_session_stats() {
        let mut s = Session::practice(PracticeScope::Mixed);
        s.start(queue()).unwrap();
        assert_eq!(
            s.stats(),
            SessionStats {
                total: 3,
                answered: 0,
                correct: 0,
                wrong: 0,
                rate: 0
            }
        );
        assert_eq!(s.position(), 0);
        assert!(s.answers().iter().all(|a| a.selected.is_none()));
    }

    #[test]
    fn submit_before_start_is_rejected() {
        let (mut ledger, _) = sinks();
        let mut s = Session::practice(PracticeScope::Mixed);
        assert_eq!(
            s.submit(0, AnswerSet::parse("A"), &mut ledger),
            Err(SessionError::NotInProgress)
        );
    }

    #[test]
    fn advance_is_clamped() {
        let mut s = Session::practice(PracticeScope::Mixed);
        s.start(queue()).unwrap();
        assert_eq!(s.advance(Direction::Prev), 0);
        assert_eq!(s.advance(Direction::Next), 1);
        assert_eq!(s.advance(Direction::Next), 2);
        assert!(s.is_last());
        assert_eq!(s.advance(Direction::Next), 2);
        assert_eq!(s.phase(), Phase::InProgress);
    }

    #[test]
    fn jump_checks_range() {
        let mut s = Session::exam();
        s.start(queue()).unwrap();
        s.jump(2).unwrap();
        assert_eq!(s.current().unwrap().id, "q2");
        assert_matches!(s.jump(3), Err(SessionError::PositionOutOfRange { position: 3, len: 3 }));
        assert_eq!(s.position(), 2);
    }

    #[test]
    fn marks_are_exam_only() {
        let mut practice = Session::practice(PracticeScope::Mixed);
        practice.start(queue()).unwrap();
        assert_eq!(practice.toggle_mark(0), Err(SessionError::ExamOnly));

        let mut exam = Session::exam();
        exam.start(queue()).unwrap();
        assert_eq!(exam.toggle_mark(1), Ok(true));
        assert!(exam.is_marked(1));
        assert_eq!(exam.toggle_mark(1), Ok(false));
        assert!(!exam.is_marked(1));
    }

    #[test]
    fn toggle_option_builds_and_clears_selection() {
        let mut s = Session::exam();
        s.start(queue()).unwrap();
        s.toggle_option(0, 'a').unwrap();
        s.toggle_option(0, 'C').unwrap();
        assert_eq!(s.answer(0).unwrap().selected, Some(AnswerSet::parse("AC")));
        s.toggle_option(0, 'A').unwrap();
        s.toggle_option(0, 'C').unwrap();
        assert_eq!(s.answer(0).unwrap().selected, None);
        assert_eq!(s.toggle_option(0, 'Z'), Err(SessionError::UnknownOption('Z')));
    }

    #[test]
    fn answer_sheet_reflects_state() {
        let (mut ledger, _) = sinks();
        let mut s = Session::exam();
        s.start(queue()).unwrap();
        s.submit(1, AnswerSet::parse("B"), &mut ledger).unwrap();
        s.toggle_mark(2).unwrap();
        s.jump(2).unwrap();

        let sheet = s.answer_sheet();
        assert_eq!(sheet[0].status, CellStatus::Unanswered);
        assert_eq!(sheet[1].status, CellStatus::Answered);
        assert!(sheet[2].current && sheet[2].marked);
    }

    #[test]
    fn finish_outside_progress_is_rejected_without_side_effects() {
        let (mut ledger, mut log) = sinks();
        let mut s = Session::practice(PracticeScope::Mixed);
        assert_matches!(s.finish(&mut ledger, &mut log), Err(SessionError::NotInProgress));

        s.start(queue()).unwrap();
        s.finish(&mut ledger, &mut log).unwrap();
        assert_eq!(log.len(), 1);
        assert_matches!(s.finish(&mut ledger, &mut log), Err(SessionError::NotInProgress));
        assert_eq!(log.len(), 1);
        assert_eq!(s.phase(), Phase::Completed);
    }

    #[test]
    fn rate_rounds_to_nearest() {
        assert_eq!(rate(0, 0), 0);
        assert_eq!(rate(1, 3), 33);
        assert_eq!(rate(2, 3), 67);
        assert_eq!(rate(1, 2), 50);
        assert_eq!(rate(4, 4), 100);
    }
}
