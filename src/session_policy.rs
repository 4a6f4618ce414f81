use crate::checker::check;
use crate::error::SessionError;
use crate::ledger::WrongLedger;
use crate::question::AnswerSet;
use crate::records::{PracticeRecord, RecordLog, RecordedQuestion};
use crate::session::{Session, SessionMode, SessionResults, SubmitOutcome};
use chrono::Utc;

fn validate_selection(
    session: &Session,
    position: usize,
    selected: &AnswerSet,
) -> Result<(), SessionError> {
    if selected.is_empty() {
        return Err(SessionError::EmptySelection);
    }
    let question = &session.queue[position];
    match selected.letters().find(|l| !question.has_option(*l)) {
        Some(letter) => Err(SessionError::UnknownOption(letter)),
        None => Ok(()),
    }
}

pub fn submit_practice(
    session: &mut Session,
    position: usize,
    selected: AnswerSet,
    ledger: &mut WrongLedger,
) -> Result<SubmitOutcome, SessionError> {
    if session.answers[position].is_correct.is_some() {
        return Ok(SubmitOutcome::AlreadyAnswered);
    }
    validate_selection(session, position, &selected)?;

    let question = &session.queue[position];
    let is_correct = check(question, &selected);
    let record = &mut session.answers[position];
    record.selected = Some(selected);
    record.is_correct = Some(is_correct);

    if is_correct {
        Ok(SubmitOutcome::Correct)
    } else {
        ledger.add(question);
        Ok(SubmitOutcome::Incorrect)
    }
}

pub fn submit_exam(
    session: &mut Session,
    position: usize,
    selected: AnswerSet,
) -> Result<SubmitOutcome, SessionError> {
    validate_selection(session, position, &selected)?;
    session.answers[position].selected = Some(selected);
    Ok(SubmitOutcome::Recorded)
}

pub fn apply_submit(
    session: &mut Session,
    position: usize,
    selected: AnswerSet,
    ledger: &mut WrongLedger,
) -> Result<SubmitOutcome, SessionError> {
    session.ensure_in_progress()?;
    session.ensure_in_range(position)?;
    match session.mode {
        SessionMode::Practice => submit_practice(session, position, selected, ledger),
        SessionMode::Exam => submit_exam(session, position, selected),
    }
}

/// Practice answers are already graded; the session becomes a log entry.
fn finish_practice(session: &Session, log: &mut RecordLog) -> PracticeRecord {
    let stats = session.stats();
    let now = Utc::now();
    let record = PracticeRecord {
        id: log.next_id(now),
        date: now,
        scope: session.scope,
        total: stats.total,
        correct: stats.correct,
        wrong: stats.wrong,
        rate: stats.rate,
        per_question: session
            .queue
            .iter()
            .zip(&session.answers)
            .map(|(q, a)| RecordedQuestion {
                question: q.text.clone(),
                kind: q.kind,
                result: a.is_answered().then(|| a.clone()),
            })
            .collect(),
    };
    log.append(record.clone());
    record
}

/// Grades every position; unanswered counts as wrong. Each miss is sent to
/// the ledger exactly once.
fn finish_exam(session: &mut Session, ledger: &mut WrongLedger) {
    for (question, record) in session.queue.iter().zip(session.answers.iter_mut()) {
        let is_correct = record
            .selected
            .as_ref()
            .map(|s| check(question, s))
            .unwrap_or(false);
        record.is_correct = Some(is_correct);
        if !is_correct {
            ledger.add(question);
        }
    }
}

pub fn apply_finish(
    session: &mut Session,
    ledger: &mut WrongLedger,
    log: &mut RecordLog,
) -> SessionResults {
    let record = match session.mode {
        SessionMode::Practice => Some(finish_practice(session, log)),
        SessionMode::Exam => {
            finish_exam(session, ledger);
            None
        }
    };

    let (score, max_score) = session
        .queue
        .iter()
        .zip(&session.answers)
        .fold((0, 0), |(got, max), (q, a)| {
            let earned = if a.is_correct == Some(true) { q.score } else { 0 };
            (got + earned, max + q.score)
        });

    SessionResults {
        mode: session.mode,
        stats: session.stats(),
        score,
        max_score,
        wrong_ids: session
            .queue
            .iter()
            .zip(&session.answers)
            .filter(|(_, a)| a.is_correct == Some(false))
            .map(|(q, _)| q.id.clone())
            .collect(),
        elapsed: session.elapsed(),
        record,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::MemoryStore;
    use crate::question::{Question, QuestionOption, QuestionType};
    use crate::records::PracticeScope;
    use crate::session::{Phase, SessionStats};

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
    fn practice_grades_immediately() {
        let (mut ledger, _) = sinks();
        let mut s = Session::practice(PracticeScope::Mixed);
        s.start(queue()).unwrap();

        assert_eq!(
            s.submit(0, AnswerSet::parse("A"), &mut ledger),
            Ok(SubmitOutcome::Correct)
        );
        assert_eq!(
            s.submit(1, AnswerSet::parse("D"), &mut ledger),
            Ok(SubmitOutcome::Incorrect)
        );
        assert_eq!(s.answer(1).unwrap().is_correct, Some(false));
        assert_eq!(ledger.len(), 1);
        assert!(ledger.get("q1").is_some());
    }

    #[test]
    fn practice_resubmit_is_a_noop() {
        let (mut ledger, _) = sinks();
        let mut s = Session::practice(PracticeScope::Mixed);
        s.start(queue()).unwrap();

        s.submit(0, AnswerSet::parse("B"), &mut ledger).unwrap();
        let before = s.answer(0).cloned();
        assert_eq!(
            s.submit(0, AnswerSet::parse("A"), &mut ledger),
            Ok(SubmitOutcome::AlreadyAnswered)
        );
        assert_eq!(s.answer(0).cloned(), before);
        assert_eq!(ledger.get("q0").unwrap().wrong_count, 1);
    }

    #[test]
    fn empty_and_foreign_selections_are_rejected() {
        let (mut ledger, _) = sinks();
        let mut s = Session::practice(PracticeScope::Mixed);
        s.start(queue()).unwrap();

        assert_eq!(
            s.submit(0, AnswerSet::new(), &mut ledger),
            Err(SessionError::EmptySelection)
        );
        assert_eq!(
            s.submit(0, AnswerSet::parse("AE"), &mut ledger),
            Err(SessionError::UnknownOption('E'))
        );
        assert!(!s.answer(0).unwrap().is_answered());
        assert_eq!(
            s.submit(5, AnswerSet::parse("A"), &mut ledger),
            Err(SessionError::PositionOutOfRange { position: 5, len: 3 })
        );
    }

    #[test]
    fn all_correct_practice() {
        let (mut ledger, mut log) = sinks();
        let mut s = Session::practice(PracticeScope::Only(QuestionType::SingleChoice));
        s.start(queue()).unwrap();
        for (i, a) in ["A", "B", "C"].iter().enumerate() {
            s.submit(i, AnswerSet::parse(a), &mut ledger).unwrap();
        }
        let expected = SessionStats {
            total: 3,
            answered: 3,
            correct: 3,
            wrong: 0,
            rate: 100,
        };
        assert_eq!(s.stats(), expected);

        let results = s.finish(&mut ledger, &mut log).unwrap();
        assert_eq!(results.stats, expected);
        let record = results.record.unwrap();
        assert_eq!(record.scope, PracticeScope::Only(QuestionType::SingleChoice));
        assert_eq!(record.rate, 100);
        assert_eq!(log.latest(), Some(&record));
        assert!(ledger.is_empty());
    }

    #[test]
    fn practice_record_keeps_unanswered_positions_empty() {
        let (mut ledger, mut log) = sinks();
        let mut s = Session::practice(PracticeScope::Mixed);
        s.start(queue()).unwrap();
        s.submit(0, AnswerSet::parse("A"), &mut ledger).unwrap();
        s.submit(2, AnswerSet::parse("A"), &mut ledger).unwrap();

        let results = s.finish(&mut ledger, &mut log).unwrap();
        let record = results.record.unwrap();
        assert_eq!((record.total, record.correct, record.wrong, record.rate), (3, 1, 1, 50));
        assert!(record.per_question[1].result.is_none());
        assert_eq!(record.per_question[2].result.as_ref().unwrap().is_correct, Some(false));
        assert_eq!(results.wrong_ids, vec!["q2".to_string()]);
    }

    #[test]
    fn exam_defers_grading_and_allows_resubmission() {
        let (mut ledger, _) = sinks();
        let mut s = Session::exam();
        s.start(queue()).unwrap();

        assert_eq!(
            s.submit(0, AnswerSet::parse("D"), &mut ledger),
            Ok(SubmitOutcome::Recorded)
        );
        assert_eq!(
            s.submit(0, AnswerSet::parse("A"), &mut ledger),
            Ok(SubmitOutcome::Recorded)
        );
        let record = s.answer(0).unwrap();
        assert_eq!(record.selected, Some(AnswerSet::parse("A")));
        assert_eq!(record.is_correct, None);
        assert!(ledger.is_empty());
        assert_eq!(s.stats().answered, 1);
        assert_eq!(s.stats().correct, 0);
    }

    #[test]
    fn exam_finish_grades_unanswered_as_wrong() {
        let (mut ledger, mut log) = sinks();
        let mut s = Session::exam();
        s.start(queue()).unwrap();
        s.submit(0, AnswerSet::parse("A"), &mut ledger).unwrap();
        s.submit(2, AnswerSet::parse("A"), &mut ledger).unwrap();
        s.toggle_mark(1).unwrap();

        let results = s.finish(&mut ledger, &mut log).unwrap();
        assert_eq!(results.stats.correct, 1);
        assert_eq!(results.stats.wrong, 2);
        assert_eq!(results.stats.answered, 3);
        assert_eq!(results.stats.rate, 33);
        assert_eq!((results.score, results.max_score), (1, 3));
        assert_eq!(results.wrong_ids, vec!["q1".to_string(), "q2".to_string()]);
        assert!(results.record.is_none());

        assert_eq!(ledger.len(), 2);
        assert!(ledger.get("q1").is_some() && ledger.get("q2").is_some());
        assert!(log.is_empty());
        assert_eq!(s.phase(), Phase::Completed);
        assert_eq!(s.marks().count(), 0);
    }

    #[test]
    fn submit_after_finish_is_rejected() {
        let (mut ledger, mut log) = sinks();
        let mut s = Session::exam();
        s.start(queue()).unwrap();
        s.finish(&mut ledger, &mut log).unwrap();
        assert_eq!(
            s.submit(0, AnswerSet::parse("A"), &mut ledger),
            Err(SessionError::NotInProgress)
        );
        assert_eq!(ledger.len(), 3);
    }
}
