use crate::question::{AnswerSet, Question};

/// True iff the selected letters form exactly the question's correct set.
/// An empty selection is always wrong.
pub fn check(question: &Question, selected: &AnswerSet) -> bool {
    !selected.is_empty() && *selected == question.correct_answer
}
