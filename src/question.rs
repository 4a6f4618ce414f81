use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;

/// Kind of question. Serialized with the tags used by the bundled sources;
/// the labels used by exported documents from older banks are accepted too.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
    strum_macros::Display,
)]
pub enum QuestionType {
    #[serde(rename = "single_choice", alias = "单选题", alias = "SingleChoice")]
    #[strum(serialize = "single choice")]
    SingleChoice,
    #[serde(rename = "multiple_choice", alias = "多选题", alias = "MultipleChoice")]
    #[strum(serialize = "multiple choice")]
    MultipleChoice,
    #[serde(rename = "true_false", alias = "判断题", alias = "TrueFalse")]
    #[strum(serialize = "true/false")]
    TrueFalse,
}

impl QuestionType {
    pub const ALL: [QuestionType; 3] = [
        QuestionType::SingleChoice,
        QuestionType::MultipleChoice,
        QuestionType::TrueFalse,
    ];

    /// Prefix used for synthetic ids of loaded questions.
    pub fn id_tag(&self) -> &'static str {
        match self {
            QuestionType::SingleChoice => "single",
            QuestionType::MultipleChoice => "multiple",
            QuestionType::TrueFalse => "truefalse",
        }
    }

    pub fn default_score(&self) -> u32 {
        match self {
            QuestionType::MultipleChoice => 2,
            _ => 1,
        }
    }

    /// Single-choice and true/false questions are answered with one click.
    pub fn is_single_select(&self) -> bool {
        !matches!(self, QuestionType::MultipleChoice)
    }
}

/// A set of option letters, compared without regard to order or duplicates.
/// Encoded as a plain string such as `"ACD"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct AnswerSet(BTreeSet<char>);

impl AnswerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(s: &str) -> Self {
        s.chars()
            .filter(|c| c.is_ascii_alphabetic())
            .map(|c| c.to_ascii_uppercase())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, letter: char) -> bool {
        self.0.contains(&letter.to_ascii_uppercase())
    }

    pub fn insert(&mut self, letter: char) -> bool {
        self.0.insert(letter.to_ascii_uppercase())
    }

    pub fn remove(&mut self, letter: char) -> bool {
        self.0.remove(&letter.to_ascii_uppercase())
    }

    pub fn letters(&self) -> impl Iterator<Item = char> + '_ {
        self.0.iter().copied()
    }
}

impl fmt::Display for AnswerSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in &self.0 {
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

impl FromIterator<char> for AnswerSet {
    fn from_iter<I: IntoIterator<Item = char>>(iter: I) -> Self {
        Self(iter.into_iter().map(|c| c.to_ascii_uppercase()).collect())
    }
}

impl From<&str> for AnswerSet {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl Serialize for AnswerSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for AnswerSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::parse(&s))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOption {
    pub letter: char,
    pub content: String,
}

impl QuestionOption {
    /// Option at `index` gets the letter `A`, `B`, ... in order.
    pub fn at(index: usize, content: impl Into<String>) -> Self {
        Self {
            letter: letter_for(index),
            content: content.into(),
        }
    }
}

pub fn letter_for(index: usize) -> char {
    char::from(b'A' + (index % 26) as u8)
}

/// A question as held by the store. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    #[serde(rename = "question")]
    pub text: String,
    #[serde(rename = "type")]
    pub kind: QuestionType,
    pub options: Vec<QuestionOption>,
    #[serde(rename = "right_answer")]
    pub correct_answer: AnswerSet,
    pub score: u32,
}

impl Question {
    pub fn has_option(&self, letter: char) -> bool {
        let letter = letter.to_ascii_uppercase();
        self.options.iter().any(|o| o.letter == letter)
    }
}
