use crate::error::QuizError;
use crate::question::{AnswerSet, Question, QuestionOption, QuestionType};
use include_dir::{include_dir, Dir};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

static BANK_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/questions");

/// File names of the three question sources, in load order.
pub const SOURCES: [(&str, QuestionType); 3] = [
    ("single_choice.json", QuestionType::SingleChoice),
    ("multiple_choice.json", QuestionType::MultipleChoice),
    ("true_false.json", QuestionType::TrueFalse),
];

/// Tokens a true/false source may use for "true". Compared case-insensitively.
const TRUE_TOKENS: [&str; 6] = ["对", "正确", "true", "t", "√", "a"];

const PREVIEW_LEN: usize = 5;

/// One question as it appears in a bank source file.
#[derive(Debug, Clone, Deserialize)]
struct RawQuestion {
    question: String,
    #[serde(default)]
    options: Vec<String>,
    answer: String,
}

#[derive(Debug, Clone, Deserialize)]
struct RawBatch {
    questions: Vec<RawQuestion>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum ImportedOption {
    Labeled { letter: char, content: String },
    Plain(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum ImportedScore {
    Number(f64),
    Text(String),
}

/// One question of a user-supplied document. Only `question`, `options` and
/// the answer are required.
#[derive(Debug, Clone, Deserialize)]
struct ImportedQuestion {
    #[serde(default)]
    id: Option<Value>,
    question: String,
    #[serde(default, rename = "type")]
    kind: Option<Value>,
    options: Vec<ImportedOption>,
    #[serde(alias = "answer")]
    right_answer: String,
    #[serde(default)]
    score: Option<ImportedScore>,
}

/// Summary shown before an import is confirmed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportPreview {
    pub name: String,
    pub count: usize,
    pub sample: Vec<Question>,
}

/// Parsed, validated import waiting to be installed.
#[derive(Debug, Clone)]
pub struct ImportedBank {
    pub name: Option<String>,
    pub questions: Vec<Question>,
}

impl ImportedBank {
    pub fn preview(&self) -> ImportPreview {
        ImportPreview {
            name: self
                .name
                .clone()
                .unwrap_or_else(|| "Untitled bank".to_string()),
            count: self.questions.len(),
            sample: self.questions.iter().take(PREVIEW_LEN).cloned().collect(),
        }
    }
}

/// The set of questions available to sessions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuestionStore {
    questions: Vec<Question>,
}

impl QuestionStore {
    pub fn new(questions: Vec<Question>) -> Self {
        Self { questions }
    }

    /// Merges raw source documents. Any malformed source leaves the store
    /// empty; the failure is logged and the caller decides how to report it.
    pub fn load(batches: &[(QuestionType, &str)]) -> Self {
        match Self::try_load(batches) {
            Ok(store) => store,
            Err(e) => {
                tracing::warn!("question bank not loaded: {e}");
                Self::default()
            }
        }
    }

    pub fn try_load(batches: &[(QuestionType, &str)]) -> Result<Self, QuizError> {
        let mut questions = Vec::new();
        for (kind, source) in batches {
            let batch: RawBatch = serde_json::from_str(source).map_err(|e| QuizError::Load {
                source_name: kind.id_tag().to_string(),
                reason: e.to_string(),
            })?;
            questions.extend(
                batch
                    .questions
                    .into_iter()
                    .enumerate()
                    .map(|(index, raw)| normalize(*kind, index, raw)),
            );
        }
        tracing::debug!(count = questions.len(), "question bank loaded");
        Ok(Self { questions })
    }

    /// Reads the three source files from `dir` concurrently. If any of them
    /// cannot be read or parsed nothing is returned.
    pub fn load_files(dir: &Path) -> Result<Self, QuizError> {
        let contents: Vec<Result<(QuestionType, String), QuizError>> = std::thread::scope(|s| {
            let handles: Vec<_> = SOURCES
                .iter()
                .map(|&(file, kind)| {
                    let path: PathBuf = dir.join(file);
                    s.spawn(move || {
                        std::fs::read_to_string(&path)
                            .map(|text| (kind, text))
                            .map_err(|e| QuizError::Load {
                                source_name: path.display().to_string(),
                                reason: e.to_string(),
                            })
                    })
                })
                .collect();

            handles
                .into_iter()
                .map(|h| {
                    h.join().unwrap_or_else(|_| {
                        Err(QuizError::Load {
                            source_name: dir.display().to_string(),
                            reason: "reader thread panicked".to_string(),
                        })
                    })
                })
                .collect()
        });

        let sources = contents.into_iter().collect::<Result<Vec<_>, _>>()?;
        let borrowed: Vec<(QuestionType, &str)> =
            sources.iter().map(|(k, s)| (*k, s.as_str())).collect();
        Self::try_load(&borrowed)
    }

    /// The sample bank compiled into the binary.
    pub fn bundled() -> Result<Self, QuizError> {
        let mut batches = Vec::with_capacity(SOURCES.len());
        for (file, kind) in SOURCES {
            let text = BANK_DIR
                .get_file(file)
                .and_then(|f| f.contents_utf8())
                .ok_or_else(|| QuizError::Load {
                    source_name: file.to_string(),
                    reason: "missing from bundled bank".to_string(),
                })?;
            batches.push((kind, text));
        }
        Self::try_load(&batches)
    }

    /// Validates a user-supplied document without touching the store.
    pub fn parse_import(json: &str) -> Result<ImportedBank, QuizError> {
        let doc: Value = serde_json::from_str(json)
            .map_err(|e| QuizError::MalformedImport(format!("not valid JSON: {e}")))?;
        let items = doc
            .get("questions")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                QuizError::MalformedImport("document has no `questions` array".to_string())
            })?;
        let name = doc.get("name").and_then(Value::as_str).map(str::to_string);

        let questions = items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                let imported: ImportedQuestion = serde_json::from_value(item.clone())
                    .map_err(|e| {
                        QuizError::MalformedImport(format!("question {}: {e}", index + 1))
                    })?;
                Ok(from_import(index, imported))
            })
            .collect::<Result<Vec<_>, QuizError>>()?;

        Ok(ImportedBank { name, questions })
    }

    pub fn preview_import(json: &str) -> Result<ImportPreview, QuizError> {
        Ok(Self::parse_import(json)?.preview())
    }

    /// Replaces the store wholesale. On error the store is unchanged.
    pub fn import_document(&mut self, json: &str) -> Result<usize, QuizError> {
        let bank = Self::parse_import(json)?;
        let count = bank.questions.len();
        self.questions = bank.questions;
        tracing::info!(count, "imported question bank");
        Ok(count)
    }

    pub fn by_type(&self, kind: QuestionType) -> Vec<Question> {
        self.questions
            .iter()
            .filter(|q| q.kind == kind)
            .cloned()
            .collect()
    }

    pub fn count_by_type(&self, kind: QuestionType) -> usize {
        self.questions.iter().filter(|q| q.kind == kind).count()
    }

    pub fn get(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

fn normalize(kind: QuestionType, index: usize, raw: RawQuestion) -> Question {
    let mut options: Vec<QuestionOption> = raw
        .options
        .into_iter()
        .enumerate()
        .map(|(i, content)| QuestionOption::at(i, content))
        .collect();

    let correct_answer = match kind {
        QuestionType::TrueFalse => {
            if options.is_empty() {
                options = vec![QuestionOption::at(0, "True"), QuestionOption::at(1, "False")];
            }
            true_false_answer(&raw.answer)
        }
        _ => AnswerSet::parse(&raw.answer),
    };

    Question {
        id: format!("{}_{}", kind.id_tag(), index),
        text: raw.question,
        kind,
        options,
        correct_answer,
        score: kind.default_score(),
    }
}

fn true_false_answer(token: &str) -> AnswerSet {
    let token = token.trim().to_lowercase();
    if TRUE_TOKENS.contains(&token.as_str()) {
        AnswerSet::parse("A")
    } else {
        AnswerSet::parse("B")
    }
}

/// Missing or unrecognised labels fall back to multiple choice.
fn import_kind(label: Option<Value>) -> QuestionType {
    match label {
        None | Some(Value::Null) => QuestionType::MultipleChoice,
        Some(label) => serde_json::from_value(label.clone()).unwrap_or_else(|_| {
            tracing::warn!(%label, "unknown question type, importing as multiple choice");
            QuestionType::MultipleChoice
        }),
    }
}

fn from_import(index: usize, imported: ImportedQuestion) -> Question {
    let kind = import_kind(imported.kind);
    let options = imported
        .options
        .into_iter()
        .enumerate()
        .map(|(i, opt)| match opt {
            ImportedOption::Labeled { letter, content } => QuestionOption {
                letter: letter.to_ascii_uppercase(),
                content,
            },
            ImportedOption::Plain(content) => QuestionOption::at(i, content),
        })
        .collect();
    let id = match imported.id {
        Some(Value::String(s)) if !s.is_empty() => s,
        Some(Value::Number(n)) => n.to_string(),
        _ => format!("imported_{index}"),
    };
    let score = match imported.score {
        Some(ImportedScore::Number(n)) if n >= 0.0 => n.round() as u32,
        Some(ImportedScore::Text(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|n| *n >= 0.0)
            .map(|n| n.round() as u32)
            .unwrap_or_else(|| kind.default_score()),
        _ => kind.default_score(),
    };

    Question {
        id,
        text: imported.question,
        kind,
        options,
        correct_answer: AnswerSet::parse(&imported.right_answer),
        score,
    }
}
