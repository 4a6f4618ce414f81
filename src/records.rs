use crate::error::QuizError;
use crate::persist::{load_json_list, save_json_list, KeyValueStore, PRACTICE_RECORDS_KEY};
use crate::question::QuestionType;
use crate::session::AnswerRecord;
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::io::Write;

pub const DEFAULT_RECORD_LIMIT: usize = 50;

/// Which questions a practice session drew from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PracticeScope {
    Mixed,
    Only(QuestionType),
    Review,
}

impl fmt::Display for PracticeScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PracticeScope::Mixed => write!(f, "mixed"),
            PracticeScope::Review => write!(f, "review"),
            PracticeScope::Only(kind) => write!(f, "{kind}"),
        }
    }
}

impl PracticeScope {
    fn tag(&self) -> &'static str {
        match self {
            PracticeScope::Mixed => "mixed",
            PracticeScope::Review => "review",
            PracticeScope::Only(QuestionType::SingleChoice) => "single_choice",
            PracticeScope::Only(QuestionType::MultipleChoice) => "multiple_choice",
            PracticeScope::Only(QuestionType::TrueFalse) => "true_false",
        }
    }
}

impl Serialize for PracticeScope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.tag())
    }
}

impl<'de> Deserialize<'de> for PracticeScope {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = Option::<String>::deserialize(deserializer)?;
        match tag.as_deref() {
            None | Some("mixed") => Ok(PracticeScope::Mixed),
            Some("review") => Ok(PracticeScope::Review),
            Some(other) => {
                let kind: QuestionType =
                    serde_json::from_value(serde_json::Value::String(other.to_string()))
                        .map_err(serde::de::Error::custom)?;
                Ok(PracticeScope::Only(kind))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedQuestion {
    pub question: String,
    #[serde(rename = "type")]
    pub kind: QuestionType,
    pub result: Option<AnswerRecord>,
}

/// Summary of one completed practice session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PracticeRecord {
    pub id: i64,
    pub date: DateTime<Utc>,
    #[serde(rename = "type")]
    pub scope: PracticeScope,
    pub total: usize,
    pub correct: usize,
    pub wrong: usize,
    pub rate: u32,
    #[serde(rename = "questions")]
    pub per_question: Vec<RecordedQuestion>,
}

/// Most-recent-first, bounded history of practice sessions.
pub struct RecordLog {
    records: Vec<PracticeRecord>,
    limit: usize,
    store: Box<dyn KeyValueStore>,
}

impl fmt::Debug for RecordLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordLog")
            .field("records", &self.records.len())
            .field("limit", &self.limit)
            .finish()
    }
}

impl RecordLog {
    pub fn open(store: Box<dyn KeyValueStore>) -> Self {
        Self::with_limit(store, DEFAULT_RECORD_LIMIT)
    }

    pub fn with_limit(store: Box<dyn KeyValueStore>, limit: usize) -> Self {
        let limit = limit.max(1);
        let mut records: Vec<PracticeRecord> = load_json_list(store.as_ref(), PRACTICE_RECORDS_KEY);
        records.truncate(limit);
        Self {
            records,
            limit,
            store,
        }
    }

    /// Prepends `record`, evicting the oldest entries beyond the limit.
    pub fn append(&mut self, record: PracticeRecord) {
        self.records.insert(0, record);
        self.records.truncate(self.limit);
        save_json_list(self.store.as_mut(), PRACTICE_RECORDS_KEY, &self.records);
    }

    /// Millisecond timestamp id, kept strictly above the newest stored id.
    pub fn next_id(&self, now: DateTime<Utc>) -> i64 {
        let candidate = now.timestamp_millis();
        match self.records.first() {
            Some(latest) if latest.id >= candidate => latest.id + 1,
            _ => candidate,
        }
    }

    pub fn records(&self) -> &[PracticeRecord] {
        &self.records
    }

    pub fn latest(&self) -> Option<&PracticeRecord> {
        self.records.first()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Writes one summary row per record, newest first.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), QuizError> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(["date", "type", "total", "correct", "wrong", "rate"])?;
        for r in &self.records {
            wtr.write_record([
                r.date.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string(),
                r.scope.tag().to_string(),
                r.total.to_string(),
                r.correct.to_string(),
                r.wrong.to_string(),
                r.rate.to_string(),
            ])?;
        }
        wtr.flush()?;
        Ok(())
    }
}
