use crate::persist::{load_json_list, save_json_list, KeyValueStore, WRONG_QUESTIONS_KEY};
use crate::question::Question;
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

pub const EXPORT_NAME: &str = "Wrong-question book export";

/// A missed question plus when and how often it was missed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WrongEntry {
    #[serde(flatten)]
    pub question: Question,
    #[serde(rename = "wrongTime")]
    pub wrong_time: DateTime<Utc>,
    #[serde(rename = "wrongCount")]
    pub wrong_count: u32,
}

/// Downloadable snapshot of the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WrongExport {
    pub name: String,
    #[serde(rename = "exportTime")]
    pub export_time: DateTime<Utc>,
    pub questions: Vec<WrongEntry>,
}

impl WrongExport {
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// File name suggested for saving this export.
    pub fn file_name(&self) -> String {
        format!(
            "wrong_questions_{}.json",
            self.export_time.with_timezone(&Local).format("%Y-%m-%d")
        )
    }
}

/// Persistent, deduplicated record of incorrectly answered questions.
/// Every mutation is written through to the backing store.
pub struct WrongLedger {
    entries: Vec<WrongEntry>,
    store: Box<dyn KeyValueStore>,
}

impl std::fmt::Debug for WrongLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WrongLedger")
            .field("entries", &self.entries.len())
            .finish()
    }
}

impl WrongLedger {
    pub fn open(store: Box<dyn KeyValueStore>) -> Self {
        let entries = load_json_list(store.as_ref(), WRONG_QUESTIONS_KEY);
        tracing::debug!(count = entries.len(), "wrong-question book loaded");
        Self { entries, store }
    }

    /// Upserts by question id and returns the entry's miss count.
    pub fn add(&mut self, question: &Question) -> u32 {
        self.add_at(question, Utc::now())
    }

    pub fn add_at(&mut self, question: &Question, when: DateTime<Utc>) -> u32 {
        let count = match self.entries.iter_mut().find(|e| e.question.id == question.id) {
            Some(entry) => {
                entry.wrong_count += 1;
                entry.wrong_time = when;
                entry.wrong_count
            }
            None => {
                self.entries.push(WrongEntry {
                    question: question.clone(),
                    wrong_time: when,
                    wrong_count: 1,
                });
                1
            }
        };
        tracing::debug!(id = %question.id, count, "recorded wrong answer");
        self.persist();
        count
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.question.id != id);
        let removed = self.entries.len() != before;
        if removed {
            self.persist();
        }
        removed
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.persist();
    }

    pub fn export(&self) -> WrongExport {
        WrongExport {
            name: EXPORT_NAME.to_string(),
            export_time: Utc::now(),
            questions: self.entries.clone(),
        }
    }

    pub fn entries(&self) -> &[WrongEntry] {
        &self.entries
    }

    pub fn get(&self, id: &str) -> Option<&WrongEntry> {
        self.entries.iter().find(|e| e.question.id == id)
    }

    pub fn questions(&self) -> Vec<Question> {
        self.entries.iter().map(|e| e.question.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn persist(&mut self) {
        save_json_list(self.store.as_mut(), WRONG_QUESTIONS_KEY, &self.entries);
    }
}
