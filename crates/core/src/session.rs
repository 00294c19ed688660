use crate::content::{Concept, ContentStore};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Interaction style governing how the tutor responds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Explain the active concept.
    #[default]
    Learn,
    /// Ask the concept's sample question and check the answer.
    Quiz,
    /// Have the learner explain the concept back.
    TeachBack,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::Learn, Mode::Quiz, Mode::TeachBack];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Learn => "learn",
            Mode::Quiz => "quiz",
            Mode::TeachBack => "teach_back",
        }
    }

    /// The mode name as it should be read aloud.
    pub fn spoken(&self) -> &'static str {
        match self {
            Mode::Learn => "learn",
            Mode::Quiz => "quiz",
            Mode::TeachBack => "teach back",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "learn" => Ok(Mode::Learn),
            "quiz" => Ok(Mode::Quiz),
            "teach_back" | "teachback" => Ok(Mode::TeachBack),
            other => Err(format!("'{}' is not one of learn, quiz, teach_back", other)),
        }
    }
}

/// Mutable record of one conversation. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub active_concept_id: Option<String>,
    pub active_mode: Mode,
    pub practice_counts: HashMap<String, u32>,
}

impl SessionState {
    /// A fresh state with no active concept.
    pub fn new(mode: Mode) -> Self {
        Self {
            active_concept_id: None,
            active_mode: mode,
            practice_counts: HashMap::new(),
        }
    }

    pub fn practice_count(&self, concept_id: &str) -> u32 {
        self.practice_counts.get(concept_id).copied().unwrap_or(0)
    }

    /// Counts one more practice round on `concept_id`, returning the new total.
    pub fn record_practice(&mut self, concept_id: &str) -> u32 {
        let count = self
            .practice_counts
            .entry(concept_id.to_string())
            .or_insert(0);
        *count = count.saturating_add(1);
        *count
    }

    pub fn total_practice(&self) -> u32 {
        self.practice_counts.values().fold(0, |acc, n| acc.saturating_add(*n))
    }

    /// The least-practiced concept; ties go to the earliest in content order.
    pub fn weakest<'a>(&self, store: &'a ContentStore) -> Option<&'a Concept> {
        store.iter().min_by_key(|c| self.practice_count(&c.id))
    }
}
