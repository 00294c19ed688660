//! Answer Evaluation
//!
//! Grading a quiz answer or a teach-back explanation is policy, not part of
//! the dialogue state machine. The controller asks an [`Evaluator`] for a
//! [`Grade`] and only decides what to say about it.

use crate::content::Concept;
use anyhow::{Result, ensure};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

const STOP_WORDS: &[&str] = &[
    "about", "after", "also", "because", "been", "before", "being", "between", "both", "does",
    "each", "either", "even", "from", "have", "into", "just", "like", "made", "make", "many",
    "more", "most", "much", "must", "only", "other", "over", "same", "some", "such", "than",
    "that", "their", "them", "then", "there", "these", "they", "thing", "things", "this",
    "those", "through", "unless", "until", "upon", "very", "what", "when", "where", "which",
    "while", "will", "with", "without", "would", "your",
];

/// Qualitative outcome of one practice attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Grade {
    Great,
    Good,
    TryAgain,
}

impl Grade {
    /// The feedback line spoken for this grade.
    pub fn label(&self) -> &'static str {
        match self {
            Grade::Great => "Great",
            Grade::Good => "Good, add more detail",
            Grade::TryAgain => "Try again, focus on key terms",
        }
    }
}

/// Defines the contract for any service that can grade a learner's answer.
///
/// Implementations may be deterministic (keyword overlap) or backed by an
/// external model; the controller treats both the same way.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Evaluator: Send + Sync {
    /// Grades `answer` against what `concept` teaches.
    async fn evaluate(&self, concept: &Concept, answer: &str) -> Result<Grade>;
}

/// Grades by the share of the summary's key terms the answer mentions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeywordOverlapEvaluator {
    great_threshold: f32,
    good_threshold: f32,
}

impl Default for KeywordOverlapEvaluator {
    fn default() -> Self {
        Self {
            great_threshold: 0.6,
            good_threshold: 0.3,
        }
    }
}

impl KeywordOverlapEvaluator {
    /// Creates an evaluator with custom cut-offs.
    ///
    /// Both thresholds must lie in `0.0..=1.0` with `good <= great`.
    pub fn new(great_threshold: f32, good_threshold: f32) -> Result<Self> {
        ensure!(
            (0.0..=1.0).contains(&great_threshold) && (0.0..=1.0).contains(&good_threshold),
            "thresholds must be between 0 and 1"
        );
        ensure!(
            good_threshold <= great_threshold,
            "good threshold {} exceeds great threshold {}",
            good_threshold,
            great_threshold
        );
        Ok(Self {
            great_threshold,
            good_threshold,
        })
    }

    /// Fraction of the concept's key terms present in `answer`, in `0.0..=1.0`.
    pub fn score(&self, concept: &Concept, answer: &str) -> f32 {
        let expected: BTreeSet<String> = key_terms(&concept.summary).into_iter().collect();
        let given: BTreeSet<String> = words(answer).collect();

        if expected.is_empty() {
            return if given.is_empty() { 0.0 } else { 1.0 };
        }
        let hits = expected.iter().filter(|term| given.contains(*term)).count();
        hits as f32 / expected.len() as f32
    }

    fn grade_for(&self, score: f32) -> Grade {
        if score >= self.great_threshold {
            Grade::Great
        } else if score >= self.good_threshold {
            Grade::Good
        } else {
            Grade::TryAgain
        }
    }
}

#[async_trait]
impl Evaluator for KeywordOverlapEvaluator {
    async fn evaluate(&self, concept: &Concept, answer: &str) -> Result<Grade> {
        let score = self.score(concept, answer);
        tracing::debug!(concept = %concept.id, score, "Keyword overlap scored");
        Ok(self.grade_for(score))
    }
}

/// Distinct key terms of `text` in order of first appearance.
///
/// A key term is a word of four or more letters that is not a stop word,
/// folded to lowercase with a trailing plural `s` removed.
pub fn key_terms(text: &str) -> Vec<String> {
    let mut seen = BTreeSet::new();
    words(text)
        .filter(|word| word.len() >= 4 && !STOP_WORDS.contains(&word.as_str()))
        .filter(|word| seen.insert(word.clone()))
        .collect()
}

fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let word = word.to_lowercase();
            match word.strip_suffix('s') {
                Some(stem) if stem.len() >= 4 && !stem.ends_with('s') => stem.to_string(),
                _ => word,
            }
        })
}
