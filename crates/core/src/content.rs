//! Content Store
//!
//! Holds the fixed set of study concepts a tutoring session works through.
//! The set is loaded once at startup from a JSON file and is read-only
//! afterwards; sessions share it behind an `Arc`.

use crate::{
    config::EndOfList,
    error::ContentError,
    formatter::{format_for_speech, spell_out_numbers},
};
use fuzzy_matcher::{FuzzyMatcher, skim::SkimMatcherV2};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use tracing::{debug, info};

/// Minimum fuzzy score per query character for a loose concept match.
const FUZZY_SCORE_PER_CHAR: i64 = 12;

/// A discrete unit of study content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Concept {
    pub id: String,
    pub title: String,
    pub summary: String,
    pub sample_question: String,
}

/// On-disk layouts accepted for a content file.
#[derive(Deserialize)]
#[serde(untagged)]
enum ContentFile {
    List(Vec<Concept>),
    Wrapped { concepts: Vec<Concept> },
}

impl ContentFile {
    fn into_concepts(self) -> Vec<Concept> {
        match self {
            ContentFile::List(concepts) | ContentFile::Wrapped { concepts } => concepts,
        }
    }
}

/// Read-only, ordered collection of concepts keyed by unique id.
#[derive(Debug, Clone)]
pub struct ContentStore {
    concepts: Vec<Concept>,
    index: HashMap<String, usize>,
}

impl ContentStore {
    /// Loads and validates a content file.
    ///
    /// The file must hold either a JSON array of concepts or an object with a
    /// `concepts` array. Any read, parse or validation failure is reported as
    /// [`ContentError::Load`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ContentError> {
        let path = path.as_ref();
        let origin = path.display().to_string();

        let raw = std::fs::read_to_string(path)
            .map_err(|e| ContentError::load(origin.clone(), e.to_string()))?;
        let file: ContentFile = serde_json::from_str(&raw)
            .map_err(|e| ContentError::load(origin.clone(), format!("malformed content: {}", e)))?;

        let store = Self::build(file.into_concepts()).map_err(|reason| ContentError::load(origin.clone(), reason))?;
        info!(path = %origin, concepts = store.len(), "Content store loaded");
        Ok(store)
    }

    /// Builds a store from concepts already in memory, applying the same
    /// validation as [`ContentStore::load`].
    pub fn from_concepts(concepts: Vec<Concept>) -> Result<Self, ContentError> {
        Self::build(concepts).map_err(|reason| ContentError::load("inline content", reason))
    }

    fn build(concepts: Vec<Concept>) -> Result<Self, String> {
        if concepts.is_empty() {
            return Err("no concepts defined".to_string());
        }

        let mut index = HashMap::with_capacity(concepts.len());
        for (position, concept) in concepts.iter().enumerate() {
            if concept.id.trim().is_empty() {
                return Err(format!("concept at position {} has an empty id", position));
            }
            for (field, value) in [
                ("title", &concept.title),
                ("summary", &concept.summary),
                ("sample_question", &concept.sample_question),
            ] {
                // Blank once formatted means nothing to say.
                if format_for_speech(value).is_empty() {
                    return Err(format!("concept '{}' has an empty {}", concept.id, field));
                }
            }
            if index.insert(concept.id.clone(), position).is_some() {
                return Err(format!("duplicate concept id '{}'", concept.id));
            }
        }

        Ok(Self { concepts, index })
    }

    /// Looks up a concept by its exact id.
    pub fn get(&self, id: &str) -> Result<&Concept, ContentError> {
        self.index
            .get(id)
            .map(|&position| &self.concepts[position])
            .ok_or_else(|| ContentError::ConceptNotFound(id.to_string()))
    }

    /// `(id, title)` pairs in content order.
    pub fn list(&self) -> Vec<(&str, &str)> {
        self.concepts
            .iter()
            .map(|c| (c.id.as_str(), c.title.as_str()))
            .collect()
    }

    pub fn all_ids(&self) -> BTreeSet<String> {
        self.index.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Concept> {
        self.concepts.iter()
    }

    pub fn len(&self) -> usize {
        self.concepts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.concepts.is_empty()
    }

    pub fn first(&self) -> Option<&Concept> {
        self.concepts.first()
    }

    /// The concept following `id` in content order.
    ///
    /// At the end of the list the `policy` decides between wrapping to the
    /// first concept and returning `None`. An unknown `id` starts from the top.
    pub fn next_after(&self, id: &str, policy: EndOfList) -> Option<&Concept> {
        let Some(&position) = self.index.get(id) else {
            return self.first();
        };
        match self.concepts.get(position + 1) {
            Some(next) => Some(next),
            None => match policy {
                EndOfList::Wrap => self.first(),
                EndOfList::Stop => None,
            },
        }
    }

    /// Maps a spoken or typed reference onto a concept.
    ///
    /// Tries [`ContentStore::resolve_exact`] first, then a fuzzy match over ids
    /// and titles. Equal fuzzy scores go to the concept listed first.
    pub fn resolve(&self, query: &str) -> Option<&Concept> {
        if let Some(exact) = self.resolve_exact(query) {
            return Some(exact);
        }

        let wanted = normalize(query);
        if wanted.is_empty() {
            return None;
        }

        let matcher = SkimMatcherV2::default();
        let threshold = wanted.chars().count() as i64 * FUZZY_SCORE_PER_CHAR;
        let mut best: Option<(i64, &Concept)> = None;
        for concept in &self.concepts {
            let Some(score) = [normalize(&concept.id), normalize(&concept.title)]
                .iter()
                .filter_map(|candidate| matcher.fuzzy_match(candidate, &wanted))
                .max()
            else {
                continue;
            };
            if score >= threshold && best.is_none_or(|(top, _)| score > top) {
                best = Some((score, concept));
            }
        }
        let best = best.map(|(_, c)| c);

        debug!(query = %query, matched = ?best.map(|c| &c.id), "Fuzzy concept lookup");
        best
    }

    /// Exact lookup: the id (ignoring case and punctuation), the id with
    /// digits spelled out ("c one" for `c1`), or the title.
    pub fn resolve_exact(&self, query: &str) -> Option<&Concept> {
        let wanted = normalize(query);
        if wanted.is_empty() {
            return None;
        }
        self.concepts.iter().find(|c| {
            normalize(&c.id) == wanted
                || normalize(&spell_out_numbers(&c.id)) == wanted
                || normalize(&c.title) == wanted
        })
    }
}

/// Lowercases, drops apostrophes and turns other punctuation into spaces.
fn normalize(text: &str) -> String {
    text.chars()
        .filter(|c| *c != '\'' && *c != '’')
        .map(|c| {
            if c.is_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                ' '
            }
        })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
