//! API Models
//!
//! Response bodies for the REST endpoints, with `utoipa` schemas for the
//! generated OpenAPI document.

use serde::{Deserialize, Serialize};
use tutor_core::content::Concept;
use utoipa::ToSchema;

/// One entry of the concept listing.
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
pub struct ConceptSummary {
    #[schema(example = "c1")]
    pub id: String,
    #[schema(example = "Newton's First Law")]
    pub title: String,
}

/// A full concept record.
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
pub struct ConceptResponse {
    #[schema(example = "c1")]
    pub id: String,
    #[schema(example = "Newton's First Law")]
    pub title: String,
    pub summary: String,
    #[schema(example = "What keeps an object at rest at rest?")]
    pub sample_question: String,
}

impl From<&Concept> for ConceptResponse {
    fn from(concept: &Concept) -> Self {
        Self {
            id: concept.id.clone(),
            title: concept.title.clone(),
            summary: concept.summary.clone(),
            sample_question: concept.sample_question.clone(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub message: String,
}
