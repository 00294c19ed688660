//! Axum Handlers for the REST API
//!
//! Read-only views of the loaded content store. Sessions themselves live on
//! the WebSocket endpoint. Handlers carry `utoipa` doc comments to generate
//! OpenAPI documentation.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::{debug, error};
use tutor_core::error::ContentError;

use crate::{
    models::{ConceptResponse, ConceptSummary, ErrorResponse},
    state::AppState,
};

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    InternalServerError(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(ErrorResponse { message })).into_response()
            }
            ApiError::NotFound(message) => {
                (StatusCode::NOT_FOUND, Json(ErrorResponse { message })).into_response()
            }
            ApiError::InternalServerError(err) => {
                error!("Internal Server Error: {:?}", err);
                let message = "An internal server error occurred.".to_string();
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse { message }),
                )
                    .into_response()
            }
        }
    }
}

impl From<ContentError> for ApiError {
    fn from(err: ContentError) -> Self {
        match err {
            ContentError::ConceptNotFound(_) => Self::NotFound(err.to_string()),
            ContentError::Load { .. } => Self::InternalServerError(err.into()),
        }
    }
}

/// List every loaded concept in content order.
#[utoipa::path(
    get,
    path = "/concepts",
    responses(
        (status = 200, description = "Concepts in content order", body = [ConceptSummary])
    )
)]
pub async fn list_concepts(State(state): State<Arc<AppState>>) -> Json<Vec<ConceptSummary>> {
    let concepts = state
        .store
        .list()
        .into_iter()
        .map(|(id, title)| ConceptSummary {
            id: id.to_string(),
            title: title.to_string(),
        })
        .collect();
    Json(concepts)
}

/// Get a single concept by its ID.
#[utoipa::path(
    get,
    path = "/concepts/{id}",
    responses(
        (status = 200, description = "Concept details", body = ConceptResponse),
        (status = 400, description = "Blank concept ID", body = ErrorResponse),
        (status = 404, description = "Concept not found", body = ErrorResponse)
    ),
    params(
        ("id" = String, Path, description = "Concept ID")
    )
)]
pub async fn get_concept(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ConceptResponse>, ApiError> {
    let id = id.trim();
    if id.is_empty() {
        return Err(ApiError::BadRequest("concept id must not be blank".to_string()));
    }

    let concept = state.store.get(id)?;
    debug!(concept = %concept.id, "Served concept");
    Ok(Json(ConceptResponse::from(concept)))
}
