//! Error types shared across the tutor core.

use thiserror::Error;

/// Errors raised by the content store.
#[derive(Debug, Error)]
pub enum ContentError {
    /// The content file could not be read or did not hold a valid concept set.
    /// This is fatal at startup.
    #[error("failed to load content from {origin}: {reason}")]
    Load { origin: String, reason: String },
    /// A concept id was requested that the store does not hold.
    #[error("concept '{0}' not found")]
    ConceptNotFound(String),
}

impl ContentError {
    pub(crate) fn load(origin: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Load {
            origin: origin.into(),
            reason: reason.into(),
        }
    }
}

/// Errors surfaced by a running dialogue.
#[derive(Debug, Error)]
pub enum TutorError {
    /// A turn arrived after the session was closed with `exit`.
    #[error("session has already ended")]
    SessionEnded,
    #[error(transparent)]
    Content(#[from] ContentError),
}
