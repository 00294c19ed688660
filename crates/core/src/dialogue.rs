//! The seam between front ends and the dialogue logic.
//!
//! Terminal and WebSocket front ends only ever talk to a `Box<dyn Dialogue>`,
//! so the tutor and the barista are driven the same way: greet, then one
//! utterance in and one [`Reply`] out until the dialogue finishes.

use crate::{
    Reply,
    barista::BaristaSession,
    config::SessionOptions,
    content::ContentStore,
    controller::TutorSession,
    error::TutorError,
    evaluator::Evaluator,
    formatter::format_for_speech,
    persona::{Persona, PersonaKind},
};
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait Dialogue: Send {
    fn persona(&self) -> &Persona;

    /// Opening line, already formatted for speech.
    fn greeting(&self) -> String {
        format_for_speech(&self.persona().greeting)
    }

    /// Handles one utterance from the speech recognizer.
    async fn respond(&mut self, utterance: &str) -> Result<Reply, TutorError>;

    /// JSON view of the dialogue's state for display and logging.
    fn snapshot(&self) -> serde_json::Value;

    fn is_finished(&self) -> bool;
}

/// Creates a fresh, independent dialogue for the requested persona.
pub fn start_dialogue(
    kind: PersonaKind,
    store: Arc<ContentStore>,
    evaluator: Arc<dyn Evaluator>,
    options: SessionOptions,
) -> Box<dyn Dialogue> {
    match kind {
        PersonaKind::Coach => Box::new(TutorSession::new(store, evaluator, options)),
        PersonaKind::Barista => Box::new(BaristaSession::new()),
    }
}
