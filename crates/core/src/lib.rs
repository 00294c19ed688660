pub mod barista;
pub mod command;
pub mod config;
pub mod content;
pub mod controller;
pub mod dialogue;
pub mod error;
pub mod evaluator;
pub mod formatter;
pub mod persona;
pub mod safety;
pub mod session;

/// Represents what the dialogue logic asks the runtime to do after a turn.
///
/// This enum decouples the dialogue's decisions from the runtime's side
/// effects (speaking text through a synthesizer, closing the session).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Speak the given text to the user.
    Speak(String),
    /// Speak the final message, then end the session.
    SessionComplete(String),
}

impl Reply {
    pub fn text(&self) -> &str {
        match self {
            Reply::Speak(text) | Reply::SessionComplete(text) => text,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Reply::SessionComplete(_))
    }
}
