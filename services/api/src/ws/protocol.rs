//! Defines the WebSocket message protocol between the client and the API server.
//!
//! The client is the speech pipeline: it sends one recognized utterance per
//! `user_message` and speaks every `response` it receives.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tutor_core::persona::PersonaKind;
use uuid::Uuid;

/// Messages sent from the client to the server.
#[derive(Deserialize, Debug, PartialEq)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Starts a session. This must be the first message.
    #[serde(rename = "init")]
    Init {
        /// Which dialogue to run; the study coach when omitted.
        #[serde(default)]
        persona: PersonaKind,
    },
    /// One utterance from the user.
    #[serde(rename = "user_message")]
    UserMessage { text: String },
}

/// Messages sent from the server to the client.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Confirms the session started and carries the opening line.
    Initialized {
        session_id: Uuid,
        persona: String,
        greeting: String,
        state: serde_json::Value,
        started_at: DateTime<Utc>,
    },
    /// Text to be spoken for the last utterance.
    Response { text: String },
    /// The dialogue's state after a turn.
    StateUpdate { state: serde_json::Value },
    /// The dialogue is over; speak the farewell and close.
    SessionEnded { farewell: String },
    /// Reports a protocol or session error to the client.
    Error { message: String },
}
