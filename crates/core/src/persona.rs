use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which dialogue a session runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersonaKind {
    /// The teach-the-tutor study coach.
    #[default]
    Coach,
    /// Alex, the barista at Falcon Brew Coffee.
    Barista,
}

impl FromStr for PersonaKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "coach" | "tutor" => Ok(PersonaKind::Coach),
            "barista" => Ok(PersonaKind::Barista),
            other => Err(format!("unknown persona '{}'", other)),
        }
    }
}

impl fmt::Display for PersonaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersonaKind::Coach => write!(f, "coach"),
            PersonaKind::Barista => write!(f, "barista"),
        }
    }
}

/// The voice a dialogue speaks with: how it opens, closes and steers back on
/// topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Persona {
    pub name: String,
    pub greeting: String,
    pub farewell: String,
    /// Spoken after declining an out-of-scope request.
    pub redirect: String,
}

impl Persona {
    pub fn for_kind(kind: PersonaKind) -> Self {
        match kind {
            PersonaKind::Coach => Self::study_coach(),
            PersonaKind::Barista => Self::barista(),
        }
    }

    pub fn study_coach() -> Self {
        Self {
            name: "Coach".to_string(),
            greeting: "Hi, I'm your study coach. We can learn a concept, take a quick quiz, or you can teach it back to me. Say list concepts to hear what we can study.".to_string(),
            farewell: "Great work today, see you next time.".to_string(),
            redirect: "Let's get back to studying, say list concepts to pick a topic.".to_string(),
        }
    }

    pub fn barista() -> Self {
        Self {
            name: "Alex".to_string(),
            greeting: "☕ Hi! Welcome to Falcon Brew Coffee! I'm Alex, what can I get for you today?".to_string(),
            farewell: "Thanks for stopping by Falcon Brew, have a great day!".to_string(),
            redirect: "I'm just here for the coffee, what can I get started for you?".to_string(),
        }
    }
}
