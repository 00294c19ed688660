//! Keyword screen for requests a study coach or barista should not take on.

use serde::Serialize;

/// Why a request was declined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Concern {
    SelfHarm,
    Violence,
    Security,
    ProfessionalAdvice,
}

const SELF_HARM: &[&str] = &["kill myself", "hurt myself", "self harm", "suicide", "end my life"];
const VIOLENCE: &[&str] = &["bomb", "explosive", "weapon", "gun", "poison someone", "hurt someone", "kill someone"];
const SECURITY: &[&str] = &[
    "hack", "hacking", "password", "passwords", "credit card", "malware", "phishing", "steal",
];
const PROFESSIONAL_ADVICE: &[&str] = &[
    "diagnose",
    "prescription",
    "medical advice",
    "legal advice",
    "lawsuit",
    "investment advice",
    "stock tip",
    "stock tips",
];

impl Concern {
    /// A one or two sentence decline that steers back to `redirect`.
    pub fn decline(&self, redirect: &str) -> String {
        match self {
            Concern::SelfHarm => "I'm not able to help with that, but please reach out to someone you trust or a local crisis line right away.".to_string(),
            Concern::Violence | Concern::Security => format!("Sorry, I can't help with that. {}", redirect),
            Concern::ProfessionalAdvice => format!("That's a question for a qualified professional, so I'll leave it to them. {}", redirect),
        }
    }
}

/// Checks an utterance against the blocked phrase lists.
pub fn screen(utterance: &str) -> Option<Concern> {
    let padded = format!(" {} ", normalize(utterance));
    let hit = |phrases: &[&str]| phrases.iter().any(|p| padded.contains(&format!(" {} ", p)));

    if hit(SELF_HARM) {
        Some(Concern::SelfHarm)
    } else if hit(VIOLENCE) {
        Some(Concern::Violence)
    } else if hit(SECURITY) {
        Some(Concern::Security)
    } else if hit(PROFESSIONAL_ADVICE) {
        Some(Concern::ProfessionalAdvice)
    } else {
        None
    }
}

fn normalize(text: &str) -> String {
    text.chars()
        .filter(|c| *c != '\'' && *c != '’')
        .map(|c| if c.is_alphanumeric() { c.to_ascii_lowercase() } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
