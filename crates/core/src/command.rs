//! Command Parser
//!
//! Turns one raw utterance into a [`Command`]. Matching is case-insensitive,
//! ignores punctuation and a few conversational fillers, and tries explicit
//! session commands in a fixed priority order before falling back to
//! [`Command::FreeformUtterance`].

use crate::session::Mode;
use fuzzy_matcher::{FuzzyMatcher, skim::SkimMatcherV2};

/// A recognized session command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    ListConcepts,
    SelectConcept(String),
    SwitchMode(Mode),
    Next,
    Repeat,
    Exit,
    WeakestConcept,
    /// Anything that is not a session command, passed through untouched.
    FreeformUtterance(String),
}

const LEADING_FILLERS: &[&str] = &[
    "please", "okay", "ok", "um", "uh", "hey", "so", "can you", "could you", "can we", "could we",
    "i want to", "id like to", "i would like to",
];

const WEAKEST_PHRASES: &[&str] = &[
    "what am i weakest at",
    "whats my weakest concept",
    "what is my weakest concept",
    "weakest",
    "weakest concept",
    "what should i practice",
    "what should i practice next",
];

const LIST_PHRASES: &[&str] = &[
    "list",
    "list concepts",
    "list the concepts",
    "list all concepts",
    "concepts",
    "what concepts",
    "what concepts are there",
    "which concepts",
    "show concepts",
    "show me the concepts",
    "what can i study",
];

const EXIT_PHRASES: &[&str] = &[
    "exit",
    "quit",
    "stop",
    "goodbye",
    "good bye",
    "bye",
    "end session",
    "end the session",
    "im done",
    "i am done",
];

const REPEAT_PHRASES: &[&str] = &[
    "repeat",
    "repeat that",
    "say that again",
    "come again",
    "again",
    "pardon",
    "what did you say",
];

const NEXT_PHRASES: &[&str] = &["next", "next concept", "next one", "skip", "skip this one", "move on"];

const MODE_PREFIXES: &[&str] = &[
    "switch mode to ",
    "change mode to ",
    "switch to ",
    "change to ",
    "go to ",
    "lets ",
    "start ",
];

const SELECT_PREFIXES: &[&str] = &[
    "select concept ",
    "lets learn about ",
    "lets study ",
    "lets do ",
    "learn about ",
    "tell me about ",
    "concept ",
    "select ",
    "choose ",
    "pick ",
    "study ",
];

const MODE_ALIASES: &[(&str, Mode)] = &[
    ("learn", Mode::Learn),
    ("learning", Mode::Learn),
    ("lesson", Mode::Learn),
    ("quiz", Mode::Quiz),
    ("quiz me", Mode::Quiz),
    ("test me", Mode::Quiz),
    ("teach back", Mode::TeachBack),
    ("teach_back", Mode::TeachBack),
    ("teachback", Mode::TeachBack),
    ("teach it back", Mode::TeachBack),
    ("teach", Mode::TeachBack),
];

/// Parses an utterance. First match wins; nothing here ever fails.
pub fn parse(utterance: &str) -> Command {
    let text = strip_fillers(&normalize(utterance));

    if WEAKEST_PHRASES.contains(&text.as_str()) || text.starts_with("what am i weakest") {
        return Command::WeakestConcept;
    }
    if LIST_PHRASES.contains(&text.as_str()) {
        return Command::ListConcepts;
    }
    if EXIT_PHRASES.contains(&text.as_str()) {
        return Command::Exit;
    }
    if REPEAT_PHRASES.contains(&text.as_str()) {
        return Command::Repeat;
    }
    if NEXT_PHRASES.contains(&text.as_str()) {
        return Command::Next;
    }
    if let Some(mode) = parse_mode_request(&text) {
        return Command::SwitchMode(mode);
    }
    if let Some(target) = SELECT_PREFIXES
        .iter()
        .find_map(|prefix| text.strip_prefix(prefix))
        .filter(|rest| !rest.is_empty())
    {
        return Command::SelectConcept(target.to_string());
    }

    Command::FreeformUtterance(utterance.trim().to_string())
}

/// Resolves a mode name, tolerating near misses like "quizz" or "teachbak".
pub fn parse_mode(phrase: &str) -> Option<Mode> {
    let phrase = phrase.trim();
    let phrase = phrase.strip_suffix(" mode").unwrap_or(phrase).trim();
    if phrase.is_empty() {
        return None;
    }
    if let Some((_, mode)) = MODE_ALIASES.iter().find(|(alias, _)| *alias == phrase) {
        return Some(*mode);
    }

    let matcher = SkimMatcherV2::default();
    let phrase_len = phrase.chars().count();
    MODE_ALIASES
        .iter()
        .filter(|(alias, _)| alias.len().abs_diff(phrase_len) <= 2)
        .filter_map(|(alias, mode)| {
            let threshold = alias.len().min(phrase_len) as i64 * 12;
            matcher
                .fuzzy_match(alias, phrase)
                .max(matcher.fuzzy_match(phrase, alias))
                .filter(|score| *score >= threshold)
                .map(|score| (score, *mode))
        })
        .max_by_key(|(score, _)| *score)
        .map(|(_, mode)| mode)
}

fn parse_mode_request(text: &str) -> Option<Mode> {
    if let Some(rest) = MODE_PREFIXES.iter().find_map(|prefix| text.strip_prefix(prefix)) {
        if let Some(mode) = parse_mode(rest) {
            return Some(mode);
        }
    }
    if text.ends_with(" mode") || matches!(text, "quiz me" | "test me") {
        return parse_mode(text);
    }
    None
}

fn normalize(text: &str) -> String {
    text.chars()
        .filter(|c| *c != '\'' && *c != '’')
        .map(|c| {
            if c.is_alphanumeric() || c == '_' {
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

fn strip_fillers(text: &str) -> String {
    let mut text = text;
    loop {
        let stripped = LEADING_FILLERS.iter().find_map(|filler| {
            text.strip_prefix(filler)
                .filter(|rest| rest.is_empty() || rest.starts_with(' '))
                .map(str::trim_start)
        });
        match stripped {
            Some(rest) if !rest.is_empty() => text = rest,
            _ => break,
        }
    }
    text.strip_suffix(" please").unwrap_or(text).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_phrases() {
        assert_eq!(parse("List concepts"), Command::ListConcepts);
        assert_eq!(parse("what concepts are there?"), Command::ListConcepts);
        assert_eq!(parse("Next"), Command::Next);
        assert_eq!(parse("repeat that, please"), Command::Repeat);
        assert_eq!(parse("EXIT"), Command::Exit);
        assert_eq!(parse("Goodbye!"), Command::Exit);
        assert_eq!(parse("What am I weakest at?"), Command::WeakestConcept);
    }

    #[test]
    fn test_switch_mode_phrases() {
        assert_eq!(parse("switch to quiz"), Command::SwitchMode(Mode::Quiz));
        assert_eq!(parse("Switch to Teach Back."), Command::SwitchMode(Mode::TeachBack));
        assert_eq!(parse("switch to teach_back"), Command::SwitchMode(Mode::TeachBack));
        assert_eq!(parse("learn mode"), Command::SwitchMode(Mode::Learn));
        assert_eq!(parse("okay, quiz me"), Command::SwitchMode(Mode::Quiz));
        assert_eq!(parse("let's learn"), Command::SwitchMode(Mode::Learn));
    }

    #[test]
    fn test_switch_mode_tolerates_near_misses() {
        assert_eq!(parse("switch to quizz"), Command::SwitchMode(Mode::Quiz));
        assert_eq!(parse("switch to teachbak"), Command::SwitchMode(Mode::TeachBack));
    }

    #[test]
    fn test_switch_to_unknown_mode_is_freeform() {
        assert_eq!(
            parse("switch to decaf"),
            Command::FreeformUtterance("switch to decaf".to_string())
        );
    }

    #[test]
    fn test_select_concept() {
        assert_eq!(parse("concept c1"), Command::SelectConcept("c1".to_string()));
        assert_eq!(
            parse("Please select Newton's first law"),
            Command::SelectConcept("newtons first law".to_string())
        );
        assert_eq!(parse("let's do loops"), Command::SelectConcept("loops".to_string()));
    }

    #[test]
    fn test_freeform_keeps_original_text() {
        let text = "  An object stays at rest unless a force acts on it. ";
        assert_eq!(
            parse(text),
            Command::FreeformUtterance(text.trim().to_string())
        );
    }

    #[test]
    fn test_filler_alone_is_freeform() {
        assert_eq!(parse("okay"), Command::FreeformUtterance("okay".to_string()));
    }

    #[test]
    fn test_parse_mode_direct() {
        assert_eq!(parse_mode("quiz mode"), Some(Mode::Quiz));
        assert_eq!(parse_mode("teach it back"), Some(Mode::TeachBack));
        assert_eq!(parse_mode(""), None);
        assert_eq!(parse_mode("photosynthesis"), None);
    }
}
