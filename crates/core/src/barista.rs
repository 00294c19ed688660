//! Barista Order Dialogue
//!
//! Alex at Falcon Brew greets the customer, collects the order slots (drink,
//! size, milk, extras) in any order and across any number of turns, reads the
//! order back for confirmation, and thanks the customer once it is confirmed.

use crate::{
    Reply,
    command::{self, Command},
    dialogue::Dialogue,
    error::TutorError,
    formatter::format_for_speech,
    persona::Persona,
    safety,
};
use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info, warn};

// Multi-word drinks come first so "chai latte" wins over "latte".
const DRINKS: &[&str] = &[
    "flat white",
    "cold brew",
    "chai latte",
    "hot chocolate",
    "cappuccino",
    "americano",
    "macchiato",
    "espresso",
    "latte",
    "mocha",
    "tea",
];

const SIZES: &[(&str, &str)] = &[
    ("small", "small"),
    ("tall", "small"),
    ("medium", "medium"),
    ("regular", "medium"),
    ("grande", "medium"),
    ("large", "large"),
    ("venti", "large"),
];

const MILKS: &[(&str, &str)] = &[
    ("no milk", "no milk"),
    ("black", "no milk"),
    ("oat", "oat"),
    ("almond", "almond"),
    ("soy", "soy"),
    ("skim", "skim"),
    ("whole", "whole"),
    ("coconut", "coconut"),
];

const EXTRAS: &[(&str, &str)] = &[
    ("extra shot", "an extra shot"),
    ("double shot", "an extra shot"),
    ("vanilla", "vanilla syrup"),
    ("caramel", "caramel syrup"),
    ("hazelnut", "hazelnut syrup"),
    ("whipped cream", "whipped cream"),
    ("cinnamon", "cinnamon"),
];

const YES: &[&str] = &[
    "yes", "yeah", "yep", "yup", "correct", "thats right", "sounds good", "perfect", "sure",
];
const NO: &[&str] = &["no", "nope", "not quite", "wrong", "change", "actually"];

/// The customer's order as collected so far.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Order {
    pub drink: Option<String>,
    pub size: Option<String>,
    pub milk: Option<String>,
    pub extras: Vec<String>,
}

impl Order {
    pub fn is_complete(&self) -> bool {
        self.drink.is_some() && self.size.is_some() && self.milk.is_some()
    }

    /// Spoken description, e.g. "a large oat milk latte with vanilla syrup".
    pub fn describe(&self) -> String {
        let mut words = vec!["a".to_string()];
        if let Some(size) = &self.size {
            words.push(size.clone());
        }
        match self.milk.as_deref() {
            Some("no milk") | None => {}
            Some(milk) => words.push(format!("{} milk", milk)),
        }
        words.push(self.drink.clone().unwrap_or_else(|| "drink".to_string()));

        let mut additions: Vec<String> = Vec::new();
        if self.milk.as_deref() == Some("no milk") {
            additions.push("no milk".to_string());
        }
        additions.extend(self.extras.iter().cloned());
        if !additions.is_empty() {
            words.push(format!("with {}", additions.join(" and ")));
        }
        words.join(" ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum Stage {
    Taking,
    Confirming,
    Done,
}

/// One customer's visit to the counter.
pub struct BaristaSession {
    persona: Persona,
    order: Order,
    stage: Stage,
    extras_asked: bool,
    extras_settled: bool,
    last_response: String,
}

impl Default for BaristaSession {
    fn default() -> Self {
        Self::new()
    }
}

impl BaristaSession {
    pub fn new() -> Self {
        let persona = Persona::barista();
        let last_response = format_for_speech(&persona.greeting);
        info!(persona = %persona.name, "Barista session started");
        Self {
            persona,
            order: Order::default(),
            stage: Stage::Taking,
            extras_asked: false,
            extras_settled: false,
            last_response,
        }
    }

    pub fn order(&self) -> &Order {
        &self.order
    }

    fn take_turn(&mut self, utterance: &str) -> Reply {
        if let Some(concern) = safety::screen(utterance) {
            warn!(?concern, "Declined out-of-scope request");
            return Reply::Speak(concern.decline(&self.persona.redirect));
        }

        let padded = format!(" {} ", normalize(utterance));
        let changed = self.fill_slots(&padded);
        debug!(changed, order = ?self.order, stage = ?self.stage, "Order updated");

        if self.stage == Stage::Confirming && !changed {
            if contains_any(&padded, YES) {
                self.stage = Stage::Done;
                info!(order = %self.order.describe(), "Order confirmed");
                return Reply::SessionComplete(format!(
                    "Thank you! Your {} will be ready in just a moment. {}",
                    self.order.describe().trim_start_matches("a "),
                    self.persona.farewell
                ));
            }
            if contains_any(&padded, NO) {
                self.stage = Stage::Taking;
                return Reply::Speak("No problem, what would you like to change?".to_string());
            }
            return Reply::Speak(format!(
                "Just to confirm, {}, is that right?",
                self.order.describe()
            ));
        }

        Reply::Speak(self.next_question(changed))
    }

    /// Pulls every recognizable slot value out of the utterance.
    fn fill_slots(&mut self, padded: &str) -> bool {
        let mut changed = false;

        if let Some(drink) = DRINKS.iter().find(|d| padded.contains(&format!(" {} ", d))) {
            changed |= replace(&mut self.order.drink, drink);
        }
        if let Some((_, size)) = find_alias(padded, SIZES) {
            changed |= replace(&mut self.order.size, size);
        }
        if let Some((_, milk)) = find_alias(padded, MILKS) {
            changed |= replace(&mut self.order.milk, milk);
        }
        for (alias, extra) in EXTRAS {
            if contains_phrase(padded, alias) && !self.order.extras.iter().any(|e| e == extra) {
                self.order.extras.push(extra.to_string());
                changed = true;
            }
        }

        if self.extras_asked || !self.order.extras.is_empty() {
            self.extras_settled = true;
        }
        changed
    }

    fn next_question(&mut self, understood: bool) -> String {
        if self.order.drink.is_none() {
            return if understood {
                "Sure, and which drink would you like?".to_string()
            } else {
                "Sorry, I didn't catch that. We have lattes, cappuccinos, mochas, cold brew and more, what would you like?".to_string()
            };
        }
        if self.order.size.is_none() {
            return "What size would you like, small, medium, or large?".to_string();
        }
        if self.order.milk.is_none() {
            return "What kind of milk would you like, whole, oat, almond, or soy?".to_string();
        }
        if !self.extras_settled {
            self.extras_asked = true;
            return "Would you like any extras, like an extra shot or vanilla syrup?".to_string();
        }

        self.stage = Stage::Confirming;
        format!("So that's {}, is that right?", self.order.describe())
    }
}

#[async_trait]
impl Dialogue for BaristaSession {
    fn persona(&self) -> &Persona {
        &self.persona
    }

    async fn respond(&mut self, utterance: &str) -> Result<Reply, TutorError> {
        if self.stage == Stage::Done {
            return Err(TutorError::SessionEnded);
        }

        let reply = match command::parse(utterance) {
            Command::Repeat => return Ok(Reply::Speak(self.last_response.clone())),
            Command::Exit => {
                self.stage = Stage::Done;
                info!("Barista session ended by customer");
                Reply::SessionComplete(self.persona.farewell.clone())
            }
            _ => self.take_turn(utterance),
        };

        let text = format_for_speech(reply.text());
        self.last_response = text.clone();
        Ok(match reply {
            Reply::Speak(_) => Reply::Speak(text),
            Reply::SessionComplete(_) => Reply::SessionComplete(text),
        })
    }

    fn snapshot(&self) -> serde_json::Value {
        serde_json::json!({
            "order": self.order,
            "stage": self.stage,
        })
    }

    fn is_finished(&self) -> bool {
        self.stage == Stage::Done
    }
}

fn replace(slot: &mut Option<String>, value: &str) -> bool {
    if slot.as_deref() == Some(value) {
        return false;
    }
    *slot = Some(value.to_string());
    true
}

fn contains_phrase(padded: &str, phrase: &str) -> bool {
    padded.contains(&format!(" {} ", phrase))
}

fn contains_any(padded: &str, phrases: &[&str]) -> bool {
    phrases.iter().any(|p| contains_phrase(padded, p))
}

fn find_alias<'a>(padded: &str, table: &'a [(&'a str, &'a str)]) -> Option<&'a (&'a str, &'a str)> {
    table.iter().find(|(alias, _)| contains_phrase(padded, alias))
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
