use clap::Parser;
use std::path::PathBuf;
use tracing::Level;
use tutor_core::{
    config::{EndOfList, SessionOptions},
    persona::PersonaKind,
    session::Mode,
};

/// Command-line arguments; every flag falls back to an environment variable.
#[derive(Debug, Parser)]
#[command(name = "tutor", version, about = "Run one spoken tutoring or barista session in the terminal", long_about = None)]
pub struct Args {
    /// Path to the concepts JSON file
    #[arg(short, long, env = "CONTENT_PATH", default_value = "./content/concepts.json")]
    pub content: PathBuf,

    /// Which dialogue to run: coach or barista
    #[arg(short, long, env = "PERSONA", default_value_t = PersonaKind::Coach)]
    pub persona: PersonaKind,

    /// Mode a new tutoring session starts in
    #[arg(short, long, env = "DEFAULT_MODE", default_value_t = Mode::Learn)]
    pub mode: Mode,

    /// What `next` does after the last concept: wrap or stop
    #[arg(long, env = "NEXT_AT_END", default_value_t = EndOfList::Wrap)]
    pub next_at_end: EndOfList,

    /// Minimum key-term overlap graded as great
    #[arg(long, env = "GREAT_THRESHOLD", default_value_t = 0.6)]
    pub great_threshold: f32,

    /// Minimum key-term overlap graded as good
    #[arg(long, env = "GOOD_THRESHOLD", default_value_t = 0.3)]
    pub good_threshold: f32,

    /// Log level, written to stderr
    #[arg(long, env = "TUTOR_LOG_LEVEL", default_value_t = Level::WARN)]
    pub log_level: Level,
}

impl Args {
    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            default_mode: self.mode,
            end_of_list: self.next_at_end,
        }
    }
}
