//! Terminal front end for the voice tutor.
//!
//! Stands in for the speech pipeline: each stdin line is one recognized
//! utterance and each stdout line is one reply for the synthesizer.

pub mod cli;
pub mod repl;
