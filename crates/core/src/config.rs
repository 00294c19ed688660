//! Per-session tuning knobs shared by every front end.

use crate::session::Mode;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What `next` does after the last concept in the content file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndOfList {
    /// Start again from the first concept.
    #[default]
    Wrap,
    /// Stay on the last concept and say so.
    Stop,
}

impl FromStr for EndOfList {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "wrap" => Ok(EndOfList::Wrap),
            "stop" | "halt" => Ok(EndOfList::Stop),
            other => Err(format!("'{}' is not 'wrap' or 'stop'", other)),
        }
    }
}

impl fmt::Display for EndOfList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndOfList::Wrap => write!(f, "wrap"),
            EndOfList::Stop => write!(f, "stop"),
        }
    }
}

/// Options applied when a tutoring session starts.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SessionOptions {
    pub default_mode: Mode,
    pub end_of_list: EndOfList,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_of_list_parsing() {
        assert_eq!("wrap".parse::<EndOfList>().unwrap(), EndOfList::Wrap);
        assert_eq!(" STOP ".parse::<EndOfList>().unwrap(), EndOfList::Stop);
        assert_eq!("halt".parse::<EndOfList>().unwrap(), EndOfList::Stop);
        assert!("loop".parse::<EndOfList>().is_err());
    }

    #[test]
    fn test_session_options_default() {
        let options = SessionOptions::default();
        assert_eq!(options.default_mode, Mode::Learn);
        assert_eq!(options.end_of_list, EndOfList::Wrap);
    }
}
