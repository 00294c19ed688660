use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::Level;
use tutor_core::{
    config::{EndOfList, SessionOptions},
    session::Mode,
};

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub content_path: PathBuf,
    pub log_level: Level,
    pub session: SessionOptions,
    pub great_threshold: f32,
    pub good_threshold: f32,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let bind_address = parse_var("BIND_ADDRESS", "0.0.0.0:3000", |s| {
            s.parse::<SocketAddr>().map_err(|e| e.to_string())
        })?;

        let content_path = parse_var("CONTENT_PATH", "./content/concepts.json", |s| {
            Ok(PathBuf::from(s))
        })?;

        let log_level = parse_var("RUST_LOG", "INFO", |s| {
            s.parse::<Level>()
                .map_err(|_| format!("'{}' is not a valid log level", s))
        })?;

        let default_mode = parse_var("DEFAULT_MODE", "learn", |s| s.parse::<Mode>())?;
        let end_of_list = parse_var("NEXT_AT_END", "wrap", |s| s.parse::<EndOfList>())?;

        let great_threshold = parse_var("GREAT_THRESHOLD", "0.6", parse_fraction)?;
        let good_threshold = parse_var("GOOD_THRESHOLD", "0.3", parse_fraction)?;
        if good_threshold > great_threshold {
            return Err(ConfigError::InvalidValue(
                "GOOD_THRESHOLD".to_string(),
                format!(
                    "{} is above GREAT_THRESHOLD {}",
                    good_threshold, great_threshold
                ),
            ));
        }

        Ok(Self {
            bind_address,
            content_path,
            log_level,
            session: SessionOptions {
                default_mode,
                end_of_list,
            },
            great_threshold,
            good_threshold,
        })
    }
}

fn parse_var<T>(
    name: &str,
    default: &str,
    parse: impl FnOnce(&str) -> Result<T, String>,
) -> Result<T, ConfigError> {
    let raw = std::env::var(name).unwrap_or_else(|_| default.to_string());
    // Set but blank counts as missing.
    if raw.trim().is_empty() {
        return Err(ConfigError::MissingVar(name.to_string()));
    }
    parse(raw.trim()).map_err(|reason| ConfigError::InvalidValue(name.to_string(), reason))
}

fn parse_fraction(s: &str) -> Result<f32, String> {
    let value = s.parse::<f32>().map_err(|e| e.to_string())?;
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("{} is not between 0 and 1", value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;
    use tracing::Level;

    fn clear_env_vars() {
        unsafe {
            env::remove_var("BIND_ADDRESS");
            env::remove_var("CONTENT_PATH");
            env::remove_var("RUST_LOG");
            env::remove_var("DEFAULT_MODE");
            env::remove_var("NEXT_AT_END");
            env::remove_var("GREAT_THRESHOLD");
            env::remove_var("GOOD_THRESHOLD");
        }
    }

    fn expect_invalid(var_name: &str) {
        match Config::from_env().unwrap_err() {
            ConfigError::InvalidValue(var, _) => assert_eq!(var, var_name),
            other => panic!("Expected InvalidValue for {}, got {:?}", var_name, other),
        }
    }

    #[test]
    fn test_config_error_display() {
        let missing_var = ConfigError::MissingVar("TEST_VAR".to_string());
        assert_eq!(
            format!("{}", missing_var),
            "Missing environment variable: TEST_VAR"
        );

        let invalid_value =
            ConfigError::InvalidValue("TEST_VAR".to_string(), "bad_value".to_string());
        assert_eq!(
            format!("{}", invalid_value),
            "Invalid value for environment variable TEST_VAR: bad_value"
        );
    }

    #[test]
    #[serial]
    fn test_config_from_env_defaults() {
        clear_env_vars();

        let config = Config::from_env().expect("Config should load successfully");

        assert_eq!(config.bind_address.to_string(), "0.0.0.0:3000");
        assert_eq!(config.content_path, PathBuf::from("./content/concepts.json"));
        assert_eq!(config.log_level, Level::INFO);
        assert_eq!(config.session, SessionOptions::default());
        assert_eq!(config.great_threshold, 0.6);
        assert_eq!(config.good_threshold, 0.3);
    }

    #[test]
    #[serial]
    fn test_config_from_env_custom_values() {
        clear_env_vars();
        unsafe {
            env::set_var("BIND_ADDRESS", "127.0.0.1:8080");
            env::set_var("CONTENT_PATH", "/srv/tutor/physics.json");
            env::set_var("RUST_LOG", "debug");
            env::set_var("DEFAULT_MODE", "teach_back");
            env::set_var("NEXT_AT_END", "stop");
            env::set_var("GREAT_THRESHOLD", "0.8");
            env::set_var("GOOD_THRESHOLD", "0.5");
        }

        let config = Config::from_env().expect("Config should load successfully");

        assert_eq!(config.bind_address.to_string(), "127.0.0.1:8080");
        assert_eq!(config.content_path, PathBuf::from("/srv/tutor/physics.json"));
        assert_eq!(config.log_level, Level::DEBUG);
        assert_eq!(config.session.default_mode, Mode::TeachBack);
        assert_eq!(config.session.end_of_list, EndOfList::Stop);
        assert_eq!(config.great_threshold, 0.8);
        assert_eq!(config.good_threshold, 0.5);
        clear_env_vars();
    }

    #[test]
    #[serial]
    fn test_config_invalid_bind_address() {
        clear_env_vars();
        unsafe {
            env::set_var("BIND_ADDRESS", "not-a-valid-address");
        }
        expect_invalid("BIND_ADDRESS");
        clear_env_vars();
    }

    #[test]
    #[serial]
    fn test_config_invalid_log_level() {
        clear_env_vars();
        unsafe {
            env::set_var("RUST_LOG", "not-a-level");
        }
        expect_invalid("RUST_LOG");
        clear_env_vars();
    }

    #[test]
    #[serial]
    fn test_config_invalid_mode_and_policy() {
        clear_env_vars();
        unsafe {
            env::set_var("DEFAULT_MODE", "lecture");
        }
        expect_invalid("DEFAULT_MODE");

        clear_env_vars();
        unsafe {
            env::set_var("NEXT_AT_END", "bounce");
        }
        expect_invalid("NEXT_AT_END");
        clear_env_vars();
    }

    #[test]
    #[serial]
    fn test_config_blank_var_is_missing() {
        clear_env_vars();
        unsafe {
            env::set_var("CONTENT_PATH", "  ");
        }
        match Config::from_env().unwrap_err() {
            ConfigError::MissingVar(var) => assert_eq!(var, "CONTENT_PATH"),
            other => panic!("Expected MissingVar for CONTENT_PATH, got {:?}", other),
        }
        clear_env_vars();
    }

    #[test]
    #[serial]
    fn test_config_threshold_validation() {
        clear_env_vars();
        unsafe {
            env::set_var("GREAT_THRESHOLD", "1.5");
        }
        expect_invalid("GREAT_THRESHOLD");

        clear_env_vars();
        unsafe {
            env::set_var("GREAT_THRESHOLD", "0.4");
            env::set_var("GOOD_THRESHOLD", "0.5");
        }
        expect_invalid("GOOD_THRESHOLD");
        clear_env_vars();
    }
}
