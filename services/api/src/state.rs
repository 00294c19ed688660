//! Shared Application State
//!
//! This module defines the `AppState` struct, which holds the resources every
//! handler and WebSocket session shares: the loaded content, the grading
//! policy and the configuration.

use crate::config::Config;
use anyhow::Context;
use std::sync::Arc;
use tutor_core::{
    content::ContentStore,
    evaluator::{Evaluator, KeywordOverlapEvaluator},
};

/// The shared application state, created once at startup and passed to all handlers.
/// Sessions never share mutable state through it; each WebSocket owns its own dialogue.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<ContentStore>,
    pub evaluator: Arc<dyn Evaluator>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Loads the content file and builds the evaluator. Fails if the content
    /// cannot be loaded, which is fatal at startup.
    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        let store = ContentStore::load(&config.content_path).with_context(|| {
            format!(
                "Failed to load content from {}",
                config.content_path.display()
            )
        })?;
        let evaluator =
            KeywordOverlapEvaluator::new(config.great_threshold, config.good_threshold)
                .context("Invalid grading thresholds")?;

        Ok(Self {
            store: Arc::new(store),
            evaluator: Arc::new(evaluator),
            config: Arc::new(config),
        })
    }
}
