//! Main entrypoint for the terminal tutor.
//!
//! Loads the content file, starts one dialogue for the chosen persona and
//! drives it from stdin until it finishes.

use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tokio::io::{self, BufReader};
use tracing::info;
use tutor_core::{
    content::ContentStore,
    dialogue::start_dialogue,
    evaluator::{Evaluator, KeywordOverlapEvaluator},
};
use tutor_service::{cli::Args, repl};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .with_writer(std::io::stderr)
        .init();

    let store = ContentStore::load(&args.content)
        .with_context(|| format!("Failed to load content from {}", args.content.display()))?;
    info!(concepts = store.len(), path = %args.content.display(), "Content loaded");

    let evaluator: Arc<dyn Evaluator> = Arc::new(
        KeywordOverlapEvaluator::new(args.great_threshold, args.good_threshold)
            .context("Invalid grading thresholds")?,
    );

    let mut dialogue = start_dialogue(
        args.persona,
        Arc::new(store),
        evaluator,
        args.session_options(),
    );
    info!(persona = %args.persona, "Starting session");

    let outcome = repl::run(dialogue.as_mut(), BufReader::new(io::stdin()), io::stdout()).await?;
    info!(?outcome, "Session over");
    Ok(())
}
