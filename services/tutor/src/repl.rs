//! Line-oriented session loop.

use anyhow::{Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};
use tutor_core::{dialogue::Dialogue, error::TutorError};

/// How a session loop came to an end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The dialogue finished on its own (exit, confirmed order).
    Completed { turns: usize },
    /// Input ran out before the dialogue finished.
    InputClosed { turns: usize },
}

/// Speaks the greeting, then answers one reply per non-empty input line until
/// the dialogue completes or the input closes.
pub async fn run<R, W>(dialogue: &mut dyn Dialogue, input: R, mut output: W) -> Result<Outcome>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let speaker = dialogue.persona().name.clone();
    speak(&mut output, &speaker, &dialogue.greeting()).await?;

    let mut lines = input.lines();
    let mut turns = 0;
    while let Some(line) = lines.next_line().await.context("Failed to read utterance")? {
        let utterance = line.trim();
        if utterance.is_empty() {
            continue;
        }

        let reply = match dialogue.respond(utterance).await {
            Ok(reply) => reply,
            Err(TutorError::SessionEnded) => return Ok(Outcome::Completed { turns }),
            Err(e) => return Err(e).context("Dialogue turn failed"),
        };
        turns += 1;
        speak(&mut output, &speaker, reply.text()).await?;
        debug!(turn = turns, state = %dialogue.snapshot(), "Turn complete");

        if reply.is_complete() {
            info!(turns, "Session complete");
            return Ok(Outcome::Completed { turns });
        }
    }

    info!(turns, "Input closed before the session finished");
    Ok(Outcome::InputClosed { turns })
}

async fn speak<W: AsyncWrite + Unpin>(output: &mut W, speaker: &str, text: &str) -> Result<()> {
    output
        .write_all(format!("{}: {}\n", speaker, text).as_bytes())
        .await
        .context("Failed to write reply")?;
    output.flush().await.context("Failed to flush reply")
}
