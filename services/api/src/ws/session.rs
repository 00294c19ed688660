//! Manages the WebSocket connection lifecycle for one dialogue session.

use super::protocol::{ClientMessage, ServerMessage};
use crate::state::AppState;
use anyhow::{Result, anyhow};
use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use chrono::Utc;
use futures_util::{
    SinkExt, StreamExt,
    stream::{SplitSink, SplitStream},
};
use std::sync::Arc;
use tracing::{Instrument, debug, error, info, instrument, warn};
use tutor_core::{
    Reply,
    dialogue::{Dialogue, start_dialogue},
};
use uuid::Uuid;

/// Axum handler to upgrade an HTTP connection to a WebSocket.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Main handler for an individual WebSocket connection.
///
/// Performs the `init` handshake, then runs the session loop in its own
/// instrumented task. Every connection gets a fresh, independent dialogue.
#[instrument(name = "ws_session", skip_all, fields(session_id))]
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let session_id = Uuid::new_v4();
    tracing::Span::current().record("session_id", session_id.to_string());
    info!("New WebSocket connection. Awaiting initialization...");

    let (mut socket_tx, mut socket_rx) = socket.split();

    // The first message from the client must be an `init` message.
    let init = match socket_rx.next().await {
        Some(Ok(Message::Text(text))) => start_session(&text, &state, session_id),
        Some(Ok(_)) => Err(anyhow!("First message was not a text `init` message.")),
        Some(Err(e)) => Err(anyhow!(e).context("Failed to read `init` message")),
        None => {
            info!("Client disconnected before sending init message.");
            return;
        }
    };

    let (dialogue, initialized) = match init {
        Ok(started) => started,
        Err(e) => {
            error!("Session initialization failed: {:?}", e);
            let _ = send_msg(
                &mut socket_tx,
                ServerMessage::Error {
                    message: e.to_string(),
                },
            )
            .await;
            return;
        }
    };

    if send_msg(&mut socket_tx, initialized).await.is_err() {
        error!("Failed to send Initialized message to client.");
        return;
    }

    let persona = dialogue.persona().name.clone();
    let session_span = tracing::info_span!("dialogue_runtime", %session_id, %persona);
    tokio::spawn(
        async move {
            if let Err(e) = run_dialogue_session(dialogue, socket_tx, socket_rx).await {
                error!(error = ?e, "Dialogue session terminated with error.");
            }
            info!("Dialogue session finished.");
        }
        .instrument(session_span),
    );
}

/// Parses the `init` message and starts the requested dialogue.
pub(crate) fn start_session(
    init_text: &str,
    state: &AppState,
    session_id: Uuid,
) -> Result<(Box<dyn Dialogue>, ServerMessage)> {
    let persona = match serde_json::from_str::<ClientMessage>(init_text)? {
        ClientMessage::Init { persona } => persona,
        _ => return Err(anyhow!("First message must be `init`")),
    };

    let dialogue = start_dialogue(
        persona,
        Arc::clone(&state.store),
        Arc::clone(&state.evaluator),
        state.config.session,
    );
    info!(%persona, "Session initialized");

    let initialized = ServerMessage::Initialized {
        session_id,
        persona: dialogue.persona().name.clone(),
        greeting: dialogue.greeting(),
        state: dialogue.snapshot(),
        started_at: Utc::now(),
    };
    Ok((dialogue, initialized))
}

/// Handles one text frame after `init` and returns the messages to send back.
pub(crate) async fn handle_client_text(
    dialogue: &mut dyn Dialogue,
    text: &str,
) -> Vec<ServerMessage> {
    let utterance = match serde_json::from_str::<ClientMessage>(text) {
        Ok(ClientMessage::UserMessage { text }) => text,
        Ok(ClientMessage::Init { .. }) => {
            warn!("Ignoring repeated `init` message.");
            return vec![ServerMessage::Error {
                message: "Session is already initialized".to_string(),
            }];
        }
        Err(e) => {
            warn!(error = %e, "Ignoring malformed client message.");
            return vec![ServerMessage::Error {
                message: format!("Invalid message: {}", e),
            }];
        }
    };

    match dialogue.respond(&utterance).await {
        Ok(Reply::Speak(text)) => vec![
            ServerMessage::Response { text },
            ServerMessage::StateUpdate {
                state: dialogue.snapshot(),
            },
        ],
        Ok(Reply::SessionComplete(farewell)) => vec![
            ServerMessage::StateUpdate {
                state: dialogue.snapshot(),
            },
            ServerMessage::SessionEnded { farewell },
        ],
        Err(e) => vec![ServerMessage::Error {
            message: e.to_string(),
        }],
    }
}

/// The main event loop for an active WebSocket session.
async fn run_dialogue_session(
    mut dialogue: Box<dyn Dialogue>,
    mut socket_tx: SplitSink<WebSocket, Message>,
    mut socket_rx: SplitStream<WebSocket>,
) -> Result<()> {
    let mut turns = 0usize;

    while let Some(msg_result) = socket_rx.next().await {
        match msg_result {
            Ok(Message::Text(text)) => {
                for reply in handle_client_text(dialogue.as_mut(), &text).await {
                    send_msg(&mut socket_tx, reply).await?;
                }
                turns += 1;
                debug!(turns, "Turn complete");

                if dialogue.is_finished() {
                    info!(turns, "Dialogue finished, closing socket.");
                    socket_tx.send(Message::Close(None)).await?;
                    break;
                }
            }
            // Audio stays with the external speech pipeline.
            Ok(Message::Binary(_)) => warn!("Ignoring binary frame, only text utterances are accepted."),
            Ok(Message::Close(_)) => {
                info!("Client sent close frame. Shutting down session.");
                break;
            }
            Ok(Message::Ping(_) | Message::Pong(_)) => {}
            Err(e) => {
                error!("Error receiving from client WebSocket: {:?}", e);
                break;
            }
        }
    }

    info!(turns, "WebSocket connection closed and dialogue discarded.");
    Ok(())
}

/// A helper function to serialize and send a `ServerMessage` to the client.
pub(crate) async fn send_msg(
    socket_tx: &mut SplitSink<WebSocket, Message>,
    msg: ServerMessage,
) -> Result<()> {
    let serialized = serde_json::to_string(&msg)?;
    socket_tx.send(Message::Text(serialized.into())).await?;
    Ok(())
}
