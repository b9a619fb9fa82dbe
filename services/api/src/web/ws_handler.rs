//! services/api/src/web/ws_handler.rs
//!
//! This is the main entry point and control loop for a WebSocket connection.
//! Each connection owns its own view state; the session behind it is shared.

use crate::{
    error::ApiError,
    web::{
        protocol::{ClientMessage, ServerMessage},
        state::{AppState, HubEvent, SessionHub},
    },
};
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{
    stream::{SplitSink, StreamExt},
    SinkExt,
};
use remotenet_core::{Action, ViewState};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};

/// The handler for upgrading HTTP requests to WebSocket connections.
pub async fn ws_handler(ws: WebSocketUpgrade, State(app_state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, app_state))
}

async fn handle_socket(socket: WebSocket, app_state: Arc<AppState>) {
    info!("New WebSocket connection established.");

    let hub = app_state.hub.clone();
    let (mut sender, mut receiver) = socket.split();
    let mut events = hub.subscribe();
    let mut view = ViewState::new();

    // --- 1. Initial Snapshot ---
    let initial = ServerMessage::Snapshot(hub.snapshot(&view).await);
    if let Err(e) = send(&mut sender, &initial).await {
        error!("Failed to send initial snapshot: {}", e);
        return;
    }

    // --- 2. Main Message Loop ---
    'connection: loop {
        let outgoing = tokio::select! {
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    handle_text_message(text.as_str(), &hub, &mut view).await
                }
                Some(Ok(Message::Close(_))) => {
                    info!("Client sent close message.");
                    break;
                }
                Some(Ok(_)) => continue,
                Some(Err(e)) => {
                    warn!("WebSocket receive error: {}", e);
                    break;
                }
                None => {
                    info!("Client disconnected.");
                    break;
                }
            },
            event = events.recv() => match event {
                Ok(HubEvent::SessionChanged) => vec![ServerMessage::Snapshot(hub.snapshot(&view).await)],
                Ok(HubEvent::Broadcast(msg)) => vec![msg],
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Client lagged behind by {} events; resending snapshot.", skipped);
                    vec![ServerMessage::Snapshot(hub.snapshot(&view).await)]
                }
                Err(RecvError::Closed) => break,
            },
        };

        for msg in &outgoing {
            if let Err(e) = send(&mut sender, msg).await {
                error!("Failed to send message to client: {}", e);
                break 'connection;
            }
        }
    }

    // --- 3. Cleanup ---
    // A vanished client is treated as if it pressed logout.
    if view.role().is_some() {
        if let Err(e) = hub.dispatch(&mut view, Action::Logout).await {
            warn!("Cleanup logout failed: {}", e);
        }
    }
    info!("WebSocket connection closed.");
}

/// Helper function to handle the logic for different `ClientMessage` variants.
/// Returns the messages meant for this client only.
async fn handle_text_message(
    text: &str,
    hub: &Arc<SessionHub>,
    view: &mut ViewState,
) -> Vec<ServerMessage> {
    let client_msg = match serde_json::from_str::<ClientMessage>(text) {
        Ok(msg) => msg,
        Err(e) => {
            warn!("Failed to deserialize client message: {}", e);
            return vec![ServerMessage::Error {
                message: format!("Malformed message: {}", e),
            }];
        }
    };

    let Some(action) = client_msg.into_action() else {
        info!("RunSpeedTest message received.");
        return match hub.start_speed_test(view).await {
            Ok(()) => Vec::new(),
            Err(e) => {
                warn!("Speed test rejected: {}", e);
                e.notice()
                    .map(|n| vec![ServerMessage::notification(&n)])
                    .unwrap_or_default()
            }
        };
    };

    info!("{} message received.", action_name(&action));
    match hub.dispatch(view, action).await {
        // Terminations are broadcast to everyone by the hub.
        Ok(outcome) if outcome.terminated.is_none() => outcome
            .notice
            .map(|n| vec![ServerMessage::notification(&n)])
            .unwrap_or_default(),
        Ok(_) => Vec::new(),
        Err(e) => {
            warn!("Action rejected: {}", e);
            let mut replies: Vec<ServerMessage> = e
                .notice()
                .map(|n| ServerMessage::notification(&n))
                .into_iter()
                .collect();
            // The view may now carry an inline error.
            replies.push(ServerMessage::Snapshot(hub.snapshot(view).await));
            replies
        }
    }
}

fn action_name(action: &Action) -> &'static str {
    // Credentials never reach the log.
    match action {
        Action::SelectRole(_) => "SelectRole",
        Action::CreateCredentials(_) => "CreateCredentials",
        Action::ConnectReceiver(_) => "ConnectReceiver",
        Action::ConfigurePolicy { .. } => "ConfigurePolicy",
        Action::StartSharing => "StartSharing",
        Action::StopSharing => "StopSharing",
        Action::Logout => "Logout",
    }
}

async fn send(
    sender: &mut SplitSink<WebSocket, Message>,
    msg: &ServerMessage,
) -> Result<(), ApiError> {
    let json = serde_json::to_string(msg).map_err(|e| ApiError::Internal(e.to_string()))?;
    sender.send(Message::Text(json.into())).await?;
    Ok(())
}
