//! DashboardServer (spec §4.6): an HTTP+WebSocket endpoint broadcasting typed
//! events to every subscriber, with a last-known-state snapshot per type so a
//! late subscriber isn't left blind.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::{IntoResponse, Json};
use axum::routing::get;
use axum::Router;
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum DashboardEvent {
    Health { agent_id: String, status: String },
    Standings { league_id: String, ranked: Vec<(String, u32)> },
    Round { round_id: String, status: String },
    Match { match_id: String, status: String },
    Error { agent_id: Option<String>, message: String },
}

impl DashboardEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            DashboardEvent::Health { .. } => "health",
            DashboardEvent::Standings { .. } => "standings",
            DashboardEvent::Round { .. } => "round",
            DashboardEvent::Match { .. } => "match",
            DashboardEvent::Error { .. } => "error",
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({ "status": "ok" })) }))
        .route("/dashboard/ws", get(ws_upgrade))
        .route("/dashboard/snapshot", get(snapshot))
        .with_state(state)
}

async fn snapshot(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.last_snapshot.lock().await;
    Json(snapshot.values().cloned().collect::<Vec<_>>())
}

async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(mut socket: WebSocket, state: AppState) {
    {
        let snapshot = state.last_snapshot.lock().await;
        for event in snapshot.values() {
            if let Ok(text) = serde_json::to_string(event) {
                if socket.send(Message::Text(text.into())).await.is_err() {
                    return;
                }
            }
        }
    }

    let mut rx = state.dashboard_tx.subscribe();
    loop {
        tokio::select! {
            event = rx.recv() => {
                match event {
                    Ok(event) => {
                        let Ok(text) = serde_json::to_string(&event) else { continue };
                        if socket.send(Message::Text(text.into())).await.is_err() {
                            return;
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => return,
                }
            }
            incoming = socket.recv() => {
                if incoming.is_none() {
                    return;
                }
            }
        }
    }
}
