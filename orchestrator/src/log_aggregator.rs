//! LogAggregator (spec §4.6): tails each agent's stdout/stderr, tags lines
//! with the originating `agent_id` when the line doesn't already carry one,
//! and re-emits anything that looks like an `ERROR`/`CRITICAL` line over the
//! dashboard's error stream.

use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

use crate::dashboard::DashboardEvent;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct TracingLine {
    #[serde(default)]
    level: Option<String>,
    #[serde(default)]
    fields: Option<serde_json::Value>,
}

/// Spawns a task that reads `stream` line by line for as long as the
/// process keeps it open; each line is handed to [`handle_line`].
pub fn spawn_stream_reader<R>(state: AppState, agent_id: String, stream: R)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(stream).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            handle_line(&state, &agent_id, &line).await;
        }
    });
}

async fn handle_line(state: &AppState, agent_id: &str, line: &str) {
    let is_severe = match serde_json::from_str::<TracingLine>(line) {
        Ok(parsed) => parsed
            .level
            .as_deref()
            .map(|level| level.eq_ignore_ascii_case("ERROR") || level.eq_ignore_ascii_case("CRITICAL"))
            .unwrap_or(false)
            || parsed.fields.is_some() && (line.contains("ERROR") || line.contains("CRITICAL")),
        Err(_) => line.contains("ERROR") || line.contains("CRITICAL"),
    };

    if is_severe {
        tracing::warn!(%agent_id, line, "agent emitted a severe log line");
        state
            .publish(DashboardEvent::Error { agent_id: Some(agent_id.to_string()), message: line.to_string() })
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OrchestratorConfig;

    #[tokio::test]
    async fn error_line_is_published_to_dashboard() {
        let state = AppState::new(OrchestratorConfig::default());
        let mut rx = state.dashboard_tx.subscribe();

        handle_line(&state, "player-1", "ERROR something broke").await;

        let event = rx.recv().await.unwrap();
        assert_eq!(event.event_type(), "error");
    }

    #[tokio::test]
    async fn info_line_is_not_published() {
        let state = AppState::new(OrchestratorConfig::default());
        let mut rx = state.dashboard_tx.subscribe();

        handle_line(&state, "player-1", "INFO all good").await;

        assert!(rx.try_recv().is_err());
    }
}
