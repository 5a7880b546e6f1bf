//! CommunicationVerifier (spec §4.6): a one-shot check, run once per agent
//! right after startup, that the agent's `/health` reports the expected role
//! and its `/initialize` handshake succeeds before the tournament is allowed
//! to begin.

use serde::Deserialize;

use crate::config::AgentSpec;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct HealthBody {
    #[serde(default)]
    role: Option<String>,
}

pub async fn verify_all(state: &AppState) -> anyhow::Result<()> {
    let client = reqwest::Client::new();
    for spec in &state.config.agents {
        verify_one(&client, spec).await?;
    }
    Ok(())
}

async fn verify_one(client: &reqwest::Client, spec: &AgentSpec) -> anyhow::Result<()> {
    let response = client
        .get(&spec.health_url)
        .send()
        .await
        .map_err(|e| anyhow::anyhow!("agent {} unreachable at {}: {e}", spec.id, spec.health_url))?;

    if !response.status().is_success() {
        anyhow::bail!("agent {} health check returned {}", spec.id, response.status());
    }

    if let Ok(body) = response.json::<HealthBody>().await {
        if let Some(role) = body.role {
            if role != spec.role {
                anyhow::bail!("agent {} reported role {role:?}, expected {:?}", spec.id, spec.role);
            }
        }
    }

    let initialize_url = spec.health_url.replace("/health", "/initialize");
    let response = client
        .post(&initialize_url)
        .json(&serde_json::json!({}))
        .send()
        .await
        .map_err(|e| anyhow::anyhow!("agent {} handshake failed at {}: {e}", spec.id, initialize_url))?;

    if !response.status().is_success() {
        anyhow::bail!("agent {} /initialize returned {}", spec.id, response.status());
    }

    tracing::info!(agent_id = %spec.id, "agent communication verified");
    Ok(())
}
