//! Atomic JSON persistence: write-temp-then-rename, read-with-retry-once.
//! Every persisted file carries a [`PersistedHeader`].

use std::path::Path;
use std::time::Duration;

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::time::now_compact;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedHeader {
    pub id: String,
    pub schema_version: u32,
    pub last_updated: String,
}

impl PersistedHeader {
    pub fn new(id: impl Into<String>, schema_version: u32) -> Self {
        Self { id: id.into(), schema_version, last_updated: now_compact() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    #[serde(flatten)]
    pub header: PersistedHeader,
    #[serde(flatten)]
    pub body: T,
}

/// Writes `value` to `path` atomically: serialize to a sibling `.tmp` file,
/// then rename over the destination. A reader that opens `path` mid-write
/// either sees the old complete file or the new complete file, never a partial one.
pub async fn atomic_write_json<T: Serialize>(path: &Path, value: &T) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let tmp_path = path.with_extension(match path.extension() {
        Some(ext) => format!("{}.tmp", ext.to_string_lossy()),
        None => "tmp".to_string(),
    });
    let bytes = serde_json::to_vec_pretty(value)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    tokio::fs::write(&tmp_path, bytes).await?;
    tokio::fs::rename(&tmp_path, path).await?;
    Ok(())
}

/// Reads and parses `path`, retrying once after a short delay if the file is
/// momentarily missing (a writer's rename may not yet be visible).
pub async fn read_json_with_retry<T: DeserializeOwned>(path: &Path) -> std::io::Result<T> {
    match tokio::fs::read(path).await {
        Ok(bytes) => parse_json(&bytes),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tokio::time::sleep(Duration::from_millis(50)).await;
            let bytes = tokio::fs::read(path).await?;
            parse_json(&bytes)
        }
        Err(e) => Err(e),
    }
}

fn parse_json<T: DeserializeOwned>(bytes: &[u8]) -> std::io::Result<T> {
    serde_json::from_slice(bytes).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

/// Path helpers mirroring the layout in spec §6.
pub mod layout {
    use std::path::PathBuf;

    pub fn league_dir(data_dir: &std::path::Path, league_id: &str) -> PathBuf {
        data_dir.join("leagues").join(league_id)
    }

    pub fn players_file(data_dir: &std::path::Path, league_id: &str) -> PathBuf {
        league_dir(data_dir, league_id).join("players.json")
    }

    pub fn referees_file(data_dir: &std::path::Path, league_id: &str) -> PathBuf {
        league_dir(data_dir, league_id).join("referees.json")
    }

    pub fn schedule_file(data_dir: &std::path::Path, league_id: &str) -> PathBuf {
        league_dir(data_dir, league_id).join("schedule.json")
    }

    pub fn standings_file(data_dir: &std::path::Path, league_id: &str) -> PathBuf {
        league_dir(data_dir, league_id).join("standings.json")
    }

    pub fn match_file(data_dir: &std::path::Path, league_id: &str, round_id: &str, match_id: &str) -> PathBuf {
        data_dir
            .join("matches")
            .join(league_id)
            .join(round_id)
            .join(format!("{match_id}.json"))
    }

    pub fn player_profile_file(data_dir: &std::path::Path, player_id: &str) -> PathBuf {
        data_dir.join("players").join(player_id).join("profile.json")
    }

    pub fn player_history_file(data_dir: &std::path::Path, player_id: &str) -> PathBuf {
        data_dir.join("players").join(player_id).join("match_history.json")
    }

    pub fn player_opponent_profiles_file(data_dir: &std::path::Path, player_id: &str) -> PathBuf {
        data_dir.join("players").join(player_id).join("opponent_profiles.json")
    }

    pub fn agent_log_file(data_dir: &std::path::Path, role: &str, agent_id: &str) -> PathBuf {
        data_dir.join("logs").join(role).join(format!("{agent_id}.jsonl"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Sample {
        value: u32,
    }

    #[tokio::test]
    async fn writes_are_atomic_and_readable() {
        let dir = tempdir();
        let path = dir.join("sample.json");
        let sample = Sample { value: 42 };
        atomic_write_json(&path, &sample).await.unwrap();
        let read_back: Sample = read_json_with_retry(&path).await.unwrap();
        assert_eq!(read_back, sample);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn overwrite_replaces_contents_without_partial_state() {
        let dir = tempdir();
        let path = dir.join("sample.json");
        atomic_write_json(&path, &Sample { value: 1 }).await.unwrap();
        atomic_write_json(&path, &Sample { value: 2 }).await.unwrap();
        let read_back: Sample = read_json_with_retry(&path).await.unwrap();
        assert_eq!(read_back, Sample { value: 2 });
    }

    fn tempdir() -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("league-protocol-test-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }
}
