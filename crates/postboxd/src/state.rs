use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Per-inbox poll progress, persisted between runs
///
/// Keyed by the inbox base identifier, so re-mining starts a fresh count.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollState {
    #[serde(default)]
    last_index: BTreeMap<String, u64>,

    #[serde(skip)]
    path: PathBuf,
}

impl PollState {
    pub async fn load(path: &Path) -> Result<Self> {
        let mut state = match fs::read(path).await {
            Ok(contents) => serde_json::from_slice::<PollState>(&contents)
                .context("Failed to parse poll state")?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => PollState::default(),
            Err(e) => return Err(e).context("Failed to read poll state"),
        };
        state.path = path.to_path_buf();
        Ok(state)
    }

    pub fn next_index(&self, inbox: &str) -> u64 {
        self.last_index.get(inbox).copied().unwrap_or(0)
    }

    /// Record progress; never moves backwards
    pub fn advance(&mut self, inbox: &str, next_index: u64) {
        let entry = self.last_index.entry(inbox.to_string()).or_insert(0);
        *entry = (*entry).max(next_index);
    }

    pub async fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(self)?).await?;
        fs::rename(&tmp, &self.path)
            .await
            .context("Failed to write poll state")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_persist_and_advance() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("state.json");

        let mut state = PollState::load(&path).await.unwrap();
        assert_eq!(state.next_index("abc"), 0);

        state.advance("abc", 4);
        state.advance("abc", 2);
        state.save().await.unwrap();

        let reloaded = PollState::load(&path).await.unwrap();
        assert_eq!(reloaded.next_index("abc"), 4);
        assert_eq!(reloaded.next_index("def"), 0);
    }

    #[tokio::test]
    async fn test_unparseable_state_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("state.json");
        tokio::fs::write(&path, b"{").await.unwrap();

        assert!(PollState::load(&path).await.is_err());
    }
}
