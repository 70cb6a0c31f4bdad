mod config;
mod normalize;

pub use config::{CalendarConfig, Config, DisplayConfig, PlayerConfig};
pub use normalize::normalize_state;

use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result};
use crate::state::PlayerState;

/// Returns the data directory.
///
/// `ASCEND_DATA_DIR` wins when set. Otherwise `~/.config/ascend[-dev]/`,
/// selected by `ASCEND_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let dir = match std::env::var_os("ASCEND_DATA_DIR") {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("ASCEND_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("ascend-dev")
            } else {
                base_dir.join("ascend")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}

/// JSON file holding the player document.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<data dir>/player.json`.
    pub fn open_default() -> Result<Self> {
        Ok(Self::new(data_dir()?.join("player.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load and normalize the player document.
    ///
    /// A missing file yields a fresh profile. A file that is not JSON at all
    /// is an error, so a corrupt document is never silently overwritten.
    pub fn load(&self) -> Result<PlayerState> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no player document; starting fresh");
                return Ok(PlayerState::new());
            }
            Err(err) => return Err(err.into()),
        };
        let raw: serde_json::Value = serde_json::from_str(&content)?;
        Ok(normalize_state(raw))
    }

    /// Write the document through a temporary file so a crash never leaves a
    /// half-written profile behind.
    pub fn save(&self, state: &PlayerState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_string_pretty(state)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_loads_fresh_profile() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path().join("player.json"));
        assert_eq!(store.load().unwrap(), PlayerState::new());
    }

    #[test]
    fn save_then_load_preserves_state() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path().join("nested").join("player.json"));
        let mut state = PlayerState::new();
        state.xp = 300;
        state.sync_level();
        state.coins = 12;
        store.save(&state).unwrap();
        assert_eq!(store.load().unwrap(), state);
        assert!(!store.path().with_extension("json.tmp").exists());
    }

    #[test]
    fn legacy_document_is_normalized_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("player.json");
        std::fs::write(&path, r#"{"xp":"80","quests":{"daily":{"x":{"id":"d1","text":"Read","xp":10}}}}"#).unwrap();
        let state = StateStore::new(&path).load().unwrap();
        assert_eq!(state.xp, 80);
        assert_eq!(state.daily_quests.len(), 1);
    }

    #[test]
    fn corrupt_document_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("player.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(StateStore::new(&path).load().is_err());
    }
}
