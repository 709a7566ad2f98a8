//! Persisted viewer configuration.
//!
//! Stored as `viewer.json` next to the tree documents. Missing file or
//! missing fields fall back to defaults, so old config files keep working.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Animation duration in milliseconds.
    pub duration_ms: u64,
    /// Draw move labels next to nodes.
    pub show_labels: bool,
    /// Show the board pane.
    pub show_board: bool,
    /// Last viewer turn the game can reach.
    pub max_ply: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            duration_ms: 750,
            show_labels: true,
            show_board: true,
            max_ply: 55,
        }
    }
}

/// Load the config at `path`, falling back to defaults when absent.
pub fn load(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("malformed config {}", path.display()))
}

pub fn save(path: &Path, config: &Config) -> Result<()> {
    let text = serde_json::to_string_pretty(config)?;
    std::fs::write(path, text)
        .with_context(|| format!("failed to write config {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let cfg = load(&dir.path().join("viewer.json")).unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn round_trips_through_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("viewer.json");
        let cfg = Config {
            duration_ms: 250,
            show_labels: false,
            show_board: true,
            max_ply: 12,
        };
        save(&path, &cfg).unwrap();
        assert_eq!(load(&path).unwrap(), cfg);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("viewer.json");
        std::fs::write(&path, r#"{"duration_ms": 100}"#).unwrap();
        let cfg = load(&path).unwrap();
        assert_eq!(cfg.duration_ms, 100);
        assert_eq!(cfg.max_ply, Config::default().max_ply);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("viewer.json");
        std::fs::write(&path, "{oops").unwrap();
        assert!(load(&path).is_err());
    }
}
