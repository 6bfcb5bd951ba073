//! Configuration management for petweaverd.
//!
//! Loads settings from /etc/petweaver/config.toml or uses defaults.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Config file path
pub const CONFIG_PATH: &str = "/etc/petweaver/config.toml";

/// Daemon configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Root directory for persisted state (battle log, encounter database,
    /// saved scripts)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Mailbox directory shared with the external responder; defaults to
    /// `<data_dir>/mailbox`
    #[serde(default)]
    pub mailbox_dir: Option<PathBuf>,

    /// Battle feed file appended to by the game client; defaults to
    /// `<data_dir>/battle_feed.jsonl`
    #[serde(default)]
    pub feed_path: Option<PathBuf>,

    /// Mailbox poll interval in seconds
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Battle feed poll interval in seconds
    #[serde(default = "default_feed_poll_interval")]
    pub feed_poll_secs: u64,

    /// Maximum number of retained battle log entries
    #[serde(default = "default_battle_log_capacity")]
    pub battle_log_capacity: usize,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("/var/lib/petweaver")
}

fn default_poll_interval() -> u64 {
    1
}

fn default_feed_poll_interval() -> u64 {
    1
}

fn default_battle_log_capacity() -> usize {
    100
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            mailbox_dir: None,
            feed_path: None,
            poll_interval_secs: default_poll_interval(),
            feed_poll_secs: default_feed_poll_interval(),
            battle_log_capacity: default_battle_log_capacity(),
        }
    }
}

impl DaemonConfig {
    /// Load configuration from the given path, or the system default.
    /// Falls back to defaults when the file is missing or unparseable.
    pub fn load(path: Option<&Path>) -> Self {
        let path = path.unwrap_or_else(|| Path::new(CONFIG_PATH));

        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => {
                    info!("Loaded configuration from {}", path.display());
                    config
                }
                Err(e) => {
                    warn!("Failed to parse {}: {}; using defaults", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => {
                info!("No config at {}; using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Resolved mailbox directory.
    pub fn mailbox_dir(&self) -> PathBuf {
        self.mailbox_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join("mailbox"))
    }

    /// Resolved battle feed path.
    pub fn feed_path(&self) -> PathBuf {
        self.feed_path
            .clone()
            .unwrap_or_else(|| self.data_dir.join("battle_feed.jsonl"))
    }

    /// Directory holding saved tactical scripts.
    pub fn scripts_dir(&self) -> PathBuf {
        self.data_dir.join("scripts")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = DaemonConfig::default();
        assert_eq!(config.poll_interval_secs, 1);
        assert_eq!(config.battle_log_capacity, 100);
        assert_eq!(config.mailbox_dir(), PathBuf::from("/var/lib/petweaver/mailbox"));
        assert_eq!(
            config.feed_path(),
            PathBuf::from("/var/lib/petweaver/battle_feed.jsonl")
        );
    }

    #[test]
    fn test_load_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        let mut file = fs::File::create(&path).expect("create");
        writeln!(file, "data_dir = \"{}\"", dir.path().display()).expect("write");
        writeln!(file, "poll_interval_secs = 5").expect("write");

        let config = DaemonConfig::load(Some(path.as_path()));
        assert_eq!(config.data_dir, dir.path());
        assert_eq!(config.poll_interval_secs, 5);
        assert_eq!(config.battle_log_capacity, 100);
        assert_eq!(config.mailbox_dir(), dir.path().join("mailbox"));
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let config = DaemonConfig::load(Some(Path::new("/nonexistent/petweaver.toml")));
        assert_eq!(config.battle_log_capacity, 100);
    }

    #[test]
    fn test_load_garbage_file_uses_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "not [valid toml").expect("write");

        let config = DaemonConfig::load(Some(path.as_path()));
        assert_eq!(config.poll_interval_secs, 1);
    }
}
