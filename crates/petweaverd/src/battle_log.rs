//! Bounded battle history with JSONL persistence.
//!
//! In-memory FIFO of frozen battle records, capped at 100 entries; inserting
//! past capacity evicts the oldest entry first. Entries are appended to
//! `battle_log.jsonl` one JSON object per line; on load only the newest
//! `capacity` lines are kept, and the file is compacted whenever an eviction
//! happens so disk mirrors memory.

use std::collections::VecDeque;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use petweaver_common::battle::BattleLogEntry;

pub const DEFAULT_CAPACITY: usize = 100;

const LOG_FILE: &str = "battle_log.jsonl";

/// Bounded FIFO battle log.
pub struct BattleLog {
    entries: VecDeque<BattleLogEntry>,
    capacity: usize,
    log_path: PathBuf,
}

impl BattleLog {
    /// Open the log in `dir`, loading the newest `capacity` persisted
    /// entries. Unparseable lines are skipped.
    pub fn open(dir: &Path, capacity: usize) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create data dir {}", dir.display()))?;

        let log_path = dir.join(LOG_FILE);
        let mut entries = VecDeque::with_capacity(capacity);

        if log_path.exists() {
            let file = File::open(&log_path)
                .with_context(|| format!("Failed to open {}", log_path.display()))?;
            for line in BufReader::new(file).lines() {
                let Ok(line) = line else { continue };
                match serde_json::from_str::<BattleLogEntry>(&line) {
                    Ok(entry) => {
                        if entries.len() == capacity {
                            entries.pop_front();
                        }
                        entries.push_back(entry);
                    }
                    Err(e) => debug!("Skipping malformed battle log line: {}", e),
                }
            }
        }

        Ok(Self {
            entries,
            capacity,
            log_path,
        })
    }

    /// Append a frozen battle, evicting the oldest entry past capacity.
    pub fn push(&mut self, entry: BattleLogEntry) -> Result<()> {
        let evicted = if self.entries.len() == self.capacity {
            self.entries.pop_front().is_some()
        } else {
            false
        };
        self.entries.push_back(entry);

        if evicted {
            // Disk would otherwise keep the evicted line forever.
            self.rewrite()
        } else {
            self.append_last()
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Oldest-first view of the retained entries.
    pub fn entries(&self) -> impl Iterator<Item = &BattleLogEntry> {
        self.entries.iter()
    }

    /// The newest `limit` entries, newest first.
    pub fn recent(&self, limit: usize) -> Vec<&BattleLogEntry> {
        self.entries.iter().rev().take(limit).collect()
    }

    fn append_last(&self) -> Result<()> {
        let Some(entry) = self.entries.back() else {
            return Ok(());
        };
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .with_context(|| format!("Failed to open {}", self.log_path.display()))?;
        let json = serde_json::to_string(entry).context("Failed to serialize battle entry")?;
        writeln!(file, "{}", json)?;
        Ok(())
    }

    fn rewrite(&self) -> Result<()> {
        let mut lines = String::new();
        for entry in &self.entries {
            lines.push_str(&serde_json::to_string(entry).context("Failed to serialize battle entry")?);
            lines.push('\n');
        }
        fs::write(&self.log_path, lines)
            .with_context(|| format!("Failed to rewrite {}", self.log_path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::TempDir;

    fn entry(tag: u32) -> BattleLogEntry {
        BattleLogEntry {
            encounter: format!("Trainer {}", tag),
            started_at: Utc::now(),
            ended_at: Utc::now(),
            duration_secs: 60,
            rounds: tag,
            victory: tag % 2 == 0,
            enemy_team: Vec::new(),
        }
    }

    #[test]
    fn test_push_and_len() -> Result<()> {
        let dir = TempDir::new()?;
        let mut log = BattleLog::open(dir.path(), DEFAULT_CAPACITY)?;
        log.push(entry(1))?;
        log.push(entry(2))?;
        assert_eq!(log.len(), 2);
        assert_eq!(log.recent(1)[0].encounter, "Trainer 2");
        Ok(())
    }

    #[test]
    fn test_101st_entry_evicts_exactly_the_oldest() -> Result<()> {
        let dir = TempDir::new()?;
        let mut log = BattleLog::open(dir.path(), DEFAULT_CAPACITY)?;
        for i in 1..=101 {
            log.push(entry(i))?;
        }

        assert_eq!(log.len(), 100);
        // The entry formerly at position 2 is now the head.
        let head = log.entries().next().expect("non-empty");
        assert_eq!(head.encounter, "Trainer 2");
        let tail = log.entries().last().expect("non-empty");
        assert_eq!(tail.encounter, "Trainer 101");
        Ok(())
    }

    #[test]
    fn test_load_keeps_only_newest_capacity_entries() -> Result<()> {
        let dir = TempDir::new()?;
        {
            let mut log = BattleLog::open(dir.path(), DEFAULT_CAPACITY)?;
            for i in 1..=120 {
                log.push(entry(i))?;
            }
        }

        let log = BattleLog::open(dir.path(), DEFAULT_CAPACITY)?;
        assert_eq!(log.len(), 100);
        assert_eq!(log.entries().next().expect("head").encounter, "Trainer 21");
        Ok(())
    }

    #[test]
    fn test_load_skips_malformed_lines() -> Result<()> {
        let dir = TempDir::new()?;
        {
            let mut log = BattleLog::open(dir.path(), DEFAULT_CAPACITY)?;
            log.push(entry(1))?;
        }
        let path = dir.path().join(LOG_FILE);
        let mut contents = fs::read_to_string(&path)?;
        contents.push_str("{ not json\n");
        fs::write(&path, contents)?;

        let log = BattleLog::open(dir.path(), DEFAULT_CAPACITY)?;
        assert_eq!(log.len(), 1);
        Ok(())
    }

    #[test]
    fn test_small_capacity_is_strict_fifo() -> Result<()> {
        let dir = TempDir::new()?;
        let mut log = BattleLog::open(dir.path(), 3)?;
        for i in 1..=5 {
            log.push(entry(i))?;
        }
        let order: Vec<u32> = log.entries().map(|e| e.rounds).collect();
        assert_eq!(order, vec![3, 4, 5]);
        Ok(())
    }
}
