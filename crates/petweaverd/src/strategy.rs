//! Scripted-strategy engine.
//!
//! Owns the loaded tactical script and a 1-based step cursor that advances
//! in lock-step with observed battle rounds, or on explicit user command.
//! Also hosts the script library: named scripts saved to disk for reuse.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info};

use petweaver_common::script::Script;

/// Step cursor state machine: EMPTY (no script) or ACTIVE (cursor in
/// `1..=steps.len()`). The cursor only moves backward on an explicit reset.
#[derive(Debug, Default)]
pub struct StrategyEngine {
    script: Option<Script>,
    /// 1-based step cursor; meaningful only while a script is loaded.
    cursor: usize,
    /// Round gate for auto-advance: the cursor moves at most once per
    /// observed round increase.
    last_gated_round: u32,
    /// Latest round reported by the battle, tracked even while no script is
    /// loaded so a fresh load gates against reality.
    last_seen_round: u32,
}

impl StrategyEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script_name(&self) -> Option<&str> {
        self.script.as_ref().map(|s| s.name.as_str())
    }

    /// The current step as `(index, text)`, if a non-empty script is loaded.
    pub fn current_step(&self) -> Option<(usize, &str)> {
        let script = self.script.as_ref()?;
        script.steps.get(self.cursor - 1).map(|s| (self.cursor, s.as_str()))
    }

    pub fn step_count(&self) -> usize {
        self.script.as_ref().map_or(0, Script::len)
    }

    /// Replace the whole script state: parse `raw`, reset the cursor to 1,
    /// gate against the last known battle round. Returns the step count.
    pub fn load_script(&mut self, raw: &str, name: &str) -> usize {
        let script = Script::parse(raw, name);
        let steps = script.len();
        info!("Loaded script '{}' ({} steps)", name, steps);
        self.script = Some(script);
        self.cursor = 1;
        self.last_gated_round = self.last_seen_round;
        steps
    }

    /// Manually advance one step; holds at the terminal step.
    pub fn advance_step(&mut self) -> bool {
        let Some(script) = self.script.as_ref() else {
            return false;
        };
        if self.cursor < script.len() {
            self.cursor += 1;
            true
        } else {
            false
        }
    }

    /// Put the cursor back to 1. Deterministic no-op when nothing is loaded.
    pub fn reset_step(&mut self) -> bool {
        if self.script.is_none() {
            return false;
        }
        self.cursor = 1;
        true
    }

    /// Gate the cursor against a freshly observed battle round. Advances at
    /// most one step per call no matter how far the round jumped.
    pub fn on_round_observed(&mut self, current_round: u32) -> bool {
        let advanced = current_round > self.last_gated_round
            && self
                .script
                .as_ref()
                .is_some_and(|script| self.cursor < script.len());
        if advanced {
            self.cursor += 1;
            self.last_gated_round = current_round;
            debug!("Auto-advanced to step {} at round {}", self.cursor, current_round);
        }
        self.last_seen_round = current_round;
        advanced
    }

    /// Unload the script entirely.
    pub fn clear(&mut self) -> bool {
        self.cursor = 1;
        self.script.take().is_some()
    }
}

/// Named scripts persisted under `<data_dir>/scripts/<name>.txt`.
pub struct ScriptLibrary {
    dir: PathBuf,
}

impl ScriptLibrary {
    pub fn open(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create scripts dir {}", dir.display()))?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    pub fn save(&self, name: &str, text: &str) -> Result<()> {
        let path = self.script_path(name);
        fs::write(&path, text).with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Saved script '{}'", name);
        Ok(())
    }

    pub fn load(&self, name: &str) -> Result<String> {
        let path = self.script_path(name);
        fs::read_to_string(&path).with_context(|| format!("No saved script '{}'", name))
    }

    pub fn list(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.dir)
            .with_context(|| format!("Failed to scan {}", self.dir.display()))?
        {
            let path = entry?.path();
            if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("txt") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    fn script_path(&self, name: &str) -> PathBuf {
        // Script names come from user commands; keep them to a single path
        // component.
        let safe: String = name
            .chars()
            .map(|c| if c == '/' || c == '\\' { '_' } else { c })
            .collect();
        self.dir.join(format!("{}.txt", safe))
    }
}
