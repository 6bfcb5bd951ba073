//! Daemon core: owns all component state and applies events to it.
//!
//! Single-threaded and cooperative: the main loop feeds it one event or one
//! poll tick at a time, and every operation runs to completion. The strategy
//! engine sits behind a mutex only so bridge callbacks can load scripts into
//! it when a response arrives.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use serde_json::Value;
use tracing::{info, warn};

use petweaver_common::feed::{FeedEvent, ScriptCommand};
use petweaver_common::protocol::ParamValue;

use crate::battle_log::BattleLog;
use crate::bridge::AsyncBridge;
use crate::config::DaemonConfig;
use crate::encounter_db::EncounterStore;
use crate::recorder::EncounterRecorder;
use crate::strategy::{ScriptLibrary, StrategyEngine};

/// Strategy engine handle shared with bridge callbacks.
pub type SharedStrategy = Arc<Mutex<StrategyEngine>>;

pub struct DaemonCore {
    recorder: EncounterRecorder,
    strategy: SharedStrategy,
    bridge: AsyncBridge,
    battle_log: BattleLog,
    encounters: EncounterStore,
    scripts: ScriptLibrary,
}

impl DaemonCore {
    /// Open all stores and restore persisted state.
    pub fn open(config: &DaemonConfig) -> Result<Self> {
        let battle_log = BattleLog::open(&config.data_dir, config.battle_log_capacity)?;
        let encounters = EncounterStore::open(&config.data_dir)?;
        let scripts = ScriptLibrary::open(&config.scripts_dir())?;
        let bridge = AsyncBridge::open(&config.mailbox_dir())?;

        info!(
            "State restored: {} logged battles, {} known encounters",
            battle_log.len(),
            encounters.database().len()
        );

        Ok(Self {
            recorder: EncounterRecorder::new(),
            strategy: Arc::new(Mutex::new(StrategyEngine::new())),
            bridge,
            battle_log,
            encounters,
            scripts,
        })
    }

    pub fn recorder(&self) -> &EncounterRecorder {
        &self.recorder
    }

    pub fn battle_log(&self) -> &BattleLog {
        &self.battle_log
    }

    pub fn encounters(&self) -> &EncounterStore {
        &self.encounters
    }

    pub fn strategy(&self) -> SharedStrategy {
        Arc::clone(&self.strategy)
    }

    /// Apply one battle feed event.
    pub fn handle_event(&mut self, event: FeedEvent) {
        match event {
            FeedEvent::BattleStarted { roster } => {
                self.recorder.start_battle(roster);
            }
            FeedEvent::MoveUsed {
                side,
                slot,
                ability,
            } => {
                self.recorder.record_move(side, slot, ability);
            }
            FeedEvent::RoundEnded => {
                if self.recorder.advance_round() {
                    if let Some(round) = self.recorder.current_round() {
                        self.strategy.lock().unwrap().on_round_observed(round);
                    }
                }
            }
            FeedEvent::BattleEnded { victory } => {
                self.end_battle(victory);
            }
            FeedEvent::ScriptCommand { command } => self.handle_script_command(command),
        }
    }

    /// Close the active battle: freeze it, append it to the bounded log,
    /// fold it into the encounter database, persist both. No-op without an
    /// open session.
    pub fn end_battle(&mut self, victory: bool) -> bool {
        let Some(entry) = self.recorder.end_battle(victory) else {
            return false;
        };
        info!(
            "Recording battle against {}: {} in {} rounds",
            entry.encounter,
            if victory { "victory" } else { "defeat" },
            entry.rounds
        );
        if let Err(e) = self.encounters.fold(&entry) {
            warn!("Failed to persist encounter database: {}", e);
        }
        if let Err(e) = self.battle_log.push(entry) {
            warn!("Failed to persist battle log: {}", e);
        }
        true
    }

    /// Poll the mailbox once, delivering any matched responses.
    pub fn poll_mailbox(&mut self) {
        match self.bridge.check_responses() {
            Ok(0) => {}
            Ok(n) => info!("Delivered {} mailbox responses", n),
            Err(e) => warn!("Mailbox poll failed: {}", e),
        }
    }

    fn handle_script_command(&mut self, command: ScriptCommand) {
        match command {
            ScriptCommand::Load { name, text } => {
                self.strategy.lock().unwrap().load_script(&text, &name);
            }
            ScriptCommand::LoadSaved { name } => match self.scripts.load(&name) {
                Ok(text) => {
                    self.strategy.lock().unwrap().load_script(&text, &name);
                }
                Err(e) => warn!("Cannot load saved script: {}", e),
            },
            ScriptCommand::Save { name, text } => {
                if let Err(e) = self.scripts.save(&name, &text) {
                    warn!("Cannot save script: {}", e);
                }
            }
            ScriptCommand::Advance => {
                self.strategy.lock().unwrap().advance_step();
            }
            ScriptCommand::Reset => {
                self.strategy.lock().unwrap().reset_step();
            }
            ScriptCommand::Clear => {
                self.strategy.lock().unwrap().clear();
            }
            ScriptCommand::Fetch { encounter } => self.fetch_strategy(&encounter),
        }
    }

    /// Ask the external responder for a script for `encounter`; the callback
    /// loads whatever comes back into the strategy engine.
    fn fetch_strategy(&mut self, encounter: &str) {
        let params = BTreeMap::from([(
            "encounter".to_string(),
            ParamValue::from(encounter),
        )]);
        let strategy = Arc::clone(&self.strategy);
        let name = encounter.to_string();

        let result = self.bridge.send_request(
            "/api/strategy",
            params,
            Box::new(move |outcome| {
                if !outcome.success {
                    warn!("Strategy fetch for '{}' failed", name);
                    return;
                }
                match extract_script_text(&outcome.data) {
                    Some(text) => {
                        strategy.lock().unwrap().load_script(&text, &name);
                    }
                    None => warn!("Strategy response for '{}' had no usable script", name),
                }
            }),
        );
        match result {
            Ok(id) => info!("Requested strategy for '{}' ({})", encounter, id),
            Err(e) => warn!("Failed to enqueue strategy request: {}", e),
        }
    }
}

/// Pull script text out of a response payload, tolerating the raw-wrapped
/// fallback shape the decoder produces for opaque payloads.
fn extract_script_text(data: &Value) -> Option<String> {
    data.get("script")
        .and_then(Value::as_str)
        .or_else(|| data.get("raw").and_then(Value::as_str))
        .map(str::to_string)
}
