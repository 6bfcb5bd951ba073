//! Battle feed events.
//!
//! The game client appends one JSON event per line to a shared feed file;
//! the daemon tails it. This is the client-side half of the contract, so it
//! lives in the common crate even though only the daemon parses it.

use serde::{Deserialize, Serialize};

use crate::battle::{BattleSide, EnemyPetRecord};

/// One line of the battle feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum FeedEvent {
    /// A battle began; carries the opposing roster as inspected at start.
    BattleStarted { roster: Vec<EnemyPetRecord> },
    /// A pet used an ability. `slot` is the 1-based roster position.
    MoveUsed {
        side: BattleSide,
        slot: usize,
        ability: u32,
    },
    /// One round finished resolving.
    RoundEnded,
    /// The battle completed.
    BattleEnded { victory: bool },
    /// A user action against the strategy engine or the bridge.
    ScriptCommand {
        #[serde(flatten)]
        command: ScriptCommand,
    },
}

/// User-driven script and bridge actions forwarded through the feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ScriptCommand {
    /// Load script text directly into the engine.
    Load { name: String, text: String },
    /// Load a previously saved script by name.
    LoadSaved { name: String },
    /// Save script text into the script library without loading it.
    Save { name: String, text: String },
    /// Manually advance the step cursor.
    Advance,
    /// Reset the step cursor to 1.
    Reset,
    /// Unload the current script.
    Clear,
    /// Ask the external responder for a strategy for the named encounter.
    Fetch { encounter: String },
}
