//! PetWeaver daemon library.
//!
//! Hosts the three core components around pet battles: the encounter
//! recorder (roster and move-order capture), the async mailbox bridge to the
//! external responder, and the scripted-strategy engine. Battle events
//! arrive from the game client through the battle feed; user script and
//! bridge actions ride the same feed.

pub mod battle_log;
pub mod bridge;
pub mod config;
pub mod core;
pub mod encounter_db;
pub mod feed;
pub mod mailbox;
pub mod recorder;
pub mod strategy;

pub use config::DaemonConfig;
pub use core::DaemonCore;
