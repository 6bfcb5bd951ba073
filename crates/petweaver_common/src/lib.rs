//! Shared data model and wire contracts for PetWeaver.
//!
//! Everything the daemon and the control CLI (and, at the file level, the
//! external responder and the game client) agree on lives here: battle
//! records, encounter aggregates, the mailbox request/response protocol,
//! the battle feed events, and tactical script parsing.

pub mod battle;
pub mod encounter;
pub mod feed;
pub mod protocol;
pub mod script;

pub use battle::{AbilityRef, BattleLogEntry, BattleSide, EnemyPetRecord, MoveEvent};
pub use encounter::{EncounterAggregate, EncounterDatabase, EncounterSummary, UNKNOWN_ENCOUNTER};
pub use feed::{FeedEvent, ScriptCommand};
pub use protocol::{
    decode_response, ParamValue, ProtocolError, QueueEntry, RequestEnvelope, ResponseEntry,
    ResponseOutcome,
};
pub use script::{parse_script, Script};
