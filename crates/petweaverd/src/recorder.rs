//! Encounter recorder: observes one live battle at a time.
//!
//! Captures the opposing roster at battle start, appends every enemy move
//! with the round it landed in, and freezes the whole session on completion.
//! All operations are defensive no-ops when their preconditions are missing;
//! the returned flag makes the skip visible to callers and tests.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use petweaver_common::battle::{BattleLogEntry, BattleSide, EnemyPetRecord, MoveEvent};
use petweaver_common::encounter::UNKNOWN_ENCOUNTER;

/// One live battle. Exactly one exists at a time, owned by the recorder;
/// destroyed once folded into persistent storage.
#[derive(Debug, Clone)]
pub struct BattleSession {
    pub started_at: DateTime<Utc>,
    /// Resolved from the first enemy pet's identity; None until resolved.
    pub encounter: Option<String>,
    pub enemy_team: Vec<EnemyPetRecord>,
    /// Current round, starting at 1.
    pub round: u32,
}

/// Records the opposing roster and move order of the active battle.
#[derive(Debug, Default)]
pub struct EncounterRecorder {
    session: Option<BattleSession>,
}

impl EncounterRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// The in-progress session, if a battle is being observed.
    pub fn session(&self) -> Option<&BattleSession> {
        self.session.as_ref()
    }

    /// Current round of the open session.
    pub fn current_round(&self) -> Option<u32> {
        self.session.as_ref().map(|s| s.round)
    }

    /// Open a session from a roster snapshot. A dangling session from a
    /// battle whose end event never arrived is replaced, not kept.
    pub fn start_battle(&mut self, mut roster: Vec<EnemyPetRecord>) -> bool {
        if let Some(old) = self.session.take() {
            warn!(
                "Discarding dangling session against {} (round {})",
                old.encounter.as_deref().unwrap_or(UNKNOWN_ENCOUNTER),
                old.round
            );
        }

        // Snapshots arrive without observed moves; make sure of it.
        for pet in &mut roster {
            pet.move_sequence.clear();
        }

        let encounter = roster
            .first()
            .map(|pet| pet.name.trim())
            .filter(|name| !name.is_empty())
            .map(str::to_string);

        debug!(
            "Battle started against {} ({} pets)",
            encounter.as_deref().unwrap_or(UNKNOWN_ENCOUNTER),
            roster.len()
        );

        self.session = Some(BattleSession {
            started_at: Utc::now(),
            encounter,
            enemy_team: roster,
            round: 1,
        });
        true
    }

    /// Append a move to the enemy pet in `pet_slot` (1-based). Ignored
    /// unless a session is open, the move is the opponent's, and the slot
    /// matches a captured roster entry.
    pub fn record_move(&mut self, side: BattleSide, pet_slot: usize, ability_id: u32) -> bool {
        if side != BattleSide::Enemy {
            return false;
        }
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        let round = session.round;
        let Some(pet) = pet_slot
            .checked_sub(1)
            .and_then(|i| session.enemy_team.get_mut(i))
        else {
            debug!("Ignoring move for unknown enemy slot {}", pet_slot);
            return false;
        };

        let ability_name = pet.ability_name(ability_id).unwrap_or("Unknown").to_string();
        pet.move_sequence.push(MoveEvent {
            round,
            ability_id,
            ability_name,
            timestamp: Utc::now(),
        });
        true
    }

    /// Bump the round counter by one. No upper bound.
    pub fn advance_round(&mut self) -> bool {
        match self.session.as_mut() {
            Some(session) => {
                session.round += 1;
                true
            }
            None => false,
        }
    }

    /// Close the session and return it frozen. The caller owns appending it
    /// to the battle log and folding it into the encounter database.
    pub fn end_battle(&mut self, victory: bool) -> Option<BattleLogEntry> {
        let session = self.session.take()?;
        let ended_at = Utc::now();
        let entry = BattleLogEntry {
            encounter: session
                .encounter
                .unwrap_or_else(|| UNKNOWN_ENCOUNTER.to_string()),
            started_at: session.started_at,
            ended_at,
            duration_secs: (ended_at - session.started_at).num_seconds(),
            rounds: session.round,
            victory,
            enemy_team: session.enemy_team,
        };
        debug!(
            "Battle against {} ended after {} rounds (victory: {})",
            entry.encounter, entry.rounds, victory
        );
        Some(entry)
    }
}
