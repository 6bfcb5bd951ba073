//! Per-encounter aggregated statistics.
//!
//! The encounter database maps a resolved encounter name to its aggregate:
//! first/last seen, cumulative battle and victory counts, and the full
//! history of enemy team snapshots. Aggregates are created lazily on first
//! contact and never deleted.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::battle::{BattleLogEntry, EnemyPetRecord};

/// Fallback key for battles whose encounter name could not be resolved.
/// All such battles collapse into this one bucket.
pub const UNKNOWN_ENCOUNTER: &str = "Unknown";

/// The enemy roster as it stood for one completed battle.
pub type EnemyTeamSnapshot = Vec<EnemyPetRecord>;

/// Cumulative statistics for one opposing encounter.
///
/// Invariant: `battles >= victories`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncounterAggregate {
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub battles: u64,
    pub victories: u64,
    /// One snapshot per completed battle, in completion order. Unbounded.
    pub team_history: Vec<EnemyTeamSnapshot>,
}

impl EncounterAggregate {
    fn new(seen_at: DateTime<Utc>) -> Self {
        Self {
            first_seen: seen_at,
            last_seen: seen_at,
            battles: 0,
            victories: 0,
            team_history: Vec::new(),
        }
    }

    /// Win rate in [0, 1]; zero when no battles have been recorded.
    pub fn win_rate(&self) -> f64 {
        if self.battles == 0 {
            0.0
        } else {
            self.victories as f64 / self.battles as f64
        }
    }
}

/// Mapping from encounter key to aggregate, suitable for bulk export to an
/// external analysis process. Consumers must tolerate additive fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EncounterDatabase {
    #[serde(default)]
    pub encounters: BTreeMap<String, EncounterAggregate>,
}

/// One row of the exported per-encounter summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncounterSummary {
    pub encounter: String,
    pub battles: u64,
    pub victories: u64,
    pub win_rate: f64,
    pub last_seen: DateTime<Utc>,
}

impl EncounterDatabase {
    /// Fold a completed battle into the aggregate for its encounter key.
    ///
    /// Creates the aggregate on first contact. Battles with unresolved
    /// names all land under [`UNKNOWN_ENCOUNTER`]; statistically unrelated
    /// opponents merge there.
    pub fn fold(&mut self, entry: &BattleLogEntry) {
        let aggregate = self
            .encounters
            .entry(entry.encounter.clone())
            .or_insert_with(|| EncounterAggregate::new(entry.ended_at));
        aggregate.battles += 1;
        if entry.victory {
            aggregate.victories += 1;
        }
        aggregate.last_seen = entry.ended_at;
        aggregate.team_history.push(entry.enemy_team.clone());
    }

    pub fn len(&self) -> usize {
        self.encounters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.encounters.is_empty()
    }

    /// Per-encounter summary rows, sorted by battle count descending.
    pub fn summary(&self) -> Vec<EncounterSummary> {
        let mut rows: Vec<EncounterSummary> = self
            .encounters
            .iter()
            .map(|(name, agg)| EncounterSummary {
                encounter: name.clone(),
                battles: agg.battles,
                victories: agg.victories,
                win_rate: agg.win_rate(),
                last_seen: agg.last_seen,
            })
            .collect();
        rows.sort_by(|a, b| b.battles.cmp(&a.battles));
        rows
    }
}
