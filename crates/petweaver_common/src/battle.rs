//! Battle data model: rosters, observed moves, and frozen battle records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which side of a battle an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BattleSide {
    Player,
    Enemy,
}

/// One of a pet's up-to-three usable abilities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityRef {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub icon: String,
    /// Ability family ("Beast", "Magic", ...); free-form, client-supplied.
    #[serde(rename = "type", default)]
    pub ability_type: String,
}

/// A single enemy move as it was observed: the round in effect when it was
/// recorded, the ability identity, and a wall-clock stamp. Append order is
/// chronological order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveEvent {
    pub round: u32,
    pub ability_id: u32,
    pub ability_name: String,
    pub timestamp: DateTime<Utc>,
}

/// One enemy pet as captured from the roster at battle start, plus every
/// move it was seen to play. `move_sequence` is append-only for the life of
/// a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyPetRecord {
    pub species_id: u32,
    pub name: String,
    pub level: u32,
    pub max_health: u32,
    pub power: u32,
    pub speed: u32,
    #[serde(default)]
    pub abilities: Vec<AbilityRef>,
    #[serde(default)]
    pub move_sequence: Vec<MoveEvent>,
}

impl EnemyPetRecord {
    /// Resolve an ability name from this pet's captured ability set.
    pub fn ability_name(&self, ability_id: u32) -> Option<&str> {
        self.abilities
            .iter()
            .find(|a| a.id == ability_id)
            .map(|a| a.name.as_str())
    }
}

/// Frozen snapshot of a completed battle. Immutable once created; lives in
/// the bounded battle log and inside encounter team histories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleLogEntry {
    /// Resolved encounter key ("Unknown" when no name could be resolved).
    pub encounter: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub duration_secs: i64,
    /// Round counter at the moment the battle ended.
    pub rounds: u32,
    pub victory: bool,
    pub enemy_team: Vec<EnemyPetRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pet_with_abilities() -> EnemyPetRecord {
        EnemyPetRecord {
            species_id: 1155,
            name: "Chitterspine Skitterling".to_string(),
            level: 25,
            max_health: 1546,
            power: 276,
            speed: 289,
            abilities: vec![
                AbilityRef {
                    id: 55,
                    name: "Bite".to_string(),
                    icon: "ability_druid_ferociousbite".to_string(),
                    ability_type: "Beast".to_string(),
                },
                AbilityRef {
                    id: 61,
                    name: "Screech".to_string(),
                    icon: "ability_hunter_cobrashot".to_string(),
                    ability_type: "Flying".to_string(),
                },
            ],
            move_sequence: Vec::new(),
        }
    }

    #[test]
    fn test_ability_name_lookup() {
        let pet = pet_with_abilities();
        assert_eq!(pet.ability_name(55), Some("Bite"));
        assert_eq!(pet.ability_name(61), Some("Screech"));
        assert_eq!(pet.ability_name(999), None);
    }

    #[test]
    fn test_roster_snapshot_tolerates_missing_optional_fields() {
        // A feed snapshot carries no move_sequence and may omit icons.
        let json = r#"{
            "species_id": 844,
            "name": "Creepy Crate",
            "level": 25,
            "max_health": 1400,
            "power": 260,
            "speed": 260,
            "abilities": [{"id": 110, "name": "Creepy Chomp"}]
        }"#;
        let pet: EnemyPetRecord = serde_json::from_str(json).expect("snapshot should parse");
        assert!(pet.move_sequence.is_empty());
        assert_eq!(pet.abilities[0].icon, "");
        assert_eq!(pet.abilities[0].ability_type, "");
    }
}
