//! Command handlers: read the daemon's persisted files and render them.

use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{bail, Context, Result};
use owo_colors::OwoColorize;

use petweaver_common::battle::BattleLogEntry;
use petweaver_common::encounter::EncounterDatabase;

const DB_FILE: &str = "encounters.json";
const LOG_FILE: &str = "battle_log.jsonl";
const EXPORT_FILE: &str = "encounter_export.json";

/// Per-encounter battle and victory counts, most-fought first.
pub fn summary(data_dir: &Path) -> Result<()> {
    let db = load_database(data_dir)?;
    if db.is_empty() {
        println!("No encounters recorded yet.");
        return Ok(());
    }

    println!("{}", "Encounters".bold());
    for row in db.summary() {
        let rate = format!("{:>5.1}%", row.win_rate * 100.0);
        let rate = if row.win_rate >= 0.5 {
            rate.green().to_string()
        } else {
            rate.red().to_string()
        };
        println!(
            "  {:<30} {:>4} battles  {:>4} wins  {}",
            row.encounter, row.battles, row.victories, rate
        );
    }
    Ok(())
}

/// The newest entries of the battle log.
pub fn battles(data_dir: &Path, limit: usize) -> Result<()> {
    let entries = load_battle_log(data_dir)?;
    if entries.is_empty() {
        println!("No battles logged yet.");
        return Ok(());
    }

    for entry in entries.iter().rev().take(limit) {
        let outcome = if entry.victory {
            "WIN ".green().to_string()
        } else {
            "LOSS".red().to_string()
        };
        println!(
            "{} {} {:<30} {} rounds, {}s",
            entry.ended_at.format("%Y-%m-%d %H:%M"),
            outcome,
            entry.encounter,
            entry.rounds,
            entry.duration_secs
        );
    }
    Ok(())
}

/// Everything known about one encounter, including the most recent enemy
/// team and its observed move order.
pub fn encounter(data_dir: &Path, name: &str) -> Result<()> {
    let db = load_database(data_dir)?;
    let Some(agg) = db.encounters.get(name) else {
        bail!("No encounter named '{}' recorded", name);
    };

    println!("{}", name.bold());
    println!("  First seen: {}", agg.first_seen.format("%Y-%m-%d %H:%M"));
    println!("  Last seen:  {}", agg.last_seen.format("%Y-%m-%d %H:%M"));
    println!(
        "  Record:     {} battles, {} victories ({:.1}%)",
        agg.battles,
        agg.victories,
        agg.win_rate() * 100.0
    );

    let Some(team) = agg.team_history.last() else {
        return Ok(());
    };
    println!("  Last team:");
    for pet in team {
        println!(
            "    {} (lvl {}, {} hp, {} power, {} speed)",
            pet.name.cyan(),
            pet.level,
            pet.max_health,
            pet.power,
            pet.speed
        );
        for mv in &pet.move_sequence {
            println!("      round {:>2}: {} ({})", mv.round, mv.ability_name, mv.ability_id);
        }
    }
    Ok(())
}

/// Write the export file the analysis process ingests and report key count.
pub fn export(data_dir: &Path) -> Result<()> {
    let db = load_database(data_dir)?;
    let export_path = data_dir.join(EXPORT_FILE);
    let json = serde_json::to_string_pretty(&db).context("Failed to serialize database")?;
    fs::write(&export_path, json)
        .with_context(|| format!("Failed to write {}", export_path.display()))?;
    println!("Exported {} encounters to {}", db.len(), export_path.display());
    Ok(())
}

fn load_database(data_dir: &Path) -> Result<EncounterDatabase> {
    let path = data_dir.join(DB_FILE);
    if !path.exists() {
        return Ok(EncounterDatabase::default());
    }
    let contents =
        fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("Failed to parse {}", path.display()))
}

fn load_battle_log(data_dir: &Path) -> Result<Vec<BattleLogEntry>> {
    let path = data_dir.join(LOG_FILE);
    if !path.exists() {
        return Ok(Vec::new());
    }
    let file = File::open(&path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut entries = Vec::new();
    for line in BufReader::new(file).lines() {
        let Ok(line) = line else { continue };
        if let Ok(entry) = serde_json::from_str::<BattleLogEntry>(&line) {
            entries.push(entry);
        }
    }
    Ok(entries)
}
