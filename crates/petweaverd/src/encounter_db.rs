//! Persistent encounter database store.
//!
//! Wraps the shared [`EncounterDatabase`] with JSON persistence in the data
//! directory and the export path used by the external analysis process.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};

use petweaver_common::battle::BattleLogEntry;
use petweaver_common::encounter::{EncounterDatabase, EncounterSummary};

const DB_FILE: &str = "encounters.json";
const EXPORT_FILE: &str = "encounter_export.json";

pub struct EncounterStore {
    db: EncounterDatabase,
    db_path: PathBuf,
    export_path: PathBuf,
}

impl EncounterStore {
    /// Open the store in `dir`, loading any existing database. A corrupt
    /// database file is preserved on disk but replaced in memory.
    pub fn open(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create data dir {}", dir.display()))?;

        let db_path = dir.join(DB_FILE);
        let db = if db_path.exists() {
            let contents = fs::read_to_string(&db_path)
                .with_context(|| format!("Failed to read {}", db_path.display()))?;
            match serde_json::from_str(&contents) {
                Ok(db) => db,
                Err(e) => {
                    warn!("Corrupt encounter database ({}); starting fresh", e);
                    EncounterDatabase::default()
                }
            }
        } else {
            EncounterDatabase::default()
        };

        Ok(Self {
            db,
            db_path,
            export_path: dir.join(EXPORT_FILE),
        })
    }

    pub fn database(&self) -> &EncounterDatabase {
        &self.db
    }

    /// Fold a completed battle into its aggregate and persist the database.
    pub fn fold(&mut self, entry: &BattleLogEntry) -> Result<()> {
        self.db.fold(entry);
        self.save()
    }

    fn save(&self) -> Result<()> {
        let json =
            serde_json::to_string_pretty(&self.db).context("Failed to serialize encounter db")?;
        fs::write(&self.db_path, json)
            .with_context(|| format!("Failed to write {}", self.db_path.display()))
    }

    /// Write the full database to the export file and return the summary
    /// rows. The export is what the external analysis process ingests.
    pub fn export(&self) -> Result<Vec<EncounterSummary>> {
        let json =
            serde_json::to_string_pretty(&self.db).context("Failed to serialize encounter db")?;
        fs::write(&self.export_path, json)
            .with_context(|| format!("Failed to write {}", self.export_path.display()))?;
        let summary = self.db.summary();
        info!(
            "Exported {} encounters to {}",
            summary.len(),
            self.export_path.display()
        );
        Ok(summary)
    }
}
