//! Mailbox channel storage.
//!
//! Two persisted queues under one directory, one writer per side:
//!
//! - `outbox.jsonl` — appended by the daemon, drained by the external
//!   responder.
//! - `responses/<id>.json` — written by the external responder, read and
//!   deleted by the daemon, one file per correlation id.
//!
//! Because each side only writes the queue it owns and only deletes from
//! the queue it reads, no locking is needed. This module is storage only;
//! matching responses to callbacks is the bridge's job.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use petweaver_common::protocol::QueueEntry;

const OUTBOX_FILE: &str = "outbox.jsonl";
const RESPONSES_DIR: &str = "responses";

pub struct Mailbox {
    outbox_path: PathBuf,
    responses_dir: PathBuf,
}

impl Mailbox {
    /// Open (creating if needed) the mailbox directory layout.
    pub fn open(dir: &Path) -> Result<Self> {
        let responses_dir = dir.join(RESPONSES_DIR);
        fs::create_dir_all(&responses_dir)
            .with_context(|| format!("Failed to create mailbox dir {}", dir.display()))?;
        Ok(Self {
            outbox_path: dir.join(OUTBOX_FILE),
            responses_dir,
        })
    }

    /// Append one request entry to the outbound queue.
    pub fn append_request(&self, entry: &QueueEntry) -> Result<()> {
        let line = entry.encode().context("Failed to encode queue entry")?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.outbox_path)
            .with_context(|| format!("Failed to open {}", self.outbox_path.display()))?;
        writeln!(file, "{}", line)?;
        debug!("Enqueued request {} to outbox", entry.request.id);
        Ok(())
    }

    /// Correlation ids with a response currently present, in no particular
    /// order. Ids are the response file stems.
    pub fn response_ids(&self) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        for dir_entry in fs::read_dir(&self.responses_dir)
            .with_context(|| format!("Failed to scan {}", self.responses_dir.display()))?
        {
            let path = dir_entry?.path();
            if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    ids.push(stem.to_string());
                }
            }
        }
        Ok(ids)
    }

    /// Raw text of the response for `id`.
    pub fn read_response(&self, id: &str) -> Result<String> {
        let path = self.response_path(id);
        fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))
    }

    /// Delete the response for `id` after it has been consumed.
    pub fn remove_response(&self, id: &str) -> Result<()> {
        let path = self.response_path(id);
        fs::remove_file(&path).with_context(|| format!("Failed to remove {}", path.display()))
    }

    fn response_path(&self, id: &str) -> PathBuf {
        self.responses_dir.join(format!("{}.json", id))
    }

    /// Write a response file the way the external responder would. Test
    /// support only; the daemon never writes responses.
    #[cfg(test)]
    pub fn write_response_for_tests(&self, id: &str, text: &str) -> Result<()> {
        fs::write(self.response_path(id), text).context("Failed to write response")
    }
}
