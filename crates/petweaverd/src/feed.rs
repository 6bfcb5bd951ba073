//! Battle feed watcher.
//!
//! The game client appends one JSON event per line to the feed file; this
//! watcher tails it by byte position on a fixed interval and forwards parsed
//! events over a channel. Malformed lines are skipped. If the file shrinks
//! (client rotated or truncated it), reading restarts from the top.

use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use petweaver_common::feed::FeedEvent;

pub struct FeedWatcher {
    path: PathBuf,
    tx: mpsc::Sender<FeedEvent>,
    poll_interval: Duration,
}

impl FeedWatcher {
    pub fn new(path: PathBuf, tx: mpsc::Sender<FeedEvent>, poll_interval: Duration) -> Self {
        Self {
            path,
            tx,
            poll_interval,
        }
    }

    /// Start tailing in a background task. Existing feed content is skipped;
    /// only events appended after startup are observed.
    pub fn spawn(self) {
        tokio::spawn(async move {
            info!("Watching battle feed at {}", self.path.display());

            let mut last_pos = match tokio::fs::metadata(&self.path).await {
                Ok(meta) => meta.len(),
                Err(_) => {
                    warn!("Battle feed not found yet; waiting for the client to create it");
                    0
                }
            };

            loop {
                tokio::time::sleep(self.poll_interval).await;

                let current_size = match tokio::fs::metadata(&self.path).await {
                    Ok(meta) => meta.len(),
                    Err(_) => continue,
                };

                if current_size < last_pos {
                    debug!("Battle feed truncated; restarting from the top");
                    last_pos = 0;
                }
                if current_size == last_pos {
                    continue;
                }

                let content = match tokio::fs::read_to_string(&self.path).await {
                    Ok(content) => content,
                    Err(e) => {
                        warn!("Failed to read battle feed: {}", e);
                        continue;
                    }
                };

                let new_content = match content.get(last_pos as usize..) {
                    Some(tail) => tail,
                    // Position landed inside a multi-byte character; the
                    // next full read resyncs.
                    None => {
                        last_pos = 0;
                        continue;
                    }
                };

                for line in new_content.lines() {
                    match parse_feed_line(line) {
                        Some(event) => {
                            if let Err(e) = self.tx.send(event).await {
                                error!("Feed channel closed: {}", e);
                                return;
                            }
                        }
                        None => continue,
                    }
                }

                last_pos = content.len() as u64;
            }
        });
    }
}

/// Parse one feed line; blank and malformed lines yield nothing.
pub fn parse_feed_line(line: &str) -> Option<FeedEvent> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    match serde_json::from_str(line) {
        Ok(event) => Some(event),
        Err(e) => {
            debug!("Skipping malformed feed line: {}", e);
            None
        }
    }
}
