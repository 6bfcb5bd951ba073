//! Asynchronous request/response bridge over the mailbox.
//!
//! The client environment cannot open sockets, so request and response are
//! correlated purely through generated identifiers written to and read from
//! the shared mailbox. `send_request` returns immediately; a fixed-interval
//! poll delivers each matched response to its callback exactly once.
//!
//! There is deliberately no timeout or retry: a request whose response never
//! arrives stays pending forever, occupying one table slot. Strengthening
//! that would change observable behavior and is out of scope here.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use anyhow::Result;
use chrono::Utc;
use tracing::{debug, warn};

use petweaver_common::protocol::{
    decode_response, ParamValue, QueueEntry, RequestEnvelope, ResponseOutcome,
};

use crate::mailbox::Mailbox;

/// Invoked exactly once when the matching response is consumed.
pub type RequestCallback = Box<dyn FnOnce(ResponseOutcome) + Send>;

/// Attempts at generating a fresh id before giving up on a send. Collisions
/// need the same millisecond and the same 32-bit suffix, so one retry is
/// already paranoia.
const ID_GENERATION_ATTEMPTS: u32 = 8;

pub struct AsyncBridge {
    mailbox: Mailbox,
    pending: HashMap<String, RequestCallback>,
}

impl AsyncBridge {
    pub fn open(mailbox_dir: &Path) -> Result<Self> {
        Ok(Self {
            mailbox: Mailbox::open(mailbox_dir)?,
            pending: HashMap::new(),
        })
    }

    /// Number of requests still waiting for a response.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Enqueue a request and register its callback under a fresh correlation
    /// id. Returns the id; never blocks waiting for the response.
    pub fn send_request(
        &mut self,
        endpoint: &str,
        params: BTreeMap<String, ParamValue>,
        callback: RequestCallback,
    ) -> Result<String> {
        let id = self.generate_id();
        let entry = QueueEntry::new(RequestEnvelope::new(endpoint, &id, params));
        self.mailbox.append_request(&entry)?;
        self.pending.insert(id.clone(), callback);
        debug!("Request {} -> {} pending", id, endpoint);
        Ok(id)
    }

    /// Poll the response table once. Every entry with a matching pending
    /// callback is decoded, delivered, and removed from both tables; entries
    /// with no matching callback are left untouched for whoever owns them.
    /// Returns the number of callbacks invoked.
    pub fn check_responses(&mut self) -> Result<usize> {
        let mut delivered = 0;

        for id in self.mailbox.response_ids()? {
            if !self.pending.contains_key(&id) {
                continue;
            }
            let text = match self.mailbox.read_response(&id) {
                Ok(text) => text,
                Err(e) => {
                    // Transient read failure: keep both entries for the
                    // next poll.
                    warn!("Failed to read response {}: {}", id, e);
                    continue;
                }
            };

            let outcome = decode_response(&text);
            if !outcome.success {
                debug!("Response {} reported failure", id);
            }
            let Some(callback) = self.pending.remove(&id) else {
                continue;
            };
            callback(outcome);
            delivered += 1;

            if let Err(e) = self.mailbox.remove_response(&id) {
                warn!("Failed to remove consumed response {}: {}", id, e);
            }
        }

        Ok(delivered)
    }

    /// Wall-clock millis plus a random 32-bit hex suffix. Regenerates while
    /// the id is already pending.
    fn generate_id(&self) -> String {
        for _ in 0..ID_GENERATION_ATTEMPTS {
            let id = format!("{}-{:08x}", Utc::now().timestamp_millis(), rand::random::<u32>());
            if !self.pending.contains_key(&id) {
                return id;
            }
        }
        // Practically unreachable; widen the suffix instead of looping on.
        format!(
            "{}-{:08x}{:08x}",
            Utc::now().timestamp_millis(),
            rand::random::<u32>(),
            rand::random::<u32>()
        )
    }

    #[cfg(test)]
    pub fn mailbox(&self) -> &Mailbox {
        &self.mailbox
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    fn counted_callback(counter: Arc<AtomicUsize>) -> RequestCallback {
        Box::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_send_without_response_leaves_pending_untouched() -> Result<()> {
        let dir = TempDir::new()?;
        let mut bridge = AsyncBridge::open(dir.path())?;
        let calls = Arc::new(AtomicUsize::new(0));

        bridge.send_request("/x", BTreeMap::new(), counted_callback(calls.clone()))?;
        assert_eq!(bridge.check_responses()?, 0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(bridge.pending_len(), 1);
        Ok(())
    }

    #[test]
    fn test_matched_response_delivers_exactly_once() -> Result<()> {
        let dir = TempDir::new()?;
        let mut bridge = AsyncBridge::open(dir.path())?;
        let calls = Arc::new(AtomicUsize::new(0));

        let id = bridge.send_request("/x", BTreeMap::new(), counted_callback(calls.clone()))?;
        bridge
            .mailbox()
            .write_response_for_tests(&id, r#"{"success": true, "data": {"ok": 1}}"#)?;

        assert_eq!(bridge.check_responses()?, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(bridge.pending_len(), 0);
        assert!(bridge.mailbox().response_ids()?.is_empty());

        // A second poll must not re-deliver.
        assert_eq!(bridge.check_responses()?, 0);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        Ok(())
    }

    #[test]
    fn test_callback_receives_success_and_decoded_data() -> Result<()> {
        let dir = TempDir::new()?;
        let mut bridge = AsyncBridge::open(dir.path())?;
        let seen: Arc<Mutex<Option<ResponseOutcome>>> = Arc::new(Mutex::new(None));
        let sink = seen.clone();

        let id = bridge.send_request(
            "/api/strategy",
            BTreeMap::from([("encounter".to_string(), ParamValue::from("Squirt"))]),
            Box::new(move |outcome| {
                *sink.lock().unwrap() = Some(outcome);
            }),
        )?;
        bridge
            .mailbox()
            .write_response_for_tests(&id, r#"{"success": true, "data": {"script": "step"}}"#)?;
        bridge.check_responses()?;

        let outcome = seen.lock().unwrap().take().expect("delivered");
        assert!(outcome.success);
        assert_eq!(outcome.data["script"], "step");
        Ok(())
    }

    #[test]
    fn test_unmatched_response_is_left_untouched() -> Result<()> {
        let dir = TempDir::new()?;
        let mut bridge = AsyncBridge::open(dir.path())?;
        bridge
            .mailbox()
            .write_response_for_tests("stranger-01", r#"{"success": true, "data": null}"#)?;

        assert_eq!(bridge.check_responses()?, 0);
        assert_eq!(bridge.mailbox().response_ids()?, vec!["stranger-01".to_string()]);
        Ok(())
    }

    #[test]
    fn test_corrupt_matched_response_is_consumed_as_failure() -> Result<()> {
        let dir = TempDir::new()?;
        let mut bridge = AsyncBridge::open(dir.path())?;
        let seen: Arc<Mutex<Option<ResponseOutcome>>> = Arc::new(Mutex::new(None));
        let sink = seen.clone();

        let id = bridge.send_request(
            "/x",
            BTreeMap::new(),
            Box::new(move |outcome| {
                *sink.lock().unwrap() = Some(outcome);
            }),
        )?;
        bridge.mailbox().write_response_for_tests(&id, "<<corrupt>>")?;
        assert_eq!(bridge.check_responses()?, 1);

        let outcome = seen.lock().unwrap().take().expect("delivered");
        assert!(!outcome.success);
        assert_eq!(outcome.data["raw"], "<<corrupt>>");
        assert!(bridge.mailbox().response_ids()?.is_empty());
        Ok(())
    }

    #[test]
    fn test_generated_ids_are_unique_under_burst() -> Result<()> {
        let dir = TempDir::new()?;
        let mut bridge = AsyncBridge::open(dir.path())?;
        let calls = Arc::new(AtomicUsize::new(0));

        let mut ids = std::collections::HashSet::new();
        for _ in 0..64 {
            let id = bridge.send_request("/x", BTreeMap::new(), counted_callback(calls.clone()))?;
            assert!(ids.insert(id));
        }
        assert_eq!(bridge.pending_len(), 64);
        Ok(())
    }
}
