//! Mailbox wire protocol: outbound request envelopes and inbound responses.
//!
//! The daemon and the external responder never talk directly; they share a
//! mailbox directory. Requests go out as JSON lines, responses come back as
//! one JSON file per correlation id. Encoding is plain serde_json, which
//! escapes embedded quotes and control characters properly; the field names
//! and shape match the historical hand-rolled format for interop.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

/// Protocol-level failures. Decode failures on response payloads are not
/// errors; they degrade to the raw-wrapped fallback shape instead.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("failed to encode request envelope: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("malformed queue entry: {0}")]
    MalformedQueueEntry(#[source] serde_json::Error),
}

/// A request parameter: strings are quoted on the wire, numbers are emitted
/// via their literal representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
    Str(String),
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Str(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Str(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Float(value)
    }
}

/// Outbound request envelope:
/// `{"endpoint": .., "method": "GET", "id": .., "params": {..}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestEnvelope {
    pub endpoint: String,
    pub method: String,
    pub id: String,
    #[serde(default)]
    pub params: BTreeMap<String, ParamValue>,
}

impl RequestEnvelope {
    pub fn new(endpoint: &str, id: &str, params: BTreeMap<String, ParamValue>) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            method: "GET".to_string(),
            id: id.to_string(),
            params,
        }
    }
}

/// One line of the outbound queue: the envelope plus its enqueue timestamp.
/// The timestamp is an additive field; consumers of the envelope shape must
/// tolerate it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueEntry {
    #[serde(flatten)]
    pub request: RequestEnvelope,
    pub enqueued_at: DateTime<Utc>,
}

impl QueueEntry {
    pub fn new(request: RequestEnvelope) -> Self {
        Self {
            request,
            enqueued_at: Utc::now(),
        }
    }

    pub fn encode(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(ProtocolError::Encode)
    }

    pub fn decode(line: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(line).map_err(ProtocolError::MalformedQueueEntry)
    }
}

/// A response as written by the external responder, keyed by correlation id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEntry {
    pub success: bool,
    #[serde(default)]
    pub data: Value,
}

/// What a request callback receives once its response is consumed.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseOutcome {
    pub success: bool,
    pub data: Value,
}

/// Decode a raw response file into a callback outcome.
///
/// The contract is intentionally weak. If the envelope parses, its `success`
/// flag is honored; a string payload is re-parsed as JSON when possible and
/// otherwise wrapped as `{"raw": <text>}`. If the envelope itself is
/// unreadable the whole text is raw-wrapped with `success = false`. Callers
/// that need specific fields must be written against the fallback shape too.
pub fn decode_response(text: &str) -> ResponseOutcome {
    match serde_json::from_str::<ResponseEntry>(text) {
        Ok(entry) => ResponseOutcome {
            success: entry.success,
            data: decode_payload(entry.data),
        },
        Err(_) => ResponseOutcome {
            success: false,
            data: raw_wrap(text),
        },
    }
}

fn decode_payload(data: Value) -> Value {
    match data {
        Value::String(text) => {
            serde_json::from_str(&text).unwrap_or_else(|_| raw_wrap(&text))
        }
        structured => structured,
    }
}

fn raw_wrap(text: &str) -> Value {
    json!({ "raw": text })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, ParamValue)]) -> BTreeMap<String, ParamValue> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_envelope_wire_shape() {
        let envelope = RequestEnvelope::new(
            "/api/strategy",
            "1730000000123-a1b2c3d4",
            params(&[
                ("encounter", "Squirt".into()),
                ("level", ParamValue::Int(25)),
            ]),
        );
        let entry = QueueEntry::new(envelope);
        let line = entry.encode().expect("encodes");

        let value: Value = serde_json::from_str(&line).expect("valid json");
        assert_eq!(value["endpoint"], "/api/strategy");
        assert_eq!(value["method"], "GET");
        assert_eq!(value["id"], "1730000000123-a1b2c3d4");
        assert_eq!(value["params"]["encounter"], "Squirt");
        assert_eq!(value["params"]["level"], 25);
        assert!(value["enqueued_at"].is_string());
    }

    #[test]
    fn test_string_params_are_escaped_not_corrupted() {
        // The historical encoder corrupted envelopes on embedded quotes;
        // the serde codec must round-trip them.
        let envelope = RequestEnvelope::new(
            "/api/lookup",
            "1-ff",
            params(&[("name", "Blingtron \"4000\"\n".into())]),
        );
        let line = QueueEntry::new(envelope).encode().expect("encodes");

        let decoded = QueueEntry::decode(&line).expect("round-trips");
        assert_eq!(
            decoded.request.params["name"],
            ParamValue::Str("Blingtron \"4000\"\n".to_string())
        );
    }

    #[test]
    fn test_decode_structured_response() {
        let outcome = decode_response(r#"{"success": true, "data": {"teams": [1, 2]}}"#);
        assert!(outcome.success);
        assert_eq!(outcome.data["teams"][0], 1);
    }

    #[test]
    fn test_decode_string_payload_reparsed_as_json() {
        let outcome = decode_response(r#"{"success": true, "data": "{\"win_rate\": 0.84}"}"#);
        assert!(outcome.success);
        assert_eq!(outcome.data["win_rate"], 0.84);
    }

    #[test]
    fn test_decode_undecodable_payload_wraps_raw_and_honors_success() {
        let outcome = decode_response(r#"{"success": false, "data": "not json at all"}"#);
        assert!(!outcome.success);
        assert_eq!(outcome.data["raw"], "not json at all");
    }

    #[test]
    fn test_decode_garbage_envelope_wraps_everything() {
        let outcome = decode_response("<<corrupt>>");
        assert!(!outcome.success);
        assert_eq!(outcome.data["raw"], "<<corrupt>>");
    }
}
