//! Payload normalization and snapshot merging.
//!
//! An incoming payload is first turned into a [`SnapshotUpdate`]; only when
//! that succeeds is it merged. Merging replaces each top-level key the update
//! carries and leaves every other key as it was. A key that cannot be read is
//! skipped on its own; a payload with nothing usable never touches the held
//! [`Snapshot`].

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};

use super::snapshot::{CargoProfile, CorridorStatus, FreightData, MarketConditions, PresentKeys, Snapshot};
use crate::error::StreamError;

/// Raw payload as delivered by a transport.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Text frame (SSE data, WebSocket text).
    Text(String),
    /// Binary frame expected to hold UTF-8 JSON.
    Binary(Vec<u8>),
    /// Already-decoded body (HTTP polling).
    Json(Value),
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Payload::Text(text)
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Payload::Text(text.to_owned())
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Payload::Json(value)
    }
}

/// Partial snapshot carried by one payload.
///
/// `None` means the payload did not carry the key (absent or `null`) or
/// carried a value that could not be read, in which case the key is listed
/// in `skipped`. Unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnapshotUpdate {
    pub freight: Option<FreightData>,
    pub cargo: Option<CargoProfile>,
    pub market: Option<MarketConditions>,
    pub corridors: Option<Vec<CorridorStatus>>,
    pub skipped: Vec<SkippedKey>,
}

/// A top-level key dropped from an otherwise usable payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedKey {
    pub key: &'static str,
    pub reason: String,
}

impl std::fmt::Display for SkippedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.key, self.reason)
    }
}

impl SnapshotUpdate {
    /// Keys this update will replace.
    pub fn keys(&self) -> PresentKeys {
        PresentKeys {
            freight: self.freight.is_some(),
            cargo: self.cargo.is_some(),
            market: self.market.is_some(),
            corridors: self.corridors.is_some(),
        }
    }

    /// An update carrying none of the four keys (a heartbeat).
    pub fn is_heartbeat(&self) -> bool {
        self.keys() == PresentKeys::default() && self.skipped.is_empty()
    }
}

/// Decode and validate a payload.
///
/// Each top-level key is read on its own: a key whose value does not fit its
/// record is skipped and the remaining keys still apply.
///
/// # Errors
///
/// Returns [`StreamError::DataProcessing`] if the payload is not JSON, is not
/// a JSON object, or every snapshot key it carries had to be skipped.
pub fn normalize(payload: &Payload) -> Result<SnapshotUpdate, StreamError> {
    let parsed;
    let value = match payload {
        Payload::Text(text) => {
            parsed = serde_json::from_str::<Value>(text)
                .map_err(|e| StreamError::DataProcessing(format!("invalid JSON: {e}")))?;
            &parsed
        }
        Payload::Binary(bytes) => {
            parsed = serde_json::from_slice::<Value>(bytes)
                .map_err(|e| StreamError::DataProcessing(format!("invalid JSON: {e}")))?;
            &parsed
        }
        Payload::Json(value) => value,
    };

    let Value::Object(object) = value else {
        return Err(StreamError::DataProcessing(format!(
            "expected a JSON object, got {}",
            kind_of(value)
        )));
    };

    let mut skipped = Vec::new();
    let update = SnapshotUpdate {
        freight: read_key(object, "freight", &mut skipped),
        cargo: read_key(object, "cargo", &mut skipped),
        market: read_key(object, "market", &mut skipped),
        corridors: read_key(object, "corridors", &mut skipped),
        skipped,
    };

    if update.keys() == PresentKeys::default() && !update.skipped.is_empty() {
        let reasons: Vec<String> = update.skipped.iter().map(ToString::to_string).collect();
        return Err(StreamError::DataProcessing(format!(
            "invalid update: {}",
            reasons.join("; ")
        )));
    }
    Ok(update)
}

fn read_key<T: DeserializeOwned>(
    object: &Map<String, Value>,
    key: &'static str,
    skipped: &mut Vec<SkippedKey>,
) -> Option<T> {
    match object.get(key) {
        None | Some(Value::Null) => None,
        Some(value) => match <T as Deserialize>::deserialize(value) {
            Ok(record) => Some(record),
            Err(e) => {
                skipped.push(SkippedKey {
                    key,
                    reason: e.to_string(),
                });
                None
            }
        },
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

impl Snapshot {
    /// Merge an update, replacing each key it carries wholesale.
    ///
    /// Returns the keys that were replaced.
    pub fn merge(&mut self, update: SnapshotUpdate) -> PresentKeys {
        let replaced = update.keys();
        if let Some(freight) = update.freight {
            self.freight = Some(freight);
        }
        if let Some(cargo) = update.cargo {
            self.cargo = Some(cargo);
        }
        if let Some(market) = update.market {
            self.market = Some(market);
        }
        if let Some(corridors) = update.corridors {
            self.corridors = Some(corridors);
        }
        replaced
    }
}
