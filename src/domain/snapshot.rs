//! Snapshot records.
//!
//! The [`Snapshot`] holds the latest known value for each of the four
//! top-level domains a feed can carry: freight, cargo, market and corridors.
//! Record internals are kept loose: list entries are opaque JSON values, the
//! structured records keep any unrecognised fields in `extra`, `null` reads
//! as the field default, and numbers may arrive as numeric strings.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Freight offers known to the feed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FreightData {
    #[serde(deserialize_with = "lenient::list")]
    pub forwarders: Vec<Value>,
    #[serde(deserialize_with = "lenient::list")]
    pub routes: Vec<Value>,
    #[serde(deserialize_with = "lenient::list")]
    pub pricing: Vec<Value>,
    #[serde(deserialize_with = "lenient::list")]
    pub capacity: Vec<Value>,
}

/// Profile of the cargo currently in flight.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CargoProfile {
    #[serde(rename = "type", deserialize_with = "lenient::text")]
    pub cargo_type: String,
    #[serde(deserialize_with = "lenient::number")]
    pub weight: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub volume: f64,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::optional_number"
    )]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hazardous: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Market conditions affecting freight cost.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketConditions {
    #[serde(deserialize_with = "lenient::number")]
    pub fuel_costs: f64,
    /// Congestion score keyed by port identifier.
    #[serde(deserialize_with = "lenient::number_map")]
    pub port_congestion: BTreeMap<String, f64>,
    #[serde(deserialize_with = "lenient::list")]
    pub weather_disruptions: Vec<Value>,
    /// Exchange rate keyed by currency pair.
    #[serde(deserialize_with = "lenient::number_map")]
    pub exchange_rates: BTreeMap<String, f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Operational state of a trade corridor.
///
/// Parsed case-insensitively; serialized lowercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CorridorState {
    Open,
    Congested,
    Closed,
}

impl CorridorState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CorridorState::Open => "open",
            CorridorState::Congested => "congested",
            CorridorState::Closed => "closed",
        }
    }
}

impl FromStr for CorridorState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        [CorridorState::Open, CorridorState::Congested, CorridorState::Closed]
            .into_iter()
            .find(|state| state.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown corridor status '{s}'"))
    }
}

impl<'de> Deserialize<'de> for CorridorState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Display for CorridorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of a single corridor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorridorStatus {
    #[serde(deserialize_with = "lenient::text")]
    pub id: String,
    pub status: CorridorState,
    #[serde(default = "unit_factor", deserialize_with = "lenient::factor")]
    pub delay_factor: f64,
    #[serde(default = "unit_factor", deserialize_with = "lenient::factor")]
    pub cost_multiplier: f64,
}

fn unit_factor() -> f64 {
    1.0
}

/// Field deserializers that accept the loose shapes feeds actually send.
mod lenient {
    use std::collections::BTreeMap;

    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    fn as_number(value: &Value) -> Option<f64> {
        match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Value>, D::Error> {
        Ok(Option::<Vec<Value>>::deserialize(d)?.unwrap_or_default())
    }

    pub fn optional_number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        match Value::deserialize(d)? {
            Value::Null => Ok(None),
            value => as_number(&value)
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("expected a number, got {value}"))),
        }
    }

    pub fn number<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
        Ok(optional_number(d)?.unwrap_or_default())
    }

    pub fn factor<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
        Ok(optional_number(d)?.unwrap_or(super::unit_factor()))
    }

    pub fn number_map<'de, D: Deserializer<'de>>(d: D) -> Result<BTreeMap<String, f64>, D::Error> {
        Option::<BTreeMap<String, Value>>::deserialize(d)?
            .unwrap_or_default()
            .into_iter()
            .map(|(key, value)| match as_number(&value) {
                Some(n) => Ok((key, n)),
                None => Err(D::Error::custom(format!(
                    "expected a number for '{key}', got {value}"
                ))),
            })
            .collect()
    }

    pub fn text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        match Value::deserialize(d)? {
            Value::Null => Ok(String::new()),
            Value::String(s) => Ok(s),
            Value::Number(n) => Ok(n.to_string()),
            other => Err(D::Error::custom(format!("expected a string, got {other}"))),
        }
    }
}

/// Merged view of everything the feed has delivered so far.
///
/// A key stays `None` until the first payload carrying it arrives.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub freight: Option<FreightData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cargo: Option<CargoProfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market: Option<MarketConditions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corridors: Option<Vec<CorridorStatus>>,
}

impl Snapshot {
    /// Create an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no payload has populated any key yet.
    pub fn is_empty(&self) -> bool {
        self.freight.is_none()
            && self.cargo.is_none()
            && self.market.is_none()
            && self.corridors.is_none()
    }

    /// Which top-level keys currently hold data.
    pub fn present_keys(&self) -> PresentKeys {
        PresentKeys {
            freight: self.freight.is_some(),
            cargo: self.cargo.is_some(),
            market: self.market.is_some(),
            corridors: self.corridors.is_some(),
        }
    }
}

/// Presence flags for the four snapshot keys, used in log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PresentKeys {
    pub freight: bool,
    pub cargo: bool,
    pub market: bool,
    pub corridors: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn cargo_accepts_partial_record() {
        let cargo: CargoProfile = serde_json::from_value(json!({"type": "frozen"})).unwrap();
        assert_eq!(cargo.cargo_type, "frozen");
        assert_eq!(cargo.weight, 0.0);
        assert!(cargo.temperature.is_none());
    }

    #[test]
    fn cargo_keeps_unknown_fields() {
        let cargo: CargoProfile =
            serde_json::from_value(json!({"type": "dry", "weight": 12.5, "un_number": "UN1203"}))
                .unwrap();
        assert_eq!(cargo.extra.get("un_number"), Some(&json!("UN1203")));
    }

    #[test]
    fn corridor_status_rejects_unknown_state() {
        let result: Result<CorridorStatus, _> =
            serde_json::from_value(json!({"id": "c1", "status": "flooded"}));
        assert!(result.is_err());
    }

    #[test]
    fn corridor_status_ignores_case() {
        let corridor: CorridorStatus =
            serde_json::from_value(json!({"id": "c1", "status": "OPEN"})).unwrap();
        assert_eq!(corridor.status, CorridorState::Open);
        assert_eq!("Congested".parse::<CorridorState>(), Ok(CorridorState::Congested));
    }

    #[test]
    fn null_fields_read_as_defaults() {
        let freight: FreightData =
            serde_json::from_value(json!({"forwarders": ["A"], "routes": null})).unwrap();
        assert_eq!(freight.forwarders, vec![json!("A")]);
        assert!(freight.routes.is_empty());

        let cargo: CargoProfile = serde_json::from_value(
            json!({"type": "frozen", "weight": null, "temperature": null}),
        )
        .unwrap();
        assert_eq!(cargo.weight, 0.0);
        assert!(cargo.temperature.is_none());

        let corridor: CorridorStatus = serde_json::from_value(
            json!({"id": 7, "status": "closed", "delay_factor": null}),
        )
        .unwrap();
        assert_eq!(corridor.id, "7");
        assert_eq!(corridor.delay_factor, 1.0);
    }

    #[test]
    fn numeric_strings_are_numbers() {
        let market: MarketConditions = serde_json::from_value(json!({
            "fuel_costs": "1.42",
            "port_congestion": {"DAR": "0.7"},
            "exchange_rates": null
        }))
        .unwrap();
        assert_eq!(market.fuel_costs, 1.42);
        assert_eq!(market.port_congestion["DAR"], 0.7);
        assert!(market.exchange_rates.is_empty());

        let bad: Result<CargoProfile, _> =
            serde_json::from_value(json!({"type": "dry", "weight": "heavy"}));
        assert!(bad.is_err());
    }

    #[test]
    fn corridor_factors_default_to_one() {
        let corridor: CorridorStatus =
            serde_json::from_value(json!({"id": "c1", "status": "congested"})).unwrap();
        assert_eq!(corridor.status, CorridorState::Congested);
        assert_eq!(corridor.delay_factor, 1.0);
        assert_eq!(corridor.cost_multiplier, 1.0);
    }

    #[test]
    fn market_maps_parse() {
        let market: MarketConditions = serde_json::from_value(json!({
            "fuel_costs": 1.42,
            "port_congestion": {"DAR": 0.7},
            "exchange_rates": {"USD/TZS": 2500.0}
        }))
        .unwrap();
        assert_eq!(market.port_congestion["DAR"], 0.7);
        assert_eq!(market.exchange_rates["USD/TZS"], 2500.0);
        assert!(market.weather_disruptions.is_empty());
    }

    #[test]
    fn new_snapshot_is_empty() {
        let snapshot = Snapshot::new();
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.present_keys(), PresentKeys::default());
    }
}
