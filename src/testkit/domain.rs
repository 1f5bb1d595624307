//! JSON payload builders for the four snapshot keys.

use serde_json::{json, Value};

use crate::domain::Payload;

/// `{"freight": {"forwarders": [...]}}` with one forwarder per name.
pub fn freight(forwarders: &[&str]) -> Value {
    let forwarders: Vec<Value> = forwarders
        .iter()
        .map(|name| json!({ "name": name }))
        .collect();
    json!({ "freight": { "forwarders": forwarders } })
}

/// `{"cargo": {"type": ..., "weight": ..., "volume": ...}}`.
pub fn cargo(cargo_type: &str, weight: f64, volume: f64) -> Value {
    json!({ "cargo": { "type": cargo_type, "weight": weight, "volume": volume } })
}

/// Market conditions with one fuel price and one congested port.
pub fn market(fuel: f64, port: &str, congestion: f64) -> Value {
    json!({
        "market": {
            "fuel_costs": fuel,
            "port_congestion": { port: congestion },
            "weather_disruptions": [],
            "exchange_rates": { "USD/TZS": 2500.0 }
        }
    })
}

/// A corridor list with one entry.
pub fn corridors(id: &str, status: &str) -> Value {
    json!({
        "corridors": [
            { "id": id, "status": status, "delay_factor": 1.0, "cost_multiplier": 1.0 }
        ]
    })
}

/// The payload as text, the way push transports deliver it.
pub fn text(value: &Value) -> Payload {
    Payload::Text(value.to_string())
}
