//! Transport-agnostic snapshot model and merge rules.

mod merge;
mod snapshot;

pub use merge::{normalize, Payload, SkippedKey, SnapshotUpdate};
pub use snapshot::{
    CargoProfile, CorridorState, CorridorStatus, FreightData, MarketConditions, PresentKeys,
    Snapshot,
};
