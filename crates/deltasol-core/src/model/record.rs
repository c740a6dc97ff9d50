// ── Telemetry records and snapshots ──

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;

use super::identity::DeviceIdentity;

/// A normalized measurement value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TelemetryValue {
    Integer(i64),
    /// Fractional value, already rounded to two decimals.
    Number(f64),
    Text(String),
    /// Decoded from a seconds offset since 2001-01-01T00:00:00Z.
    Timestamp(DateTime<Utc>),
}

impl TelemetryValue {
    pub fn is_timestamp(&self) -> bool {
        matches!(self, Self::Timestamp(_))
    }
}

impl fmt::Display for TelemetryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(i) => write!(f, "{i}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s}"),
            Self::Timestamp(ts) => write!(f, "{}", ts.to_rfc3339()),
        }
    }
}

/// One field of one bus packet, as of the last fetch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetryRecord {
    /// `<headerId>__<fieldId>`; stable across fetches.
    pub unique_id: String,
    /// Field name, lower-cased, spaces replaced with underscores.
    pub name: String,
    pub value: TelemetryValue,
    /// Trimmed unit. Empty for diagnostic-only fields.
    pub unit: String,
    pub description: String,
    pub bus_source: String,
    pub bus_destination: String,
    #[serde(skip)]
    pub device: Arc<DeviceIdentity>,
}

impl TelemetryRecord {
    /// Fields without a unit are diagnostic attributes, never primary measurements.
    pub fn is_diagnostic(&self) -> bool {
        self.unit.is_empty()
    }
}

/// Every record from one successful fetch, in device order.
///
/// Replaces the previous snapshot wholesale; there is no incremental merge.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub fetched_at: DateTime<Utc>,
    pub device: Arc<DeviceIdentity>,
    pub records: IndexMap<String, TelemetryRecord>,
}

impl Snapshot {
    pub fn get(&self, unique_id: &str) -> Option<&TelemetryRecord> {
        self.records.get(unique_id)
    }

    /// First record with the given normalized name.
    pub fn by_name(&self, name: &str) -> Option<&TelemetryRecord> {
        self.records.values().find(|r| r.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TelemetryRecord> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
