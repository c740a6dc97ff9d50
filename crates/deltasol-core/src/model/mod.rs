// ── Domain model ──
//
// Canonical types produced by the polling layer. Re-exports the
// public surface so consumers can `use deltasol_core::model::*`.

pub mod identity;
pub mod record;

pub use identity::DeviceIdentity;
pub use record::{Snapshot, TelemetryRecord, TelemetryValue};
