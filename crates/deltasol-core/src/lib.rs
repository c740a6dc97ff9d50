//! Polling layer between `deltasol-api` and its consumers (CLI, host integrations).
//!
//! - **[`Controller`]** — the single entry point a host polls:
//!   [`fetch_snapshot()`](Controller::fetch_snapshot) detects the product once,
//!   runs the matching protocol driver under the cycle timeout, and returns
//!   a normalized [`Snapshot`].
//!
//! - **[`normalize`]** — flattens the device's header/packet structure into
//!   [`TelemetryRecord`]s keyed by `<headerId>__<fieldId>`.
//!
//! - **[`coordinator`]** — periodic refresh loop that publishes
//!   [`UpdateState`] to subscribers, standing in for a host's update
//!   coordinator.

pub mod config;
pub mod controller;
pub mod convert;
pub mod coordinator;
pub mod error;
pub mod model;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::DeviceConfig;
pub use controller::Controller;
pub use convert::normalize;
pub use coordinator::{CoordinatorHandle, UpdateState};
pub use error::CoreError;
pub use model::{DeviceIdentity, Snapshot, TelemetryRecord, TelemetryValue};

pub use deltasol_api::{Product, Protocol};
