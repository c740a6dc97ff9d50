//! `deltasol read` -- fetch one snapshot.

use tabled::Tabled;

use deltasol_core::{Controller, Snapshot};

use crate::cli::{GlobalOpts, ReadArgs};
use crate::error::CliError;
use crate::output;
use crate::sensor::SensorView;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct SensorRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Unit")]
    unit: String,
    #[tabled(rename = "Class")]
    class: String,
    #[tabled(rename = "Source")]
    source: String,
    #[tabled(rename = "ID")]
    id: String,
}

impl From<&SensorView> for SensorRow {
    fn from(s: &SensorView) -> Self {
        Self {
            name: s.name.clone(),
            value: s.value.to_string(),
            unit: s.unit.clone(),
            class: s.device_class.map_or_else(
                || if s.diagnostic { "diagnostic".into() } else { String::new() },
                |c| c.to_string(),
            ),
            source: s.source.clone(),
            id: s.unique_id.clone(),
        }
    }
}

// ── Selection ───────────────────────────────────────────────────────

/// Records to show, in device order.
pub fn select(snapshot: &Snapshot, args: &ReadArgs) -> Vec<SensorView> {
    let needles: Vec<String> = args.name.iter().map(|n| n.to_lowercase()).collect();

    snapshot
        .iter()
        .filter(|r| args.all || !r.is_diagnostic())
        .filter(|r| needles.is_empty() || needles.iter().any(|n| r.name.contains(n.as_str())))
        .map(SensorView::from)
        .collect()
}

/// Render the selected records of a snapshot in the chosen format.
pub fn render(snapshot: &Snapshot, args: &ReadArgs, global: &GlobalOpts) -> String {
    let views = select(snapshot, args);
    output::render_list(&global.output, &views, |s| SensorRow::from(s), |s| {
        if s.unit.is_empty() {
            format!("{}={}", s.name, s.value)
        } else {
            format!("{}={} {}", s.name, s.value, s.unit)
        }
    })
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    controller: &Controller,
    args: &ReadArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let snapshot = controller.fetch_snapshot().await?;
    output::print_output(&render(&snapshot, args, global), global.quiet);
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;
    use deltasol_core::{DeviceIdentity, Product, TelemetryRecord, TelemetryValue};

    use super::*;

    fn snapshot() -> Snapshot {
        let device = Arc::new(DeviceIdentity {
            product: Product::Km2,
            product_name: "km2".into(),
            vendor: "RESOL".into(),
            serial_number: "001E3D0012AB".into(),
            firmware_version: String::new(),
            firmware_build: String::new(),
            display_name: String::new(),
            feature_flags: String::new(),
            mac_address: "00:1E:3D:00:12:AB".into(),
        });
        let record = |id: &str, name: &str, value: TelemetryValue, unit: &str| TelemetryRecord {
            unique_id: id.into(),
            name: name.into(),
            value,
            unit: unit.into(),
            description: String::new(),
            bus_source: "DeltaSol MX".into(),
            bus_destination: "DFA".into(),
            device: Arc::clone(&device),
        };
        let records = [
            record("h__1", "temperature_sensor_1", TelemetryValue::Number(23.46), "°C"),
            record("h__2", "pump_speed_relay_1", TelemetryValue::Integer(100), "%"),
            record("h__3", "version", TelemetryValue::Text("2.11".into()), ""),
        ];
        Snapshot {
            fetched_at: Utc::now(),
            device: Arc::clone(&device),
            records: records
                .into_iter()
                .map(|r| (r.unique_id.clone(), r))
                .collect(),
        }
    }

    fn args(names: &[&str], all: bool) -> ReadArgs {
        ReadArgs {
            name: names.iter().map(|n| (*n).to_owned()).collect(),
            all,
        }
    }

    #[test]
    fn diagnostics_hidden_by_default() {
        let views = select(&snapshot(), &args(&[], false));
        let names: Vec<_> = views.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["temperature_sensor_1", "pump_speed_relay_1"]);
    }

    #[test]
    fn all_includes_diagnostics() {
        assert_eq!(select(&snapshot(), &args(&[], true)).len(), 3);
    }

    #[test]
    fn name_filter_is_case_insensitive_substring() {
        let views = select(&snapshot(), &args(&["TEMPERATURE"], false));
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].icon, "mdi:thermometer");
    }
}
