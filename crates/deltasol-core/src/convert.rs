// ── API-to-domain conversions ──
//
// Bridges raw `deltasol_api` payloads into canonical domain types:
// device information into a `DeviceIdentity`, and the live
// header/packet structure into a flat `Snapshot`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::{Number, Value};
use tracing::debug;

use deltasol_api::{DeviceInformation, LiveData};

use crate::error::CoreError;
use crate::model::identity::mac_from_serial;
use crate::model::{DeviceIdentity, Snapshot, TelemetryRecord, TelemetryValue};

/// 2001-01-01T00:00:00Z as Unix seconds; origin of the device's date fields.
const DATE_EPOCH_SECS: i64 = 978_307_200;

/// Field names containing this marker carry epoch-offset dates.
const DATE_MARKER: &str = "date";

// ── Device identity ────────────────────────────────────────────────

impl From<DeviceInformation> for DeviceIdentity {
    fn from(info: DeviceInformation) -> Self {
        Self {
            mac_address: mac_from_serial(&info.serial),
            product: info.product,
            product_name: info.product_name,
            vendor: info.vendor,
            serial_number: info.serial,
            firmware_version: info.version,
            firmware_build: info.build,
            display_name: info.name,
            feature_flags: info.features,
        }
    }
}

// ── Live data ──────────────────────────────────────────────────────

/// Flatten a raw live-data payload into a [`Snapshot`].
///
/// Pure; no I/O. Field definitions and values are matched by position,
/// so array lengths are checked before any indexing. Any structural
/// problem is a [`CoreError::MalformedResponse`]; nothing is skipped.
pub fn normalize(raw: &Value, device: &Arc<DeviceIdentity>) -> Result<Snapshot, CoreError> {
    let data = LiveData::deserialize(raw)
        .map_err(|e| CoreError::malformed(format!("unexpected live data layout: {e}")))?;

    let headerset = data
        .headersets
        .first()
        .ok_or_else(|| CoreError::malformed("response carries no headersets"))?;

    if headerset.packets.len() != data.headers.len() {
        return Err(CoreError::malformed(format!(
            "{} headers but {} packets",
            data.headers.len(),
            headerset.packets.len()
        )));
    }

    let mut records = IndexMap::new();

    for (index, (header, packet)) in data.headers.iter().zip(&headerset.packets).enumerate() {
        debug!(index, header = %header.id, "normalizing header");

        if header.fields.len() != packet.field_values.len() {
            return Err(CoreError::malformed(format!(
                "header {} declares {} fields but its packet has {} values",
                header.id,
                header.fields.len(),
                packet.field_values.len()
            )));
        }

        for (field, field_value) in header.fields.iter().zip(&packet.field_values) {
            let unique_id = format!("{}__{}", header.id, field.id);
            let name = normalize_name(&field.name);
            let value = coerce_value(&name, &field_value.raw_value)
                .map_err(|reason| CoreError::malformed(format!("{unique_id}: {reason}")))?;

            let record = TelemetryRecord {
                unique_id: unique_id.clone(),
                name,
                value,
                unit: field.unit.trim().to_owned(),
                description: header.description.clone(),
                bus_source: header.source_name.clone(),
                bus_destination: header.destination_name.clone(),
                device: Arc::clone(device),
            };

            if records.insert(unique_id.clone(), record).is_some() {
                return Err(CoreError::malformed(format!(
                    "duplicate field identifier {unique_id}"
                )));
            }
        }
    }

    Ok(Snapshot {
        fetched_at: Utc::now(),
        device: Arc::clone(device),
        records,
    })
}

/// `"Temperature Sensor 1"` → `"temperature_sensor_1"`.
pub fn normalize_name(name: &str) -> String {
    name.replace(' ', "_").to_lowercase()
}

/// Interpret a raw wire value for the field called `name`.
fn coerce_value(name: &str, raw: &Value) -> Result<TelemetryValue, String> {
    match raw {
        Value::Number(n) if name.contains(DATE_MARKER) => decode_date(n).map(TelemetryValue::Timestamp),
        Value::Number(n) => Ok(number_value(n)),
        Value::String(s) => Ok(TelemetryValue::Text(s.clone())),
        other => Err(format!("unsupported raw_value {other}")),
    }
}

fn number_value(n: &Number) -> TelemetryValue {
    if let Some(i) = n.as_i64() {
        return TelemetryValue::Integer(i);
    }
    // u64 beyond i64::MAX and all fractional values
    let f = n.as_f64().unwrap_or_default();
    TelemetryValue::Number(round2(f))
}

/// Two decimals, ties to even on the exact binary value (`0.125` → `0.12`).
fn round2(value: f64) -> f64 {
    format!("{value:.2}").parse().unwrap_or(value)
}

/// Seconds since 2001-01-01T00:00:00Z → absolute UTC timestamp.
fn decode_date(n: &Number) -> Result<DateTime<Utc>, String> {
    let decoded = if let Some(secs) = n.as_i64() {
        secs.checked_add(DATE_EPOCH_SECS)
            .and_then(|ts| DateTime::from_timestamp(ts, 0))
    } else {
        let millis = n.as_f64().map(|f| (f * 1000.0).round()).unwrap_or(f64::NAN);
        #[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
        let millis = millis.is_finite().then_some(millis as i64);
        millis
            .and_then(|ms| ms.checked_add(DATE_EPOCH_SECS * 1000))
            .and_then(DateTime::from_timestamp_millis)
    };

    decoded.ok_or_else(|| format!("date offset {n} out of range"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use deltasol_api::Product;

    use super::*;

    fn device() -> Arc<DeviceIdentity> {
        Arc::new(DeviceIdentity::from(DeviceInformation {
            product: Product::Km2,
            product_name: "km2".into(),
            vendor: "RESOL".into(),
            serial: "001E3D0012AB".into(),
            version: "2.2.0".into(),
            build: "201907041034".into(),
            name: "KM2".into(),
            features: String::new(),
        }))
    }

    fn two_headers() -> Value {
        json!({
            "headers": [
                {
                    "id": "00_0010_7E11_10_0100",
                    "description": "DeltaSol MX [Regler]",
                    "source_name": "DeltaSol MX [Regler]",
                    "destination_name": "DFA",
                    "fields": [
                        { "id": "000_2_0", "name": "Temperature sensor 1", "unit": " °C" },
                        { "id": "002_2_0", "name": "Temperature sensor 2", "unit": " °C" },
                        { "id": "076_4_0", "name": "Operating hours relay 1", "unit": " h" }
                    ]
                },
                {
                    "id": "00_0010_7E11_10_0200",
                    "description": "DeltaSol MX [WMZ]",
                    "source_name": "DeltaSol MX [WMZ#1]",
                    "destination_name": "DFA",
                    "fields": [
                        { "id": "000_4_0", "name": "System date", "unit": "" },
                        { "id": "004_4_0", "name": "Version", "unit": "" }
                    ]
                }
            ],
            "headersets": [{
                "timestamp": 1_700_000_000.5,
                "packets": [
                    { "field_values": [
                        { "raw_value": 23.456 },
                        { "raw_value": 61.0 },
                        { "raw_value": 4711 }
                    ]},
                    { "field_values": [
                        { "raw_value": 86400 },
                        { "raw_value": "2.11" }
                    ]}
                ]
            }]
        })
    }

    #[test]
    fn one_record_per_field_with_composite_ids() {
        let snap = normalize(&two_headers(), &device()).expect("well-formed");

        assert_eq!(snap.len(), 5);
        let ids: Vec<&str> = snap.records.keys().map(String::as_str).collect();
        assert_eq!(
            ids,
            vec![
                "00_0010_7E11_10_0100__000_2_0",
                "00_0010_7E11_10_0100__002_2_0",
                "00_0010_7E11_10_0100__076_4_0",
                "00_0010_7E11_10_0200__000_4_0",
                "00_0010_7E11_10_0200__004_4_0",
            ]
        );
    }

    #[test]
    fn record_fields_are_normalized() {
        let snap = normalize(&two_headers(), &device()).expect("well-formed");
        let rec = snap.get("00_0010_7E11_10_0100__000_2_0").expect("present");

        assert_eq!(rec.name, "temperature_sensor_1");
        assert_eq!(rec.value, TelemetryValue::Number(23.46));
        assert_eq!(rec.unit, "°C");
        assert_eq!(rec.description, "DeltaSol MX [Regler]");
        assert_eq!(rec.bus_source, "DeltaSol MX [Regler]");
        assert_eq!(rec.bus_destination, "DFA");
        assert!(!rec.is_diagnostic());
        assert!(Arc::ptr_eq(&rec.device, &snap.device));
    }

    #[test]
    fn integers_stay_integers() {
        let snap = normalize(&two_headers(), &device()).expect("well-formed");
        let rec = snap.by_name("operating_hours_relay_1").expect("present");
        assert_eq!(rec.value, TelemetryValue::Integer(4711));
        assert_eq!(rec.unit, "h");
    }

    #[test]
    fn whole_floats_stay_numbers() {
        let snap = normalize(&two_headers(), &device()).expect("well-formed");
        let rec = snap.by_name("temperature_sensor_2").expect("present");
        assert_eq!(rec.value, TelemetryValue::Number(61.0));
    }

    #[test]
    fn date_fields_decode_from_2001_epoch() {
        let snap = normalize(&two_headers(), &device()).expect("well-formed");
        let rec = snap.by_name("system_date").expect("present");
        assert_eq!(
            rec.value,
            TelemetryValue::Timestamp(Utc.with_ymd_and_hms(2001, 1, 2, 0, 0, 0).unwrap())
        );
        assert!(rec.is_diagnostic());
    }

    #[test]
    fn date_marker_ignores_case() {
        let mut raw = two_headers();
        raw["headers"][1]["fields"][0]["name"] = json!("System DATE");

        let snap = normalize(&raw, &device()).expect("well-formed");
        let rec = snap.by_name("system_date").expect("present");
        assert_eq!(
            rec.value,
            TelemetryValue::Timestamp(Utc.with_ymd_and_hms(2001, 1, 2, 0, 0, 0).unwrap())
        );
        assert!(matches!(
            coerce_value("datum", &json!(86400)),
            Ok(TelemetryValue::Integer(86400))
        ));
    }

    #[test]
    fn date_zero_is_epoch_anchor() {
        let n = Number::from(0);
        assert_eq!(
            decode_date(&n).unwrap(),
            Utc.with_ymd_and_hms(2001, 1, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn fractional_date_keeps_milliseconds() {
        let n = Number::from_f64(1.5).unwrap();
        let ts = decode_date(&n).unwrap();
        assert_eq!(ts.timestamp_millis(), DATE_EPOCH_SECS * 1000 + 1500);
    }

    #[test]
    fn strings_pass_through() {
        let snap = normalize(&two_headers(), &device()).expect("well-formed");
        let rec = snap.by_name("version").expect("present");
        assert_eq!(rec.value, TelemetryValue::Text("2.11".into()));
    }

    #[test]
    fn rounding_to_two_decimals() {
        assert_eq!(round2(23.456), 23.46);
        assert_eq!(round2(-4.444), -4.44);
        assert_eq!(round2(0.125_1), 0.13);
        assert_eq!(round2(100.0), 100.0);
    }

    #[test]
    fn exact_halves_round_to_even() {
        assert_eq!(round2(0.125), 0.12);
        assert_eq!(round2(0.375), 0.38);
        assert_eq!(round2(-0.125), -0.12);
        // 2.675 is stored just below the midpoint
        assert_eq!(round2(2.675), 2.67);
    }

    #[test]
    fn packet_count_mismatch_is_malformed() {
        let mut raw = two_headers();
        raw["headersets"][0]["packets"].as_array_mut().unwrap().pop();

        let err = normalize(&raw, &device()).unwrap_err();
        assert!(matches!(err, CoreError::MalformedResponse { .. }), "{err:?}");
    }

    #[test]
    fn field_value_count_mismatch_is_malformed() {
        let mut raw = two_headers();
        raw["headersets"][0]["packets"][0]["field_values"]
            .as_array_mut()
            .unwrap()
            .push(json!({ "raw_value": 1 }));

        let err = normalize(&raw, &device()).unwrap_err();
        assert!(matches!(err, CoreError::MalformedResponse { .. }), "{err:?}");
    }

    #[test]
    fn missing_headersets_is_malformed() {
        let raw = json!({ "headers": [], "headersets": [] });
        let err = normalize(&raw, &device()).unwrap_err();
        assert!(matches!(err, CoreError::MalformedResponse { .. }), "{err:?}");
    }

    #[test]
    fn missing_keys_are_malformed() {
        let raw = json!({ "headers": [{ "id": "a" }] });
        let err = normalize(&raw, &device()).unwrap_err();
        assert!(matches!(err, CoreError::MalformedResponse { .. }), "{err:?}");
    }

    #[test]
    fn duplicate_ids_are_malformed() {
        let raw = json!({
            "headers": [{
                "id": "h",
                "fields": [
                    { "id": "f", "name": "A", "unit": "" },
                    { "id": "f", "name": "B", "unit": "" }
                ]
            }],
            "headersets": [{ "packets": [{ "field_values": [
                { "raw_value": 1 }, { "raw_value": 2 }
            ]}]}]
        });
        let err = normalize(&raw, &device()).unwrap_err();
        assert!(matches!(err, CoreError::MalformedResponse { .. }), "{err:?}");
    }

    #[test]
    fn unsupported_value_shape_is_malformed() {
        let raw = json!({
            "headers": [{ "id": "h", "fields": [{ "id": "f", "name": "A", "unit": "" }] }],
            "headersets": [{ "packets": [{ "field_values": [{ "raw_value": [1, 2] }] }] }]
        });
        let err = normalize(&raw, &device()).unwrap_err();
        assert!(matches!(err, CoreError::MalformedResponse { .. }), "{err:?}");
    }

    #[test]
    fn identity_derives_mac_from_serial() {
        assert_eq!(device().mac_address, "00:1E:3D:00:12:AB");
        assert_eq!(device().firmware_build, "201907041034");
    }
}
