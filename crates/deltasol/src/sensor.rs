//! Presentation metadata for telemetry records.
//!
//! Pure lookups over the unit string: icon, device class, state class.
//! Records without a unit are diagnostic attributes.

use serde::Serialize;

use deltasol_core::{TelemetryRecord, TelemetryValue};

const DEFAULT_ICON: &str = "mdi:flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DeviceClass {
    Temperature,
    PowerFactor,
    Power,
    Energy,
    Duration,
    Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StateClass {
    Measurement,
    TotalIncreasing,
}

pub fn icon(unit: &str) -> &'static str {
    match unit {
        "°C" => "mdi:thermometer",
        "%" => "mdi:gauge",
        "h" => "mdi:timer",
        "Wh" | "kWh" => "mdi:lightning-bolt",
        _ => DEFAULT_ICON,
    }
}

pub fn device_class(unit: &str, value: &TelemetryValue) -> Option<DeviceClass> {
    if value.is_timestamp() {
        return Some(DeviceClass::Timestamp);
    }
    match unit {
        "°C" => Some(DeviceClass::Temperature),
        "%" => Some(DeviceClass::PowerFactor),
        "W" | "kW" => Some(DeviceClass::Power),
        "Wh" | "kWh" => Some(DeviceClass::Energy),
        "h" => Some(DeviceClass::Duration),
        _ => None,
    }
}

pub fn state_class(class: Option<DeviceClass>) -> Option<StateClass> {
    match class? {
        DeviceClass::Temperature | DeviceClass::Power => Some(StateClass::Measurement),
        DeviceClass::Energy | DeviceClass::Duration => Some(StateClass::TotalIncreasing),
        DeviceClass::PowerFactor | DeviceClass::Timestamp => None,
    }
}

/// A record as shown to the user: value plus presentation metadata.
#[derive(Debug, Clone, Serialize)]
pub struct SensorView {
    pub unique_id: String,
    pub name: String,
    pub value: TelemetryValue,
    pub unit: String,
    pub icon: &'static str,
    pub device_class: Option<DeviceClass>,
    pub state_class: Option<StateClass>,
    pub diagnostic: bool,
    pub description: String,
    pub source: String,
    pub destination: String,
}

impl From<&TelemetryRecord> for SensorView {
    fn from(r: &TelemetryRecord) -> Self {
        let device_class = device_class(&r.unit, &r.value);
        Self {
            unique_id: r.unique_id.clone(),
            name: r.name.clone(),
            value: r.value.clone(),
            unit: r.unit.clone(),
            icon: icon(&r.unit),
            device_class,
            state_class: state_class(device_class),
            diagnostic: r.is_diagnostic(),
            description: r.description.clone(),
            source: r.bus_source.clone(),
            destination: r.bus_destination.clone(),
        }
    }
}
