// Wire types for the Resol device API
//
// `DeviceInformation` comes from the text probe; `LiveData` is the
// header/field/packet structure shared by the webservice
// `dataGetCurrentData` result and the DLX live download.

use serde::{Deserialize, Deserializer, Serialize, de};
use serde_json::Value;

use crate::auth::Protocol;

// ── Product ─────────────────────────────────────────────────────────

/// Product family reported by the device information probe.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Product {
    Km2,
    Dl2,
    Dl2Plus,
    Dl3,
    Unknown,
}

impl Product {
    /// Map the reported `product` string onto a known family.
    pub fn from_reported(raw: &str) -> Self {
        raw.trim().parse().unwrap_or(Self::Unknown)
    }

    /// Wire protocol for this family. `None` for [`Unknown`](Self::Unknown).
    pub fn protocol(self) -> Option<Protocol> {
        match self {
            Self::Km2 | Self::Dl2Plus => Some(Protocol::WebService),
            Self::Dl2 | Self::Dl3 => Some(Protocol::Dlx),
            Self::Unknown => None,
        }
    }
}

// ── Device information ──────────────────────────────────────────────

/// Identity fields extracted from `/cgi-bin/get_resol_device_information`.
///
/// Only `product` is mandatory; the remaining fields default to empty
/// strings when the firmware does not report them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInformation {
    pub product: Product,
    /// Lower-cased `product` value exactly as reported.
    pub product_name: String,
    pub vendor: String,
    pub serial: String,
    pub version: String,
    pub build: String,
    pub name: String,
    pub features: String,
}

// ── Live data ───────────────────────────────────────────────────────

/// Header/packet structure returned by both protocols.
///
/// Values are correlated to field definitions by position:
/// `headers[i].fields[j]` ↔ `headersets[0].packets[i].field_values[j]`.
#[derive(Debug, Clone, Deserialize)]
pub struct LiveData {
    pub headers: Vec<Header>,
    pub headersets: Vec<HeaderSet>,
}

/// One bus packet description.
#[derive(Debug, Clone, Deserialize)]
pub struct Header {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default, deserialize_with = "string_or_null")]
    pub description: String,
    #[serde(default, deserialize_with = "string_or_null")]
    pub destination_name: String,
    #[serde(default, deserialize_with = "string_or_null")]
    pub source_name: String,
    pub fields: Vec<FieldDef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FieldDef {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
    pub unit: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HeaderSet {
    pub packets: Vec<Packet>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Packet {
    pub field_values: Vec<FieldValue>,
}

/// A single measured value. Loosely typed on the wire.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldValue {
    pub raw_value: Value,
}

// ── Webservice envelope ─────────────────────────────────────────────

/// One element of a JSON-RPC style reply array.
#[derive(Debug, Deserialize)]
pub(crate) struct RpcReply<T> {
    pub result: Option<T>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginResult {
    #[serde(rename = "authId")]
    pub auth_id: Option<String>,
}

// ── Serde helpers ───────────────────────────────────────────────────

/// Device-assigned identifiers are usually strings but some firmware
/// emits plain numbers.
fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(de::Error::custom(format!(
            "expected string or number identifier, got {other}"
        ))),
    }
}

fn string_or_null<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
