// ── Device identity ──

use serde::Serialize;

use deltasol_api::{Product, Protocol};

/// Who we are talking to. Detected once per `Controller` and shared by
/// every record through an `Arc`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceIdentity {
    pub product: Product,
    /// Product string as reported, lower-cased. Differs from `product`
    /// for families we do not support.
    pub product_name: String,
    pub vendor: String,
    pub serial_number: String,
    pub firmware_version: String,
    pub firmware_build: String,
    pub display_name: String,
    pub feature_flags: String,
    /// Serial number grouped in pairs (`00:1E:3D:…`). Display only.
    pub mac_address: String,
}

impl DeviceIdentity {
    pub fn protocol(&self) -> Option<Protocol> {
        self.product.protocol()
    }

    /// Human-facing title: the configured device name, or the product.
    pub fn title(&self) -> String {
        if self.display_name.is_empty() {
            format!("Resol {}", self.product_name.to_uppercase())
        } else {
            self.display_name.clone()
        }
    }
}

/// Insert `:` after every second character of a serial number.
pub fn mac_from_serial(serial: &str) -> String {
    let chars: Vec<char> = serial.chars().collect();
    chars
        .chunks(2)
        .map(|pair| pair.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join(":")
}
