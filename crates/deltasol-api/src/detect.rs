// Product detection
//
// Probes the fixed device-information endpoint and pulls the identity
// out of its `key = "value"` text with independent pattern matches.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use reqwest::StatusCode;
use tracing::{debug, info};

use crate::client::DeviceClient;
use crate::error::{Error, preview};
use crate::models::{DeviceInformation, Product};

pub const DEVICE_INFORMATION_PATH: &str = "/cgi-bin/get_resol_device_information";

static KEY_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)\b([A-Za-z_]+)\s*=\s*"([^"]*)""#).expect("key/value pattern is valid")
});

impl DeviceClient {
    /// Probe the device and identify its product family.
    ///
    /// `GET /cgi-bin/get_resol_device_information`
    ///
    /// - transport failure → [`Error::Transport`]
    /// - status other than 200 → [`Error::Unreachable`]
    /// - 200 without a `product` entry → [`Error::DetectionFailed`]
    ///
    /// Single attempt; caching is the caller's concern.
    pub async fn device_information(&self) -> Result<DeviceInformation, Error> {
        let url = self.endpoint(DEVICE_INFORMATION_PATH)?;
        let resp = self.get(url.clone()).await?;

        let status = resp.status();
        if status != StatusCode::OK {
            return Err(Error::Unreachable {
                url: url.to_string(),
                reason: format!("device information probe returned HTTP {status}"),
            });
        }

        let body = resp.text().await.map_err(Error::Transport)?;
        let info = DeviceInformation::parse(&body).ok_or_else(|| Error::DetectionFailed {
            body_preview: preview(&body),
        })?;

        info!(
            product = %info.product,
            vendor = %info.vendor,
            version = %info.version,
            "detected device"
        );
        Ok(info)
    }
}

impl DeviceInformation {
    /// Extract identity fields from the probe body.
    ///
    /// Returns `None` when no `product` entry is present. When a key
    /// appears more than once the first occurrence wins.
    pub fn parse(body: &str) -> Option<Self> {
        let mut fields: HashMap<String, String> = HashMap::new();
        for caps in KEY_VALUE.captures_iter(body) {
            let key = caps[1].to_ascii_lowercase();
            fields.entry(key).or_insert_with(|| caps[2].trim().to_owned());
        }

        let product_name = fields.remove("product")?.to_lowercase();
        debug!(product = %product_name, "device information parsed");
        let mut take = |key: &str| fields.remove(key).unwrap_or_default();

        Some(Self {
            product: Product::from_reported(&product_name),
            vendor: take("vendor"),
            serial: take("serial"),
            version: take("version"),
            build: take("build"),
            name: take("name"),
            features: take("features"),
            product_name,
        })
    }
}
