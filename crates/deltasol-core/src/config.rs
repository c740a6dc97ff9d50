// ── Runtime connection configuration ──
//
// Describes *how* to reach one Resol device. Carries credential data
// and timing, but never touches disk. Front ends (CLI, host glue)
// construct a `DeviceConfig` and hand it in.

use std::time::Duration;

use secrecy::SecretString;

use deltasol_api::Credentials;

/// Port the device web interface listens on out of the box.
pub const DEFAULT_PORT: u16 = 80;
/// Budget for one whole detect + fetch + normalize cycle.
pub const DEFAULT_CYCLE_TIMEOUT: Duration = Duration::from_secs(60);
/// Budget for a single HTTP request inside a cycle.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = deltasol_api::transport::DEFAULT_REQUEST_TIMEOUT;
pub const DEFAULT_SCAN_INTERVAL: Duration = Duration::from_secs(300);
/// Polling floor; shorter intervals are clamped to this.
pub const MIN_SCAN_INTERVAL: Duration = Duration::from_secs(60);

/// Configuration for polling a single device.
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    /// Hostname or IP address, optionally with an `http://` scheme.
    pub host: String,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<SecretString>,
    /// DLX filter id, appended as `filter=` when credentials are present.
    pub filter_id: Option<String>,
    pub request_timeout: Duration,
    pub cycle_timeout: Duration,
    /// How often the coordinator refreshes. Clamped to [`MIN_SCAN_INTERVAL`].
    pub scan_interval: Duration,
}

impl DeviceConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }

    /// Credentials for the protocol drivers, when both halves are set.
    pub fn credentials(&self) -> Option<Credentials> {
        Credentials::from_parts(self.username.clone(), self.password.clone())
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: Some(DEFAULT_PORT),
            username: None,
            password: None,
            filter_id: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            cycle_timeout: DEFAULT_CYCLE_TIMEOUT,
            scan_interval: DEFAULT_SCAN_INTERVAL,
        }
    }
}
