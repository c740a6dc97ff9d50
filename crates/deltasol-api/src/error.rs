use thiserror::Error;

/// Top-level error type for the `deltasol-api` crate.
///
/// Covers every wire-level failure across the detection probe, the
/// webservice (KM2 / DL2Plus) and the DLX download endpoint.
/// `deltasol-core` folds these into its polling-cycle taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    // ── Reachability ────────────────────────────────────────────────
    /// The device answered the probe with something other than HTTP 200.
    /// A wrong host/port is indistinguishable from an offline device.
    #[error("Device unreachable at {url}: {reason}")]
    Unreachable { url: String, reason: String },

    // ── Detection ───────────────────────────────────────────────────
    /// The probe succeeded but the body carried no `product` entry.
    #[error("Device did not report a product identity")]
    DetectionFailed { body_preview: String },

    // ── Authentication ──────────────────────────────────────────────
    /// Missing credentials, rejected credentials, or a login/data reply
    /// without the expected keys. The wire format does not let us tell
    /// these apart.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    Client(String),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this error indicates the credentials need attention.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }
}

/// Truncate a response body for inclusion in error messages.
pub(crate) fn preview(body: &str) -> String {
    body.chars().take(200).collect()
}
