// ── Core error types ──
//
// The polling-cycle taxonomy. Hosts see one of these per failed cycle;
// none of them is fatal to the process. The `From<deltasol_api::Error>`
// impl folds wire-level failures into these kinds.

use thiserror::Error;

/// Unified error type for one fetch cycle.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Reachability ─────────────────────────────────────────────────
    #[error("Cannot reach device at {url}: {reason}")]
    DeviceUnreachable { url: String, reason: String },

    #[error("Device did not report a product identity: {message}")]
    DetectionFailed { message: String },

    #[error("Polling cycle timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Device support ───────────────────────────────────────────────
    #[error("Unsupported product '{product}'")]
    UnsupportedProduct { product: String },

    // ── Credentials ──────────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    // ── Data ─────────────────────────────────────────────────────────
    #[error("Malformed response: {message}")]
    MalformedResponse { message: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    /// Returns `true` if the next cycle may succeed without user action.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::DeviceUnreachable { .. } | Self::DetectionFailed { .. } | Self::Timeout { .. }
        )
    }

    /// Returns `true` if the user has to revisit the credentials.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::AuthenticationFailed { .. })
    }

    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            message: message.into(),
        }
    }
}

// ── Conversion from wire-level errors ────────────────────────────────

impl From<deltasol_api::Error> for CoreError {
    fn from(err: deltasol_api::Error) -> Self {
        match err {
            deltasol_api::Error::Unreachable { url, reason } => {
                CoreError::DeviceUnreachable { url, reason }
            }
            deltasol_api::Error::DetectionFailed { body_preview } => CoreError::DetectionFailed {
                message: format!("no product entry in probe body {body_preview:?}"),
            },
            deltasol_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            deltasol_api::Error::Transport(e) => {
                // The reqwest message embeds the URL, which may carry the DLX password.
                let url = e
                    .url()
                    .map_or_else(|| "<unknown>".into(), deltasol_api::redact_url);
                let reason = if e.is_timeout() {
                    "request timed out".to_owned()
                } else {
                    e.without_url().to_string()
                };
                CoreError::DeviceUnreachable { url, reason }
            }
            deltasol_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid device URL: {e}"),
            },
            deltasol_api::Error::Client(message) => CoreError::Config { message },
            deltasol_api::Error::Deserialization { message, body: _ } => {
                CoreError::MalformedResponse { message }
            }
        }
    }
}
