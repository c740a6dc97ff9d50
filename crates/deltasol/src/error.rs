//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and distinct exit codes.

use miette::Diagnostic;
use thiserror::Error;

use deltasol_config::ConfigError;
use deltasol_core::CoreError;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const UNSUPPORTED: i32 = 4;
    pub const MALFORMED: i32 = 5;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach device at {url}")]
    #[diagnostic(
        code(deltasol::unreachable),
        help(
            "Check that the data logger is powered and reachable from this machine.\n\
             Reason: {reason}"
        )
    )]
    Unreachable { url: String, reason: String },

    #[error("Device did not identify itself")]
    #[diagnostic(
        code(deltasol::detection_failed),
        help(
            "The host answered, but not like a Resol data logger.\n\
             Check --host and --port. {message}"
        )
    )]
    DetectionFailed { message: String },

    #[error("Product '{product}' is not supported")]
    #[diagnostic(
        code(deltasol::unsupported_product),
        help("Supported products: KM2, DL2, DL2Plus, DL3.")
    )]
    UnsupportedProduct { product: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed")]
    #[diagnostic(
        code(deltasol::auth_failed),
        help(
            "{message}\n\
             Verify username and password, or run: deltasol config set-password"
        )
    )]
    AuthFailed { message: String },

    // ── Data ─────────────────────────────────────────────────────────
    #[error("Device returned malformed data: {message}")]
    #[diagnostic(
        code(deltasol::malformed),
        help("Re-run with -vv to log the request; the firmware may be unsupported.")
    )]
    Malformed { message: String },

    // ── Timeout ──────────────────────────────────────────────────────
    #[error("Timed out after {seconds}s")]
    #[diagnostic(
        code(deltasol::timeout),
        help("Increase the timeout with --timeout or check device responsiveness.")
    )]
    Timeout { seconds: u64 },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(deltasol::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("No device configured")]
    #[diagnostic(
        code(deltasol::no_config),
        help(
            "Pass --host, set DELTASOL_HOST, or create a profile with: deltasol config init\n\
             Expected config at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(deltasol::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: deltasol config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error(transparent)]
    #[diagnostic(code(deltasol::config))]
    Config(ConfigError),

    // ── IO ───────────────────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Unreachable { .. } | Self::DetectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } => exit_code::AUTH,
            Self::UnsupportedProduct { .. } => exit_code::UNSUPPORTED,
            Self::Malformed { .. } => exit_code::MALFORMED,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. } | Self::NoConfig { .. } => exit_code::USAGE,
            Self::ProfileNotFound { .. } | Self::Config(_) | Self::Io(_) => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::DeviceUnreachable { url, reason } => CliError::Unreachable { url, reason },
            CoreError::DetectionFailed { message } => CliError::DetectionFailed { message },
            CoreError::UnsupportedProduct { product } => CliError::UnsupportedProduct { product },
            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },
            CoreError::MalformedResponse { message } => CliError::Malformed { message },
            CoreError::Timeout { timeout_secs } => CliError::Timeout {
                seconds: timeout_secs,
            },
            CoreError::Config { message } => CliError::Validation {
                field: "host".into(),
                reason: message,
            },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            other => CliError::Config(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_errors_keep_distinct_exit_codes() {
        let cases = [
            (
                CoreError::DeviceUnreachable {
                    url: "http://x/".into(),
                    reason: "refused".into(),
                },
                exit_code::CONNECTION,
            ),
            (
                CoreError::AuthenticationFailed {
                    message: "no authId".into(),
                },
                exit_code::AUTH,
            ),
            (
                CoreError::UnsupportedProduct {
                    product: "vbus".into(),
                },
                exit_code::UNSUPPORTED,
            ),
            (
                CoreError::MalformedResponse {
                    message: "bad".into(),
                },
                exit_code::MALFORMED,
            ),
            (CoreError::Timeout { timeout_secs: 60 }, exit_code::TIMEOUT),
        ];

        for (core, code) in cases {
            assert_eq!(CliError::from(core).exit_code(), code);
        }
    }

    #[test]
    fn config_validation_is_usage_error() {
        let err = CliError::from(ConfigError::Validation {
            field: "host".into(),
            reason: "empty".into(),
        });
        assert_eq!(err.exit_code(), exit_code::USAGE);
    }
}
