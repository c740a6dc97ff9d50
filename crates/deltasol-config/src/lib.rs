//! Shared configuration for deltasol front ends.
//!
//! TOML profiles, password resolution (env + keyring + plaintext),
//! and translation to `deltasol_core::DeviceConfig`. The CLI layers
//! its flag overrides on top.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use deltasol_core::DeviceConfig;
use deltasol_core::config::{
    DEFAULT_CYCLE_TIMEOUT, DEFAULT_PORT, DEFAULT_REQUEST_TIMEOUT, DEFAULT_SCAN_INTERVAL,
};

/// Service name under which passwords are stored in the system keyring.
pub const KEYRING_SERVICE: &str = "deltasol";
/// Environment prefix for config overrides.
pub const ENV_PREFIX: &str = "DELTASOL_";
pub const PASSWORD_ENV: &str = "DELTASOL_PASSWORD";
pub const USERNAME_ENV: &str = "DELTASOL_USERNAME";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found in config")]
    UnknownProfile { name: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when `--profile` is not given.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named device profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Look up a profile by name.
    pub fn profile(&self, name: &str) -> Result<&Profile, ConfigError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::UnknownProfile { name: name.into() })
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Refresh interval for `watch`, in seconds.
    #[serde(default = "default_scan_interval")]
    pub scan_interval: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            timeout: default_timeout(),
            scan_interval: default_scan_interval(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT.as_secs()
}
fn default_scan_interval() -> u64 {
    DEFAULT_SCAN_INTERVAL.as_secs()
}

/// A named device profile.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct Profile {
    /// Hostname or IP, optionally `host:port`.
    pub host: String,

    pub port: Option<u16>,

    pub username: Option<String>,

    /// Password (plaintext; prefer keyring or `password_env`).
    pub password: Option<String>,

    /// Environment variable name containing the password.
    pub password_env: Option<String>,

    /// DLX filter id.
    pub filter_id: Option<String>,

    /// Override `defaults.scan_interval`.
    pub scan_interval: Option<u64>,

    /// Override `defaults.timeout`.
    pub timeout: Option<u64>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("", "", "deltasol").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("deltasol");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit path. A missing file yields the defaults.
///
/// Nested keys are addressed with a double underscore, e.g.
/// `DELTASOL_DEFAULTS__TIMEOUT=20`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    debug!(path = %path.display(), "loading config");

    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if loading fails.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Host parsing ────────────────────────────────────────────────────

/// Split `host:port` into its parts.
///
/// Hosts with a scheme are returned unchanged (the URL parser handles
/// them). Bare IPv6 literals are left alone; bracketed ones split.
pub fn split_host_port(raw: &str) -> Result<(String, Option<u16>), ConfigError> {
    let raw = raw.trim();
    if raw.contains("://") {
        return Ok((raw.to_owned(), None));
    }

    match raw.rsplit_once(':') {
        Some((host, port)) if !host.contains(':') || host.ends_with(']') => {
            let port = port.parse::<u16>().map_err(|_| ConfigError::Validation {
                field: "host".into(),
                reason: format!("invalid port in '{raw}'"),
            })?;
            Ok((host.to_owned(), Some(port)))
        }
        _ => Ok((raw.to_owned(), None)),
    }
}

// ── Credential resolution (without CLI flags) ───────────────────────

/// Resolve the username: profile value, then `DELTASOL_USERNAME`.
pub fn resolve_username(profile: &Profile) -> Option<String> {
    profile
        .username
        .clone()
        .or_else(|| std::env::var(USERNAME_ENV).ok())
        .filter(|u| !u.is_empty())
}

/// Resolve the password from the credential chain.
///
/// `None` means the device is read anonymously.
pub fn resolve_password(profile: &Profile, profile_name: &str) -> Option<SecretString> {
    password_chain(
        profile,
        profile_name,
        |name| std::env::var(name).ok(),
        keyring_password,
    )
}

fn password_chain(
    profile: &Profile,
    profile_name: &str,
    env: impl Fn(&str) -> Option<String>,
    stored: impl Fn(&str) -> Option<String>,
) -> Option<SecretString> {
    // 1. Profile's password_env → env var lookup
    if let Some(pw) = profile.password_env.as_deref().and_then(&env) {
        return Some(SecretString::from(pw));
    }

    // 2. Global env var
    if let Some(pw) = env(PASSWORD_ENV) {
        return Some(SecretString::from(pw));
    }

    // 3. System keyring
    if let Some(pw) = stored(profile_name) {
        return Some(SecretString::from(pw));
    }

    // 4. Plaintext in config
    profile.password.clone().map(SecretString::from)
}

fn keyring_entry(profile_name: &str) -> Result<keyring::Entry, keyring::Error> {
    keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/password"))
}

fn keyring_password(profile_name: &str) -> Option<String> {
    match keyring_entry(profile_name).and_then(|entry| entry.get_password()) {
        Ok(pw) => Some(pw),
        Err(e) => {
            debug!(profile = profile_name, error = %e, "no keyring password");
            None
        }
    }
}

/// Store a profile's password in the system keyring.
pub fn store_password(profile_name: &str, password: &str) -> Result<(), ConfigError> {
    keyring_entry(profile_name)?.set_password(password)?;
    Ok(())
}

// ── Translation ─────────────────────────────────────────────────────

/// Build a `DeviceConfig` from a profile, with no flag overrides.
pub fn profile_to_device_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<DeviceConfig, ConfigError> {
    let (host, embedded_port) = split_host_port(&profile.host)?;
    if host.is_empty() {
        return Err(ConfigError::Validation {
            field: "host".into(),
            reason: format!("profile '{profile_name}' has no host"),
        });
    }

    let port = profile.port.or(embedded_port).or(Some(DEFAULT_PORT));
    let timeout = profile.timeout.unwrap_or(defaults.timeout);
    let scan_interval = profile.scan_interval.unwrap_or(defaults.scan_interval);
    let filter_id = validate_filter(profile.filter_id.as_deref())?;

    Ok(DeviceConfig {
        host,
        port,
        username: resolve_username(profile),
        password: resolve_password(profile, profile_name),
        filter_id,
        request_timeout: Duration::from_secs(timeout),
        cycle_timeout: DEFAULT_CYCLE_TIMEOUT,
        scan_interval: Duration::from_secs(scan_interval),
    })
}

/// DLX filter ids are numeric (`"05"`); blank means no filter.
fn validate_filter(raw: Option<&str>) -> Result<Option<String>, ConfigError> {
    let Some(filter) = raw.map(str::trim).filter(|f| !f.is_empty()) else {
        return Ok(None);
    };
    if !filter.chars().all(|c| c.is_ascii_digit()) {
        return Err(ConfigError::Validation {
            field: "filter_id".into(),
            reason: format!("'{filter}' is not a numeric filter id"),
        });
    }
    Ok(Some(filter.to_owned()))
}
