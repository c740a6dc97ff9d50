//! CLI configuration -- thin wrapper around `deltasol_config`.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides
//! (--host, --port, --username, --filter, --timeout).

use clap::ValueEnum;
use clap::parser::ValueSource;
use secrecy::SecretString;

use deltasol_core::DeviceConfig;

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use deltasol_config::{
    Config, Profile, config_path, load_config_or_default, save_config, store_password,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Comma-separated profile names for error help text.
pub fn available_profiles(config: &Config) -> String {
    let mut names: Vec<_> = config.profiles.keys().cloned().collect();
    if names.is_empty() {
        return "(none)".into();
    }
    names.sort();
    names.join(", ")
}

/// Use `[defaults] output` when `--output` was left at its built-in default.
pub fn apply_default_output(
    global: &mut GlobalOpts,
    source: Option<ValueSource>,
    config: &Config,
) -> Result<(), CliError> {
    if source != Some(ValueSource::DefaultValue) {
        return Ok(());
    }
    global.output = OutputFormat::from_str(&config.defaults.output, true).map_err(|reason| {
        CliError::Validation {
            field: "defaults.output".into(),
            reason,
        }
    })?;
    Ok(())
}

/// Build a `DeviceConfig` from the config file, profile, and CLI overrides.
pub fn build_device_config(global: &GlobalOpts) -> Result<DeviceConfig, CliError> {
    let cfg = load_config_or_default();
    resolve_device_config(&cfg, global)
}

pub fn resolve_device_config(cfg: &Config, global: &GlobalOpts) -> Result<DeviceConfig, CliError> {
    let profile_name = active_profile_name(global, cfg);

    let mut profile = match cfg.profiles.get(&profile_name) {
        Some(profile) => profile.clone(),
        // An explicitly requested profile has to exist
        None if global.profile.is_some() => {
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: available_profiles(cfg),
            });
        }
        None if global.host.is_some() => Profile::default(),
        None => {
            return Err(CliError::NoConfig {
                path: config_path().display().to_string(),
            });
        }
    };

    apply_overrides(&mut profile, global);

    let mut device = deltasol_config::profile_to_device_config(&profile, &profile_name, &cfg.defaults)?;
    if let Some(ref pw) = global.password {
        device.password = Some(SecretString::from(pw.clone()));
    }
    Ok(device)
}

/// Flag values win over the profile.
fn apply_overrides(profile: &mut Profile, global: &GlobalOpts) {
    if let Some(ref host) = global.host {
        profile.host.clone_from(host);
        // A new host invalidates the profile's port unless one is given
        profile.port = None;
    }
    if global.port.is_some() {
        profile.port = global.port;
    }
    if global.username.is_some() {
        profile.username.clone_from(&global.username);
    }
    if global.filter.is_some() {
        profile.filter_id.clone_from(&global.filter);
    }
    if global.timeout.is_some() {
        profile.timeout = global.timeout;
    }
}
