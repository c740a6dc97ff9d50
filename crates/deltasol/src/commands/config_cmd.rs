//! Config subcommand handlers.

use std::fmt::Write;

use dialoguer::{Confirm, Input, Select};
use secrecy::SecretString;

use deltasol_core::{Controller, DeviceConfig};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

const MASK: &str = "****";

/// Copy of the config with plaintext passwords masked.
fn redacted(cfg: &Config) -> Config {
    let mut copy = cfg.clone();
    for profile in copy.profiles.values_mut() {
        if profile.password.is_some() {
            profile.password = Some(MASK.into());
        }
    }
    copy
}

/// Format config for display as TOML-like text.
fn format_config(cfg: &Config) -> String {
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(out, "timeout = {}", cfg.defaults.timeout);
    let _ = writeln!(out, "scan_interval = {}", cfg.defaults.scan_interval);

    let mut names: Vec<_> = cfg.profiles.keys().collect();
    names.sort();
    for name in names {
        let p = &cfg.profiles[name];
        let _ = writeln!(out);
        let _ = writeln!(out, "[profiles.{name}]");
        let _ = writeln!(out, "host = \"{}\"", p.host);
        if let Some(port) = p.port {
            let _ = writeln!(out, "port = {port}");
        }
        if let Some(ref u) = p.username {
            let _ = writeln!(out, "username = \"{u}\"");
        }
        if let Some(ref pw) = p.password {
            let _ = writeln!(out, "password = \"{pw}\"");
        }
        if let Some(ref env) = p.password_env {
            let _ = writeln!(out, "password_env = \"{env}\"");
        }
        if let Some(ref filter) = p.filter_id {
            let _ = writeln!(out, "filter_id = \"{filter}\"");
        }
        if let Some(interval) = p.scan_interval {
            let _ = writeln!(out, "scan_interval = {interval}");
        }
        if let Some(timeout) = p.timeout {
            let _ = writeln!(out, "timeout = {timeout}");
        }
    }

    out
}

fn save(cfg: &Config) -> Result<(), CliError> {
    config::save_config(cfg)?;
    Ok(())
}

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn parse_number<T: std::str::FromStr>(field: &str, value: &str) -> Result<T, CliError> {
    value.parse().map_err(|_| CliError::Validation {
        field: field.into(),
        reason: format!("'{value}' is not a valid number"),
    })
}

/// Offer to store the password in the system keyring.
///
/// Returns `Some(password)` if the user chose plaintext, `None` if stored in keyring.
fn prompt_password_storage(profile_name: &str, password: &str) -> Result<Option<String>, CliError> {
    let choices = &[
        "Store in system keyring (recommended)",
        "Save to config file (plaintext)",
    ];
    let selection = Select::new()
        .with_prompt("Where to store the password?")
        .items(choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    if selection == 0 {
        config::store_password(profile_name, password)?;
        eprintln!("   ✓ Password stored in system keyring");
        Ok(None)
    } else {
        Ok(Some(password.to_owned()))
    }
}

/// Probe the device so typos surface before the profile is saved.
async fn probe(profile: &Profile, password: Option<&str>) -> Result<String, CliError> {
    let (host, embedded_port) = deltasol_config::split_host_port(&profile.host)?;
    let device = DeviceConfig {
        port: profile.port.or(embedded_port).or(Some(deltasol_core::config::DEFAULT_PORT)),
        username: profile.username.clone(),
        password: password.map(|p| SecretString::from(p.to_owned())),
        ..DeviceConfig::new(host)
    };
    let identity = Controller::new(device)?.detect().await?;
    Ok(format!(
        "{} (serial {})",
        identity.product_name.to_uppercase(),
        identity.serial_number
    ))
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init => init().await,

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = redacted(&config::load_config_or_default());
            let out = output::render_single(&global.output, &cfg, format_config, |_| {
                config::config_path().display().to_string()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Set <key> <value> ───────────────────────────────────────
        ConfigCommand::Set { key, value } => {
            let mut cfg = config::load_config_or_default();
            let profile_name = config::active_profile_name(global, &cfg);
            let profile = cfg.profiles.entry(profile_name.clone()).or_default();

            match key.as_str() {
                "host" => profile.host = value,
                "port" => profile.port = Some(parse_number("port", &value)?),
                "username" => profile.username = Some(value),
                "password" => profile.password = Some(value),
                "password_env" | "password-env" => profile.password_env = Some(value),
                "filter_id" | "filter-id" | "filter" => profile.filter_id = Some(value),
                "scan_interval" | "scan-interval" => {
                    profile.scan_interval = Some(parse_number("scan_interval", &value)?);
                }
                "timeout" => profile.timeout = Some(parse_number("timeout", &value)?),
                other => {
                    return Err(CliError::Validation {
                        field: other.into(),
                        reason: format!(
                            "unknown config key '{other}'. Valid keys: host, port, username, \
                             password, password_env, filter_id, scan_interval, timeout"
                        ),
                    });
                }
            }

            save(&cfg)?;
            if !global.quiet {
                eprintln!("✓ Set {key} on profile '{profile_name}'");
            }
            Ok(())
        }

        // ── Profiles ────────────────────────────────────────────────
        ConfigCommand::Profiles => {
            let cfg = config::load_config_or_default();
            let default = cfg.default_profile.as_deref().unwrap_or("default");
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured. Run: deltasol config init");
            } else {
                let mut names: Vec<_> = cfg.profiles.keys().collect();
                names.sort();
                for name in names {
                    let marker = if name == default { " *" } else { "" };
                    println!("{name}{marker}");
                }
            }
            Ok(())
        }

        // ── Use <name> ──────────────────────────────────────────────
        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config_or_default();
            if !cfg.profiles.contains_key(&name) {
                return Err(CliError::ProfileNotFound {
                    available: config::available_profiles(&cfg),
                    name,
                });
            }

            cfg.default_profile = Some(name.clone());
            save(&cfg)?;
            if !global.quiet {
                eprintln!("✓ Default profile set to '{name}'");
            }
            Ok(())
        }

        // ── SetPassword ─────────────────────────────────────────────
        ConfigCommand::SetPassword { profile } => {
            let cfg = config::load_config_or_default();
            let profile_name = profile.unwrap_or_else(|| config::active_profile_name(global, &cfg));
            if !cfg.profiles.contains_key(&profile_name) {
                return Err(CliError::ProfileNotFound {
                    available: config::available_profiles(&cfg),
                    name: profile_name,
                });
            }

            let secret = rpassword::prompt_password("Password: ").map_err(prompt_err)?;
            if secret.is_empty() {
                return Err(CliError::Validation {
                    field: "password".into(),
                    reason: "value cannot be empty".into(),
                });
            }
            config::store_password(&profile_name, &secret)?;

            eprintln!("✓ Password stored in system keyring for profile '{profile_name}'");
            Ok(())
        }
    }
}

// ── Init: interactive wizard ────────────────────────────────────────

async fn init() -> Result<(), CliError> {
    let config_path = config::config_path();
    eprintln!("deltasol configuration wizard");
    eprintln!("   Config path: {}\n", config_path.display());

    // 1. Profile name
    let profile_name: String = Input::new()
        .with_prompt("Profile name")
        .default("default".into())
        .interact_text()
        .map_err(prompt_err)?;

    // 2. Host (host or host:port)
    let host: String = Input::new()
        .with_prompt("Device host (IP or name, optionally host:port)")
        .interact_text()
        .map_err(prompt_err)?;
    // Validate early
    deltasol_config::split_host_port(&host)?;

    // 3. Credentials; empty username means anonymous reads
    let username: String = Input::new()
        .with_prompt("Username (leave empty for anonymous)")
        .allow_empty(true)
        .interact_text()
        .map_err(prompt_err)?;

    let (username, password) = if username.is_empty() {
        (None, None)
    } else {
        let pw = rpassword::prompt_password("Password: ").map_err(prompt_err)?;
        (Some(username), Some(pw).filter(|p| !p.is_empty()))
    };

    // 4. DLX filter
    let filter_id: String = Input::new()
        .with_prompt("DLX filter id (DL2/DL3 only, leave empty for none)")
        .allow_empty(true)
        .interact_text()
        .map_err(prompt_err)?;

    let mut profile = Profile {
        host,
        username,
        filter_id: Some(filter_id).filter(|f| !f.trim().is_empty()),
        ..Profile::default()
    };

    // 5. Validate against the device
    eprintln!("\n   Contacting device...");
    match probe(&profile, password.as_deref()).await {
        Ok(found) => eprintln!("   ✓ Found {found}"),
        Err(e) => {
            eprintln!("   ✗ {e}");
            let keep = Confirm::new()
                .with_prompt("Save the profile anyway?")
                .default(false)
                .interact()
                .map_err(prompt_err)?;
            if !keep {
                return Err(e);
            }
        }
    }

    // 6. Password storage
    if let Some(ref pw) = password {
        profile.password = prompt_password_storage(&profile_name, pw)?;
    }

    // 7. Merge into existing config and write
    let mut cfg = config::load_config_or_default();
    cfg.profiles.insert(profile_name.clone(), profile);
    cfg.default_profile = Some(profile_name.clone());
    save(&cfg)?;

    eprintln!("\n✓ Configuration written to {}", config_path.display());
    eprintln!("  Active profile: {profile_name}");
    eprintln!("\n  Test it: deltasol read");

    Ok(())
}
