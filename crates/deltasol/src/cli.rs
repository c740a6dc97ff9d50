//! Clap derive structures for the `deltasol` CLI.
//!
//! Also compiled by `build.rs` for man page generation, so this file
//! may only depend on `clap` and `clap_complete`.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// deltasol -- read live telemetry from Resol solar controllers
#[derive(Debug, Parser)]
#[command(
    name = "deltasol",
    version,
    about = "Read live telemetry from Resol Deltasol data loggers",
    long_about = "Reads live measurements from Resol KM2, DL2, DL2Plus and DL3 \
        data loggers over the local network.\n\n\
        The product family is detected automatically; KM2 and DL2Plus are read \
        through the JSON-RPC webservice, DL2 and DL3 through the DLX live download.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Device profile to use
    #[arg(long, short = 'p', env = "DELTASOL_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Device host or IP, optionally host:port (overrides profile)
    #[arg(long, short = 'H', env = "DELTASOL_HOST", global = true)]
    pub host: Option<String>,

    /// Device HTTP port
    #[arg(long, env = "DELTASOL_PORT", global = true)]
    pub port: Option<u16>,

    /// Username for the device web interface
    #[arg(long, short = 'u', env = "DELTASOL_USERNAME", global = true)]
    pub username: Option<String>,

    /// Password for the device web interface (read from the environment)
    #[arg(
        long,
        env = "DELTASOL_PASSWORD",
        global = true,
        hide = true,
        hide_env_values = true
    )]
    pub password: Option<String>,

    /// DLX filter id (DL2/DL3 only)
    #[arg(long, env = "DELTASOL_FILTER", global = true)]
    pub filter: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "DELTASOL_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Per-request timeout in seconds
    #[arg(long, env = "DELTASOL_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Identify the device (product, serial, firmware)
    Detect,

    /// Fetch one snapshot of all measurements
    #[command(alias = "r")]
    Read(ReadArgs),

    /// Poll the device periodically and print each snapshot
    #[command(alias = "w")]
    Watch(WatchArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Read / Watch ─────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ReadArgs {
    /// Only show records whose name contains this text (repeatable)
    #[arg(long, short = 'n')]
    pub name: Vec<String>,

    /// Include diagnostic fields (those without a unit)
    #[arg(long, short = 'a')]
    pub all: bool,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    #[command(flatten)]
    pub read: ReadArgs,

    /// Refresh interval in seconds (minimum 60; default from config)
    #[arg(long, short = 'i')]
    pub interval: Option<u64>,

    /// Stop after this many snapshots
    #[arg(long, short = 'c')]
    pub count: Option<u32>,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current configuration (passwords masked)
    Show,

    /// Set a value on the active profile
    Set {
        /// Profile key (host, port, username, password_env, filter_id, scan_interval, timeout)
        key: String,

        /// Value to set
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Store a password in the system keyring
    SetPassword {
        /// Profile to store the password for (defaults to the active profile)
        #[arg(long)]
        profile: Option<String>,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
