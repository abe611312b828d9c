//! Clap derive structures for the `univent` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// univent -- check-in station for UniVent events
#[derive(Debug, Parser)]
#[command(
    name = "univent",
    version,
    about = "Check attendees in to UniVent events from the command line",
    long_about = "Operator tools for the UniVent university event platform.\n\n\
        Runs an interactive check-in station fed by a barcode scanner or\n\
        typed ticket codes, and validates single tickets for scripting.",
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
    /// Backend profile to use
    #[arg(long, short = 'p', env = "UNIVENT_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Backend base URL (overrides profile)
    #[arg(long, env = "UNIVENT_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Pre-issued bearer token (skips password login)
    #[arg(long, env = "UNIVENT_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// Login email (overrides profile)
    #[arg(long, env = "UNIVENT_EMAIL", global = true)]
    pub email: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "UNIVENT_OUTPUT",
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

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "UNIVENT_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "UNIVENT_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable tables and banners (default)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON (one object per line)
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
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
    /// Run an interactive check-in station for one event
    #[command(alias = "ci")]
    Checkin(CheckinArgs),

    /// Validate a single ticket code
    Validate(ValidateArgs),

    /// Show the authenticated account
    Whoami,

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Check-in ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CheckinArgs {
    /// Event identifier
    #[arg(long, short = 'e')]
    pub event: String,

    /// Start in manual entry mode instead of scanning
    #[arg(long, short = 'm')]
    pub manual: bool,

    /// Barcode scanner device (repeatable; overrides the profile's list)
    #[arg(long, short = 'd')]
    pub device: Vec<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ValidateArgs {
    /// Ticket code as printed or encoded on the ticket
    pub code: String,

    /// Event identifier
    #[arg(long, short = 'e')]
    pub event: String,
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

    /// Display current resolved configuration
    Show,

    /// Set a profile value
    Set {
        /// Profile key (api_url, email, password_env, token_env, ca_cert, insecure, timeout, scanner_devices)
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

    /// Store the active profile's password in the system keyring
    SetPassword,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
