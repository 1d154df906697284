//! CLI argument definitions for the Startpage binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Storage backend type
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Backend {
    /// SQLite database (default, production-ready)
    Sqlite,
    /// PostgreSQL database (for shared deployments)
    Postgres,
    /// In-memory with JSON persistence (for development and ephemeral deployments)
    Inmemory,
}

/// Startpage: personal start pages of ordered link sections
#[derive(Parser, Debug)]
#[command(name = "startpage")]
#[command(about = "Startpage: personal start pages built from ordered sections of links")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the Startpage web server
    Serve(ServeArgs),
    /// Send the daily summary mail to staff
    Digest(DigestArgs),
    /// Manage accounts
    Users(UsersArgs),
    /// Show or change the site settings
    Settings(SettingsArgs),
    /// Manage the color schemes accounts can pick from
    Themes(ThemesArgs),
    /// Check health of a running Startpage server
    Health(HealthArgs),
}

/// Where accounts and pages are stored
#[derive(clap::Args, Debug, Clone)]
pub struct BackendConfig {
    /// Storage backend to use
    #[arg(short, long, default_value = "sqlite", env = "STARTPAGE_BACKEND")]
    pub backend: Backend,

    /// Data directory for storage files.
    /// For SQLite: stores startpage.db
    /// For InMemory: stores startpage.json
    #[arg(short = 'D', long, env = "STARTPAGE_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// PostgreSQL connection URL (required when backend=postgres)
    #[arg(long, env = "STARTPAGE_POSTGRES_URL")]
    pub postgres_url: Option<String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Sqlite,
            data_dir: None,
            postgres_url: None,
        }
    }
}

impl BackendConfig {
    /// The data directory, defaulting to the working directory.
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }
}

/// Arguments for the serve command
#[derive(clap::Args, Debug)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(short, long, default_value_t = 3000, env = "STARTPAGE_PORT")]
    pub port: u16,

    /// Bind address
    #[arg(long, default_value = "0.0.0.0", env = "STARTPAGE_HOST")]
    pub host: String,

    #[command(flatten)]
    pub backend_config: BackendConfig,

    /// ntfy server base URL, e.g. https://ntfy.sh
    #[arg(long, env = "NTFY_BASE_URL")]
    pub ntfy_base_url: Option<String>,

    /// ntfy topic that receives event notifications
    #[arg(long, env = "NTFY_TOPIC")]
    pub ntfy_topic: Option<String>,
}

impl Default for ServeArgs {
    fn default() -> Self {
        Self {
            port: 3000,
            host: "0.0.0.0".to_string(),
            backend_config: BackendConfig::default(),
            ntfy_base_url: None,
            ntfy_topic: None,
        }
    }
}

/// Arguments for the digest command
#[derive(clap::Args, Debug)]
pub struct DigestArgs {
    #[command(flatten)]
    pub backend_config: BackendConfig,

    /// Offset of the reporting time zone from UTC, in hours
    #[arg(long, default_value_t = 0, env = "STARTPAGE_UTC_OFFSET_HOURS", allow_negative_numbers = true)]
    pub utc_offset_hours: i32,

    /// Sender address of the summary mail
    #[arg(long, default_value = "startpage@localhost", env = "STARTPAGE_FROM_EMAIL")]
    pub from_email: String,

    /// Directory the rendered mails are written to.
    /// Defaults to `outbox` inside the data directory.
    #[arg(long, env = "STARTPAGE_OUTBOX_DIR")]
    pub outbox: Option<PathBuf>,
}

/// Arguments for the users command
#[derive(clap::Args, Debug)]
pub struct UsersArgs {
    #[command(subcommand)]
    pub command: UsersCommand,
}

#[derive(Subcommand, Debug)]
pub enum UsersCommand {
    /// List registered accounts
    List(UsersListArgs),
    /// Create an account, optionally with staff rights
    Create(UsersCreateArgs),
}

/// Arguments for the `users list` command
#[derive(clap::Args, Debug)]
pub struct UsersListArgs {
    #[command(flatten)]
    pub backend_config: BackendConfig,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `users create` command
#[derive(clap::Args, Debug)]
pub struct UsersCreateArgs {
    #[command(flatten)]
    pub backend_config: BackendConfig,

    /// Login name
    pub username: String,

    /// Email address; staff accounts need one to receive the daily mail
    #[arg(long, default_value = "")]
    pub email: String,

    /// Login password
    #[arg(long, env = "STARTPAGE_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Grant staff rights
    #[arg(long)]
    pub staff: bool,
}

/// Arguments for the settings command
#[derive(clap::Args, Debug)]
pub struct SettingsArgs {
    #[command(subcommand)]
    pub command: SettingsCommand,
}

#[derive(Subcommand, Debug)]
pub enum SettingsCommand {
    /// Print the current site settings
    Show(SettingsShowArgs),
    /// Change individual switches; unspecified ones keep their value
    Set(SettingsSetArgs),
}

/// Arguments for the `settings show` command
#[derive(clap::Args, Debug)]
pub struct SettingsShowArgs {
    #[command(flatten)]
    pub backend_config: BackendConfig,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `settings set` command
#[derive(clap::Args, Debug)]
pub struct SettingsSetArgs {
    #[command(flatten)]
    pub backend_config: BackendConfig,

    /// Send ntfy notifications for new accounts and imports
    #[arg(long, value_name = "BOOL")]
    pub ntfy: Option<bool>,

    /// Send the daily summary mail
    #[arg(long, value_name = "BOOL")]
    pub daily_mail: Option<bool>,

    /// List new registrations in the daily summary mail
    #[arg(long, value_name = "BOOL")]
    pub include_registrations: Option<bool>,
}

/// Arguments for the themes command
#[derive(clap::Args, Debug)]
pub struct ThemesArgs {
    #[command(subcommand)]
    pub command: ThemesCommand,
}

#[derive(Subcommand, Debug)]
pub enum ThemesCommand {
    /// List color schemes
    List(ThemesListArgs),
    /// Add a color scheme
    Add(ThemesAddArgs),
    /// Delete a color scheme; accounts using it fall back to none
    Delete(ThemesDeleteArgs),
}

/// Arguments for the `themes list` command
#[derive(clap::Args, Debug)]
pub struct ThemesListArgs {
    #[command(flatten)]
    pub backend_config: BackendConfig,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `themes add` command
#[derive(clap::Args, Debug)]
pub struct ThemesAddArgs {
    #[command(flatten)]
    pub backend_config: BackendConfig,

    /// Display name
    pub name: String,

    /// Mark as a dark theme
    #[arg(long)]
    pub dark: bool,

    /// Swatch color for the theme picker; repeat for several
    #[arg(long = "preview", value_name = "COLOR")]
    pub preview_colors: Vec<String>,

    /// CSS custom property declarations
    #[arg(long, conflicts_with = "css_file")]
    pub css: Option<String>,

    /// Read the CSS custom property declarations from a file
    #[arg(long)]
    pub css_file: Option<PathBuf>,
}

/// Arguments for the `themes delete` command
#[derive(clap::Args, Debug)]
pub struct ThemesDeleteArgs {
    #[command(flatten)]
    pub backend_config: BackendConfig,

    /// Id of the scheme, as shown by `themes list`
    pub id: i64,
}

/// Arguments for the health command
#[derive(clap::Args, Debug)]
pub struct HealthArgs {
    /// Base URL of the server to check
    #[arg(long, default_value = "http://127.0.0.1:3000", env = "STARTPAGE_URL")]
    pub url: String,

    /// Timeout in seconds
    #[arg(short, long, default_value_t = 5)]
    pub timeout: u64,
}
