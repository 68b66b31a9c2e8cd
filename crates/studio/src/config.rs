// Command-line configuration (flags with environment fallbacks)

use clap::{Parser, Subcommand, ValueEnum};
use openreel_core::domain::AspectRatio;
use openreel_infra_kling::DEFAULT_BASE_URL;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_DB_PATH: &str = "~/.openreel/studio.db";
const DEFAULT_HISTORY_LIMIT: usize = 20;

#[derive(Parser, Debug)]
#[command(name = "openreel")]
#[command(about = "OpenReel video generation studio", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// SQLite database path
    #[arg(long, global = true, env = "OPENREEL_DB_PATH", default_value = DEFAULT_DB_PATH)]
    pub db_path: String,

    /// Kling API root
    #[arg(long, global = true, env = "OPENREEL_KLING_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub kling_base_url: String,

    /// Processing time of the simulated provider (seconds)
    #[arg(long, global = true, env = "OPENREEL_MOCK_DURATION_SECS", default_value_t = 2)]
    pub mock_duration_secs: u64,

    /// Per-request HTTP timeout (seconds)
    #[arg(long, global = true, env = "OPENREEL_HTTP_TIMEOUT_SECS", default_value_t = 30)]
    pub http_timeout_secs: u64,

    /// Log output format
    #[arg(long, global = true, env = "OPENREEL_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a video and follow it to completion (Ctrl+C cancels)
    Generate {
        /// Text prompt
        prompt: String,

        /// Aspect ratio: 16:9, 9:16 or 1:1
        #[arg(short, long, default_value = "16:9")]
        aspect_ratio: AspectRatio,

        /// Clip length in seconds (1-10)
        #[arg(short, long, default_value_t = 4)]
        duration: u8,
    },

    /// List recent generations, newest first
    History {
        /// Maximum number of records
        #[arg(short = 'n', long, default_value_t = DEFAULT_HISTORY_LIMIT)]
        limit: usize,

        /// Print records as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete a generation record
    Delete {
        /// Generation ID
        id: String,
    },

    /// Manage provider credentials
    Keys {
        #[command(subcommand)]
        action: KeysCommand,
    },

    /// Manage the output folder
    OutputFolder {
        #[command(subcommand)]
        action: OutputFolderCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum KeysCommand {
    /// Store Kling keys (a blank value clears that key)
    Set {
        #[arg(long)]
        access_key: Option<String>,

        #[arg(long)]
        secret_key: Option<String>,
    },

    /// Remove both Kling keys
    Clear,

    /// Show which provider will be used
    Status,
}

#[derive(Subcommand, Debug)]
pub enum OutputFolderCommand {
    /// Remember an output folder
    Set { path: PathBuf },

    /// Print the remembered output folder
    Show,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl Cli {
    /// Database location with `~` expanded
    pub fn database_path(&self) -> String {
        shellexpand::tilde(&self.db_path).into_owned()
    }

    pub fn is_in_memory(&self) -> bool {
        self.db_path.contains(":memory:")
    }

    pub fn mock_duration(&self) -> Duration {
        Duration::from_secs(self.mock_duration_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}
