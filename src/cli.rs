//! Command-line interface parsing for castcall
//!
//! This module handles parsing of CLI arguments using clap, with environment
//! variable fallbacks for every setting, and turns them into [`Settings`].

use clap::{Parser, Subcommand, ValueEnum};
use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

use crate::genai::{DEFAULT_API_BASE, DEFAULT_MODEL};

/// Default listen address for `serve`
pub const DEFAULT_BIND: &str = "127.0.0.1:8080";

/// Default application namespace in document paths
pub const DEFAULT_APP_ID: &str = "default-app-id";

/// Error types for CLI argument handling
#[derive(Debug, Error)]
pub enum CliError {
    /// No API key was given on the command line or in the environment
    #[error("Missing API key: pass --api-key or set GEMINI_API_KEY")]
    MissingApiKey,

    /// The file store was selected but no directory could be determined
    #[error("Cannot determine a store directory: pass --store-dir or set CASTCALL_STORE_DIR")]
    NoStoreDir,
}

/// Which document store backs the actor fee cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreKind {
    /// In-process store, lost on exit
    Memory,
    /// JSON files on disk
    File,
}

/// castcall - AI-backed casting for book-to-film adaptations
#[derive(Parser, Debug)]
#[command(name = "castcall")]
#[command(about = "Actor fees, book analysis and movie results for the casting game")]
#[command(version)]
pub struct Cli {
    /// API key for the generative-AI endpoint
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    /// Model variant to call
    #[arg(long, env = "CASTCALL_MODEL", default_value = DEFAULT_MODEL, global = true)]
    pub model: String,

    /// Base URL of the API, including the version segment
    #[arg(long, env = "CASTCALL_API_BASE", default_value = DEFAULT_API_BASE, global = true)]
    pub api_base: String,

    /// Application id used in cache document paths
    #[arg(long, env = "CASTCALL_APP_ID", default_value = DEFAULT_APP_ID, global = true)]
    pub app_id: String,

    /// Document store for the actor fee cache
    #[arg(
        long,
        env = "CASTCALL_STORE",
        value_enum,
        default_value_t = StoreKind::File,
        global = true
    )]
    pub store: StoreKind,

    /// Directory for the file store (defaults to the XDG cache directory)
    #[arg(long, env = "CASTCALL_STORE_DIR", global = true)]
    pub store_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// What to run
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Serve the HTTP endpoints
    Serve {
        /// Address to listen on
        #[arg(long, env = "CASTCALL_BIND", default_value = DEFAULT_BIND)]
        bind: SocketAddr,
    },
    /// Look up booking fees for one or more actors
    ///
    /// Examples:
    ///   castcall fee "Tom Hanks"
    ///   castcall fee "Tom Hanks" "Meryl Streep"
    Fee {
        /// Actor names
        #[arg(required = true, value_name = "ACTOR", value_parser = parse_actor_name)]
        actors: Vec<String>,
    },
}

/// Rejects actor names that are empty once trimmed
fn parse_actor_name(raw: &str) -> Result<String, String> {
    if raw.trim().is_empty() {
        Err("actor name cannot be blank".to_string())
    } else {
        Ok(raw.to_string())
    }
}

/// Where the cache documents live
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreSettings {
    /// In-process store
    Memory,
    /// File store rooted at a directory, or the XDG default when `None`
    File(Option<PathBuf>),
}

/// Configuration derived from CLI arguments and environment
#[derive(Clone, PartialEq, Eq)]
pub struct Settings {
    /// API key for the generative-AI endpoint
    pub api_key: String,
    /// Model variant
    pub model: String,
    /// API base URL
    pub api_base: String,
    /// Application id for cache paths
    pub app_id: String,
    /// Cache store selection
    pub store: StoreSettings,
    /// Command to run
    pub command: Command,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("api_base", &self.api_base)
            .field("app_id", &self.app_id)
            .field("store", &self.store)
            .field("command", &self.command)
            .finish()
    }
}

impl Settings {
    /// Creates Settings from parsed CLI arguments.
    ///
    /// # Arguments
    /// * `cli` - The parsed CLI struct
    ///
    /// # Returns
    /// * `Ok(Settings)` with every value resolved
    /// * `Err(CliError)` if the API key is missing or blank
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let api_key = cli
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(CliError::MissingApiKey)?
            .to_string();

        let store = match cli.store {
            StoreKind::Memory => StoreSettings::Memory,
            StoreKind::File => StoreSettings::File(cli.store_dir.clone()),
        };

        Ok(Settings {
            api_key,
            model: cli.model.clone(),
            api_base: cli.api_base.clone(),
            app_id: cli.app_id.clone(),
            store,
            command: cli.command.clone(),
        })
    }
}
