//! Configuration loading and management.
//!
//! Sources, lowest to highest priority: built-in defaults, a YAML file,
//! environment variables, then CLI flags (applied by the binary).
//!
//! ## Environment Variables
//! - `TASK_TRACKER_CONFIG` - Config file path
//! - `TASK_TRACKER_DB_PATH` - Database path
//! - `TASK_TRACKER_HOST` - Bind address
//! - `TASK_TRACKER_PORT` - Bind port
//! - `TASK_TRACKER_ENV` - `development` or `production`
//! - `TASK_TRACKER_API_URL` - Base URL used by client commands

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Default config file location, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "task-tracker/config.yaml";

/// Default port for the HTTP API.
pub const DEFAULT_PORT: u16 = 3001;

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub client: ClientConfig,
}

/// Server-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind (0 picks a free port).
    #[serde(default = "default_port")]
    pub port: u16,

    /// Deployment environment; controls error detail in responses.
    #[serde(default)]
    pub environment: Environment,

    /// Allow cross-origin requests from any origin.
    #[serde(default = "default_cors")]
    pub cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            host: default_host(),
            port: default_port(),
            environment: Environment::default(),
            cors: default_cors(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("task-tracker/tasks.db")
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_cors() -> bool {
    true
}

/// Client-side configuration for the store-driven commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the task API (without the `/tasks` suffix).
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

fn default_base_url() -> String {
    format!("http://127.0.0.1:{}", DEFAULT_PORT)
}

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    /// Whether internal error causes may be sent to clients.
    pub fn exposes_internal_errors(&self) -> bool {
        matches!(self, Environment::Development)
    }
}

impl FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => anyhow::bail!("Unknown environment '{}'", other),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Resolve configuration from an explicit path, the environment, or defaults.
    ///
    /// An explicitly named file must exist; the default location is optional.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        let vars: HashMap<String, String> = std::env::vars().collect();
        Self::resolve_with(explicit, &vars)
    }

    /// Same as [`Config::resolve`] with an explicit variable set (for testing).
    pub fn resolve_with(explicit: Option<&Path>, vars: &HashMap<String, String>) -> Result<Self> {
        let from_env = vars.get("TASK_TRACKER_CONFIG").map(PathBuf::from);
        let mut config = match explicit.map(Path::to_path_buf).or(from_env) {
            Some(path) => Self::load(path)?,
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => Self::load(DEFAULT_CONFIG_PATH)?,
            None => Self::default(),
        };
        config.apply_env(vars)?;
        Ok(config)
    }

    /// Apply `TASK_TRACKER_*` overrides.
    pub fn apply_env(&mut self, vars: &HashMap<String, String>) -> Result<()> {
        if let Some(db_path) = vars.get("TASK_TRACKER_DB_PATH") {
            self.server.db_path = PathBuf::from(db_path);
        }

        if let Some(host) = vars.get("TASK_TRACKER_HOST") {
            self.server.host = host.clone();
        }

        if let Some(port) = vars.get("TASK_TRACKER_PORT") {
            self.server.port = port
                .parse()
                .with_context(|| format!("Invalid TASK_TRACKER_PORT '{}'", port))?;
        }

        if let Some(env) = vars.get("TASK_TRACKER_ENV") {
            self.server.environment = env.parse()?;
        }

        if let Some(url) = vars.get("TASK_TRACKER_API_URL") {
            self.client.base_url = url.clone();
        }

        Ok(())
    }

    /// Ensure the database directory exists.
    pub fn ensure_db_dir(&self) -> Result<()> {
        if let Some(parent) = self.server.db_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}
