use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use tracing::{debug, info};

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: default_host(), port: default_port(), worker_threads: Some(4) }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_notes_file")]
    pub notes_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { data_dir: default_data_dir(), notes_file: default_notes_file() }
    }
}

fn default_host() -> String { "127.0.0.1".into() }
fn default_port() -> u16 { 3000 }
fn default_data_dir() -> PathBuf { PathBuf::from("data") }
fn default_notes_file() -> String { "notes.json".into() }

/// `CONFIG_PATH`, or `config.toml` in the working directory.
pub fn config_path() -> PathBuf {
    std::env::var("CONFIG_PATH").map(PathBuf::from).unwrap_or_else(|_| PathBuf::from("config.toml"))
}

fn parse_toml(path: &Path, content: &str) -> Result<AppConfig> {
    toml::from_str(content).with_context(|| format!("parsing {}", path.display()))
}

impl AppConfig {
    /// Build a config purely from environment variables, used when no config file exists.
    ///
    /// Reads `SERVER_HOST`, `SERVER_PORT` (or `PORT`), `TOKIO_WORKER_THREADS`,
    /// `NOTES_DATA_DIR` and `NOTES_FILE`.
    pub fn from_env() -> Result<Self> {
        let mut cfg = AppConfig::default();
        if let Ok(host) = std::env::var("SERVER_HOST") {
            cfg.server.host = host;
        }
        let port = std::env::var("SERVER_PORT").or_else(|_| std::env::var("PORT"));
        if let Ok(port) = port {
            cfg.server.port = port
                .parse::<u16>()
                .map_err(|e| anyhow!("invalid port {port:?}: {e}"))?;
        }
        cfg.server.worker_threads = std::env::var("TOKIO_WORKER_THREADS")
            .ok()
            .and_then(|v| v.parse::<usize>().ok());
        if let Ok(dir) = std::env::var("NOTES_DATA_DIR") {
            cfg.storage.data_dir = PathBuf::from(dir);
        }
        if let Ok(file) = std::env::var("NOTES_FILE") {
            cfg.storage.notes_file = file;
        }
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    /// Config file first, environment second.
    pub fn load() -> Result<Self> {
        Self::load_from(config_path())
    }

    /// Read and validate the TOML file at `path`. Only a missing file falls
    /// back to [`AppConfig::from_env`]; a file that exists but cannot be read,
    /// parsed or validated is an error.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "no config file; reading environment");
                return Self::from_env();
            }
            Err(e) => return Err(e).with_context(|| format!("reading {}", path.display())),
        };
        let mut cfg = parse_toml(path, &content)?;
        cfg.normalize_and_validate()
            .with_context(|| format!("validating {}", path.display()))?;
        info!(path = %path.display(), "configuration loaded");
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        self.storage.validate()?;
        Ok(())
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = default_host();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be within 1..=65535"));
        }
        match self.worker_threads {
            Some(w) if w > 0 => {}
            _ => self.worker_threads = Some(4),
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl StorageConfig {
    pub fn validate(&self) -> Result<()> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(anyhow!("storage.data_dir must not be empty"));
        }
        if self.notes_file.trim().is_empty() {
            return Err(anyhow!("storage.notes_file must not be empty"));
        }
        Ok(())
    }

    /// Full path of the notes JSON document.
    pub fn notes_path(&self) -> PathBuf {
        self.data_dir.join(&self.notes_file)
    }
}
