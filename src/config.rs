//! Process configuration for the desktop shell.
//!
//! Values come from environment variables, optionally seeded from a `.env`
//! file one directory above the executable:
//! ```text
//! <install>/.env
//! <install>/<bin dir>/agent-playground-desktop
//! <install>/<bin dir>/dist/index.html
//! ```
//!
//! The configuration is built once in [`crate::run`] and handed to the server
//! and window controller by reference. Nothing reads the environment after
//! startup.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;

use crate::error::ConfigError;

pub const HOST_VAR: &str = "DESKTOP_APP_HOST";
pub const PORT_VAR: &str = "DESKTOP_APP_PORT";
pub const DIST_VAR: &str = "DESKTOP_APP_DIST";
pub const READY_TIMEOUT_VAR: &str = "DESKTOP_APP_READY_TIMEOUT_MS";

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 10088;

/// Name of the document served for any path that matches no file.
pub const INDEX_DOCUMENT: &str = "index.html";

// ---------- Types ----------

/// Where the Local Server listens and what it serves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub root_dir: PathBuf,
}

impl ServerConfig {
    /// Host as it appears in an authority: IPv6 literals get brackets.
    fn authority_host(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        }
    }

    /// `host:port`, suitable for binding and connecting.
    pub fn address(&self) -> String {
        format!("{}:{}", self.authority_host(), self.port)
    }

    /// URL the window navigates to.
    pub fn url(&self) -> String {
        format!("http://{}:{}/", self.authority_host(), self.port)
    }

    pub fn index_path(&self) -> PathBuf {
        self.root_dir.join(INDEX_DOCUMENT)
    }

    /// Check that the static root can be served.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the root is missing, is not a directory, cannot be
    /// listed, or lacks the index document.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let path = &self.root_dir;
        let meta = fs::metadata(path).map_err(|e| root_access_error(path, e))?;
        if !meta.is_dir() {
            return Err(ConfigError::RootNotDirectory { path: path.clone() });
        }
        fs::read_dir(path).map_err(|source| ConfigError::UnreadableRoot {
            path: path.clone(),
            source,
        })?;
        if !self.index_path().is_file() {
            return Err(ConfigError::MissingIndex { path: path.clone() });
        }
        Ok(())
    }
}

/// Settings of the single native window.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowConfig {
    pub title: String,
    pub width: f64,
    pub height: f64,
    pub min_width: f64,
    pub min_height: f64,
    pub resizable: bool,
    pub fullscreen: bool,
    pub confirm_close: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Agent Playground".to_string(),
            width: 1200.0,
            height: 800.0,
            min_width: 800.0,
            min_height: 600.0,
            resizable: true,
            fullscreen: false,
            confirm_close: true,
        }
    }
}

/// Bounds of the readiness gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessPolicy {
    /// Give up once this much time has passed since the first attempt.
    pub timeout: Duration,
    /// Pause between failed attempts.
    pub interval: Duration,
    /// Upper bound for a single connection attempt.
    pub connect_timeout: Duration,
}

impl Default for ReadinessPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            interval: Duration::from_millis(100),
            connect_timeout: Duration::from_millis(250),
        }
    }
}

/// Everything [`crate::run`] needs, built once at process entry.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub window: WindowConfig,
    pub readiness: ReadinessPolicy,
}

impl AppConfig {
    /// Load `.env` next to the install directory, then read the process
    /// environment.
    pub fn load() -> Result<Self, ConfigError> {
        let exe_dir = executable_dir()?;
        load_dotenv(&exe_dir);
        Self::from_lookup(&exe_dir, |key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    ///
    /// `base_dir` is the directory the default static root is resolved
    /// against. Empty values count as unset.
    pub fn from_lookup<F>(base_dir: &Path, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let host = read(HOST_VAR).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match read(PORT_VAR) {
            // Port 0 would bind a random port the window cannot know.
            Some(value) => value
                .parse::<u16>()
                .ok()
                .filter(|port| *port != 0)
                .ok_or(ConfigError::InvalidPort {
                    var: PORT_VAR,
                    value,
                })?,
            None => DEFAULT_PORT,
        };
        let root_dir = read(DIST_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| base_dir.join("dist"));

        let mut readiness = ReadinessPolicy::default();
        if let Some(value) = read(READY_TIMEOUT_VAR) {
            let ms = value
                .parse::<u64>()
                .ok()
                .filter(|ms| *ms > 0)
                .ok_or(ConfigError::InvalidTimeout {
                    var: READY_TIMEOUT_VAR,
                    value,
                })?;
            readiness.timeout = Duration::from_millis(ms);
        }

        Ok(Self {
            server: ServerConfig {
                host,
                port,
                root_dir,
            },
            window: WindowConfig::default(),
            readiness,
        })
    }
}

fn root_access_error(path: &Path, source: io::Error) -> ConfigError {
    match source.kind() {
        io::ErrorKind::NotFound => ConfigError::MissingRoot {
            path: path.to_path_buf(),
        },
        _ => ConfigError::UnreadableRoot {
            path: path.to_path_buf(),
            source,
        },
    }
}

/// Directory containing the running executable.
fn executable_dir() -> Result<PathBuf, ConfigError> {
    let exe = std::env::current_exe().map_err(ConfigError::ExecutableDir)?;
    Ok(exe
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(".")))
}

/// Seed the process environment from `<exe_dir>/../.env` if it exists.
///
/// Variables already present in the environment win over the file.
fn load_dotenv(exe_dir: &Path) {
    let Some(path) = exe_dir.parent().map(|p| p.join(".env")) else {
        return;
    };
    if !path.is_file() {
        log::debug!("[config] no .env at {}", path.display());
        return;
    }
    match dotenvy::from_path(&path) {
        Ok(()) => log::info!("[config] loaded {}", path.display()),
        Err(e) => log::warn!("[config] ignoring malformed {}: {e}", path.display()),
    }
}
