//! Error taxonomy for the desktop shell.
//!
//! Anything that would leave a window open without a backing server is a
//! [`StartupError`] and ends the process. Errors confined to one optional
//! action ([`BridgeError`], [`PlatformError`]) are logged where they happen.

use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Environment or filesystem configuration is unusable.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?} is not a port number")]
    InvalidPort { var: &'static str, value: String },
    #[error("invalid value for {var}: {value:?} is not a number of milliseconds")]
    InvalidTimeout { var: &'static str, value: String },
    #[error("static root {path} does not exist")]
    MissingRoot { path: PathBuf },
    #[error("static root {path} is not a directory")]
    RootNotDirectory { path: PathBuf },
    #[error("static root {path} is not readable: {source}")]
    UnreadableRoot {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("static root {path} has no index.html")]
    MissingIndex { path: PathBuf },
    #[error("{url:?} is not a valid window URL: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("cannot locate the executable directory: {0}")]
    ExecutableDir(#[source] io::Error),
}

/// The Local Server could not start or stopped serving.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("cannot bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },
    #[error("cannot start server runtime: {0}")]
    Runtime(#[source] io::Error),
    #[error("server loop failed: {0}")]
    Serve(#[source] io::Error),
    #[error("server thread exited before reporting its bind outcome")]
    Vanished,
}

/// The readiness gate gave up.
#[derive(Debug, Error)]
pub enum ReadinessError {
    #[error("cannot resolve {addr}: {source}")]
    Resolve {
        addr: String,
        #[source]
        source: io::Error,
    },
    #[error("{addr} resolved to no addresses")]
    NoAddress { addr: String },
    #[error("no listener at {addr} after {attempts} attempts in {elapsed:?}")]
    Timeout {
        addr: SocketAddr,
        attempts: u32,
        elapsed: Duration,
    },
}

/// `open_external` refused or failed to hand a URL to the system browser.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("{url:?} is not a valid URL: {reason}")]
    Malformed { url: String, reason: String },
    #[error("scheme {scheme:?} is not allowed for external links")]
    DisallowedScheme { scheme: String },
    #[error("system opener failed for {url}: {reason}")]
    Opener { url: String, reason: String },
}

/// A host platform adjustment could not be applied.
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("{call} failed: {source}")]
    Console {
        call: &'static str,
        #[source]
        source: io::Error,
    },
}

/// Fatal conditions of the bootstrap sequence.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("local server: {0}")]
    Server(#[from] ServerError),
    #[error("readiness: {0}")]
    Readiness(#[from] ReadinessError),
    #[error("window: {0}")]
    Window(#[from] tauri::Error),
}
