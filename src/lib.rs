//! Agent Playground desktop shell.
//!
//! Serves the pre-built web bundle over loopback HTTP and shows it in a
//! native Tauri window:
//!
//! - Environment and `.env` configuration ([`config`])
//! - Static bundle server with single-page-app fallback ([`server`])
//! - Readiness gate between server and window ([`readiness`])
//! - Per-OS console adjustments ([`platform`])
//! - Window, link bridge and close confirmation ([`shell`])

pub mod config;
pub mod error;
pub mod platform;
pub mod readiness;
pub mod server;
pub mod shell;

use std::sync::Arc;

use log::{error, info};

use config::AppConfig;
use error::StartupError;
use shell::WindowSession;

/// Bootstrap the desktop shell and run until the user exits.
///
/// Order matters:
///
/// 1. **Configuration**: `.env` plus environment, then the static root is
///    checked.
/// 2. **Console**: platform console tweaks (never fatal).
/// 3. **Server**: bound on its own thread; a port conflict stops here.
/// 4. **Readiness**: poll the server address until it accepts
///    connections, bounded by the configured timeout.
/// 5. **Window**: Tauri app with the dialog and opener plugins, the
///    `open_external` command, and the shell window created in `setup`.
///
/// Any startup failure is logged and the process exits with status 1.
pub fn run() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = try_run() {
        error!("[startup] {e}");
        std::process::exit(1);
    }
}

fn try_run() -> Result<(), StartupError> {
    let config = AppConfig::load()?;
    config.server.validate()?;
    info!(
        "[config] serving {} on {}",
        config.server.root_dir.display(),
        config.server.url()
    );

    platform::prepare(platform::current().as_ref());

    let server = server::spawn(&config.server)?;
    readiness::wait_for_server(&config.server, &config.readiness)?;
    server.exit_on_failure();

    let session = Arc::new(WindowSession::new(
        config.window.clone(),
        config.server.url(),
    ));

    tauri::Builder::default()
        .plugin(tauri_plugin_dialog::init())
        .plugin(tauri_plugin_opener::init())
        .setup(move |app| {
            shell::window::open(app.handle(), session)?;
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![shell::bridge::open_external])
        .run(tauri::generate_context!())?;

    Ok(())
}
