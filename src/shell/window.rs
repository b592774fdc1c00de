//! Native window creation and handler registration.
//!
//! Handlers are free functions taking the [`WindowSession`] explicitly; the
//! closures registered with Tauri only forward to them.

use std::sync::Arc;

use log::{debug, info, warn};
use tauri::ipc::CapabilityBuilder;
use tauri::webview::{PageLoadEvent, PageLoadPayload};
use tauri::{AppHandle, Manager, Runtime, Url, WebviewUrl, WebviewWindow, WebviewWindowBuilder, WindowEvent};

use super::gate::{self, DialogPrompt};
use super::hook::link_intercept_script;
use super::session::WindowSession;
use crate::error::{ConfigError, StartupError};

pub const MAIN_WINDOW: &str = "main";

/// Remote URL pattern covering every path of the bundle origin.
pub fn origin_pattern(target: &Url) -> String {
    let mut origin = target.origin().ascii_serialization();
    origin.push_str("/*");
    origin
}

/// Create the shell window for `session` and register its handlers.
///
/// # Errors
///
/// Returns `Err` if the target URL is invalid, the loopback origin cannot be
/// granted IPC access, or the native window cannot be created.
pub fn open<R: Runtime>(
    app: &AppHandle<R>,
    session: Arc<WindowSession>,
) -> Result<WebviewWindow<R>, StartupError> {
    let url = Url::parse(session.target_url()).map_err(|e| ConfigError::InvalidUrl {
        url: session.target_url().to_string(),
        reason: e.to_string(),
    })?;

    // The bundle is a remote origin to Tauri; let it reach the bridge.
    app.add_capability(
        CapabilityBuilder::new("loopback-bundle")
            .remote(origin_pattern(&url))
            .window(MAIN_WINDOW)
            .permission("core:default"),
    )?;

    let config = session.config();
    debug!(
        "[window] creating {}",
        serde_json::to_string(config).unwrap_or_default()
    );

    let loaded = Arc::clone(&session);
    let window = WebviewWindowBuilder::new(app, MAIN_WINDOW, WebviewUrl::External(url))
        .title(&config.title)
        .inner_size(config.width, config.height)
        .min_inner_size(config.min_width, config.min_height)
        .resizable(config.resizable)
        .fullscreen(config.fullscreen)
        .on_page_load(move |window, payload| on_page_load(&loaded, &window, &payload))
        .build()?;

    let closing = Arc::clone(&session);
    let handle = window.clone();
    window.on_window_event(move |event| {
        if let WindowEvent::CloseRequested { api, .. } = event {
            // Only the gate may end the session.
            api.prevent_close();
            on_close_requested(&closing, &handle);
        }
    });

    info!("[window] opened {}", session.target_url());
    Ok(window)
}

/// Track document loads and install the link hook once each finishes.
pub fn on_page_load<R: Runtime>(
    session: &WindowSession,
    window: &WebviewWindow<R>,
    payload: &PageLoadPayload<'_>,
) {
    match payload.event() {
        PageLoadEvent::Started => {
            let state = session.page_load_started();
            debug!("[window] loading {} ({state:?})", payload.url());
        }
        PageLoadEvent::Finished => {
            if !session.page_loaded() {
                return;
            }
            match window.eval(&link_intercept_script()) {
                Ok(()) => info!(
                    "[window] window.open rerouted to the system browser on {}",
                    payload.url()
                ),
                Err(e) => warn!("[window] cannot install link hook: {e}"),
            }
        }
    }
}

/// Run the close gate for `session`; confirmed exits end the process.
pub fn on_close_requested<R: Runtime>(session: &Arc<WindowSession>, window: &WebviewWindow<R>) {
    let app = window.app_handle().clone();
    let prompt = DialogPrompt::new(app.clone());
    let snapshot_of = Arc::clone(session);
    gate::on_closing(session, &prompt, move || {
        debug!(
            "[window] session at exit: {}",
            serde_json::to_string(&snapshot_of.snapshot()).unwrap_or_default()
        );
        app.exit(0);
    });
}
