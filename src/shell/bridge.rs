//! Host capability exposed to the embedded page.
//!
//! The page reaches it as the `open_external` IPC command. Links go to the
//! system browser; the webview itself never navigates. Every failure is
//! logged here and returned to the page as a string, so a bad link cannot
//! take the window down.

use log::{info, warn};
use tauri::{AppHandle, Runtime, Url};
use tauri_plugin_opener::OpenerExt;

use crate::error::BridgeError;

/// Schemes handed to the system opener.
pub const ALLOWED_SCHEMES: &[&str] = &["http", "https", "mailto"];

/// Something that can show a URL outside the shell window.
pub trait ExternalOpener {
    fn open(&self, url: &str) -> Result<(), String>;
}

/// Opens URLs with the user's default handler via the opener plugin.
pub struct SystemOpener<'a, R: Runtime> {
    app: &'a AppHandle<R>,
}

impl<'a, R: Runtime> SystemOpener<'a, R> {
    pub fn new(app: &'a AppHandle<R>) -> Self {
        Self { app }
    }
}

impl<R: Runtime> ExternalOpener for SystemOpener<'_, R> {
    fn open(&self, url: &str) -> Result<(), String> {
        self.app
            .opener()
            .open_url(url, None::<String>)
            .map_err(|e| e.to_string())
    }
}

/// Parse `raw` and check its scheme.
pub fn validate(raw: &str) -> Result<Url, BridgeError> {
    let url = Url::parse(raw).map_err(|e| BridgeError::Malformed {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    if !ALLOWED_SCHEMES.contains(&url.scheme()) {
        return Err(BridgeError::DisallowedScheme {
            scheme: url.scheme().to_string(),
        });
    }
    Ok(url)
}

/// Validate `raw` and pass it, unmodified apart from surrounding whitespace,
/// to `opener`.
pub fn open_external_with(opener: &dyn ExternalOpener, raw: &str) -> Result<(), BridgeError> {
    let raw = raw.trim();
    let result = validate(raw).and_then(|_| {
        opener.open(raw).map_err(|reason| BridgeError::Opener {
            url: raw.to_string(),
            reason,
        })
    });
    match &result {
        Ok(()) => info!("[bridge] opened in browser: {raw}"),
        Err(e) => warn!("[bridge] {e}"),
    }
    result
}

/// IPC command: open `url` in the system browser.
#[tauri::command]
pub fn open_external<R: Runtime>(app: AppHandle<R>, url: String) -> Result<(), String> {
    open_external_with(&SystemOpener::new(&app), &url).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recording {
        opened: RefCell<Vec<String>>,
        fail: bool,
    }

    impl ExternalOpener for Recording {
        fn open(&self, url: &str) -> Result<(), String> {
            if self.fail {
                return Err("no browser registered".to_string());
            }
            self.opened.borrow_mut().push(url.to_string());
            Ok(())
        }
    }

    #[test]
    fn passes_exact_url_to_opener() {
        let opener = Recording::default();
        open_external_with(&opener, "https://example.com").expect("open");
        assert_eq!(*opener.opened.borrow(), vec!["https://example.com".to_string()]);
    }

    #[test]
    fn malformed_url_is_rejected_without_opening() {
        let opener = Recording::default();
        let err = open_external_with(&opener, "not a url").unwrap_err();
        assert!(matches!(err, BridgeError::Malformed { .. }));
        assert!(opener.opened.borrow().is_empty());

        // Still usable afterwards.
        open_external_with(&opener, "http://localhost:3000/docs").expect("open");
        assert_eq!(opener.opened.borrow().len(), 1);
    }

    #[test]
    fn disallowed_schemes_are_rejected() {
        let opener = Recording::default();
        for raw in ["javascript:alert(1)", "file:///etc/passwd", "ftp://host/x"] {
            let err = open_external_with(&opener, raw).unwrap_err();
            assert!(matches!(err, BridgeError::DisallowedScheme { .. }), "{raw}");
        }
        assert!(opener.opened.borrow().is_empty());
    }

    #[test]
    fn mailto_is_allowed() {
        assert!(validate("mailto:team@example.com").is_ok());
    }

    #[test]
    fn opener_failure_becomes_bridge_error() {
        let opener = Recording {
            fail: true,
            ..Recording::default()
        };
        let err = open_external_with(&opener, "https://example.com").unwrap_err();
        assert!(matches!(err, BridgeError::Opener { .. }));
        assert!(err.to_string().contains("no browser registered"));
    }
}
