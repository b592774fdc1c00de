//! Lifecycle of the single shell window.
//!
//! ```text
//! Created -> Loading -> Ready <-> Loading
//!                       Ready -> ClosePending -> Terminated
//!                                ClosePending -> Ready      (veto)
//! ```
//!
//! The session is shared as an `Arc` between the page-load and close
//! handlers, which Tauri may run on different threads, so transitions go
//! through a `Mutex`.

use std::sync::Mutex;

use serde::Serialize;

use crate::config::WindowConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionState {
    Created,
    Loading,
    Ready,
    ClosePending,
    Terminated,
}

/// What the close handler should do with a close request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseRequest {
    /// Show the confirmation dialog.
    Confirm,
    /// A dialog is already open; swallow this request.
    AlreadyPending,
    /// Confirmation is disabled; end the process.
    Terminate,
}

/// Result of answering the confirmation dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseDecision {
    Terminate,
    Veto,
}

/// Read-only view of a session, for logging and diagnostics.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub target_url: String,
    pub page_loads: u32,
    pub vetoed_closes: u32,
}

#[derive(Debug)]
struct Inner {
    state: SessionState,
    page_loads: u32,
    vetoed_closes: u32,
}

/// The window session created once at startup.
#[derive(Debug)]
pub struct WindowSession {
    config: WindowConfig,
    target_url: String,
    inner: Mutex<Inner>,
}

impl WindowSession {
    pub fn new(config: WindowConfig, target_url: impl Into<String>) -> Self {
        Self {
            config,
            target_url: target_url.into(),
            inner: Mutex::new(Inner {
                state: SessionState::Created,
                page_loads: 0,
                vetoed_closes: 0,
            }),
        }
    }

    pub fn config(&self) -> &WindowConfig {
        &self.config
    }

    pub fn target_url(&self) -> &str {
        &self.target_url
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // Transitions never panic while holding the lock; recover the data anyway.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn state(&self) -> SessionState {
        self.lock().state
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let inner = self.lock();
        SessionSnapshot {
            state: inner.state,
            target_url: self.target_url.clone(),
            page_loads: inner.page_loads,
            vetoed_closes: inner.vetoed_closes,
        }
    }

    /// A document started loading. A pending close stays pending.
    pub fn page_load_started(&self) -> SessionState {
        let mut inner = self.lock();
        if matches!(inner.state, SessionState::Created | SessionState::Ready) {
            inner.state = SessionState::Loading;
        }
        inner.state
    }

    /// A document finished loading.
    ///
    /// Returns `true` when the link hook should be installed, i.e. the
    /// session is still alive.
    pub fn page_loaded(&self) -> bool {
        let mut inner = self.lock();
        match inner.state {
            SessionState::Terminated => false,
            SessionState::ClosePending => {
                inner.page_loads += 1;
                true
            }
            _ => {
                inner.state = SessionState::Ready;
                inner.page_loads += 1;
                true
            }
        }
    }

    /// The user asked to close the window.
    pub fn close_requested(&self) -> CloseRequest {
        let mut inner = self.lock();
        match inner.state {
            SessionState::ClosePending => CloseRequest::AlreadyPending,
            SessionState::Terminated => CloseRequest::AlreadyPending,
            _ if !self.config.confirm_close => {
                inner.state = SessionState::Terminated;
                CloseRequest::Terminate
            }
            _ => {
                inner.state = SessionState::ClosePending;
                CloseRequest::Confirm
            }
        }
    }

    /// Apply the user's answer to the confirmation dialog.
    pub fn close_answered(&self, confirmed: bool) -> CloseDecision {
        let mut inner = self.lock();
        if confirmed {
            inner.state = SessionState::Terminated;
            CloseDecision::Terminate
        } else {
            if inner.state == SessionState::ClosePending {
                inner.state = SessionState::Ready;
            }
            inner.vetoed_closes += 1;
            CloseDecision::Veto
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> WindowSession {
        WindowSession::new(WindowConfig::default(), "http://127.0.0.1:10088/")
    }

    #[test]
    fn load_cycle_reaches_ready() {
        let s = session();
        assert_eq!(s.state(), SessionState::Created);
        assert_eq!(s.page_load_started(), SessionState::Loading);
        assert!(s.page_loaded());
        assert_eq!(s.state(), SessionState::Ready);

        // Navigation reloads the document.
        assert_eq!(s.page_load_started(), SessionState::Loading);
        assert!(s.page_loaded());
        assert_eq!(s.snapshot().page_loads, 2);
    }

    #[test]
    fn declining_close_returns_to_ready_every_time() {
        let s = session();
        s.page_load_started();
        s.page_loaded();

        for n in 1..=5 {
            assert_eq!(s.close_requested(), CloseRequest::Confirm);
            assert_eq!(s.state(), SessionState::ClosePending);
            assert_eq!(s.close_answered(false), CloseDecision::Veto);
            assert_eq!(s.state(), SessionState::Ready);
            assert_eq!(s.snapshot().vetoed_closes, n);
        }
    }

    #[test]
    fn accepting_close_terminates() {
        let s = session();
        s.page_loaded();
        assert_eq!(s.close_requested(), CloseRequest::Confirm);
        assert_eq!(s.close_answered(true), CloseDecision::Terminate);
        assert_eq!(s.state(), SessionState::Terminated);
        assert!(!s.page_loaded());
    }

    #[test]
    fn second_request_while_pending_is_swallowed() {
        let s = session();
        s.page_loaded();
        assert_eq!(s.close_requested(), CloseRequest::Confirm);
        assert_eq!(s.close_requested(), CloseRequest::AlreadyPending);
        assert_eq!(s.state(), SessionState::ClosePending);
    }

    #[test]
    fn load_during_pending_close_keeps_it_pending() {
        let s = session();
        s.page_loaded();
        s.close_requested();
        assert_eq!(s.page_load_started(), SessionState::ClosePending);
        assert!(s.page_loaded());
        assert_eq!(s.state(), SessionState::ClosePending);
    }

    #[test]
    fn close_without_confirmation_terminates_directly() {
        let config = WindowConfig {
            confirm_close: false,
            ..WindowConfig::default()
        };
        let s = WindowSession::new(config, "http://127.0.0.1:1/");
        assert_eq!(s.close_requested(), CloseRequest::Terminate);
        assert_eq!(s.state(), SessionState::Terminated);
    }
}
