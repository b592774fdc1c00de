//! Close-confirmation gate.
//!
//! A close request never closes the window directly. The gate asks the user
//! and either ends the whole process or leaves the session as it was.

use std::sync::Arc;

use log::{debug, info};
use tauri::{AppHandle, Runtime};
use tauri_plugin_dialog::{DialogExt, MessageDialogButtons, MessageDialogKind};

use super::session::{CloseDecision, CloseRequest, WindowSession};

pub const EXIT_TITLE: &str = "Exit confirmation";
pub const EXIT_MESSAGE: &str = "Are you sure you want to exit?";

/// Callback receiving the user's answer (`true` = exit).
pub type Answer = Box<dyn FnOnce(bool) + Send + 'static>;

/// A yes/no question shown to the user.
pub trait ExitPrompt {
    /// Ask asynchronously; `answer` is called exactly once.
    fn ask(&self, answer: Answer);
}

/// Native OK/Cancel message box from the dialog plugin.
pub struct DialogPrompt<R: Runtime> {
    app: AppHandle<R>,
}

impl<R: Runtime> DialogPrompt<R> {
    pub fn new(app: AppHandle<R>) -> Self {
        Self { app }
    }
}

impl<R: Runtime> ExitPrompt for DialogPrompt<R> {
    fn ask(&self, answer: Answer) {
        self.app
            .dialog()
            .message(EXIT_MESSAGE)
            .title(EXIT_TITLE)
            .kind(MessageDialogKind::Warning)
            .buttons(MessageDialogButtons::OkCancel)
            .show(answer);
    }
}

/// Handle a close request for `session`.
///
/// `terminate` runs at most once, when the user confirms (or immediately if
/// confirmation is disabled). On a veto nothing else changes.
pub fn on_closing<P, T>(session: &Arc<WindowSession>, prompt: &P, terminate: T) -> CloseRequest
where
    P: ExitPrompt + ?Sized,
    T: FnOnce() + Send + 'static,
{
    let request = session.close_requested();
    match request {
        CloseRequest::Terminate => {
            info!("[window] close requested, confirmation disabled; exiting");
            terminate();
        }
        CloseRequest::AlreadyPending => debug!("[window] close already pending"),
        CloseRequest::Confirm => {
            let session = Arc::clone(session);
            prompt.ask(Box::new(move |confirmed| {
                match session.close_answered(confirmed) {
                    CloseDecision::Terminate => {
                        info!("[window] exit confirmed");
                        terminate();
                    }
                    CloseDecision::Veto => info!("[window] exit cancelled"),
                }
            }));
        }
    }
    request
}
