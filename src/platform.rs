//! Host platform adjustments applied once at startup.
//!
//! On Windows the launching console's quick-edit and insert modes are turned
//! off, so a stray click in the console cannot freeze the process in text
//! selection. Other platforms get [`NoopPlatform`].

use log::{info, warn};

use crate::error::PlatformError;

pub const ENABLE_INSERT_MODE: u32 = 0x0020;
pub const ENABLE_QUICK_EDIT_MODE: u32 = 0x0040;
/// Required for quick-edit changes to take effect.
pub const ENABLE_EXTENDED_FLAGS: u32 = 0x0080;

/// Compute the console input mode with quick-edit and insert disabled.
pub fn adjusted_input_mode(mode: u32) -> u32 {
    (mode & !ENABLE_QUICK_EDIT_MODE & !ENABLE_INSERT_MODE) | ENABLE_EXTENDED_FLAGS
}

/// What [`HostPlatform::prepare_console`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleAdjustment {
    /// The platform has nothing to adjust.
    Unsupported,
    /// Standard input is not attached to a console.
    NoConsole,
    Applied { before: u32, after: u32 },
}

/// Platform-specific startup behaviour.
pub trait HostPlatform: Send + Sync {
    fn name(&self) -> &'static str;

    /// Adjust the launching console, if any.
    fn prepare_console(&self) -> Result<ConsoleAdjustment, PlatformError>;
}

/// Platform with no adjustments.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopPlatform;

impl HostPlatform for NoopPlatform {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn prepare_console(&self) -> Result<ConsoleAdjustment, PlatformError> {
        Ok(ConsoleAdjustment::Unsupported)
    }
}

/// Windows console host.
#[cfg(target_os = "windows")]
#[derive(Debug, Default, Clone, Copy)]
pub struct WindowsConsole;

#[cfg(target_os = "windows")]
impl HostPlatform for WindowsConsole {
    fn name(&self) -> &'static str {
        "windows"
    }

    fn prepare_console(&self) -> Result<ConsoleAdjustment, PlatformError> {
        use windows::Win32::System::Console::{
            GetConsoleMode, GetStdHandle, SetConsoleMode, CONSOLE_MODE, STD_INPUT_HANDLE,
        };

        // SAFETY: plain Win32 calls on the process's own stdin handle; the
        // mode out-pointer refers to a live local.
        unsafe {
            let stdin = GetStdHandle(STD_INPUT_HANDLE).map_err(|e| PlatformError::Console {
                call: "GetStdHandle",
                source: e.into(),
            })?;
            if stdin.is_invalid() {
                return Ok(ConsoleAdjustment::NoConsole);
            }

            let mut mode = CONSOLE_MODE::default();
            if GetConsoleMode(stdin, &mut mode).is_err() {
                // Redirected or detached stdin.
                return Ok(ConsoleAdjustment::NoConsole);
            }

            let before = mode.0;
            let after = adjusted_input_mode(before);
            SetConsoleMode(stdin, CONSOLE_MODE(after)).map_err(|e| PlatformError::Console {
                call: "SetConsoleMode",
                source: e.into(),
            })?;
            Ok(ConsoleAdjustment::Applied { before, after })
        }
    }
}

/// Platform implementation for the running OS.
pub fn current() -> Box<dyn HostPlatform> {
    #[cfg(target_os = "windows")]
    {
        return Box::new(WindowsConsole);
    }

    #[cfg(not(target_os = "windows"))]
    Box::new(NoopPlatform)
}

/// Apply console adjustments and log the outcome. Never fatal.
pub fn prepare(platform: &dyn HostPlatform) -> Option<ConsoleAdjustment> {
    match platform.prepare_console() {
        Ok(adjustment) => {
            match adjustment {
                ConsoleAdjustment::Applied { before, after } => info!(
                    "[console] quick-edit and insert modes disabled ({before:#06x} -> {after:#06x})"
                ),
                ConsoleAdjustment::NoConsole => {
                    info!("[console] stdin is not a console, nothing to adjust")
                }
                ConsoleAdjustment::Unsupported => {}
            }
            Some(adjustment)
        }
        Err(e) => {
            warn!("[console] {} console adjustment failed: {e}", platform.name());
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adjusted_mode_clears_quick_edit_and_insert() {
        // Typical cmd.exe default: processed, line, echo, insert, quick-edit, extended.
        let mode = 0x0001 | 0x0002 | 0x0004 | ENABLE_INSERT_MODE | ENABLE_QUICK_EDIT_MODE | ENABLE_EXTENDED_FLAGS;
        let adjusted = adjusted_input_mode(mode);
        assert_eq!(adjusted & ENABLE_QUICK_EDIT_MODE, 0);
        assert_eq!(adjusted & ENABLE_INSERT_MODE, 0);
        assert_eq!(adjusted & 0x0007, 0x0007);
        assert_ne!(adjusted & ENABLE_EXTENDED_FLAGS, 0);
    }

    #[test]
    fn adjusted_mode_is_idempotent() {
        let once = adjusted_input_mode(0x01f7);
        assert_eq!(adjusted_input_mode(once), once);
    }

    #[test]
    fn noop_platform_reports_unsupported() {
        assert_eq!(
            prepare(&NoopPlatform),
            Some(ConsoleAdjustment::Unsupported)
        );
    }

    struct Failing;

    impl HostPlatform for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn prepare_console(&self) -> Result<ConsoleAdjustment, PlatformError> {
            Err(PlatformError::Console {
                call: "SetConsoleMode",
                source: std::io::Error::other("denied"),
            })
        }
    }

    #[test]
    fn failure_is_swallowed() {
        assert_eq!(prepare(&Failing), None);
    }
}
