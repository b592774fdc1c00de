//! Shell window controller: one native window pointed at the Local Server,
//! with a link-interception hook and a close-confirmation gate.

pub mod bridge;
pub mod gate;
pub mod hook;
pub mod session;
pub mod window;

pub use session::{SessionState, WindowSession};
