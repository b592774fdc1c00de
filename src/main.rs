//! Binary entry point for the Agent Playground desktop shell.
//!
//! The console stays attached: startup diagnostics and fatal errors are
//! printed there. All logic lives in [`agent_playground_desktop_lib::run`].

fn main() {
    agent_playground_desktop_lib::run()
}
