//! Shell-command automation hook.
//!
//! Fires user-configured commands when a work interval starts or naturally
//! ends. Commands are spawned detached through the platform shell; the
//! engine never waits on them and spawn failures are only logged.

use std::process::{Command, Stdio};

use tracing::{debug, warn};

use super::AutomationHook;

#[derive(Debug, Clone, Default)]
pub struct ShellHook {
    on_start: Option<String>,
    on_end: Option<String>,
}

impl ShellHook {
    pub fn new(on_start: Option<String>, on_end: Option<String>) -> Self {
        Self { on_start, on_end }
    }

    fn run(&self, command: &str) {
        let mut shell = if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.args(["/C", command]);
            c
        } else {
            let mut c = Command::new("sh");
            c.args(["-c", command]);
            c
        };
        match shell
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
        {
            Ok(child) => debug!(pid = child.id(), command, "automation command spawned"),
            Err(e) => warn!(command, "failed to spawn automation command: {e}"),
        }
    }
}

impl AutomationHook for ShellHook {
    fn on_start(&self) {
        if let Some(command) = &self.on_start {
            self.run(command);
        }
    }

    fn on_end(&self) {
        if let Some(command) = &self.on_end {
            self.run(command);
        }
    }
}
