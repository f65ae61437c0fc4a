//! Detached process spawning.

use crate::traits::Launcher;
use log::{debug, warn};
use std::os::unix::process::CommandExt;
use std::process::{Command, Stdio};

/// Runs commands through `sh -c`, each in its own process group.
///
/// The child is reaped on a short-lived background thread so finished
/// programs never linger as zombies and the manager never waits.
#[derive(Debug, Clone)]
pub struct ShellLauncher {
    shell: String,
}

impl Default for ShellLauncher {
    fn default() -> Self {
        Self {
            shell: "/bin/sh".into(),
        }
    }
}

impl ShellLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different shell (must accept `-c <command>`).
    pub fn with_shell(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
        }
    }

    fn command(&self, command: &str) -> Command {
        let mut cmd = Command::new(&self.shell);
        cmd.arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .process_group(0);
        cmd
    }
}

impl Launcher for ShellLauncher {
    fn spawn(&self, command: &str) {
        if command.trim().is_empty() {
            debug!("spawn: empty command ignored");
            return;
        }
        match self.command(command).spawn() {
            Ok(mut child) => {
                let pid = child.id();
                debug!("spawned {:?} (pid {})", command, pid);
                std::thread::spawn(move || {
                    if let Err(e) = child.wait() {
                        warn!("wait for pid {}: {}", pid, e);
                    }
                });
            }
            Err(e) => warn!("failed to spawn {:?}: {}", command, e),
        }
    }
}
