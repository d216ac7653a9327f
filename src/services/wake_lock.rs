use std::process::{Child, Command, Stdio};

/// External program that keeps the host awake for as long as it runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InhibitorCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl InhibitorCommand {
    pub fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|arg| (*arg).to_string()).collect(),
        }
    }

    /// The inhibitor available on this platform, if any
    #[must_use]
    pub fn for_platform() -> Option<Self> {
        if cfg!(target_os = "linux") {
            Some(Self::new(
                "systemd-inhibit",
                &[
                    "--what=idle:sleep",
                    "--who=lmchat",
                    "--why=Streaming a chat reply",
                    "--mode=block",
                    "sleep",
                    "infinity",
                ],
            ))
        } else if cfg!(target_os = "macos") {
            Some(Self::new("caffeinate", &["-i", "-d"]))
        } else {
            None
        }
    }
}

/// Best-effort idle inhibition held while a reply streams
///
/// Failures are logged and otherwise ignored.
#[derive(Debug)]
pub struct WakeLockManager {
    command: Option<InhibitorCommand>,
    child: Option<Child>,
    wanted: bool,
}

impl Default for WakeLockManager {
    fn default() -> Self {
        Self::new()
    }
}

impl WakeLockManager {
    pub fn new() -> Self {
        Self::with_command(InhibitorCommand::for_platform())
    }

    /// A manager that never inhibits anything
    pub fn disabled() -> Self {
        Self::with_command(None)
    }

    pub fn with_command(command: Option<InhibitorCommand>) -> Self {
        Self {
            command,
            child: None,
            wanted: false,
        }
    }

    /// Drops any held lock, then takes a fresh one
    pub fn acquire(&mut self) {
        self.stop_child();
        self.wanted = true;
        self.spawn_child();
    }

    pub fn release(&mut self) {
        self.wanted = false;
        self.stop_child();
    }

    /// Whether the inhibitor process is currently running
    pub fn is_held(&mut self) -> bool {
        let Some(child) = self.child.as_mut() else {
            return false;
        };
        match child.try_wait() {
            Ok(None) => true,
            Ok(Some(status)) => {
                tracing::debug!(%status, "wake lock inhibitor exited");
                self.child = None;
                false
            }
            Err(error) => {
                tracing::warn!(%error, "could not poll wake lock inhibitor");
                false
            }
        }
    }

    /// Re-takes a lock that is still wanted but was lost; returns whether it tried
    pub fn reacquire_if_lost(&mut self) -> bool {
        if !self.wanted || self.is_held() {
            return false;
        }
        tracing::debug!("re-acquiring lost wake lock");
        self.spawn_child();
        true
    }

    fn spawn_child(&mut self) {
        let Some(command) = &self.command else {
            tracing::debug!("no wake lock inhibitor on this platform");
            return;
        };
        match Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
        {
            Ok(child) => {
                tracing::debug!(program = %command.program, pid = child.id(), "wake lock acquired");
                self.child = Some(child);
            }
            Err(error) => {
                tracing::warn!(program = %command.program, %error, "wake lock not available");
            }
        }
    }

    fn stop_child(&mut self) {
        let Some(mut child) = self.child.take() else {
            return;
        };
        if let Err(error) = child.kill() {
            tracing::debug!(%error, "wake lock inhibitor already gone");
        }
        if let Err(error) = child.wait() {
            tracing::warn!(%error, "could not reap wake lock inhibitor");
        }
    }
}

impl Drop for WakeLockManager {
    fn drop(&mut self) {
        self.stop_child();
    }
}
