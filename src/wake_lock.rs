use std::process::{Child, Command, Stdio};

use crate::error::WakeLockError;

/// Best-effort screen wake lock backed by the platform idle inhibitor.
///
/// Acquire and release are both idempotent.
#[derive(Debug, Default)]
pub struct WakeLock {
    inhibitor: Option<Child>,
}

impl WakeLock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_held(&self) -> bool {
        self.inhibitor.is_some()
    }

    pub fn acquire(&mut self) -> Result<(), WakeLockError> {
        if self.inhibitor.is_some() {
            return Ok(());
        }

        let (program, args) = inhibitor_command().ok_or(WakeLockError::Unsupported)?;
        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| WakeLockError::Spawn { program, source })?;

        tracing::info!(program, pid = child.id(), "Wake lock is active");
        self.inhibitor = Some(child);
        Ok(())
    }

    pub fn release(&mut self) {
        let Some(mut child) = self.inhibitor.take() else {
            return;
        };

        if let Err(e) = child.kill() {
            tracing::warn!(error = %e, "Failed to stop wake lock inhibitor");
        }
        // Reap so the inhibitor does not linger as a zombie
        if let Err(e) = child.wait() {
            tracing::debug!(error = %e, "Failed to reap wake lock inhibitor");
        }
        tracing::info!("Wake lock was released");
    }
}

impl Drop for WakeLock {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(target_os = "linux")]
fn inhibitor_command() -> Option<(&'static str, &'static [&'static str])> {
    const ARGS: &[&str] = &[
        "--what=idle",
        "--who=intervalTimer",
        "--why=Workout in progress",
        "sleep",
        "infinity",
    ];
    Some(("systemd-inhibit", ARGS))
}

#[cfg(target_os = "macos")]
fn inhibitor_command() -> Option<(&'static str, &'static [&'static str])> {
    const ARGS: &[&str] = &["-d"];
    Some(("caffeinate", ARGS))
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
fn inhibitor_command() -> Option<(&'static str, &'static [&'static str])> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_without_acquire_is_noop() {
        let mut lock = WakeLock::new();
        lock.release();
        lock.release();
        assert!(!lock.is_held());
    }

    #[test]
    fn test_acquire_release_cycle() {
        let mut lock = WakeLock::new();
        // The inhibitor may be missing on the test host; that must not panic
        match lock.acquire() {
            Ok(()) => {
                assert!(lock.is_held());
                assert!(lock.acquire().is_ok());
                lock.release();
                assert!(!lock.is_held());
            }
            Err(_) => assert!(!lock.is_held()),
        }
    }
}
