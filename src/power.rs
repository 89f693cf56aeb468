//! Host power-state transitions
//!
//! Reboot and poweroff are one-shot and irreversible within a process
//! lifetime; invoking them concurrently with the monitor loop is safe
//! because the process is ending either way.

use crate::error::{Result, UpsError};
use std::process::Command;

const REBOOT_BIN: &str = "/usr/sbin/reboot";
const POWEROFF_BIN: &str = "/usr/sbin/poweroff";
const WALL_BIN: &str = "/usr/bin/wall";

/// Requested host power transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerAction {
    Reboot,
    Poweroff,
}

impl std::fmt::Display for PowerAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Reboot => write!(f, "reboot"),
            Self::Poweroff => write!(f, "poweroff"),
        }
    }
}

/// Interface to the host power state.
pub trait PowerController {
    /// Reboot the host.
    fn reboot(&mut self) -> Result<()>;

    /// Power the host off.
    fn poweroff(&mut self) -> Result<()>;

    /// Broadcast a message to all logged-in terminals.
    fn broadcast(&mut self, message: &str) -> Result<()>;

    /// Apply a requested action.
    fn apply(&mut self, action: PowerAction) -> Result<()> {
        match action {
            PowerAction::Reboot => self.reboot(),
            PowerAction::Poweroff => self.poweroff(),
        }
    }
}

/// Controller shelling out to the system power binaries.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemPower;

impl PowerController for SystemPower {
    fn reboot(&mut self) -> Result<()> {
        run(REBOOT_BIN, &[])
    }

    fn poweroff(&mut self) -> Result<()> {
        run(POWEROFF_BIN, &[])
    }

    fn broadcast(&mut self, message: &str) -> Result<()> {
        run(WALL_BIN, &[message])
    }
}

fn run(bin: &str, args: &[&str]) -> Result<()> {
    let status = Command::new(bin).args(args).status()?;
    if !status.success() {
        return Err(UpsError::CommandFailed(format!(
            "{} exited with {}",
            bin, status
        )));
    }
    Ok(())
}
