//! AC power loss detection
//!
//! Tracks transitions between AC-present and AC-lost as reported by the UPS
//! power-loss detection line. Current policy is observe-only: transitions
//! are logged and mirrored in [`AcPowerState`], and the hook stays wired so
//! alerting can be attached without touching the monitor loop.

use serde::{Deserialize, Serialize};

/// Edge events delivered by the GPIO layer for the AC presence signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcEvent {
    /// Mains power disconnected, running on batteries.
    Lost,
    /// Mains power restored.
    Restored,
}

/// Last observed AC power state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AcPowerState {
    Present,
    Lost,
}

impl std::fmt::Display for AcPowerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Present => write!(f, "present"),
            Self::Lost => write!(f, "lost"),
        }
    }
}

/// AC power monitor
#[derive(Debug)]
pub struct AcPowerMonitor {
    state: AcPowerState,
}

impl AcPowerMonitor {
    pub fn new() -> Self {
        Self {
            state: AcPowerState::Present,
        }
    }

    /// Record one edge. Observe-only: no power action is taken here.
    pub fn handle(&mut self, event: AcEvent) {
        match event {
            AcEvent::Lost => {
                log::warn!("AC power lost. Running on batteries.");
                self.state = AcPowerState::Lost;
            }
            AcEvent::Restored => {
                log::info!("AC power restored.");
                self.state = AcPowerState::Present;
            }
        }
    }

    /// Last observed state.
    pub fn state(&self) -> AcPowerState {
        self.state
    }
}

impl Default for AcPowerMonitor {
    fn default() -> Self {
        Self::new()
    }
}
