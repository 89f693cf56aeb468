//! Power-button gesture classifier
//!
//! Distinguishes a quick press (reboot) from a held press (poweroff). The
//! classifier consumes discrete [`ButtonEvent`]s produced by the GPIO edge
//! layer; the 2-second hold classification happens there, so synthetic
//! event sequences can be injected in tests without hardware.

use crate::power::PowerAction;

/// Edge events delivered by the GPIO layer for the power button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonEvent {
    /// The button went down.
    Pressed,
    /// The button went up.
    Released,
    /// The press duration crossed the hold threshold while still down.
    Held,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GestureState {
    Idle,
    Pressed,
}

/// Two-state machine tracking one button press at a time.
///
/// A terminal action (reboot or poweroff) ends the process, so the machine
/// holds no further state afterwards; the `held` latch only exists to keep
/// the hold-then-release sequence from triggering twice.
#[derive(Debug)]
pub struct ButtonGesture {
    state: GestureState,
    held: bool,
}

impl ButtonGesture {
    pub fn new() -> Self {
        Self {
            state: GestureState::Idle,
            held: false,
        }
    }

    /// Feed one event; returns the power action it concludes, if any.
    pub fn handle(&mut self, event: ButtonEvent) -> Option<PowerAction> {
        match event {
            ButtonEvent::Pressed => {
                self.state = GestureState::Pressed;
                self.held = false;
                None
            }
            ButtonEvent::Held => {
                if self.state == GestureState::Pressed && !self.held {
                    self.held = true;
                    Some(PowerAction::Poweroff)
                } else {
                    None
                }
            }
            ButtonEvent::Released => {
                let action = if self.state == GestureState::Pressed && !self.held {
                    Some(PowerAction::Reboot)
                } else {
                    // Release after a hold: poweroff was already issued.
                    None
                };
                self.state = GestureState::Idle;
                action
            }
        }
    }
}

impl Default for ButtonGesture {
    fn default() -> Self {
        Self::new()
    }
}
