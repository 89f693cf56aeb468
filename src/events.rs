//! Hardware event channel and dispatcher
//!
//! Edge notifications from the GPIO layer arrive as discrete messages on an
//! mpsc channel instead of ambient callbacks. The dispatcher consumes them
//! on its own thread, runs the button and AC state machines, and invokes the
//! power controller for any resulting action. The monitor loop shares no
//! mutable state with it; the only shared resource is the host power state,
//! whose transitions are one-shot.

use crate::acpower::{AcEvent, AcPowerMonitor};
use crate::button::{ButtonEvent, ButtonGesture};
use crate::power::PowerController;
use std::sync::mpsc::Receiver;
use std::thread::JoinHandle;

/// One edge notification from the GPIO layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HardwareEvent {
    Button(ButtonEvent),
    Ac(AcEvent),
}

/// Background consumer of [`HardwareEvent`]s.
pub struct EventDispatcher {
    handle: JoinHandle<()>,
}

impl EventDispatcher {
    /// Spawn the dispatcher thread.
    pub fn spawn<P>(events: Receiver<HardwareEvent>, mut power: P) -> std::io::Result<Self>
    where
        P: PowerController + Send + 'static,
    {
        let handle = std::thread::Builder::new()
            .name("event-dispatch".into())
            .spawn(move || dispatch(events, &mut power))?;
        Ok(Self { handle })
    }

    /// Wait for the dispatcher to finish (the sender side hung up or a
    /// terminal action was issued).
    pub fn join(self) {
        let _ = self.handle.join();
    }
}

/// Consume events until the channel closes or a terminal action fires.
fn dispatch<P: PowerController>(events: Receiver<HardwareEvent>, power: &mut P) {
    let mut gesture = ButtonGesture::new();
    let mut ac = AcPowerMonitor::new();
    for event in events {
        match event {
            HardwareEvent::Button(ev) => {
                if let Some(action) = gesture.handle(ev) {
                    log::warn!("power button requested {}", action);
                    if let Err(e) = power.apply(action) {
                        log::error!("failed to {}: {}", action, e);
                    }
                    // Terminal action: the host power state is changing,
                    // nothing further to dispatch.
                    return;
                }
            }
            HardwareEvent::Ac(ev) => ac.handle(ev),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::power::test_support::RecordingPower;
    use std::sync::mpsc;

    fn run_sequence(events: &[HardwareEvent]) -> Vec<String> {
        let (tx, rx) = mpsc::channel();
        let power = RecordingPower::default();
        let recorder = power.clone();
        for event in events {
            tx.send(*event).unwrap();
        }
        drop(tx);
        let dispatcher = EventDispatcher::spawn(rx, power).unwrap();
        dispatcher.join();
        recorder.calls()
    }

    #[test]
    fn test_short_press_dispatches_reboot() {
        let calls = run_sequence(&[
            HardwareEvent::Button(ButtonEvent::Pressed),
            HardwareEvent::Button(ButtonEvent::Released),
        ]);
        assert_eq!(calls, vec!["reboot"]);
    }

    #[test]
    fn test_hold_dispatches_poweroff_once() {
        let calls = run_sequence(&[
            HardwareEvent::Button(ButtonEvent::Pressed),
            HardwareEvent::Button(ButtonEvent::Held),
            HardwareEvent::Button(ButtonEvent::Released),
        ]);
        assert_eq!(calls, vec!["poweroff"]);
    }

    #[test]
    fn test_ac_events_take_no_action() {
        let calls = run_sequence(&[
            HardwareEvent::Ac(AcEvent::Lost),
            HardwareEvent::Ac(AcEvent::Restored),
        ]);
        assert!(calls.is_empty());
    }

    #[test]
    fn test_dispatch_stops_after_terminal_action() {
        // Events queued behind the hold must be ignored.
        let calls = run_sequence(&[
            HardwareEvent::Button(ButtonEvent::Pressed),
            HardwareEvent::Button(ButtonEvent::Held),
            HardwareEvent::Button(ButtonEvent::Pressed),
            HardwareEvent::Button(ButtonEvent::Released),
        ]);
        assert_eq!(calls, vec!["poweroff"]);
    }

    #[test]
    fn test_channel_close_ends_dispatch() {
        let calls = run_sequence(&[HardwareEvent::Button(ButtonEvent::Pressed)]);
        assert!(calls.is_empty());
    }
}
