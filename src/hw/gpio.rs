//! Sysfs GPIO transport and edge watcher
//!
//! Wraps the legacy sysfs GPIO interface (`/sys/class/gpio`): export a line,
//! set its direction, read or drive its level. The [`EdgeWatcher`] polls the
//! button and AC-presence inputs on a short period and turns level changes
//! into discrete [`HardwareEvent`]s, including the 2-second hold
//! classification for the power button.

use crate::acpower::AcEvent;
use crate::button::ButtonEvent;
use crate::config::HOLD_THRESHOLD;
use crate::error::Result;
use crate::events::HardwareEvent;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

const GPIO_ROOT: &str = "/sys/class/gpio";

/// Input poll period. Short enough that a press is never missed and the
/// hold threshold is hit within one period of 2 s.
const POLL_PERIOD: Duration = Duration::from_millis(20);

/// One exported GPIO line.
#[derive(Debug)]
struct GpioLine {
    number: u32,
    dir: PathBuf,
}

impl GpioLine {
    fn export(number: u32, direction: &str) -> Result<Self> {
        let root = PathBuf::from(GPIO_ROOT);
        match std::fs::write(root.join("export"), number.to_string()) {
            Ok(()) => {}
            // EBUSY: already exported by a previous run
            Err(e) if e.raw_os_error() == Some(libc::EBUSY) => {}
            Err(e) => return Err(e.into()),
        }
        let dir = root.join(format!("gpio{}", number));
        let line = Self { number, dir };
        line.write_direction(direction)?;
        Ok(line)
    }

    fn write_direction(&self, direction: &str) -> Result<()> {
        // The attribute files appear asynchronously after export; give udev
        // a moment before failing.
        let path = self.dir.join("direction");
        let mut last_err = None;
        for _ in 0..10 {
            match std::fs::write(&path, direction) {
                Ok(()) => return Ok(()),
                Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::PermissionDenied) => {
                    last_err = Some(e);
                    std::thread::sleep(Duration::from_millis(10));
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(last_err.expect("retry loop ran at least once").into())
    }

    fn read_value(&self) -> Result<bool> {
        let content = std::fs::read_to_string(self.dir.join("value"))?;
        parse_value(&content)
    }

    fn write_value(&self, high: bool) -> Result<()> {
        std::fs::write(self.dir.join("value"), if high { "1" } else { "0" })?;
        Ok(())
    }

    fn unexport(&self) {
        let _ = std::fs::write(PathBuf::from(GPIO_ROOT).join("unexport"), self.number.to_string());
    }
}

fn parse_value(content: &str) -> Result<bool> {
    match content.trim() {
        "0" => Ok(false),
        "1" => Ok(true),
        other => Err(crate::error::UpsError::Parse(format!(
            "unexpected GPIO value '{}'",
            other
        ))),
    }
}

/// GPIO input line.
#[derive(Debug)]
pub struct GpioInput {
    line: GpioLine,
}

impl GpioInput {
    /// Export the line and configure it as an input.
    pub fn open(number: u32) -> Result<Self> {
        Ok(Self {
            line: GpioLine::export(number, "in")?,
        })
    }

    /// Current logic level.
    pub fn is_high(&self) -> Result<bool> {
        self.line.read_value()
    }
}

impl Drop for GpioInput {
    fn drop(&mut self) {
        self.line.unexport();
    }
}

/// GPIO output line.
///
/// Not unexported on drop: releasing the power-enable line must not glitch
/// the rail it controls.
#[derive(Debug)]
pub struct GpioOutput {
    line: GpioLine,
}

impl GpioOutput {
    /// Export the line and configure it as an output.
    pub fn open(number: u32) -> Result<Self> {
        Ok(Self {
            line: GpioLine::export(number, "out")?,
        })
    }

    pub fn set_high(&mut self) -> Result<()> {
        self.line.write_value(true)
    }

    pub fn set_low(&mut self) -> Result<()> {
        self.line.write_value(false)
    }
}

/// Edge derivation state shared by the watcher thread and its tests.
#[derive(Debug)]
struct InputEdges {
    button_down: bool,
    pressed_at: Option<Instant>,
    held_sent: bool,
    ac_lost: Option<bool>,
}

impl InputEdges {
    fn new() -> Self {
        Self {
            button_down: false,
            pressed_at: None,
            held_sent: false,
            ac_lost: None,
        }
    }

    /// Fold one pair of sampled levels into zero or more events.
    fn step(&mut self, button: bool, ac_lost: bool, now: Instant, out: &mut Vec<HardwareEvent>) {
        if button && !self.button_down {
            self.pressed_at = Some(now);
            self.held_sent = false;
            out.push(HardwareEvent::Button(ButtonEvent::Pressed));
        }
        if button && !self.held_sent {
            if let Some(pressed_at) = self.pressed_at {
                if now.duration_since(pressed_at) >= HOLD_THRESHOLD {
                    self.held_sent = true;
                    out.push(HardwareEvent::Button(ButtonEvent::Held));
                }
            }
        }
        if !button && self.button_down {
            self.pressed_at = None;
            out.push(HardwareEvent::Button(ButtonEvent::Released));
        }
        self.button_down = button;

        // First observation only sets the baseline; edges after that.
        if let Some(prev) = self.ac_lost {
            if prev != ac_lost {
                out.push(HardwareEvent::Ac(if ac_lost {
                    AcEvent::Lost
                } else {
                    AcEvent::Restored
                }));
            }
        }
        self.ac_lost = Some(ac_lost);
    }
}

/// Polls the button and AC inputs, feeding edges into the event channel.
pub struct EdgeWatcher {
    button: GpioInput,
    ac: GpioInput,
    events: Sender<HardwareEvent>,
}

impl EdgeWatcher {
    pub fn new(button: GpioInput, ac: GpioInput, events: Sender<HardwareEvent>) -> Self {
        Self { button, ac, events }
    }

    /// Spawn the polling thread.
    pub fn spawn(self) -> std::io::Result<JoinHandle<()>> {
        std::thread::Builder::new()
            .name("gpio-edge".into())
            .spawn(move || self.run())
    }

    fn run(self) {
        let mut edges = InputEdges::new();
        let mut out = Vec::new();
        loop {
            std::thread::sleep(POLL_PERIOD);
            let button = match self.button.is_high() {
                Ok(level) => level,
                Err(e) => {
                    log::error!("power button line read failed: {}", e);
                    return;
                }
            };
            let ac_lost = match self.ac.is_high() {
                Ok(level) => level,
                Err(e) => {
                    log::error!("AC presence line read failed: {}", e);
                    return;
                }
            };
            edges.step(button, ac_lost, Instant::now(), &mut out);
            for event in out.drain(..) {
                if self.events.send(event).is_err() {
                    // Receiver gone, the supervisor is shutting down.
                    return;
                }
            }
        }
    }
}
