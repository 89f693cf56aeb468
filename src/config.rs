//! Runtime configuration and board constants
//!
//! Settings are read once at startup (CLI flags, optionally seeded from a
//! TOML file) and are immutable afterwards. The board constants describe the
//! fixed wiring of the UPS add-on: three GPIO lines, one fuel gauge on the
//! I2C bus, and the kernel thermal zone for the CPU temperature.

use crate::error::{Result, UpsError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// BCM pin of the physical power button (board pin 29).
pub const GPIO_PIN_PWR_BUTTON: u32 = 5;
/// BCM pin of the AC presence signal (board pin 31). High means AC lost.
pub const GPIO_PIN_AC_LOST: u32 = 6;
/// BCM pin of the power-enable output (board pin 32).
pub const GPIO_PIN_PWR_TRIGGER: u32 = 12;

/// I2C bus number carrying the fuel gauge (`/dev/i2c-1`).
pub const I2C_BUS: u8 = 1;
/// I2C address of the battery fuel gauge.
pub const I2C_BATTERY_ADDR: u16 = 0x36;
/// Fuel gauge register holding the cell voltage.
pub const REG_VOLTAGE: u8 = 0x02;
/// Fuel gauge register holding the state of charge.
pub const REG_CHARGE: u8 = 0x04;

/// Sysfs file exposing the CPU temperature in millidegrees Celsius.
pub const TEMPERATURE_PATH: &str = "/sys/class/thermal/thermal_zone0/temp";

/// Press duration after which a button press is classified as held.
pub const HOLD_THRESHOLD: Duration = Duration::from_secs(2);

/// Supervisor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Poll interval in seconds.
    pub interval_secs: f64,
    /// Minimum battery voltage before emergency poweroff.
    pub min_voltage: f64,
    /// Render the terminal dashboard instead of plain line output.
    pub ncurses: bool,
    /// Suppress all output.
    pub quiet: bool,
    /// Watch only: no GPIO actuation, voltage guard disabled.
    pub watch: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            interval_secs: 2.0,
            min_voltage: 3.5,
            ncurses: false,
            quiet: false,
            watch: false,
        }
    }
}

impl Config {
    /// Load from a TOML file
    pub fn from_toml_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| UpsError::Configuration(format!("Cannot read {}: {}", path, e)))?;
        Self::from_toml(&content)
    }

    /// Parse from a TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| UpsError::Configuration(format!("TOML parse error: {}", e)))
    }

    /// Generate sample config
    pub fn sample_toml() -> String {
        r#"# upsmon configuration
interval_secs = 2.0
min_voltage = 3.5
ncurses = false
quiet = false
watch = false
"#
        .into()
    }

    /// Poll interval as a [`Duration`].
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs_f64(self.interval_secs)
    }

    /// Reject non-positive interval or threshold values.
    pub fn validate(&self) -> Result<()> {
        if !(self.interval_secs.is_finite() && self.interval_secs > 0.0) {
            return Err(UpsError::Configuration(format!(
                "'{}' is not a positive interval",
                self.interval_secs
            )));
        }
        if !(self.min_voltage.is_finite() && self.min_voltage > 0.0) {
            return Err(UpsError::Configuration(format!(
                "'{}' is not a positive voltage",
                self.min_voltage
            )));
        }
        Ok(())
    }
}
