//! Board telemetry sampling
//!
//! Produces one [`TelemetrySample`] per poll cycle from two independent
//! sources: the kernel thermal zone (CPU temperature, millidegrees Celsius)
//! and the UPS fuel gauge (cell voltage and state of charge, two 16-bit
//! big-endian registers).
//!
//! ## Platform Support
//!
//! - **Linux**: `/sys/class/thermal/thermal_zone0/temp`, `/dev/i2c-1`
//!
//! A missing thermal zone is a boot-time warning, not an error: every
//! subsequent sample simply reports the temperature as absent. Fuel gauge
//! read failures propagate; voltage is required for the shutdown guard.

use crate::config::{REG_CHARGE, REG_VOLTAGE, TEMPERATURE_PATH};
use crate::error::Result;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Access to the fuel gauge's 16-bit registers.
///
/// Implementations return the register value in host order, most significant
/// wire byte first (the gauge transmits big-endian).
pub trait BatteryGauge {
    /// Read a raw 16-bit register.
    fn read_register(&mut self, reg: u8) -> Result<u16>;
}

/// One poll cycle's worth of board telemetry.
///
/// Immutable once produced; created fresh each cycle and handed to the
/// presentation sink by value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetrySample {
    /// CPU temperature in whole degrees Celsius, absent if the sensor is
    /// unavailable or the read was malformed.
    pub temperature_c: Option<i64>,
    /// Battery voltage in volts.
    pub voltage: f64,
    /// Battery state of charge in percent.
    pub charge_percent: f64,
    /// Wall-clock instant the sample was taken.
    pub timestamp: DateTime<Local>,
}

/// Convert a raw voltage register value to volts.
pub fn voltage_from_raw(raw: u16) -> f64 {
    raw as f64 * 1.25 / 1000.0 / 16.0
}

/// Convert a raw state-of-charge register value to percent.
pub fn charge_from_raw(raw: u16) -> f64 {
    raw as f64 / 256.0
}

/// Telemetry source
pub struct TelemetrySource<G> {
    gauge: G,
    temperature_path: PathBuf,
    temperature_available: bool,
}

impl<G: BatteryGauge> TelemetrySource<G> {
    /// Create a source reading the board's default thermal zone.
    pub fn new(gauge: G) -> Self {
        Self::with_temperature_path(gauge, TEMPERATURE_PATH)
    }

    /// Create a source with an explicit temperature file path.
    pub fn with_temperature_path(gauge: G, path: impl Into<PathBuf>) -> Self {
        let temperature_path = path.into();
        let temperature_available = temperature_path.is_file();
        if !temperature_available {
            log::warn!(
                "cannot open {}; temperature will not be reported",
                temperature_path.display()
            );
        }
        Self {
            gauge,
            temperature_path,
            temperature_available,
        }
    }

    /// Whether the temperature sensor was readable at startup.
    pub fn temperature_available(&self) -> bool {
        self.temperature_available
    }

    /// Take one telemetry sample.
    ///
    /// A malformed temperature read is logged and yields an absent
    /// temperature for this cycle only; gauge errors propagate.
    pub fn sample(&mut self) -> Result<TelemetrySample> {
        let temperature_c = if self.temperature_available {
            read_temperature(&self.temperature_path)
        } else {
            None
        };
        let voltage = voltage_from_raw(self.gauge.read_register(REG_VOLTAGE)?);
        let charge_percent = charge_from_raw(self.gauge.read_register(REG_CHARGE)?);
        Ok(TelemetrySample {
            temperature_c,
            voltage,
            charge_percent,
            timestamp: Local::now(),
        })
    }
}

/// Read the thermal zone file: a single line holding millidegrees Celsius.
///
/// Non-numeric or non-positive content counts as a malformed read.
fn read_temperature(path: &Path) -> Option<i64> {
    let content = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            log::error!("failed to read {}: {}", path.display(), e);
            return None;
        }
    };
    match content.trim().parse::<i64>() {
        Ok(raw) if raw > 0 => Some(raw / 1000),
        Ok(raw) => {
            log::error!("invalid value in {}: '{}'", path.display(), raw);
            None
        }
        Err(_) => {
            log::error!("invalid value in {}: '{}'", path.display(), content.trim());
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{REG_CHARGE, REG_VOLTAGE};
    use std::io::Write;

    /// Gauge stub answering from fixed register values.
    struct FixedGauge {
        voltage_raw: u16,
        charge_raw: u16,
    }

    impl BatteryGauge for FixedGauge {
        fn read_register(&mut self, reg: u8) -> Result<u16> {
            match reg {
                REG_VOLTAGE => Ok(self.voltage_raw),
                REG_CHARGE => Ok(self.charge_raw),
                other => panic!("unexpected register {other:#04x}"),
            }
        }
    }

    fn temp_file(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("upsmon-test-{}-{}", std::process::id(), name));
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_voltage_conversion_exact() {
        // 1280 * 1.25 / 1000 / 16 == 0.1 V
        assert_eq!(voltage_from_raw(1280), 0.1);
        assert_eq!(voltage_from_raw(0), 0.0);
    }

    #[test]
    fn test_charge_conversion_exact() {
        // The gauge keeps whole percent in the high register byte.
        assert_eq!(charge_from_raw(0x6400), 100.0);
        assert_eq!(charge_from_raw(256), 1.0);
        assert_eq!(charge_from_raw(0x3200), 50.0);
    }

    #[test]
    fn test_sample_with_temperature() {
        let path = temp_file("temp-ok", "47123\n");
        let gauge = FixedGauge {
            voltage_raw: 49920, // 3.9 V
            charge_raw: 0x6400, // 100 %
        };
        let mut source = TelemetrySource::with_temperature_path(gauge, &path);
        assert!(source.temperature_available());

        let sample = source.sample().unwrap();
        assert_eq!(sample.temperature_c, Some(47));
        assert_eq!(sample.voltage, 3.9);
        assert_eq!(sample.charge_percent, 100.0);

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_missing_sensor_does_not_abort_sampling() {
        let gauge = FixedGauge {
            voltage_raw: 46080, // 3.6 V
            charge_raw: 0x3200,
        };
        let mut source =
            TelemetrySource::with_temperature_path(gauge, "/nonexistent/thermal/temp");
        assert!(!source.temperature_available());

        let sample = source.sample().unwrap();
        assert_eq!(sample.temperature_c, None);
        assert_eq!(sample.voltage, 3.6);
        assert_eq!(sample.charge_percent, 50.0);
    }

    #[test]
    fn test_malformed_temperature_is_absent_for_the_cycle() {
        let path = temp_file("temp-bad", "not-a-number\n");
        let gauge = FixedGauge {
            voltage_raw: 46080,
            charge_raw: 0x3200,
        };
        let mut source = TelemetrySource::with_temperature_path(gauge, &path);
        let sample = source.sample().unwrap();
        assert_eq!(sample.temperature_c, None);
        assert_eq!(sample.voltage, 3.6);

        // A later well-formed read recovers.
        std::fs::write(&path, "51000\n").unwrap();
        let sample = source.sample().unwrap();
        assert_eq!(sample.temperature_c, Some(51));

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_non_positive_temperature_is_malformed() {
        let path = temp_file("temp-neg", "-5000\n");
        let gauge = FixedGauge {
            voltage_raw: 46080,
            charge_raw: 0x3200,
        };
        let mut source = TelemetrySource::with_temperature_path(gauge, &path);
        let sample = source.sample().unwrap();
        assert_eq!(sample.temperature_c, None);

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_sample_serialization() {
        let path = temp_file("temp-ser", "40000\n");
        let gauge = FixedGauge {
            voltage_raw: 49920,
            charge_raw: 0x6400,
        };
        let mut source = TelemetrySource::with_temperature_path(gauge, &path);
        let sample = source.sample().unwrap();
        let json = serde_json::to_string(&sample).unwrap();
        assert!(json.contains("\"voltage\":3.9"));
        let _: TelemetrySample = serde_json::from_str(&json).unwrap();

        let _ = std::fs::remove_file(path);
    }
}
