//! UPS power-management supervisor for battery-backed single-board computers
//!
//! Samples board telemetry (CPU temperature, battery voltage, state of
//! charge), powers the host off when the battery voltage falls below a
//! configured minimum, and turns power-button gestures into host power
//! transitions: a quick press reboots, a 2-second hold powers off. AC
//! loss/restore edges are tracked as an observe-only hook.
//!
//! Hardware edges arrive as discrete events on an mpsc channel consumed by
//! the [`events::EventDispatcher`]; the [`monitor::Monitor`] runs an
//! independent synchronous poll-sleep cycle. The two share nothing but the
//! host power state, whose transitions are one-shot.
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::atomic::AtomicBool;
//! use std::sync::Arc;
//! use upsmonlib::config::{I2C_BATTERY_ADDR, I2C_BUS};
//! use upsmonlib::hw::I2cBus;
//! use upsmonlib::power::SystemPower;
//! use upsmonlib::telemetry::TelemetrySource;
//! use upsmonlib::ui::NullSink;
//! use upsmonlib::{Config, Monitor};
//!
//! # fn main() -> upsmonlib::Result<()> {
//! let running = Arc::new(AtomicBool::new(true));
//! let source = TelemetrySource::new(I2cBus::open(I2C_BUS, I2C_BATTERY_ADDR)?);
//! let sink = Box::new(NullSink::new(running.clone()));
//! let mut monitor = Monitor::new(source, SystemPower, sink, Config::default(), running);
//! let _code = monitor.run()?;
//! # Ok(())
//! # }
//! ```

pub mod acpower;
pub mod button;
pub mod config;
pub mod error;
pub mod events;
pub mod guard;
#[cfg(unix)]
pub mod hw;
pub mod monitor;
pub mod power;
pub mod telemetry;
pub mod ui;

pub use config::Config;
pub use error::{Result, UpsError};
pub use monitor::Monitor;
pub use telemetry::{BatteryGauge, TelemetrySample, TelemetrySource};
