//! Hardware transports
//!
//! Thin I/O wrappers with no decision logic of their own: the I2C fuel
//! gauge bus and the sysfs GPIO lines. Both are owned resources created
//! once at startup; opens fail fast rather than hang.

pub mod gpio;
pub mod i2c;

pub use gpio::{EdgeWatcher, GpioInput, GpioOutput};
pub use i2c::I2cBus;
