//! I2C fuel gauge transport
//!
//! Talks to the UPS fuel gauge through the kernel i2c-dev interface:
//! `/dev/i2c-<bus>`, slave address selected with the `I2C_SLAVE` ioctl,
//! registers read as two big-endian wire bytes.

use crate::error::Result;
use crate::telemetry::BatteryGauge;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::os::unix::io::AsRawFd;

// I2C_SLAVE from linux/i2c-dev.h
const I2C_SLAVE: libc::c_int = 0x0703;

nix::ioctl_write_int_bad!(i2c_set_slave, I2C_SLAVE);

/// Exclusive handle on one I2C slave device.
pub struct I2cBus {
    file: File,
}

impl I2cBus {
    /// Open `/dev/i2c-<bus>` and bind it to the given slave address.
    pub fn open(bus: u8, addr: u16) -> Result<Self> {
        let path = format!("/dev/i2c-{}", bus);
        let file = OpenOptions::new().read(true).write(true).open(&path)?;
        unsafe { i2c_set_slave(file.as_raw_fd(), addr as libc::c_int) }?;
        Ok(Self { file })
    }

    /// Read a 16-bit register, correcting the device's big-endian layout
    /// to host order.
    pub fn read_word_be(&mut self, reg: u8) -> Result<u16> {
        self.file.write_all(&[reg])?;
        let mut buf = [0u8; 2];
        self.file.read_exact(&mut buf)?;
        Ok(u16::from_be_bytes(buf))
    }
}

impl BatteryGauge for I2cBus {
    fn read_register(&mut self, reg: u8) -> Result<u16> {
        self.read_word_be(reg)
    }
}
