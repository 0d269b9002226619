//! I2C interface implementation built on top of `embedded-hal` `I2c`.

use embedded_hal::i2c::I2c;

use super::Fxos8700Interface;
use crate::params::SlaveAddress;

// Register address plus the longest burst the driver issues.
const MAX_WRITE: usize = 1 + 8;

/// I2C-based interface implementation for the FXOS8700CQ driver.
pub struct I2cInterface<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C> I2cInterface<I2C> {
    /// Creates a new interface talking to the device at `address`.
    pub const fn new(i2c: I2C, address: SlaveAddress) -> Self {
        Self {
            i2c,
            address: address.addr(),
        }
    }

    /// Seven-bit address the interface talks to.
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Provides mutable access to the wrapped I2C bus.
    pub fn i2c_mut(&mut self) -> &mut I2C {
        &mut self.i2c
    }

    /// Consumes the interface and returns the owned I2C bus.
    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C> Fxos8700Interface for I2cInterface<I2C>
where
    I2C: I2c,
{
    type Error = I2C::Error;

    fn write_register(&mut self, register: u8, value: u8) -> core::result::Result<(), Self::Error> {
        self.i2c.write(self.address, &[register, value])
    }

    fn read_register(&mut self, register: u8) -> core::result::Result<u8, Self::Error> {
        let mut value = [0u8; 1];
        self.read_many(register, &mut value)?;
        Ok(value[0])
    }

    fn read_many(&mut self, register: u8, buf: &mut [u8]) -> core::result::Result<usize, Self::Error> {
        if buf.is_empty() {
            return Ok(0);
        }

        // Register address goes out with a repeated start before the read.
        self.i2c.write_read(self.address, &[register], buf)?;
        Ok(buf.len())
    }

    fn write_many(&mut self, register: u8, data: &[u8]) -> core::result::Result<(), Self::Error> {
        if data.is_empty() {
            return Ok(());
        }

        // Fall back to one register per transfer for bursts longer than the
        // stack frame.
        if data.len() >= MAX_WRITE {
            for (offset, &value) in data.iter().enumerate() {
                self.write_register(register.wrapping_add(offset as u8), value)?;
            }
            return Ok(());
        }

        let mut frame = [0u8; MAX_WRITE];
        frame[0] = register;
        frame[1..=data.len()].copy_from_slice(data);
        self.i2c.write(self.address, &frame[..=data.len()])
    }
}
