//! Register access directly over a [`TransferBus`].
//!
//! Unlike [`I2cInterface`](super::i2c::I2cInterface) wrapped around the same
//! bus, reads here report how many bytes the transport actually delivered, so
//! a truncated burst reaches the driver as a byte count rather than a bus
//! fault.

use embedded_hal::i2c::{I2c, Operation};

use super::Fxos8700Interface;
use crate::params::SlaveAddress;
use crate::transfer::{TransferBus, TransferError, Transport, MERGE_CAPACITY};

/// Interface over an interrupt-driven [`TransferBus`].
pub struct TransferInterface<'s, T> {
    bus: TransferBus<'s, T>,
    address: u8,
}

impl<'s, T> TransferInterface<'s, T> {
    /// Creates a new interface talking to the device at `address`.
    pub const fn new(bus: TransferBus<'s, T>, address: SlaveAddress) -> Self {
        Self {
            bus,
            address: address.addr(),
        }
    }

    /// Seven-bit address the interface talks to.
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Provides mutable access to the wrapped bus.
    pub fn bus_mut(&mut self) -> &mut TransferBus<'s, T> {
        &mut self.bus
    }

    /// Consumes the interface and returns the owned bus.
    pub fn release(self) -> TransferBus<'s, T> {
        self.bus
    }
}

impl<T> Fxos8700Interface for TransferInterface<'_, T>
where
    T: Transport,
{
    type Error = TransferError<T::Error>;

    fn write_register(&mut self, register: u8, value: u8) -> core::result::Result<(), Self::Error> {
        self.bus.write_phase(self.address, &[register, value], false)
    }

    fn read_register(&mut self, register: u8) -> core::result::Result<u8, Self::Error> {
        let mut value = [0u8; 1];
        if self.read_many(register, &mut value)? == 0 {
            return Err(TransferError::ShortRead {
                expected: 1,
                actual: 0,
            });
        }
        Ok(value[0])
    }

    fn read_many(&mut self, register: u8, buf: &mut [u8]) -> core::result::Result<usize, Self::Error> {
        if buf.is_empty() {
            return Ok(0);
        }

        self.bus.write_phase(self.address, &[register], true)?;
        self.bus.read_counted(self.address, buf, false)
    }

    fn write_many(&mut self, register: u8, data: &[u8]) -> core::result::Result<(), Self::Error> {
        if data.is_empty() {
            return Ok(());
        }

        if data.len() >= MERGE_CAPACITY {
            for (offset, &value) in data.iter().enumerate() {
                self.write_register(register.wrapping_add(offset as u8), value)?;
            }
            return Ok(());
        }

        self.bus.transaction(
            self.address,
            &mut [Operation::Write(&[register]), Operation::Write(data)],
        )
    }
}
