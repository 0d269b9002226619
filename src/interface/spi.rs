//! SPI interface implementation built on top of `embedded-hal` `SpiDevice`.

use embedded_hal::spi::{Operation, SpiDevice};

use super::Fxos8700Interface;

/// SPI-based interface implementation for the FXOS8700CQ driver.
pub struct SpiInterface<SPI> {
    spi: SPI,
}

impl<SPI> SpiInterface<SPI> {
    /// Creates a new interface from the provided SPI device abstraction.
    pub const fn new(spi: SPI) -> Self {
        Self { spi }
    }

    /// Builds the two command bytes that precede every SPI transfer.
    ///
    /// Byte 0 carries the write flag in bit 7 and `ADDR[6:0]`; byte 1 carries
    /// `ADDR[7]` in its top bit.
    fn command(register: u8, is_write: bool) -> [u8; 2] {
        let mut first = register & 0x7F;
        if is_write {
            first |= 0x80;
        }
        [first, register & 0x80]
    }

    /// Provides mutable access to the wrapped SPI device.
    pub fn spi_mut(&mut self) -> &mut SPI {
        &mut self.spi
    }

    /// Consumes the interface and returns the owned SPI device.
    pub fn release(self) -> SPI {
        self.spi
    }
}

impl<SPI> Fxos8700Interface for SpiInterface<SPI>
where
    SPI: SpiDevice,
{
    type Error = SPI::Error;

    fn write_register(&mut self, register: u8, value: u8) -> core::result::Result<(), Self::Error> {
        self.write_many(register, core::slice::from_ref(&value))
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

        let command = Self::command(register, false);
        let len = buf.len();
        let mut operations = [Operation::Write(&command), Operation::Read(buf)];
        self.spi.transaction(&mut operations)?;
        Ok(len)
    }

    fn write_many(&mut self, register: u8, data: &[u8]) -> core::result::Result<(), Self::Error> {
        if data.is_empty() {
            return Ok(());
        }

        let command = Self::command(register, true);
        let mut operations = [Operation::Write(&command), Operation::Write(data)];
        self.spi.transaction(&mut operations)
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::SpiInterface;
    use crate::interface::Fxos8700Interface;
    use embedded_hal_mock::eh1::spi::{Mock as SpiMock, Transaction as SpiTransaction};
    use std::vec;

    #[test]
    fn command_encodes_direction_and_high_address_bit() {
        assert_eq!(SpiInterface::<()>::command(0x2A, true), [0xAA, 0x00]);
        assert_eq!(SpiInterface::<()>::command(0x0D, false), [0x0D, 0x00]);
        assert_eq!(SpiInterface::<()>::command(0xC0, false), [0x40, 0x80]);
    }

    #[test]
    fn read_many_sends_command_then_reads() {
        let expectations = [
            SpiTransaction::transaction_start(),
            SpiTransaction::write_vec(vec![0x01, 0x00]),
            SpiTransaction::read_vec(vec![0x10, 0x20, 0x30]),
            SpiTransaction::transaction_end(),
        ];
        let mut spi = SpiMock::new(&expectations);
        let mut interface = SpiInterface::new(spi.clone());

        let mut buf = [0u8; 3];
        assert_eq!(interface.read_many(0x01, &mut buf).unwrap(), 3);
        assert_eq!(buf, [0x10, 0x20, 0x30]);
        spi.done();
    }

    #[test]
    fn write_register_sends_command_then_value() {
        let expectations = [
            SpiTransaction::transaction_start(),
            SpiTransaction::write_vec(vec![0xAA, 0x00]),
            SpiTransaction::write_vec(vec![0x0D]),
            SpiTransaction::transaction_end(),
        ];
        let mut spi = SpiMock::new(&expectations);
        let mut interface = SpiInterface::new(spi.clone());

        interface.write_register(0x2A, 0x0D).unwrap();
        spi.done();
    }

    #[test]
    fn empty_transfers_are_skipped() {
        let expectations: [SpiTransaction<u8>; 0] = [];
        let mut spi = SpiMock::new(&expectations);
        let mut interface = SpiInterface::new(spi.clone());

        assert_eq!(interface.read_many(0x01, &mut []).unwrap(), 0);
        interface.write_many(0x01, &[]).unwrap();
        spi.done();
    }
}
