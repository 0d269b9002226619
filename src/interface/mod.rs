//! Bus interface abstraction for the FXOS8700CQ driver.

pub mod i2c;
pub mod spi;
pub mod transfer;

/// Abstraction over the low-level bus access required by the driver.
pub trait Fxos8700Interface {
    /// Error type produced by the concrete bus implementation.
    type Error;

    /// Writes a single register.
    fn write_register(&mut self, register: u8, value: u8) -> core::result::Result<(), Self::Error>;

    /// Reads a single register.
    fn read_register(&mut self, register: u8) -> core::result::Result<u8, Self::Error>;

    /// Reads consecutive registers into `buf` and returns how many bytes were
    /// obtained.
    ///
    /// Buses whose contract fills the whole buffer or fails, such as
    /// `embedded-hal` I2C and SPI, always return `buf.len()`.
    fn read_many(&mut self, register: u8, buf: &mut [u8]) -> core::result::Result<usize, Self::Error>;

    /// Writes multiple consecutive registers from the provided buffer.
    fn write_many(&mut self, register: u8, data: &[u8]) -> core::result::Result<(), Self::Error>;
}
