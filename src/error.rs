//! Error handling primitives for the FXOS8700CQ driver.

use embedded_hal::i2c::{self, ErrorKind};

/// Crate-wide result type alias.
pub type Result<T, E> = core::result::Result<T, Error<E>>;

/// Error variants produced by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// Any error reported by the underlying bus interface.
    Interface(E),
    /// `WHO_AM_I` did not hold the FXOS8700CQ identity; carries the value read.
    IdentityMismatch(u8),
    /// A burst read returned a different number of bytes than requested.
    MalformedResponse {
        /// Bytes requested.
        expected: usize,
        /// Bytes actually obtained.
        actual: usize,
    },
    /// The provided configuration parameters are invalid.
    InvalidConfig,
    /// The device must pass [`init`](crate::Fxos8700::init) first.
    NotReady,
}

impl<E> From<E> for Error<E> {
    fn from(err: E) -> Self {
        Self::Interface(err)
    }
}

impl<E> Error<E>
where
    E: i2c::Error,
{
    /// Returns `true` when the caller may retry or proceed.
    ///
    /// A `false` result means the bus or device is in an unknown state: bus
    /// faults during a read phase, arbitration loss and transport failures.
    /// Only NACKs are considered recoverable among the interface errors.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Interface(err) => matches!(err.kind(), ErrorKind::NoAcknowledge(_)),
            Self::IdentityMismatch(_)
            | Self::MalformedResponse { .. }
            | Self::InvalidConfig
            | Self::NotReady => true,
        }
    }
}
