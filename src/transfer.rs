//! Blocking two-wire bus built from an interrupt-driven transport.
//!
//! Platform bus drivers typically start a transfer and report its end later
//! from an interrupt handler. [`TransferBus`] pairs such a [`Transport`] with a
//! [`CompletionSignal`] and turns every transfer into a blocking call, exposing
//! the result as an [`embedded_hal::i2c::I2c`] bus the rest of the driver can
//! use like any other.
//!
//! Every transfer follows the same cycle: arm the signal, start the transfer,
//! wait for the interrupt handler to call [`CompletionSignal::notify`]. A
//! register read is two such cycles, the register address written with the bus
//! held (repeated start) followed by the read itself.
//!
//! Adjacent operations of the same kind in an [`I2c::transaction`] are merged
//! into one transfer, up to [`MERGE_CAPACITY`] bytes.

use embedded_hal::i2c::{self, ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation};

use crate::log::{debug, error, trace, warning};
use crate::signal::{CompletionSignal, Outcome};

/// Bus clock frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Frequency {
    /// 100 kHz standard mode.
    K100,
    /// 250 kHz.
    K250,
    /// 400 kHz fast mode.
    K400,
}

impl Frequency {
    /// Returns the clock frequency in hertz.
    pub const fn hz(self) -> u32 {
        match self {
            Self::K100 => 100_000,
            Self::K250 => 250_000,
            Self::K400 => 400_000,
        }
    }
}

/// Pin assignment and clock settings handed to [`Transport::configure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BusConfig {
    /// Clock line pin number.
    pub scl: u32,
    /// Data line pin number.
    pub sda: u32,
    /// Bus clock frequency.
    pub frequency: Frequency,
}

impl BusConfig {
    /// Creates a configuration for the given pins at 400 kHz.
    pub const fn new(scl: u32, sda: u32) -> Self {
        Self {
            scl,
            sda,
            frequency: Frequency::K400,
        }
    }

    /// Overrides the bus clock frequency.
    pub const fn with_frequency(mut self, frequency: Frequency) -> Self {
        self.frequency = frequency;
        self
    }
}

/// Interrupt-driven bus transfer primitives supplied by the platform.
///
/// `start_*` methods only begin a transfer. When it ends, the platform's bus
/// interrupt handler must call [`CompletionSignal::notify`] on the signal the
/// [`TransferBus`] was built with, exactly once, whatever the outcome.
pub trait Transport {
    /// Error type produced when a transfer cannot be started.
    type Error: core::fmt::Debug;

    /// Applies pin and clock settings and enables the peripheral.
    fn configure(&mut self, config: &BusConfig) -> core::result::Result<(), Self::Error>;

    /// Starts writing `bytes` to `address`.
    ///
    /// Implementations copy `bytes` into their own transfer storage before
    /// returning. With `hold_bus` set no stop condition is issued at the end so
    /// the next transfer starts with a repeated start.
    fn start_write(
        &mut self,
        address: u8,
        bytes: &[u8],
        hold_bus: bool,
    ) -> core::result::Result<(), Self::Error>;

    /// Starts reading `len` bytes from `address`.
    ///
    /// `hold_bus` has the same meaning as for [`start_write`](Self::start_write).
    fn start_read(
        &mut self,
        address: u8,
        len: usize,
        hold_bus: bool,
    ) -> core::result::Result<(), Self::Error>;

    /// Copies the bytes received by the last completed read into `buf` and
    /// returns how many arrived.
    fn take_received(&mut self, buf: &mut [u8]) -> usize;
}

/// Errors produced by [`TransferBus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransferError<E> {
    /// The completion signal still had a transfer outstanding.
    Busy,
    /// The transport refused to start a transfer.
    Transport(E),
    /// A write was not acknowledged.
    Nack(NoAcknowledgeSource),
    /// A write ended with an unclassified bus event.
    Unknown,
    /// The read phase of a transfer failed; the bus state is unknown.
    ReadFault(Outcome),
    /// The read phase delivered fewer bytes than requested.
    ShortRead {
        /// Bytes requested.
        expected: usize,
        /// Bytes received.
        actual: usize,
    },
    /// Merged operations exceed [`MERGE_CAPACITY`].
    Unsupported,
}

/// Largest run of adjacent same-kind operations [`TransferBus`] merges into
/// one transfer.
pub const MERGE_CAPACITY: usize = 32;

impl<E> i2c::Error for TransferError<E>
where
    E: core::fmt::Debug,
{
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Nack(source) => ErrorKind::NoAcknowledge(*source),
            Self::ReadFault(_) | Self::ShortRead { .. } => ErrorKind::Bus,
            Self::Busy | Self::Transport(_) | Self::Unknown | Self::Unsupported => ErrorKind::Other,
        }
    }
}

/// Blocking bus handle over an interrupt-driven [`Transport`].
pub struct TransferBus<'s, T> {
    transport: T,
    signal: &'s CompletionSignal,
}

impl<'s, T> TransferBus<'s, T>
where
    T: Transport,
{
    /// Configures the transport and wraps it into a blocking bus.
    pub fn init(
        mut transport: T,
        signal: &'s CompletionSignal,
        config: &BusConfig,
    ) -> core::result::Result<Self, TransferError<T::Error>> {
        transport.configure(config).map_err(|err| {
            error!("bus configuration failed");
            TransferError::Transport(err)
        })?;
        debug!(
            "bus ready: scl={=u32} sda={=u32} {=u32} Hz",
            config.scl,
            config.sda,
            config.frequency.hz()
        );

        Ok(Self::new(transport, signal))
    }

    /// Wraps an already configured transport.
    pub const fn new(transport: T, signal: &'s CompletionSignal) -> Self {
        Self { transport, signal }
    }

    /// Returns the completion signal this bus waits on.
    pub fn signal(&self) -> &'s CompletionSignal {
        self.signal
    }

    /// Provides mutable access to the wrapped transport.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Consumes the bus and returns the owned transport.
    pub fn release(self) -> T {
        self.transport
    }

    /// Writes `bytes` to `address` and blocks until the transfer completes.
    pub fn write_phase(
        &mut self,
        address: u8,
        bytes: &[u8],
        hold_bus: bool,
    ) -> core::result::Result<(), TransferError<T::Error>> {
        self.signal.reset().map_err(|_| TransferError::Busy)?;
        if let Err(err) = self.transport.start_write(address, bytes, hold_bus) {
            self.signal.disarm();
            return Err(TransferError::Transport(err));
        }

        let outcome = self.signal.wait();
        trace!("write to {=u8:#x} finished: {}", address, outcome);
        match outcome {
            Outcome::Complete => Ok(()),
            Outcome::AddressNack => {
                warning!("address {=u8:#x} not acknowledged", address);
                Err(TransferError::Nack(NoAcknowledgeSource::Address))
            }
            Outcome::DataNack => {
                warning!("data to {=u8:#x} not acknowledged", address);
                Err(TransferError::Nack(NoAcknowledgeSource::Data))
            }
            Outcome::Other => Err(TransferError::Unknown),
        }
    }

    /// Reads `buf.len()` bytes from `address` and blocks until they arrive.
    ///
    /// Any failure here is reported as [`TransferError::ReadFault`] or
    /// [`TransferError::ShortRead`], both of which leave the bus state unknown.
    pub fn read_phase(
        &mut self,
        address: u8,
        buf: &mut [u8],
        hold_bus: bool,
    ) -> core::result::Result<(), TransferError<T::Error>> {
        let actual = self.read_counted(address, buf, hold_bus)?;
        if actual != buf.len() {
            error!(
                "short read from {=u8:#x}: {=usize} of {=usize}",
                address,
                actual,
                buf.len()
            );
            return Err(TransferError::ShortRead {
                expected: buf.len(),
                actual,
            });
        }

        Ok(())
    }

    /// Like [`read_phase`](Self::read_phase) but returns how many bytes
    /// arrived instead of failing when fewer than `buf.len()` did.
    pub fn read_counted(
        &mut self,
        address: u8,
        buf: &mut [u8],
        hold_bus: bool,
    ) -> core::result::Result<usize, TransferError<T::Error>> {
        self.signal.reset().map_err(|_| TransferError::Busy)?;
        if let Err(err) = self.transport.start_read(address, buf.len(), hold_bus) {
            self.signal.disarm();
            return Err(TransferError::Transport(err));
        }

        let outcome = self.signal.wait();
        trace!("read from {=u8:#x} finished: {}", address, outcome);
        if !outcome.is_complete() {
            error!("read from {=u8:#x} failed: {}", address, outcome);
            return Err(TransferError::ReadFault(outcome));
        }

        Ok(self.transport.take_received(buf))
    }

    fn merged_write(
        &mut self,
        address: u8,
        operations: &[Operation<'_>],
        hold_bus: bool,
    ) -> core::result::Result<(), TransferError<T::Error>> {
        let mut frame = [0u8; MERGE_CAPACITY];
        let mut len = 0;
        for operation in operations {
            if let Operation::Write(bytes) = operation {
                let end = len + bytes.len();
                if end > MERGE_CAPACITY {
                    return Err(TransferError::Unsupported);
                }
                frame[len..end].copy_from_slice(bytes);
                len = end;
            }
        }

        self.write_phase(address, &frame[..len], hold_bus)
    }

    fn merged_read(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
        hold_bus: bool,
    ) -> core::result::Result<(), TransferError<T::Error>> {
        let total: usize = operations
            .iter()
            .map(|operation| match operation {
                Operation::Read(buf) => buf.len(),
                Operation::Write(_) => 0,
            })
            .sum();
        if total > MERGE_CAPACITY {
            return Err(TransferError::Unsupported);
        }

        let mut scratch = [0u8; MERGE_CAPACITY];
        self.read_phase(address, &mut scratch[..total], hold_bus)?;

        let mut offset = 0;
        for operation in operations.iter_mut() {
            if let Operation::Read(buf) = operation {
                let end = offset + buf.len();
                buf.copy_from_slice(&scratch[offset..end]);
                offset = end;
            }
        }
        Ok(())
    }
}

impl<T> ErrorType for TransferBus<'_, T>
where
    T: Transport,
{
    type Error = TransferError<T::Error>;
}

impl<T> I2c for TransferBus<'_, T>
where
    T: Transport,
{
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> core::result::Result<(), Self::Error> {
        let mut runs = operations.chunk_by_mut(same_kind).peekable();
        while let Some(run) = runs.next() {
            // Every run but the last ends in a repeated start.
            let hold_bus = runs.peek().is_some();
            match run {
                [Operation::Write(bytes)] => self.write_phase(address, bytes, hold_bus)?,
                [Operation::Read(buf)] => self.read_phase(address, buf, hold_bus)?,
                [Operation::Write(_), ..] => self.merged_write(address, run, hold_bus)?,
                [Operation::Read(_), ..] => self.merged_read(address, run, hold_bus)?,
                [] => {}
            }
        }

        Ok(())
    }
}

fn same_kind(a: &Operation<'_>, b: &Operation<'_>) -> bool {
    matches!(
        (a, b),
        (Operation::Write(_), Operation::Write(_)) | (Operation::Read(_), Operation::Read(_))
    )
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::{BusConfig, Frequency, TransferBus, TransferError, MERGE_CAPACITY};
    use crate::signal::{CompletionSignal, Outcome};
    use crate::sim::{Fault, SimTransport, TransferRecord};
    use embedded_hal::i2c::{Error as _, ErrorKind, I2c, NoAcknowledgeSource, Operation};
    use std::vec;

    const ADDR: u8 = 0x1E;

    fn bus(signal: &CompletionSignal) -> TransferBus<'_, SimTransport<'_>> {
        TransferBus::init(SimTransport::new(signal, ADDR), signal, &BusConfig::new(7, 30))
            .unwrap()
    }

    #[test]
    fn init_configures_transport() {
        let signal = CompletionSignal::new();
        let bus = TransferBus::init(
            SimTransport::new(&signal, ADDR),
            &signal,
            &BusConfig::new(7, 30).with_frequency(Frequency::K100),
        )
        .unwrap();
        assert_eq!(
            bus.release().configured,
            Some(BusConfig {
                scl: 7,
                sda: 30,
                frequency: Frequency::K100
            })
        );
    }

    #[test]
    fn init_reports_configuration_failure() {
        let signal = CompletionSignal::new();
        let mut transport = SimTransport::new(&signal, ADDR);
        transport.refuse_configure = true;
        let result = TransferBus::init(transport, &signal, &BusConfig::new(7, 30));
        assert!(matches!(result, Err(TransferError::Transport(_))));
    }

    #[test]
    fn write_then_read_returns_last_written_value() {
        let signal = CompletionSignal::new();
        let mut bus = bus(&signal);

        for value in [0x00, 0x5A, 0xFF, 0x0D] {
            bus.write(ADDR, &[0x2A, value]).unwrap();
            let mut buf = [0u8; 1];
            bus.write_read(ADDR, &[0x2A], &mut buf).unwrap();
            assert_eq!(buf[0], value);
        }
        assert!(signal.is_idle());
    }

    #[test]
    fn register_read_holds_bus_between_phases() {
        let signal = CompletionSignal::new();
        let mut bus = bus(&signal);
        bus.transport_mut().registers[0x01..0x07].copy_from_slice(&[1, 2, 3, 4, 5, 6]);

        let mut buf = [0u8; 6];
        bus.write_read(ADDR, &[0x01], &mut buf).unwrap();
        assert_eq!(buf, [1, 2, 3, 4, 5, 6]);

        let transport = bus.release();
        assert_eq!(
            transport.log,
            vec![
                TransferRecord::Write {
                    bytes: vec![0x01],
                    hold_bus: true
                },
                TransferRecord::Read {
                    len: 6,
                    hold_bus: false
                },
            ]
        );
    }

    #[test]
    fn plain_write_releases_bus() {
        let signal = CompletionSignal::new();
        let mut bus = bus(&signal);
        bus.write(ADDR, &[0x0E, 0x01]).unwrap();
        assert_eq!(
            bus.release().log,
            vec![TransferRecord::Write {
                bytes: vec![0x0E, 0x01],
                hold_bus: false
            }]
        );
    }

    #[test]
    fn address_nack_is_recoverable_error() {
        let signal = CompletionSignal::new();
        let mut bus = TransferBus::new(SimTransport::new(&signal, 0x1D), &signal);

        let err = bus.write(ADDR, &[0x2A, 0x00]).unwrap_err();
        assert_eq!(err, TransferError::Nack(NoAcknowledgeSource::Address));
        assert_eq!(
            err.kind(),
            ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address)
        );
        assert!(signal.is_idle());
    }

    #[test]
    fn failed_address_phase_skips_read_phase() {
        let signal = CompletionSignal::new();
        let mut bus = bus(&signal);
        bus.transport_mut().fault = Some(Fault::DataNackOnWrite);

        let mut buf = [0u8; 1];
        let err = bus.write_read(ADDR, &[0x0D], &mut buf).unwrap_err();
        assert_eq!(err, TransferError::Nack(NoAcknowledgeSource::Data));
        assert_eq!(
            bus.release().log,
            vec![TransferRecord::Write {
                bytes: vec![0x0D],
                hold_bus: true
            }]
        );
    }

    #[test]
    fn read_phase_failure_is_bus_fault() {
        let signal = CompletionSignal::new();
        let mut bus = bus(&signal);
        bus.transport_mut().fault = Some(Fault::OtherOnRead);

        let mut buf = [0u8; 2];
        let err = bus.write_read(ADDR, &[0x01], &mut buf).unwrap_err();
        assert_eq!(err, TransferError::ReadFault(Outcome::Other));
        assert_eq!(err.kind(), ErrorKind::Bus);
    }

    #[test]
    fn short_read_is_reported() {
        let signal = CompletionSignal::new();
        let mut bus = bus(&signal);
        bus.transport_mut().fault = Some(Fault::ShortRead(2));

        let mut buf = [0u8; 6];
        let err = bus.write_read(ADDR, &[0x01], &mut buf).unwrap_err();
        assert_eq!(
            err,
            TransferError::ShortRead {
                expected: 6,
                actual: 4
            }
        );
    }

    #[test]
    fn refused_start_leaves_signal_idle() {
        let signal = CompletionSignal::new();
        let mut bus = bus(&signal);
        bus.transport_mut().fault = Some(Fault::RefuseStart);

        let err = bus.write(ADDR, &[0x2A, 0x01]).unwrap_err();
        assert!(matches!(err, TransferError::Transport(_)));
        assert!(signal.is_idle());
    }

    #[test]
    fn outstanding_transfer_rejects_new_one() {
        let signal = CompletionSignal::new();
        let mut bus = bus(&signal);
        signal.reset().unwrap();

        let err = bus.write(ADDR, &[0x2A, 0x01]).unwrap_err();
        assert_eq!(err, TransferError::Busy);
        assert!(bus.release().log.is_empty());
    }

    #[test]
    fn adjacent_writes_form_one_transfer() {
        let signal = CompletionSignal::new();
        let mut bus = bus(&signal);

        bus.transaction(ADDR, &mut [Operation::Write(&[0x5B]), Operation::Write(&[0x1F, 0x20])])
            .unwrap();

        let transport = bus.release();
        assert_eq!(transport.registers[0x5B], 0x1F);
        assert_eq!(transport.registers[0x5C], 0x20);
        assert_eq!(
            transport.log,
            vec![TransferRecord::Write {
                bytes: vec![0x5B, 0x1F, 0x20],
                hold_bus: false
            }]
        );
    }

    #[test]
    fn adjacent_reads_form_one_transfer() {
        let signal = CompletionSignal::new();
        let mut bus = bus(&signal);
        bus.transport_mut().registers[0x01..0x07].copy_from_slice(&[1, 2, 3, 4, 5, 6]);

        let mut accel = [0u8; 4];
        let mut rest = [0u8; 2];
        bus.transaction(
            ADDR,
            &mut [
                Operation::Write(&[0x01]),
                Operation::Read(&mut accel),
                Operation::Read(&mut rest),
            ],
        )
        .unwrap();

        assert_eq!(accel, [1, 2, 3, 4]);
        assert_eq!(rest, [5, 6]);
        assert_eq!(
            bus.release().log,
            vec![
                TransferRecord::Write {
                    bytes: vec![0x01],
                    hold_bus: true
                },
                TransferRecord::Read {
                    len: 6,
                    hold_bus: false
                },
            ]
        );
    }

    #[test]
    fn read_then_write_holds_bus_after_read() {
        let signal = CompletionSignal::new();
        let mut bus = bus(&signal);
        bus.transport_mut().registers[0x00] = 0x0F;

        let mut status = [0u8; 1];
        bus.transaction(
            ADDR,
            &mut [Operation::Read(&mut status), Operation::Write(&[0x2A, 0x0D])],
        )
        .unwrap();

        assert_eq!(status, [0x0F]);
        let transport = bus.release();
        assert_eq!(transport.registers[0x2A], 0x0D);
        assert_eq!(
            transport.log,
            vec![
                TransferRecord::Read {
                    len: 1,
                    hold_bus: true
                },
                TransferRecord::Write {
                    bytes: vec![0x2A, 0x0D],
                    hold_bus: false
                },
            ]
        );
    }

    #[test]
    fn empty_transaction_touches_nothing() {
        let signal = CompletionSignal::new();
        let mut bus = bus(&signal);

        bus.transaction(ADDR, &mut []).unwrap();
        assert!(bus.release().log.is_empty());
        assert!(signal.is_idle());
    }

    #[test]
    fn oversized_merge_is_rejected() {
        let signal = CompletionSignal::new();
        let mut bus = bus(&signal);
        let block = [0u8; MERGE_CAPACITY];

        let err = bus
            .transaction(ADDR, &mut [Operation::Write(&[0x01]), Operation::Write(&block)])
            .unwrap_err();
        assert_eq!(err, TransferError::Unsupported);
        assert!(bus.release().log.is_empty());
        assert!(signal.is_idle());
    }

    #[test]
    fn read_counted_reports_bytes_obtained() {
        let signal = CompletionSignal::new();
        let mut bus = bus(&signal);
        bus.transport_mut().fault = Some(Fault::ShortRead(2));

        let mut buf = [0u8; 6];
        assert_eq!(bus.read_counted(ADDR, &mut buf, false).unwrap(), 4);
        assert!(signal.is_idle());
    }
}
