//! Simulated transport and register file used by the unit tests.
//!
//! Completes every transfer immediately by notifying the completion signal
//! from inside `start_*`, the way a bus interrupt firing right after the
//! transfer starts would.

extern crate std;

use std::vec::Vec;

use crate::registers::{EXPECTED_WHO_AM_I, REG_WHO_AM_I};
use crate::signal::{CompletionSignal, Outcome};
use crate::transfer::{BusConfig, Transport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferRecord {
    Write { bytes: Vec<u8>, hold_bus: bool },
    Read { len: usize, hold_bus: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    RefuseStart,
    DataNackOnWrite,
    OtherOnRead,
    ShortRead(usize),
}

pub struct SimTransport<'s> {
    signal: &'s CompletionSignal,
    address: u8,
    pointer: u8,
    received: Vec<u8>,
    pub registers: [u8; 256],
    pub log: Vec<TransferRecord>,
    pub fault: Option<Fault>,
    pub refuse_configure: bool,
    pub configured: Option<BusConfig>,
}

impl<'s> SimTransport<'s> {
    pub fn new(signal: &'s CompletionSignal, address: u8) -> Self {
        let mut registers = [0u8; 256];
        registers[REG_WHO_AM_I as usize] = EXPECTED_WHO_AM_I;

        Self {
            signal,
            address,
            pointer: 0,
            received: Vec::new(),
            registers,
            log: Vec::new(),
            fault: None,
            refuse_configure: false,
            configured: None,
        }
    }

    /// Registers written, in order, as `(register, value)` pairs.
    pub fn register_writes(&self) -> Vec<(u8, u8)> {
        self.log
            .iter()
            .filter_map(|record| match record {
                TransferRecord::Write { bytes, .. } if bytes.len() == 2 => {
                    Some((bytes[0], bytes[1]))
                }
                _ => None,
            })
            .collect()
    }

    fn complete(&self, outcome: Outcome) {
        assert!(self.signal.notify(outcome), "transfer started without arming");
    }
}

impl Transport for SimTransport<'_> {
    type Error = SimError;

    fn configure(&mut self, config: &BusConfig) -> Result<(), Self::Error> {
        if self.refuse_configure {
            return Err(SimError);
        }
        self.configured = Some(*config);
        Ok(())
    }

    fn start_write(&mut self, address: u8, bytes: &[u8], hold_bus: bool) -> Result<(), Self::Error> {
        if self.fault == Some(Fault::RefuseStart) {
            return Err(SimError);
        }
        self.log.push(TransferRecord::Write {
            bytes: bytes.to_vec(),
            hold_bus,
        });

        if address != self.address {
            self.complete(Outcome::AddressNack);
            return Ok(());
        }
        if self.fault == Some(Fault::DataNackOnWrite) {
            self.complete(Outcome::DataNack);
            return Ok(());
        }

        if let Some((&register, data)) = bytes.split_first() {
            self.pointer = register;
            for &value in data {
                self.registers[self.pointer as usize] = value;
                self.pointer = self.pointer.wrapping_add(1);
            }
        }
        self.complete(Outcome::Complete);
        Ok(())
    }

    fn start_read(&mut self, address: u8, len: usize, hold_bus: bool) -> Result<(), Self::Error> {
        if self.fault == Some(Fault::RefuseStart) {
            return Err(SimError);
        }
        self.log.push(TransferRecord::Read { len, hold_bus });

        if address != self.address {
            self.complete(Outcome::AddressNack);
            return Ok(());
        }
        if self.fault == Some(Fault::OtherOnRead) {
            self.complete(Outcome::Other);
            return Ok(());
        }

        let missing = match self.fault {
            Some(Fault::ShortRead(missing)) => missing,
            _ => 0,
        };
        self.received.clear();
        for _ in 0..len.saturating_sub(missing) {
            self.received.push(self.registers[self.pointer as usize]);
            self.pointer = self.pointer.wrapping_add(1);
        }
        self.complete(Outcome::Complete);
        Ok(())
    }

    fn take_received(&mut self, buf: &mut [u8]) -> usize {
        let count = self.received.len().min(buf.len());
        buf[..count].copy_from_slice(&self.received[..count]);
        self.received.clear();
        count
    }
}
