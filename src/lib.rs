#![no_std]

mod log;

mod error;

pub mod config;
pub mod device;
pub mod interface;
pub mod params;
pub mod registers;
pub mod signal;
pub mod transfer;

#[cfg(test)]
mod sim;

pub use crate::device::{Fxos8700, Mode, Sample, Triplet};
pub use crate::error::{Error, Result};
pub use crate::signal::CompletionSignal;
pub use crate::transfer::{BusConfig, TransferBus, Transport};
