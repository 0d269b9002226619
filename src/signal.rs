//! Transfer completion signal shared between a bus interrupt and a blocking caller.
//!
//! The bus hardware finishes transfers asynchronously and reports the outcome
//! from interrupt context, while every register access in this crate wants to
//! block until that happens. [`CompletionSignal`] is the rendezvous between the
//! two: the caller arms it, starts a transfer and waits; the interrupt handler
//! calls [`CompletionSignal::notify`] exactly once with the transfer outcome.
//!
//! Only one transfer may be outstanding per signal. Arming a signal whose
//! previous completion has not been observed fails with [`Busy`].
//!
//! ```
//! use fxos8700cq::signal::{CompletionSignal, Outcome};
//!
//! static TWI0_DONE: CompletionSignal = CompletionSignal::new();
//!
//! // Interrupt handler side.
//! fn on_twi_event(outcome: Outcome) {
//!     TWI0_DONE.notify(outcome);
//! }
//!
//! TWI0_DONE.reset().unwrap();
//! on_twi_event(Outcome::Complete);
//! assert_eq!(TWI0_DONE.wait(), Outcome::Complete);
//! ```

use portable_atomic::{AtomicU8, Ordering};

const IDLE: u8 = 0;
const AWAITING: u8 = 1;
// Completed states are COMPLETED_BASE + outcome discriminant.
const COMPLETED_BASE: u8 = 0x10;

/// How a bus transfer ended, as classified by the platform's bus driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Outcome {
    /// Transfer completed and every byte was acknowledged.
    Complete = 0,
    /// The device did not acknowledge its address.
    AddressNack = 1,
    /// The device did not acknowledge a data byte.
    DataNack = 2,
    /// Any other event reported by the bus driver.
    Other = 3,
}

impl Outcome {
    const fn encode(self) -> u8 {
        COMPLETED_BASE + self as u8
    }

    const fn decode(raw: u8) -> Self {
        match raw.wrapping_sub(COMPLETED_BASE) {
            0 => Self::Complete,
            1 => Self::AddressNack,
            2 => Self::DataNack,
            _ => Self::Other,
        }
    }

    /// Returns `true` for [`Outcome::Complete`].
    pub const fn is_complete(self) -> bool {
        matches!(self, Self::Complete)
    }
}

/// Observable state of a [`CompletionSignal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum State {
    /// No transfer in flight.
    Idle,
    /// Armed; a transfer was issued and its notification has not arrived.
    Awaiting,
    /// Notification delivered but not yet observed by the waiting side.
    Completed(Outcome),
}

/// Returned by [`CompletionSignal::reset`] when a transfer is still outstanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Busy;

/// Single-producer, single-consumer completion flag for one bus.
///
/// Usually placed in a `static` so the interrupt handler can reach it, and
/// handed by reference to [`TransferBus`](crate::transfer::TransferBus).
#[derive(Debug)]
pub struct CompletionSignal {
    state: AtomicU8,
}

impl CompletionSignal {
    /// Creates an idle signal.
    pub const fn new() -> Self {
        Self {
            state: AtomicU8::new(IDLE),
        }
    }

    /// Arms the signal ahead of issuing a transfer.
    ///
    /// Must be called before the transfer is started so a fast completion
    /// cannot be lost.
    pub fn reset(&self) -> core::result::Result<(), Busy> {
        self.state
            .compare_exchange(IDLE, AWAITING, Ordering::AcqRel, Ordering::Relaxed)
            .map(|_| ())
            .map_err(|_| Busy)
    }

    /// Returns an armed signal to idle when the transfer never started.
    ///
    /// Does nothing unless the signal is awaiting.
    pub fn disarm(&self) {
        let _ = self
            .state
            .compare_exchange(AWAITING, IDLE, Ordering::AcqRel, Ordering::Relaxed);
    }

    /// Delivers the outcome of the outstanding transfer.
    ///
    /// Safe to call from interrupt context; never blocks. Returns `false` and
    /// leaves the state untouched if no transfer was armed.
    pub fn notify(&self, outcome: Outcome) -> bool {
        self.state
            .compare_exchange(
                AWAITING,
                outcome.encode(),
                Ordering::Release,
                Ordering::Relaxed,
            )
            .is_ok()
    }

    /// Consumes a delivered completion without blocking.
    pub fn poll(&self) -> Option<Outcome> {
        let raw = self.state.load(Ordering::Acquire);
        if raw < COMPLETED_BASE {
            return None;
        }

        self.state.store(IDLE, Ordering::Relaxed);
        Some(Outcome::decode(raw))
    }

    /// Spins until the outstanding transfer completes and returns its outcome.
    ///
    /// Never times out: a bus that never reports completion hangs the caller,
    /// and so does waiting on a signal that was never armed with
    /// [`reset`](Self::reset). The latter panics in debug builds.
    pub fn wait(&self) -> Outcome {
        self.wait_with(core::hint::spin_loop)
    }

    /// Like [`wait`](Self::wait) but runs `relax` between polls, e.g. a `WFE`
    /// or a cooperative yield.
    pub fn wait_with<F>(&self, mut relax: F) -> Outcome
    where
        F: FnMut(),
    {
        debug_assert!(!self.is_idle(), "waiting on a signal that was never armed");
        loop {
            if let Some(outcome) = self.poll() {
                return outcome;
            }
            relax();
        }
    }

    /// Returns the current state without consuming anything.
    pub fn state(&self) -> State {
        match self.state.load(Ordering::Acquire) {
            IDLE => State::Idle,
            AWAITING => State::Awaiting,
            raw => State::Completed(Outcome::decode(raw)),
        }
    }

    /// Returns `true` when no transfer is outstanding.
    pub fn is_idle(&self) -> bool {
        self.state() == State::Idle
    }
}

impl Default for CompletionSignal {
    fn default() -> Self {
        Self::new()
    }
}
