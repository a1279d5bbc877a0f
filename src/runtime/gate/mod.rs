//! Admission gate
//!
//! A counting semaphore that hands out at most `limit` slots at a time.
//! Async callers park on a [`Notify`], blocking callers on a [`Condvar`];
//! both share one slot count behind a single mutex.
//!
//! Admission is unordered. A caller arriving while a slot is free takes it
//! immediately even if others are already waiting, and every woken waiter
//! re-checks the count before proceeding.

use std::fmt;
use std::num::NonZeroUsize;

use parking_lot::{Condvar, Mutex};
use serde::{Deserialize, Serialize};
use tokio::sync::Notify;
use tracing::{debug, trace};

use super::error::{RunnerError, RunnerResult};


const DEFAULT_LIMIT: NonZeroUsize = match NonZeroUsize::new(2) {
    Some(limit) => limit,
    None => NonZeroUsize::MIN,
};

/// Maximum number of units allowed to execute at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct ConcurrencyLimit(NonZeroUsize);

impl ConcurrencyLimit {
    /// Create a limit, rejecting zero.
    pub fn new(limit: usize) -> RunnerResult<Self> {
        NonZeroUsize::new(limit)
            .map(Self)
            .ok_or(RunnerError::InvalidLimit(0))
    }

    /// Get the inner value.
    #[inline]
    pub fn get(&self) -> usize {
        self.0.get()
    }
}

impl Default for ConcurrencyLimit {
    fn default() -> Self {
        Self(DEFAULT_LIMIT)
    }
}

impl TryFrom<i64> for ConcurrencyLimit {
    type Error = RunnerError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        usize::try_from(value)
            .ok()
            .and_then(NonZeroUsize::new)
            .map(Self)
            .ok_or(RunnerError::InvalidLimit(value))
    }
}

impl From<ConcurrencyLimit> for i64 {
    fn from(limit: ConcurrencyLimit) -> Self {
        i64::try_from(limit.get()).unwrap_or(i64::MAX)
    }
}

impl From<NonZeroUsize> for ConcurrencyLimit {
    fn from(limit: NonZeroUsize) -> Self {
        Self(limit)
    }
}

impl fmt::Display for ConcurrencyLimit {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Default)]
struct GateState {
    /// Admitted and not yet released.
    in_flight: usize,
    /// Callers suspended waiting for a slot.
    waiting: usize,
}

/// Slot accounting shared by every caller of one runner.
#[derive(Debug)]
pub struct AdmissionGate {
    limit: ConcurrencyLimit,
    state: Mutex<GateState>,
    /// Wakes blocking waiters.
    slot_freed: Condvar,
    /// Wakes async waiters.
    notify: Notify,
}

impl AdmissionGate {
    /// Create a gate with all slots free.
    pub fn new(limit: ConcurrencyLimit) -> Self {
        Self {
            limit,
            state: Mutex::new(GateState::default()),
            slot_freed: Condvar::new(),
            notify: Notify::new(),
        }
    }

    /// The configured slot count.
    #[inline]
    pub fn limit(&self) -> usize {
        self.limit.get()
    }

    /// Number of slots currently held.
    pub fn in_flight(&self) -> usize {
        self.state.lock().in_flight
    }

    /// Number of callers currently waiting for a slot.
    pub fn waiting(&self) -> usize {
        self.state.lock().waiting
    }

    /// Take a slot if one is free, without waiting.
    pub fn try_acquire(&self) -> Option<SlotGuard<'_>> {
        let mut state = self.state.lock();
        self.admit_locked(&mut state)
            .map(|in_flight| SlotGuard::new(self, in_flight))
    }

    /// Wait asynchronously for a slot.
    pub async fn acquire(&self) -> SlotGuard<'_> {
        let mut ticket: Option<WaitTicket<'_>> = None;

        loop {
            // Register interest before checking so a release that lands
            // between the check and the await still wakes us.
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut state = self.state.lock();
                if let Some(in_flight) = self.admit_locked(&mut state) {
                    if let Some(ticket) = ticket.as_mut() {
                        ticket.redeem(&mut state);
                    }
                    return SlotGuard::new(self, in_flight);
                }
                if ticket.is_none() {
                    state.waiting += 1;
                    ticket = Some(WaitTicket {
                        gate: self,
                        armed: true,
                    });
                }
                trace!("slot wait ({}/{} in flight)", state.in_flight, self.limit);
            }

            notified.await;
        }
    }

    /// Block the current thread until a slot is free.
    pub fn acquire_blocking(&self) -> SlotGuard<'_> {
        let mut state = self.state.lock();
        if let Some(in_flight) = self.admit_locked(&mut state) {
            return SlotGuard::new(self, in_flight);
        }

        state.waiting += 1;
        loop {
            trace!("slot wait ({}/{} in flight)", state.in_flight, self.limit);
            self.slot_freed.wait(&mut state);
            if let Some(in_flight) = self.admit_locked(&mut state) {
                state.waiting -= 1;
                return SlotGuard::new(self, in_flight);
            }
        }
    }

    /// Check-and-increment under the state lock.
    fn admit_locked(
        &self,
        state: &mut GateState,
    ) -> Option<usize> {
        if state.in_flight >= self.limit.get() {
            return None;
        }
        state.in_flight += 1;
        debug!("slot admitted ({}/{} in flight)", state.in_flight, self.limit);
        Some(state.in_flight)
    }

    fn release(&self) {
        let in_flight = {
            let mut state = self.state.lock();
            debug_assert!(state.in_flight > 0, "slot released twice");
            state.in_flight = state.in_flight.saturating_sub(1);
            state.in_flight
        };
        debug!("slot released ({}/{} in flight)", in_flight, self.limit);

        // One slot freed, one waiter of each kind is enough: a woken waiter
        // that loses the race re-checks and parks again.
        self.slot_freed.notify_one();
        self.notify.notify_one();
    }
}

/// An admission slot. Dropping it frees the slot and wakes a waiter.
#[must_use = "the slot is released as soon as the guard is dropped"]
#[derive(Debug)]
pub struct SlotGuard<'a> {
    gate: &'a AdmissionGate,
    in_flight: usize,
}

impl<'a> SlotGuard<'a> {
    fn new(
        gate: &'a AdmissionGate,
        in_flight: usize,
    ) -> Self {
        Self { gate, in_flight }
    }

    /// In-flight count right after this slot was taken, itself included.
    #[inline]
    pub fn in_flight_at_admission(&self) -> usize {
        self.in_flight
    }
}

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        self.gate.release();
    }
}

/// Keeps the `waiting` count honest when an async waiter is dropped
/// before it is admitted.
struct WaitTicket<'a> {
    gate: &'a AdmissionGate,
    armed: bool,
}

impl WaitTicket<'_> {
    fn redeem(
        &mut self,
        state: &mut GateState,
    ) {
        if self.armed {
            state.waiting -= 1;
            self.armed = false;
        }
    }
}

impl Drop for WaitTicket<'_> {
    fn drop(&mut self) {
        if self.armed {
            let mut state = self.gate.state.lock();
            state.waiting = state.waiting.saturating_sub(1);
        }
    }
}
