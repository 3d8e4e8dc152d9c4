//! The step protocol: three rendezvous points per simulated month.
//!
//! EXECUTION ORDER (fixed, every step, every participant):
//!   0. Check the termination predicate (`SharedClock::is_running`).
//!   1. Updaters read prior values and compute proposals.
//!      -> DoneComputing
//!   2. Each updater commits its own compartment.
//!      -> DoneAssigning
//!   3. The coordinator emits a snapshot and advances the clock.
//!      -> DonePrinting
//!
//! RULES:
//!   - N updaters + 1 coordinator share one barrier of size N + 1.
//!   - Every participant reaches every rendezvous of a step, or none of them.
//!   - The predicate is only evaluated at step 0, after DonePrinting of the
//!     previous step, so every participant sees the same clock value.
//!   - Nobody touches the barrier before the `StartGate` opens, which happens
//!     only once all N + 1 threads exist.

use hurdles::Barrier;
use std::sync::{Condvar, Mutex, PoisonError};

/// One participant's handle on the shared barrier.
/// Cloned once per participant before the threads start.
#[derive(Clone)]
pub struct StepBarrier {
    barrier: Barrier,
}

impl StepBarrier {
    pub fn new(participants: usize) -> Self {
        Self { barrier: Barrier::new(participants) }
    }

    /// Rendezvous 1: every proposal is computed, nobody is still reading
    /// the previous step's values.
    pub fn done_computing(&mut self) {
        self.barrier.wait();
    }

    /// Rendezvous 2: every compartment holds its new value.
    pub fn done_assigning(&mut self) {
        self.barrier.wait();
    }

    /// Rendezvous 3: the snapshot is emitted and the clock has advanced.
    pub fn done_printing(&mut self) {
        self.barrier.wait();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GateState {
    Pending,
    Open,
    Aborted,
}

/// Held closed while the engine spawns participants. If a spawn fails the
/// gate is aborted, so the threads that did start return without ever
/// waiting on a barrier that can no longer fill.
#[derive(Debug)]
pub struct StartGate {
    state: Mutex<GateState>,
    changed: Condvar,
}

impl Default for StartGate {
    fn default() -> Self {
        Self::new()
    }
}

impl StartGate {
    pub fn new() -> Self {
        Self { state: Mutex::new(GateState::Pending), changed: Condvar::new() }
    }

    pub fn open(&self) {
        self.settle(GateState::Open);
    }

    pub fn abort(&self) {
        self.settle(GateState::Aborted);
    }

    /// Block until the gate is opened or aborted. True means run.
    pub fn wait(&self) -> bool {
        let guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let guard = self
            .changed
            .wait_while(guard, |state| *state == GateState::Pending)
            .unwrap_or_else(PoisonError::into_inner);
        *guard == GateState::Open
    }

    fn settle(&self, next: GateState) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *state == GateState::Pending {
            *state = next;
        }
        drop(state);
        self.changed.notify_all();
    }
}
