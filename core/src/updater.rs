//! One updater per compartment.
//!
//! Per step: Computing -> DoneComputing -> Committing -> DoneAssigning
//! -> DonePrinting, until the clock says stop. The updater holds the only
//! `CommitSlot` for its compartment.

use crate::{
    clock::SharedClock,
    model::Model,
    rates::BoundRates,
    rounding::RoundingPolicy,
    scheduler::{StartGate, StepBarrier},
    state::{CommitSlot, CompartmentState, Prior},
    types::Quantity,
};
use std::panic::{self, AssertUnwindSafe};

pub(crate) struct CompartmentUpdater<'a> {
    pub slot:     CommitSlot,
    pub model:    &'a Model,
    pub state:    &'a CompartmentState,
    pub rates:    &'a BoundRates,
    pub clock:    &'a SharedClock,
    pub rounding: RoundingPolicy,
    pub barrier:  StepBarrier,
    pub gate:     &'a StartGate,
}

/// What an updater reports after joining.
#[derive(Debug, Default)]
pub(crate) struct UpdaterOutcome {
    pub steps:         u64,
    /// Step at which the rule first panicked, if ever.
    pub rule_panicked: Option<u64>,
}

impl CompartmentUpdater<'_> {
    pub fn run(mut self) -> UpdaterOutcome {
        let id = self.slot.id();
        let mut outcome = UpdaterOutcome::default();
        let mut prior: Vec<Quantity> = Vec::with_capacity(self.state.len());
        if !self.gate.wait() {
            return outcome;
        }

        while self.clock.is_running() {
            // Computing
            self.state.read_all_into(&mut prior);
            let view = Prior::new(&prior);
            let proposal = match panic::catch_unwind(AssertUnwindSafe(|| {
                self.model.propose(id, &view, self.rates)
            })) {
                Ok(value) => self.rounding.settle(value),
                Err(_) => {
                    // Keep the previous value and stay in lock-step; a missing
                    // participant would leave everyone else on the barrier.
                    if outcome.rule_panicked.is_none() {
                        log::error!(
                            "rule for '{}' panicked at step {}",
                            self.state.name(id),
                            outcome.steps
                        );
                        outcome.rule_panicked = Some(outcome.steps);
                    }
                    view[id]
                }
            };

            self.barrier.done_computing();

            // Committing
            self.state.commit(&self.slot, proposal);

            self.barrier.done_assigning();
            self.barrier.done_printing();
            outcome.steps += 1;
        }
        outcome
    }
}
