//! The coordinator: owns the clock and the only observation point.
//!
//! Per step: DoneComputing -> DoneAssigning -> Emitting -> AdvancingClock
//! -> DonePrinting. It never writes a compartment.

use crate::{
    clock::SharedClock,
    error::SimError,
    output::StepSink,
    scheduler::{StartGate, StepBarrier},
    snapshot::Snapshot,
    state::CompartmentState,
};
use std::panic::{self, AssertUnwindSafe};

pub(crate) struct Coordinator<'a, S: StepSink> {
    pub state:   &'a CompartmentState,
    pub clock:   &'a SharedClock,
    pub barrier: StepBarrier,
    pub gate:    &'a StartGate,
    pub sink:    S,
}

pub(crate) struct CoordinatorOutcome<S> {
    pub steps: u64,
    pub sink:  S,
    /// First sink failure. Emission stops after it, the protocol does not.
    pub error: Option<SimError>,
}

impl<S: StepSink> Coordinator<'_, S> {
    pub fn run(mut self) -> CoordinatorOutcome<S> {
        let mut steps = 0u64;
        let mut error: Option<SimError> = None;
        if !self.gate.wait() {
            return CoordinatorOutcome { steps, sink: self.sink, error };
        }

        while self.clock.is_running() {
            self.barrier.done_computing();
            self.barrier.done_assigning();

            // Emitting
            let now = self.clock.read();
            let snapshot = Snapshot::new(&now, self.state.values());
            log::debug!(
                "step={steps} year={} month={} total={:.2}",
                snapshot.year,
                snapshot.month,
                snapshot.total()
            );
            if error.is_none() {
                if let Err(e) = record(&mut self.sink, &snapshot) {
                    log::warn!("output failed at step {steps}, emission stopped: {e}");
                    error = Some(e);
                }
            }

            // AdvancingClock
            self.clock.advance();
            steps += 1;

            self.barrier.done_printing();
        }

        if error.is_none() {
            if let Err(e) = self.sink.finish() {
                error = Some(e);
            }
        }
        CoordinatorOutcome { steps, sink: self.sink, error }
    }
}

fn record<S: StepSink>(sink: &mut S, snapshot: &Snapshot) -> Result<(), SimError> {
    match panic::catch_unwind(AssertUnwindSafe(|| sink.record(snapshot))) {
        Ok(result) => result,
        Err(_) => Err(SimError::Other(anyhow::anyhow!("output sink panicked"))),
    }
}
