//! The simulation engine.
//!
//! Spawns exactly one updater thread per compartment plus one coordinator
//! thread, all sharing a single `StepBarrier` of size N + 1 (see
//! `scheduler.rs` for the per-step protocol). Threads are scoped: they
//! borrow the model, state, rates and clock, and are all joined before
//! `run` returns.
//!
//! RULES:
//!   - Nothing is spawned until configuration has been validated.
//!   - No thread is created or destroyed mid-run.
//!   - Identical inputs produce identical snapshots regardless of scheduling.

use crate::{
    clock::{SharedClock, SimClock},
    config::SimConfig,
    coordinator::{Coordinator, CoordinatorOutcome},
    error::{SimError, SimResult},
    model::Model,
    output::StepSink,
    rates::{BoundRates, RateParameters},
    rounding::RoundingPolicy,
    scheduler::{StartGate, StepBarrier},
    snapshot::Snapshot,
    state::{CommitSlot, CompartmentState},
    types::Quantity,
    updater::{CompartmentUpdater, UpdaterOutcome},
};
use std::{collections::BTreeMap, thread};

pub struct Simulation {
    model:    Model,
    rates:    BoundRates,
    initial:  Vec<Quantity>,
    clock:    SimClock,
    rounding: RoundingPolicy,
}

/// Result of a completed run.
#[derive(Debug)]
pub struct RunReport<S> {
    pub steps: u64,
    /// State and clock after the last step.
    pub final_snapshot: Snapshot,
    pub sink: S,
}

impl Simulation {
    /// Bind initial quantities and rates to `model`. Every check that can
    /// fail happens here, before any thread exists.
    pub fn new(
        model: Model,
        initial: &BTreeMap<String, Quantity>,
        rates: &RateParameters,
        clock: SimClock,
        rounding: RoundingPolicy,
    ) -> SimResult<Self> {
        let rates = model.bind_rates(rates)?.with_rounding(rounding);
        let initial = model.bind_initial(initial)?;
        // Reject an out-of-range month before the run, not inside it.
        SharedClock::new(clock)?;
        Ok(Self { model, rates, initial, clock, rounding })
    }

    /// Build the configured built-in model and bind the config to it.
    pub fn from_config(config: &SimConfig) -> SimResult<Self> {
        config.validate()?;
        Self::new(
            config.model.build()?,
            &config.resolved_initial()?,
            &config.rates,
            config.clock()?,
            config.rounding,
        )
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn clock(&self) -> SimClock {
        self.clock
    }

    /// Steps a run will take before the termination predicate holds.
    pub fn total_steps(&self) -> u64 {
        self.clock.total_steps()
    }

    /// Run to completion. Each call starts from the initial state, so
    /// repeated runs are identical.
    pub fn run<S: StepSink>(&self, sink: S) -> SimResult<RunReport<S>> {
        let names = self
            .model
            .compartment_names()
            .into_iter()
            .map(String::from)
            .collect();
        let state = CompartmentState::new(names, &self.initial);
        let clock = SharedClock::new(self.clock)?;
        let barrier = StepBarrier::new(self.model.len() + 1);
        let gate = StartGate::new();

        log::info!(
            "run start: model={} compartments={} threads={} steps={} rounding={}",
            self.model.name(),
            self.model.len(),
            self.model.len() + 1,
            self.total_steps(),
            self.rounding
        );

        let (updaters, coordinator) = thread::scope(|scope| -> SimResult<_> {
            let mut handles = Vec::with_capacity(self.model.len());
            for id in self.model.ids() {
                let updater = CompartmentUpdater {
                    slot:     CommitSlot::new(id),
                    model:    &self.model,
                    state:    &state,
                    rates:    &self.rates,
                    clock:    &clock,
                    rounding: self.rounding,
                    barrier:  barrier.clone(),
                    gate:     &gate,
                };
                let name = format!("updater_{:02}_{}", id.index(), state.name(id));
                let handle = thread::Builder::new()
                    .name(name.clone())
                    .spawn_scoped(scope, move || updater.run())
                    .map_err(|e| abort_start(&gate, e))?;
                handles.push((name, handle));
            }

            let coordinator = Coordinator {
                state:   &state,
                clock:   &clock,
                barrier: barrier.clone(),
                gate:    &gate,
                sink,
            };
            let coordinator = thread::Builder::new()
                .name("coordinator".into())
                .spawn_scoped(scope, move || coordinator.run())
                .map_err(|e| abort_start(&gate, e))?;
            gate.open();

            let updaters = handles
                .into_iter()
                .map(|(name, handle)| {
                    handle.join().map_err(|_| SimError::WorkerPanicked { name })
                })
                .collect::<SimResult<Vec<UpdaterOutcome>>>()?;
            let coordinator = coordinator.join().map_err(|_| SimError::WorkerPanicked {
                name: "coordinator".into(),
            })?;
            Ok((updaters, coordinator))
        })?;

        let CoordinatorOutcome { steps, sink, error } = coordinator;

        for (id, outcome) in self.model.ids().zip(&updaters) {
            debug_assert_eq!(outcome.steps, steps, "participants disagreed on step count");
            if let Some(step) = outcome.rule_panicked {
                return Err(SimError::RulePanicked {
                    compartment: state.name(id).to_string(),
                    step,
                });
            }
        }
        if let Some(e) = error {
            return Err(e);
        }

        let final_snapshot = Snapshot::new(&clock.read(), state.values());
        log::info!(
            "run finished: model={} steps={} total={:.2}",
            self.model.name(),
            steps,
            final_snapshot.total()
        );
        Ok(RunReport { steps, final_snapshot, sink })
    }
}

/// Release the participants already spawned so the scope can join them.
fn abort_start(gate: &StartGate, e: std::io::Error) -> SimError {
    log::error!("spawn failed, aborting run before the first step: {e}");
    gate.abort();
    SimError::from(e)
}
