//! Helpers shared by the integration tests.

#![allow(dead_code)]

use compartment_core::{
    config::SimConfig,
    engine::Simulation,
    model::Model,
    rates::RateParameters,
    rounding::RoundingPolicy,
    snapshot::Snapshot,
    state::Prior,
    types::Quantity,
};
use std::collections::BTreeMap;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn run_config(config: &SimConfig) -> Vec<Snapshot> {
    init_logging();
    let sim = Simulation::from_config(config).expect("valid config");
    sim.run(Vec::new()).expect("run").sink
}

/// Single-threaded evaluation of the same model: every rule sees the
/// previous step's values, then all values are replaced at once.
pub fn sequential_reference(
    model: &Model,
    initial: &BTreeMap<String, Quantity>,
    rates: &RateParameters,
    rounding: RoundingPolicy,
    steps: u64,
) -> Vec<Vec<Quantity>> {
    let rates = model.bind_rates(rates).expect("rates").with_rounding(rounding);
    let mut values = model.bind_initial(initial).expect("initial");
    let mut history = Vec::new();
    for _ in 0..steps {
        let prior = values.clone();
        let view = Prior::new(&prior);
        for id in model.ids() {
            values[id.index()] = rounding.settle(model.propose(id, &view, &rates));
        }
        history.push(values.clone());
    }
    history
}

pub fn values_of(snapshot: &Snapshot) -> Vec<Quantity> {
    snapshot.compartments.iter().map(|c| c.value).collect()
}
