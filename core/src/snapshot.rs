//! A fully-committed view of the simulation for one (year, month).
//!
//! The coordinator builds one snapshot per step, after the DoneAssigning
//! rendezvous, so it never mixes old and new values.

use crate::{
    clock::SimClock,
    types::{Month, Quantity, Year},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompartmentValue {
    pub name:  String,
    pub value: Quantity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub year:           Year,
    /// Zero-based month.
    pub month:          Month,
    pub months_elapsed: u64,
    pub compartments:   Vec<CompartmentValue>,
}

impl Snapshot {
    pub fn new(clock: &SimClock, compartments: Vec<CompartmentValue>) -> Self {
        Self {
            year:           clock.year,
            month:          clock.month,
            months_elapsed: clock.months_elapsed(),
            compartments,
        }
    }

    pub fn get(&self, name: &str) -> Option<Quantity> {
        self.compartments
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.value)
    }

    pub fn total(&self) -> Quantity {
        self.compartments.iter().map(|c| c.value).sum()
    }
}
