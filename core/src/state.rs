//! Shared compartment quantities.
//!
//! RULES:
//!   - Any participant may `read` outside the commit phase.
//!   - Each compartment has exactly one writer: the updater holding its
//!     `CommitSlot`. The coordinator never writes a compartment.
//!   - Every committed value is `>= 0`.
//!
//! Because writers are partitioned per compartment and phases are separated
//! by barriers, no lock is needed; values live in atomics only so the
//! handle can be shared across threads.

use crate::{
    rounding::clamp_non_negative,
    snapshot::CompartmentValue,
    types::{CompartmentId, Quantity},
};
use std::{
    ops::Index,
    sync::atomic::{AtomicU64, Ordering},
};

#[derive(Debug)]
pub struct CompartmentState {
    names:  Vec<String>,
    values: Vec<AtomicU64>,
}

impl CompartmentState {
    /// `names` and `initial` are parallel; initial values are clamped.
    pub(crate) fn new(names: Vec<String>, initial: &[Quantity]) -> Self {
        debug_assert_eq!(names.len(), initial.len());
        let values = initial
            .iter()
            .map(|v| AtomicU64::new(clamp_non_negative(*v).to_bits()))
            .collect();
        Self { names, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn read(&self, id: CompartmentId) -> Quantity {
        f64::from_bits(self.values[id.0].load(Ordering::Acquire))
    }

    pub fn read_by_name(&self, name: &str) -> Option<Quantity> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.read(CompartmentId(i)))
    }

    pub fn name(&self, id: CompartmentId) -> &str {
        &self.names[id.0]
    }

    /// Copy every current value into `buf`, reusing its allocation.
    pub fn read_all_into(&self, buf: &mut Vec<Quantity>) {
        buf.clear();
        buf.extend(
            self.values
                .iter()
                .map(|v| f64::from_bits(v.load(Ordering::Acquire))),
        );
    }

    /// Write the owning updater's value for this step.
    pub fn commit(&self, slot: &CommitSlot, value: Quantity) {
        let value = clamp_non_negative(value);
        self.values[slot.id.0].store(value.to_bits(), Ordering::Release);
    }

    pub fn values(&self) -> Vec<CompartmentValue> {
        self.names
            .iter()
            .zip(&self.values)
            .map(|(name, v)| CompartmentValue {
                name:  name.clone(),
                value: f64::from_bits(v.load(Ordering::Acquire)),
            })
            .collect()
    }
}

/// Write permission for a single compartment.
///
/// Not `Clone`: the engine hands out exactly one per compartment per run.
#[derive(Debug)]
pub struct CommitSlot {
    id: CompartmentId,
}

impl CommitSlot {
    pub(crate) fn new(id: CompartmentId) -> Self {
        Self { id }
    }

    pub fn id(&self) -> CompartmentId {
        self.id
    }
}

/// The previous step's committed values, as seen by an update rule.
#[derive(Debug, Clone, Copy)]
pub struct Prior<'a> {
    values: &'a [Quantity],
}

impl<'a> Prior<'a> {
    pub fn new(values: &'a [Quantity]) -> Self {
        Self { values }
    }

    pub fn get(&self, id: CompartmentId) -> Quantity {
        self.values[id.0]
    }

    /// Sum over every compartment in the model.
    pub fn total(&self) -> Quantity {
        self.values.iter().sum()
    }
}

impl Index<CompartmentId> for Prior<'_> {
    type Output = Quantity;

    fn index(&self, id: CompartmentId) -> &Quantity {
        &self.values[id.0]
    }
}
