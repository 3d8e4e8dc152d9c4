//! Shared primitive types used across the entire simulation.

/// A population count. Fractional values are allowed unless the
/// configured rounding policy removes them.
pub type Quantity = f64;

/// A rate coefficient, per simulated month unless a model says otherwise.
pub type Rate = f64;

/// Simulated calendar year.
pub type Year = i32;

/// Simulated month, zero-based: `[0, 11]`.
pub type Month = u32;

pub const MONTHS_PER_YEAR: Month = 12;

/// Stable index of a compartment inside one model.
/// Handed out by `ModelBuilder::compartment`, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CompartmentId(pub(crate) usize);

impl CompartmentId {
    pub fn index(self) -> usize { self.0 }
}

/// Stable index of a rate coefficient inside one model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RateKey(pub(crate) usize);

impl RateKey {
    pub fn index(self) -> usize { self.0 }
}
