//! Update rule trait.
//!
//! RULE: Every compartment has exactly one UpdateRule.
//! A rule is a pure function of the previous step's committed values and
//! the bound rates. It never reads the clock and never writes state; the
//! engine settles (rounds and clamps) whatever it returns.

use crate::{rates::BoundRates, state::Prior, types::Quantity};

/// The contract every compartment formula must fulfill.
pub trait UpdateRule: Send + Sync {
    /// Propose this compartment's next quantity.
    ///
    /// - `prior`: every compartment's value from the previous step
    /// - `rates`: the model's coefficients, resolved by `RateKey`
    fn propose(&self, prior: &Prior<'_>, rates: &BoundRates) -> Quantity;
}

impl<F> UpdateRule for F
where
    F: Fn(&Prior<'_>, &BoundRates) -> Quantity + Send + Sync,
{
    fn propose(&self, prior: &Prior<'_>, rates: &BoundRates) -> Quantity {
        self(prior, rates)
    }
}
