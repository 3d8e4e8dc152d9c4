//! Rate coefficients. Set once before the first step, read-only afterwards.

use crate::{
    error::{ensure_non_negative, SimResult},
    rounding::RoundingPolicy,
    types::{Quantity, Rate, RateKey},
};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, ops::Index};

/// Named rate coefficients as supplied by configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RateParameters {
    values: BTreeMap<String, Rate>,
}

impl RateParameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a coefficient. Negative and non-finite values are rejected.
    pub fn set(&mut self, name: impl Into<String>, value: Rate) -> SimResult<()> {
        let name = name.into();
        ensure_non_negative(&name, value)?;
        self.values.insert(name, value);
        Ok(())
    }

    pub fn with(mut self, name: impl Into<String>, value: Rate) -> SimResult<Self> {
        self.set(name, value)?;
        Ok(self)
    }

    pub fn read(&self, name: &str) -> Option<Rate> {
        self.values.get(name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Rate)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Re-check every value; used after deserializing from a file.
    pub fn validate(&self) -> SimResult<()> {
        for (name, value) in self.iter() {
            ensure_non_negative(name, value)?;
        }
        Ok(())
    }

    /// Overlay `other` on top of `self`.
    pub fn merge(&mut self, other: &RateParameters) {
        for (name, value) in other.iter() {
            self.values.insert(name.to_string(), value);
        }
    }
}

/// Rates resolved against one model, indexed by `RateKey`.
/// Produced by `Model::bind_rates`; shared read-only by every updater.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundRates {
    values:   Vec<Rate>,
    rounding: RoundingPolicy,
}

impl BoundRates {
    pub(crate) fn new(values: Vec<Rate>) -> Self {
        Self { values, rounding: RoundingPolicy::Exact }
    }

    /// Policy used by `flow`. The engine sets it from the run's rounding.
    pub fn with_rounding(mut self, rounding: RoundingPolicy) -> Self {
        self.rounding = rounding;
        self
    }

    pub fn rounding(&self) -> RoundingPolicy {
        self.rounding
    }

    pub fn read(&self, key: RateKey) -> Rate {
        self.values[key.0]
    }

    /// One transfer term between compartments. Rules wrap every term so
    /// `nearest` rounds each flow on its own, before the terms are summed.
    pub fn flow(&self, amount: Quantity) -> Quantity {
        self.rounding.flow(amount)
    }
}

impl Index<RateKey> for BoundRates {
    type Output = Rate;

    fn index(&self, key: RateKey) -> &Rate {
        &self.values[key.0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SimError;

    #[test]
    fn negative_rate_is_rejected() {
        let mut rates = RateParameters::new();
        let err = rates.set("recovery_rate", -0.1).unwrap_err();
        assert!(matches!(err, SimError::InvalidValue { .. }));
        assert_eq!(rates.read("recovery_rate"), None);
    }

    #[test]
    fn nan_rate_is_rejected() {
        assert!(RateParameters::new().with("infection_rate", f64::NAN).is_err());
    }

    #[test]
    fn merge_overrides_existing_values() {
        let mut base = RateParameters::new()
            .with("infection_rate", 0.4).unwrap()
            .with("recovery_rate", 0.04).unwrap();
        let overlay = RateParameters::new().with("recovery_rate", 0.1).unwrap();
        base.merge(&overlay);
        assert_eq!(base.read("infection_rate"), Some(0.4));
        assert_eq!(base.read("recovery_rate"), Some(0.1));
    }

    #[test]
    fn flow_rounds_each_term_only_under_nearest() {
        let bound = BoundRates::new(vec![0.25]);
        assert_eq!(bound.flow(2.5), 2.5);
        assert_eq!(bound.clone().with_rounding(RoundingPolicy::Nearest).flow(2.5), 3.0);
        assert_eq!(bound.with_rounding(RoundingPolicy::Truncate).flow(2.5), 2.5);
    }

    #[test]
    fn deserializes_from_plain_json_object() {
        let rates: RateParameters =
            serde_json::from_str(r#"{"infection_rate": 0.4, "recovery_rate": 0.04}"#).unwrap();
        assert_eq!(rates.read("recovery_rate"), Some(0.04));
        assert!(rates.validate().is_ok());
    }
}
