//! A model: the compartments, the rates they use and one rule per
//! compartment. The engine is written once; models only supply formulas.

use crate::{
    error::{ensure_non_negative, SimError, SimResult},
    rates::{BoundRates, RateParameters},
    rule::UpdateRule,
    state::Prior,
    types::{CompartmentId, Quantity, RateKey},
};
use std::collections::{BTreeMap, HashSet};

struct Compartment {
    name: String,
    rule: Option<Box<dyn UpdateRule>>,
}

pub struct Model {
    name:         String,
    compartments: Vec<(String, Box<dyn UpdateRule>)>,
    rates:        Vec<String>,
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("name", &self.name)
            .field("compartments", &self.compartment_names())
            .field("rates", &self.rates)
            .finish()
    }
}

impl Model {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.compartments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.compartments.is_empty()
    }

    pub fn compartment_names(&self) -> Vec<&str> {
        self.compartments.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn rate_names(&self) -> &[String] {
        &self.rates
    }

    pub fn compartment_id(&self, name: &str) -> SimResult<CompartmentId> {
        self.compartments
            .iter()
            .position(|(n, _)| n == name)
            .map(CompartmentId)
            .ok_or_else(|| SimError::UnknownCompartment {
                model: self.name.clone(),
                name:  name.to_string(),
            })
    }

    pub fn ids(&self) -> impl Iterator<Item = CompartmentId> {
        (0..self.compartments.len()).map(CompartmentId)
    }

    /// Run one compartment's rule. The result is not yet settled.
    pub fn propose(&self, id: CompartmentId, prior: &Prior<'_>, rates: &BoundRates) -> Quantity {
        self.compartments[id.0].1.propose(prior, rates)
    }

    /// Resolve named rates into `RateKey` order. Every declared rate must be
    /// present; names the model does not declare are rejected.
    pub fn bind_rates(&self, params: &RateParameters) -> SimResult<BoundRates> {
        params.validate()?;
        for (name, _) in params.iter() {
            if !self.rates.iter().any(|r| r == name) {
                return Err(SimError::UnknownRate {
                    model: self.name.clone(),
                    name:  name.to_string(),
                });
            }
        }
        let values = self
            .rates
            .iter()
            .map(|name| {
                params.read(name).ok_or_else(|| SimError::MissingRate {
                    model: self.name.clone(),
                    name:  name.clone(),
                })
            })
            .collect::<SimResult<Vec<_>>>()?;
        Ok(BoundRates::new(values))
    }

    /// Resolve named initial quantities into compartment order.
    /// Compartments not mentioned start at zero.
    pub fn bind_initial(&self, initial: &BTreeMap<String, Quantity>) -> SimResult<Vec<Quantity>> {
        let mut values = vec![0.0; self.compartments.len()];
        for (name, value) in initial {
            let id = self.compartment_id(name)?;
            values[id.0] = ensure_non_negative(name, *value)?;
        }
        Ok(values)
    }
}

/// Builds a `Model`. Declaring a compartment or rate hands back the typed
/// key that rules use to index `Prior` and `BoundRates`.
pub struct ModelBuilder {
    name:         String,
    compartments: Vec<Compartment>,
    rates:        Vec<String>,
}

impl ModelBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), compartments: Vec::new(), rates: Vec::new() }
    }

    pub fn compartment(&mut self, name: impl Into<String>) -> CompartmentId {
        self.compartments.push(Compartment { name: name.into(), rule: None });
        CompartmentId(self.compartments.len() - 1)
    }

    pub fn rate(&mut self, name: impl Into<String>) -> RateKey {
        self.rates.push(name.into());
        RateKey(self.rates.len() - 1)
    }

    /// Attach the formula for `id`. A later call replaces an earlier one.
    pub fn rule<F>(&mut self, id: CompartmentId, rule: F) -> &mut Self
    where
        F: Fn(&Prior<'_>, &BoundRates) -> Quantity + Send + Sync + 'static,
    {
        self.boxed_rule(id, Box::new(rule))
    }

    pub fn boxed_rule(&mut self, id: CompartmentId, rule: Box<dyn UpdateRule>) -> &mut Self {
        self.compartments[id.0].rule = Some(rule);
        self
    }

    pub fn build(self) -> SimResult<Model> {
        if self.compartments.is_empty() {
            return Err(SimError::EmptyModel { model: self.name });
        }

        let mut seen = HashSet::new();
        for name in self.compartments.iter().map(|c| &c.name).chain(&self.rates) {
            if !seen.insert(name.as_str()) {
                return Err(SimError::DuplicateName {
                    model: self.name.clone(),
                    name:  name.clone(),
                });
            }
        }

        let mut compartments = Vec::with_capacity(self.compartments.len());
        for c in self.compartments {
            match c.rule {
                Some(rule) => compartments.push((c.name, rule)),
                None => {
                    return Err(SimError::MissingRule { model: self.name, name: c.name });
                }
            }
        }

        Ok(Model { name: self.name, compartments, rates: self.rates })
    }
}
