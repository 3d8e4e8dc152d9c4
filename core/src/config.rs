use crate::{
    clock::SimClock,
    error::{ensure_non_negative, SimError, SimResult},
    models::ModelKind,
    output::OutputFormat,
    rates::RateParameters,
    rounding::RoundingPolicy,
    types::{Quantity, Rate, Year},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Everything a run needs, fully resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    pub model:      ModelKind,
    pub start_year: Year,
    pub end_year:   Year,
    pub initial:    BTreeMap<String, Quantity>,
    pub rates:      RateParameters,
    pub rounding:   RoundingPolicy,
    pub format:     OutputFormat,
    /// Total population. When set, the first compartment's initial value is
    /// derived from it after every other value is known, so later overrides
    /// of the other compartments still add up to this total.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub population: Option<Quantity>,
}

/// On-disk shape. Every field but `model` is optional and falls back to
/// the model's defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    model: ModelKind,
    #[serde(default)]
    start_year: Option<Year>,
    #[serde(default)]
    end_year: Option<Year>,
    /// Total population; the first compartment gets what the others don't.
    #[serde(default)]
    population: Option<Quantity>,
    #[serde(default)]
    initial: BTreeMap<String, Quantity>,
    #[serde(default)]
    rates: RateParameters,
    #[serde(default)]
    rounding: Option<RoundingPolicy>,
    #[serde(default)]
    format: Option<OutputFormat>,
}

impl SimConfig {
    /// Built-in defaults for `model`.
    pub fn for_model(model: ModelKind) -> SimResult<Self> {
        let defaults = model.defaults()?;
        Ok(Self {
            model,
            start_year: defaults.start_year,
            end_year:   defaults.end_year,
            initial:    defaults.initial,
            rates:      defaults.rates,
            rounding:   RoundingPolicy::default(),
            format:     OutputFormat::default(),
            population: None,
        })
    }

    /// Load from a JSON file.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config = Self::from_json(&content)
            .map_err(|e| anyhow::anyhow!("Invalid config {path}: {e}"))?;
        Ok(config)
    }

    pub fn from_json(content: &str) -> SimResult<Self> {
        let file: ConfigFile = serde_json::from_str(content)?;
        let mut config = Self::for_model(file.model)?;
        if let Some(year) = file.start_year {
            config.start_year = year;
        }
        if let Some(year) = file.end_year {
            config.end_year = year;
        }
        for (name, value) in file.initial {
            config.set_initial(name, value)?;
        }
        file.rates.validate()?;
        config.rates.merge(&file.rates);
        if let Some(rounding) = file.rounding {
            config.rounding = rounding;
        }
        if let Some(format) = file.format {
            config.format = format;
        }
        if let Some(population) = file.population {
            config.apply_population(population)?;
        }
        Ok(config)
    }

    pub fn set_initial(&mut self, name: impl Into<String>, value: Quantity) -> SimResult<()> {
        let name = name.into();
        ensure_non_negative(&name, value)?;
        self.initial.insert(name, value);
        Ok(())
    }

    pub fn set_rate(&mut self, name: impl Into<String>, value: Rate) -> SimResult<()> {
        self.rates.set(name, value)
    }

    /// Fix the total population. The first compartment (Susceptible,
    /// Humans, ...) becomes `population` minus every other compartment,
    /// resolved by `resolved_initial` and so after any later `set_initial`.
    pub fn apply_population(&mut self, population: Quantity) -> SimResult<()> {
        ensure_non_negative("population", population)?;
        self.population = Some(population);
        Ok(())
    }

    /// Initial values as the run will see them, with the population
    /// remainder written into the first compartment.
    pub fn resolved_initial(&self) -> SimResult<BTreeMap<String, Quantity>> {
        let mut initial = self.initial.clone();
        let Some(population) = self.population else {
            return Ok(initial);
        };
        let model = self.model.build()?;
        let names = model.compartment_names();
        let first = names[0];
        let others: Quantity = names[1..]
            .iter()
            .map(|n| initial.get(*n).copied().unwrap_or(0.0))
            .sum();
        let remainder = population - others;
        if remainder < 0.0 {
            return Err(SimError::InvalidValue { name: first.to_string(), value: remainder });
        }
        initial.insert(first.to_string(), remainder);
        Ok(initial)
    }

    pub fn clock(&self) -> SimResult<SimClock> {
        SimClock::new(self.start_year, self.end_year)
    }

    /// Check every value without building threads. Model-specific names are
    /// checked again when the model binds them.
    pub fn validate(&self) -> SimResult<()> {
        self.clock()?;
        for (name, value) in &self.initial {
            ensure_non_negative(name, *value)?;
        }
        self.rates.validate()?;
        let model = self.model.build()?;
        model.bind_rates(&self.rates)?;
        model.bind_initial(&self.resolved_initial()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        for kind in ModelKind::ALL {
            SimConfig::for_model(kind).unwrap().validate().unwrap();
        }
    }

    #[test]
    fn file_values_override_defaults() {
        let config = SimConfig::from_json(
            r#"{
                "model": "sir",
                "end_year": 2026,
                "initial": { "Infected": 50 },
                "rates": { "recovery_rate": 0.1 },
                "rounding": "nearest",
                "format": "csv"
            }"#,
        )
        .unwrap();
        assert_eq!(config.start_year, 2023);
        assert_eq!(config.end_year, 2026);
        assert_eq!(config.initial["Infected"], 50.0);
        assert_eq!(config.initial["Susceptible"], 175_000.0);
        assert_eq!(config.rates.read("recovery_rate"), Some(0.1));
        assert_eq!(config.rates.read("infection_rate"), Some(0.4));
        assert_eq!(config.rounding, RoundingPolicy::Nearest);
        assert_eq!(config.format, OutputFormat::Csv);
    }

    #[test]
    fn population_subtracts_other_compartments() {
        let config = SimConfig::from_json(
            r#"{ "model": "sir", "population": 1000, "initial": { "Infected": 10 } }"#,
        )
        .unwrap();
        assert_eq!(config.population, Some(1000.0));
        assert_eq!(config.resolved_initial().unwrap()["Susceptible"], 990.0);
    }

    #[test]
    fn population_smaller_than_others_is_rejected() {
        let mut config = SimConfig::for_model(ModelKind::Sir).unwrap();
        config.apply_population(5.0).unwrap();
        assert!(matches!(config.validate(), Err(SimError::InvalidValue { .. })));
        assert!(config.apply_population(-1.0).is_err());
    }

    #[test]
    fn file_population_holds_after_later_overrides() {
        let mut config = SimConfig::from_json(
            r#"{ "model": "zombie", "population": 1000, "initial": { "Zombies": 5 } }"#,
        )
        .unwrap();
        config.set_initial("Zombies", 40.0).unwrap();
        config.set_initial("Immune", 0.0).unwrap();
        let initial = config.resolved_initial().unwrap();
        assert_eq!(initial.values().sum::<Quantity>(), 1000.0);
        // Infected 10 from the defaults.
        assert_eq!(initial["Susceptible"], 950.0);
    }

    #[test]
    fn negative_values_are_rejected() {
        assert!(SimConfig::from_json(r#"{ "model": "sir", "initial": { "Infected": -1 } }"#).is_err());
        assert!(SimConfig::from_json(r#"{ "model": "sir", "rates": { "recovery_rate": -1 } }"#).is_err());
    }

    #[test]
    fn unknown_field_is_rejected() {
        assert!(matches!(
            SimConfig::from_json(r#"{ "model": "sir", "years": 3 }"#),
            Err(SimError::Serialization(_))
        ));
    }

    #[test]
    fn unknown_compartment_fails_validation() {
        let mut config = SimConfig::for_model(ModelKind::Sir).unwrap();
        config.set_initial("Zombies", 3.0).unwrap();
        assert!(matches!(config.validate(), Err(SimError::UnknownCompartment { .. })));
    }

    #[test]
    fn reversed_years_fail_validation() {
        let mut config = SimConfig::for_model(ModelKind::Sir).unwrap();
        config.end_year = 2020;
        assert!(matches!(config.validate(), Err(SimError::InvalidYearRange { .. })));
    }

    #[test]
    fn load_reports_missing_file() {
        let err = SimConfig::load("/nonexistent/compartment-sim.json").unwrap_err();
        assert!(err.to_string().contains("Cannot read"));
    }
}
