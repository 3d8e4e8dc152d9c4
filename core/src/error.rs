use crate::types::Year;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid value for '{name}': {value} (must be finite and non-negative)")]
    InvalidValue { name: String, value: f64 },

    #[error("Model '{model}' has no compartment named '{name}'")]
    UnknownCompartment { model: String, name: String },

    #[error("Model '{model}' has no rate named '{name}'")]
    UnknownRate { model: String, name: String },

    #[error("Rate '{name}' required by model '{model}' was not provided")]
    MissingRate { model: String, name: String },

    #[error("'{name}' declared twice in model '{model}'")]
    DuplicateName { model: String, name: String },

    #[error("Compartment '{name}' in model '{model}' has no update rule")]
    MissingRule { model: String, name: String },

    #[error("Model '{model}' declares no compartments")]
    EmptyModel { model: String },

    #[error("Unknown model '{0}'")]
    UnknownModel(String),

    #[error("Invalid year range: end year {end} is before start year {start}")]
    InvalidYearRange { start: Year, end: Year },

    #[error("Invalid month {0} (must be in 0..=11)")]
    InvalidMonth(u32),

    #[error("Update rule for '{compartment}' panicked at step {step}")]
    RulePanicked { compartment: String, step: u64 },

    #[error("Worker thread '{name}' panicked")]
    WorkerPanicked { name: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type SimResult<T> = Result<T, SimError>;

/// Reject negative, NaN and infinite configuration values.
pub(crate) fn ensure_non_negative(name: &str, value: f64) -> SimResult<f64> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(SimError::InvalidValue { name: name.to_string(), value })
    }
}
