//! Discrete-time compartmental population simulator.
//!
//! A model is a set of compartments, each with one pure update rule. The
//! engine runs one thread per compartment plus a coordinator, lock-stepped
//! through three barrier rendezvous per simulated month.

pub mod clock;
pub mod config;
mod coordinator;
pub mod engine;
pub mod error;
pub mod model;
pub mod models;
pub mod output;
pub mod rates;
pub mod rounding;
pub mod rule;
pub mod scheduler;
pub mod snapshot;
pub mod state;
pub mod types;
mod updater;
