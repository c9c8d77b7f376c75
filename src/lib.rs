//! Simulation of pooled diagnostic testing strategies.
//!
//! A [`Simulator`] owns a population of individuals with prior positive
//! probabilities. Each round it samples a ground truth, applies the pooling
//! models of a [`Strategy`] to the still unresolved individuals, infers
//! individual outcomes from noisy pooled trials and counts trials and errors.

pub mod analysis;
pub mod config;
pub mod decode;
pub mod engine;
pub mod manager;
pub mod model;
pub mod pooling;
pub mod prime;
pub mod priors;
pub mod random;
pub mod results;
pub mod stats;
pub mod testing_set;
mod utils;

pub use engine::Simulator;
pub use model::{Group, GroupList, Individual, Strategy};
pub use pooling::PoolingModel;
pub use random::{RandomSource, RngSource, ScriptedSource};
pub use results::{RoundResult, SimulationResult};
pub use testing_set::TestingSet;
