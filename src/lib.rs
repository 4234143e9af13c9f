/// Tabular RL algorithms
pub mod algo;

/// Training configuration and validation
pub mod config;

/// Strategies for time-decaying hyperparameters
pub mod decay;

/// State discretization
pub mod discretize;

/// Data structures
pub mod ds;

/// Environment
pub mod env;

/// Error types
pub mod error;

/// Exploration policies
pub mod exploration;

/// Simulated environments for training and testing
pub mod gym;

/// Episode lifecycle state machine
pub mod orchestrator;

/// Training session recording and export
pub mod telemetry;

mod util;

pub use error::{Error, Result};
