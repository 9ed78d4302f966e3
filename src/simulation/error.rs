//! Error types and handling
//!
//! This module contains the error types raised by the simulation core. None of
//! them is retried: the computation is pure and reproducible, so a failure
//! points at bad input or a structural bug rather than a transient condition.

use thiserror::Error;

/// Errors that can occur during simulation
#[derive(Debug, Error)]
pub enum SimulationError {
    /// The random sequence is missing, empty or holds values outside [0, 1)
    #[error("Random input unavailable: {0}")]
    InputUnavailable(String),

    /// Configuration validation failed
    #[error("Configuration validation failed: {0}")]
    ConfigurationError(String),

    /// The aggregator was handed no replications
    #[error("No replications to aggregate for {servers} server(s)")]
    EmptyReplicationSet {
        /// Staffing level whose replication set was empty
        servers: usize,
    },

    /// No event can advance the clock while the shift loop must continue
    #[error("Scheduler stalled at t={time} in {shift} shift: no pending arrival or departure")]
    SchedulerStalled {
        /// Simulation time when the stall was detected
        time: f64,
        /// Shift being simulated
        shift: String,
    },

    /// The drain phase did not empty the system within the event budget
    #[error(
        "Shift drain did not terminate after {events} events \
         ({occupied} customer(s) still in system)"
    )]
    DrainDidNotTerminate {
        /// Number of events processed before giving up
        events: usize,
        /// Customers still in the system
        occupied: usize,
    },

    /// Statistics could not be computed
    #[error("Statistics error: {0}")]
    StatisticsError(String),

    /// I/O error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl SimulationError {
    /// Create an input-unavailable error
    pub fn input_unavailable(msg: impl Into<String>) -> Self {
        Self::InputUnavailable(msg.into())
    }

    /// Create a configuration error
    pub fn configuration_error(msg: impl Into<String>) -> Self {
        Self::ConfigurationError(msg.into())
    }

    /// Create a statistics error
    pub fn statistics_error(msg: impl Into<String>) -> Self {
        Self::StatisticsError(msg.into())
    }

    /// Check if this is a recoverable error
    ///
    /// Only collaborator I/O can succeed on a second attempt; everything the
    /// core raises is deterministic.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, SimulationError::IoError(_))
    }

    /// Whether this error signals a broken scheduler invariant
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            SimulationError::SchedulerStalled { .. } | SimulationError::DrainDidNotTerminate { .. }
        )
    }

    /// Get the error category
    pub fn category(&self) -> &'static str {
        match self {
            SimulationError::InputUnavailable(_) => "Input",
            SimulationError::ConfigurationError(_) => "Configuration",
            SimulationError::EmptyReplicationSet { .. } => "Statistics",
            SimulationError::SchedulerStalled { .. } => "Scheduler",
            SimulationError::DrainDidNotTerminate { .. } => "Scheduler",
            SimulationError::StatisticsError(_) => "Statistics",
            SimulationError::IoError(_) => "IO",
            SimulationError::SerializationError(_) => "Serialization",
        }
    }
}

/// Result type for simulation operations
pub type SimulationResult<T> = Result<T, SimulationError>;
