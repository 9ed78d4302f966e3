//! Simulation engine and experiment control
//!
//! # Overview
//!
//! - **ShiftScheduler**: two-event clock for one shift, with the drain policy
//! - **ReplicationRunner**: runs every day and shift of a replication from its
//!   own sequence offset
//! - **StatisticsAggregator**: reduces replications to an interval and a verdict
//! - **ExperimentOrchestrator**: evaluates every staffing level
//! - **SimulationError**: error type shared by the whole crate
//!
//! # Usage Example
//!
//! ```rust
//! use service_counter_simulator::random::UniformSequence;
//! use service_counter_simulator::simulation::*;
//! use service_counter_simulator::types::*;
//!
//! let sequence = UniformSequence::generate(GeneratorKind::Lcg, 12345, 20_000)?;
//! let config = ExperimentConfig {
//!     staffing_levels: vec![2],
//!     replications: 4,
//!     business_days: 2,
//!     ..Default::default()
//! };
//!
//! let report = ExperimentOrchestrator::new(config, sequence)?.run()?;
//! let record = &report.records[0];
//! assert_eq!(record.servers, 2);
//! assert_eq!(record.objective_met, record.mean_wait <= 6.0);
//! # Ok::<(), SimulationError>(())
//! ```

pub mod error;
pub mod logging;
pub mod orchestrator;
pub mod replication;
pub mod scheduler;
pub mod statistics;

pub use error::*;
pub use logging::*;
pub use orchestrator::*;
pub use replication::*;
pub use scheduler::*;
pub use statistics::*;
