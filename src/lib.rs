//! Service Counter Simulator
//!
//! A discrete-event simulation of a retail service counter with a variable
//! number of servers, used to pick the smallest staffing level that keeps the
//! expected customer wait under a target.
//!
//! # Overview
//!
//! Each business day has a Morning and an Afternoon shift with their own
//! arrival rates. Customers join the shortest line and may balk when the
//! estimated wait is long. Every stochastic decision reads the next value of
//! a shared pseudo-random sequence, so a run is fully reproducible. Many
//! replications per staffing level are reduced to a confidence interval and a
//! go/no-go verdict.
//!
//! ## Quick Start
//!
//! ```rust
//! use service_counter_simulator::*;
//!
//! let sequence = UniformSequence::generate(GeneratorKind::Lcg, 12345, 20_000)?;
//! let config = ExperimentConfig {
//!     staffing_levels: vec![1, 2],
//!     replications: 3,
//!     business_days: 1,
//!     ..Default::default()
//! };
//!
//! let report = ExperimentOrchestrator::new(config, sequence)?.run()?;
//! println!("{}", analysis::render_summary(&report));
//! # Ok::<(), SimulationError>(())
//! ```
//!
//! ## Module Organization
//!
//! - [`types`]: identifiers, enums and configuration
//! - [`random`]: the accepted sequence and the cursor reading it
//! - [`counter`]: shift calendar, balking policy and server pool
//! - [`simulation`]: scheduler, replications, statistics and orchestration
//! - [`analysis`]: recommendation and report output
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐    ┌──────────────┐    ┌───────────────┐
//! │   Random    │    │   Counter    │    │     Types     │
//! │             │    │              │    │               │
//! │ Sequence    │◄───┤ Calendar     │    │ Config        │
//! │ Cursor      │    │ Balking      │    │ Enums         │
//! │             │    │ Server pool  │    │ Identifiers   │
//! └─────────────┘    └──────────────┘    └───────────────┘
//!        ▲                   ▲                    ▲
//!        │                   │                    │
//! ┌──────────────────────────────────────────────────────┐
//! │ Simulation: Scheduler ► Replications ► Statistics    │
//! │             Orchestrator ► Analysis                  │
//! └──────────────────────────────────────────────────────┘
//! ```
#![warn(missing_docs, missing_debug_implementations, unreachable_pub)]

pub mod analysis;
pub mod counter;
pub mod random;
pub mod simulation;
pub mod types;

pub use types::{
    CiMethod, ConfigValidationError, EventKind, ExperimentConfig, GeneratorKind, OutputFormat,
    RoundingRule, RunId, ServerId, ShiftKind,
};

pub use random::{LcgGenerator, SequenceCursor, UniformSequence, UniformStream};

pub use counter::{BalkingPolicy, ServerPool, ShiftCalendar};

pub use simulation::{
    ExperimentOrchestrator, ExperimentRecord, ExperimentReport, ReplicationRecord,
    ReplicationRunner, ShiftScheduler, SimulationError, SimulationResult, StatisticsAggregator,
};

pub use analysis::StaffingRecommendation;
