//! Core types and identifiers for the service counter simulator
//!
//! This module contains fundamental types, identifiers, and configuration structures
//! used throughout the simulation system.
//!
//! # Overview
//!
//! - **Identifiers**: server positions and UUID-tagged experiment runs
//! - **Enums**: shift kinds, rounding rules, event kinds, interval methods
//! - **Configuration**: experiment configuration with validation and CLI support
//!
//! # Usage Example
//!
//! ```rust
//! use service_counter_simulator::types::*;
//!
//! let config = ExperimentConfig {
//!     staffing_levels: vec![2],
//!     replications: 10,
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! assert_eq!(ShiftKind::DAILY_ORDER[0], ShiftKind::Morning);
//! ```

pub mod config;
pub mod enums;
pub mod identifiers;

// Re-export all public types for convenience
pub use config::*;
pub use enums::*;
pub use identifiers::*;
