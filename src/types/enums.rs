//! Enumeration types for the service counter simulator
//!
//! This module contains the enumeration types shared across the simulation:
//! shift kinds, variate rounding rules, scheduler event kinds, confidence
//! interval methods and the CLI-facing output and generator choices.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Shifts of a business day, in the order they are simulated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShiftKind {
    /// Opening shift, 270 minutes, dense arrivals
    Morning,
    /// Closing shift, 240 minutes, sparser arrivals
    Afternoon,
}

impl ShiftKind {
    /// Both shifts in daily order
    pub const DAILY_ORDER: [ShiftKind; 2] = [ShiftKind::Morning, ShiftKind::Afternoon];
}

impl fmt::Display for ShiftKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShiftKind::Morning => write!(f, "Morning"),
            ShiftKind::Afternoon => write!(f, "Afternoon"),
        }
    }
}

impl FromStr for ShiftKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "morning" | "am" => Ok(ShiftKind::Morning),
            "afternoon" | "pm" => Ok(ShiftKind::Afternoon),
            _ => Err(format!("Unknown shift kind: {}", s)),
        }
    }
}

/// How a continuous inverse-transform result is turned into whole minutes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RoundingRule {
    /// Round to nearest, ties to even
    #[default]
    NearestEven,
    /// Drop the fractional part
    Truncate,
}

impl RoundingRule {
    /// Convert a non-negative variate to whole minutes
    pub fn apply(self, value: f64) -> u32 {
        let whole = match self {
            RoundingRule::NearestEven => value.round_ties_even(),
            RoundingRule::Truncate => value.trunc(),
        };
        whole as u32
    }
}

impl fmt::Display for RoundingRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoundingRule::NearestEven => write!(f, "nearest-even"),
            RoundingRule::Truncate => write!(f, "truncate"),
        }
    }
}

impl FromStr for RoundingRule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "nearest-even" | "nearest" | "round" => Ok(RoundingRule::NearestEven),
            "truncate" | "floor" => Ok(RoundingRule::Truncate),
            _ => Err(format!("Unknown rounding rule: {}", s)),
        }
    }
}

/// Kinds of events processed by the shift scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// A customer reaches the counter
    Arrival,
    /// A server finishes serving a customer
    Departure,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Arrival => write!(f, "Arrival"),
            EventKind::Departure => write!(f, "Departure"),
        }
    }
}

/// Formula used for a configuration's confidence interval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CiMethod {
    /// `mean ± t(α/2, R-1)·s/√R`, used when the replication means look normal
    StudentT,
    /// `mean ± s/√(R·α)`, used otherwise
    Fallback,
}

impl fmt::Display for CiMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CiMethod::StudentT => write!(f, "Student-t"),
            CiMethod::Fallback => write!(f, "Fallback"),
        }
    }
}

/// Output formats for the experiment report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Human readable summary
    #[default]
    Text,
    /// JSON format for structured data
    Json,
    /// CSV format, one row per staffing level
    Csv,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "TEXT"),
            OutputFormat::Json => write!(f, "JSON"),
            OutputFormat::Csv => write!(f, "CSV"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

/// Generators the CLI can use when no sequence file is supplied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GeneratorKind {
    /// Mixed linear congruential generator (a=1664525, c=1013904223, m=2^32)
    #[default]
    Lcg,
    /// Seeded `rand::rngs::StdRng`
    StdRng,
}

impl fmt::Display for GeneratorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeneratorKind::Lcg => write!(f, "lcg"),
            GeneratorKind::StdRng => write!(f, "std-rng"),
        }
    }
}

impl FromStr for GeneratorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "lcg" => Ok(GeneratorKind::Lcg),
            "std-rng" | "stdrng" | "std" => Ok(GeneratorKind::StdRng),
            _ => Err(format!("Unknown generator: {}", s)),
        }
    }
}
