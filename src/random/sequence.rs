//! Accepted uniform sequences and the collaborators that produce them
//!
//! A [`UniformSequence`] is immutable once built and is shared by every cursor
//! reading it. Loading from disk and generating fresh sequences live here so
//! that input problems surface as [`SimulationError::InputUnavailable`] before
//! any simulation starts.

use crate::simulation::{SimulationError, SimulationResult};
use crate::types::GeneratorKind;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Column names recognised in CSV input
const VALUE_COLUMNS: [&str; 3] = ["numero_pseudoaleatorio", "value", "uniform"];

/// Validated, immutable sequence of draws in [0, 1)
#[derive(Debug, Clone, PartialEq)]
pub struct UniformSequence {
    values: Arc<[f64]>,
}

impl UniformSequence {
    /// Build a sequence, rejecting empty input and values outside [0, 1)
    pub fn new(values: Vec<f64>) -> SimulationResult<Self> {
        if values.is_empty() {
            return Err(SimulationError::input_unavailable("random sequence is empty"));
        }
        if let Some((index, value)) =
            values.iter().enumerate().find(|(_, v)| !(0.0..1.0).contains(*v))
        {
            return Err(SimulationError::input_unavailable(format!(
                "value {} at index {} is outside [0, 1)",
                value, index
            )));
        }
        Ok(Self { values: values.into() })
    }

    /// The draws in load order
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of draws before the sequence wraps
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Always false for a constructed sequence
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Load a sequence from a file
    ///
    /// `.json` files hold an array of numbers; anything else is read as CSV
    /// (optionally with a header naming the value column) or as one value per line.
    pub fn from_path<P: AsRef<Path>>(path: P) -> SimulationResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SimulationError::input_unavailable(format!(
                "sequence file not found: {}",
                path.display()
            )));
        }

        let content = fs::read_to_string(path)?;
        let sequence = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&content)?,
            _ => Self::from_csv_str(&content)?,
        };

        info!("Loaded {} accepted draws from {}", sequence.len(), path.display());
        Ok(sequence)
    }

    /// Parse a JSON array of numbers
    pub fn from_json_str(content: &str) -> SimulationResult<Self> {
        let values: Vec<f64> = serde_json::from_str(content).map_err(|e| {
            SimulationError::input_unavailable(format!("invalid JSON sequence: {}", e))
        })?;
        Self::new(values)
    }

    /// Parse CSV or line-oriented text
    ///
    /// When the first line is a header, the value column is the first of
    /// `numero_pseudoaleatorio`, `value` or `uniform` present, falling back to
    /// the last column. Without a header the last column is used, so
    /// `index,value` pairs and bare values both load.
    pub fn from_csv_str(content: &str) -> SimulationResult<Self> {
        let mut lines = content.lines().map(str::trim).filter(|line| !line.is_empty()).peekable();

        let mut column: Option<usize> = None;
        if let Some(first) = lines.peek() {
            let fields: Vec<&str> = first.split(',').map(str::trim).collect();
            let is_header = fields.iter().any(|field| field.parse::<f64>().is_err());
            if is_header {
                column = Some(
                    VALUE_COLUMNS
                        .iter()
                        .find_map(|name| fields.iter().position(|field| field == name))
                        .unwrap_or(fields.len() - 1),
                );
                debug!("CSV header detected, reading column {:?}", column);
                lines.next();
            }
        }

        let mut values = Vec::new();
        for (line_number, line) in lines.enumerate() {
            let fields: Vec<&str> = line.split(',').map(str::trim).collect();
            let index = column.unwrap_or(fields.len() - 1);
            let raw = fields.get(index).ok_or_else(|| {
                SimulationError::input_unavailable(format!(
                    "line {} has no column {}",
                    line_number + 1,
                    index
                ))
            })?;
            let value = raw.parse::<f64>().map_err(|e| {
                SimulationError::input_unavailable(format!(
                    "line {}: cannot parse '{}': {}",
                    line_number + 1,
                    raw,
                    e
                ))
            })?;
            values.push(value);
        }

        Self::new(values)
    }

    /// Generate `len` draws with the requested generator
    pub fn generate(kind: GeneratorKind, seed: u64, len: usize) -> SimulationResult<Self> {
        let values: Vec<f64> = match kind {
            GeneratorKind::Lcg => LcgGenerator::new(seed).take(len).collect(),
            GeneratorKind::StdRng => {
                let mut rng = StdRng::seed_from_u64(seed);
                (0..len).map(|_| rng.gen::<f64>()).collect()
            }
        };
        info!(generator = %kind, seed, len, "Generated uniform sequence");
        Self::new(values)
    }
}

/// Mixed linear congruential generator `x' = (a·x + c) mod 2^32`
#[derive(Debug, Clone)]
pub struct LcgGenerator {
    state: u64,
}

impl LcgGenerator {
    /// Multiplier
    pub const A: u64 = 1_664_525;
    /// Increment
    pub const C: u64 = 1_013_904_223;
    /// Modulus
    pub const M: u64 = 1 << 32;
    /// Seed used when none is configured
    pub const DEFAULT_SEED: u64 = 12345;

    /// Create a generator from a seed
    pub fn new(seed: u64) -> Self {
        Self { state: seed % Self::M }
    }
}

impl Default for LcgGenerator {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SEED)
    }
}

impl Iterator for LcgGenerator {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        self.state = (Self::A * self.state + Self::C) % Self::M;
        Some(self.state as f64 / Self::M as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty_sequence() {
        let err = UniformSequence::new(vec![]).unwrap_err();
        assert!(matches!(err, SimulationError::InputUnavailable(_)));
    }

    #[test]
    fn test_rejects_out_of_range_values() {
        assert!(UniformSequence::new(vec![0.2, 1.0]).is_err());
        assert!(UniformSequence::new(vec![-0.1]).is_err());
        assert!(UniformSequence::new(vec![f64::NAN]).is_err());
        assert!(UniformSequence::new(vec![0.0, 0.999_999]).is_ok());
    }

    #[test]
    fn test_csv_with_named_column() {
        let csv = "indice,numero_pseudoaleatorio\n1,0.25\n2,0.5\n\n3,0.75\n";
        let sequence = UniformSequence::from_csv_str(csv).unwrap();
        assert_eq!(sequence.values(), &[0.25, 0.5, 0.75]);
    }

    #[test]
    fn test_csv_without_header_uses_last_column() {
        let sequence = UniformSequence::from_csv_str("0,0.1\n1,0.2").unwrap();
        assert_eq!(sequence.values(), &[0.1, 0.2]);

        let bare = UniformSequence::from_csv_str("0.3\n0.4\n").unwrap();
        assert_eq!(bare.values(), &[0.3, 0.4]);
    }

    #[test]
    fn test_csv_parse_error_is_input_unavailable() {
        let err = UniformSequence::from_csv_str("value\n0.1\nabc\n").unwrap_err();
        assert!(matches!(err, SimulationError::InputUnavailable(_)));
    }

    #[test]
    fn test_json_array() {
        let sequence = UniformSequence::from_json_str("[0.5, 0.25]").unwrap();
        assert_eq!(sequence.len(), 2);
    }

    #[test]
    fn test_missing_file_is_input_unavailable() {
        let err = UniformSequence::from_path("/definitely/not/here.csv").unwrap_err();
        assert!(matches!(err, SimulationError::InputUnavailable(_)));
    }

    #[test]
    fn test_lcg_first_values() {
        let mut lcg = LcgGenerator::new(12345);
        let expected_state = (1_664_525u64 * 12345 + 1_013_904_223) % (1u64 << 32);
        let first = lcg.next().unwrap();
        assert_eq!(first, expected_state as f64 / 4_294_967_296.0);
        assert!(lcg.take(1000).all(|v| (0.0..1.0).contains(&v)));
    }

    #[test]
    fn test_generation_is_deterministic() {
        for kind in [GeneratorKind::Lcg, GeneratorKind::StdRng] {
            let a = UniformSequence::generate(kind, 7, 500).unwrap();
            let b = UniformSequence::generate(kind, 7, 500).unwrap();
            assert_eq!(a, b);
            assert_eq!(a.len(), 500);
        }
    }
}
