//! Configuration structures for the service counter simulator
//!
//! Settings come from three layers: command-line arguments override a JSON
//! configuration file, which overrides the built-in defaults.

use super::{GeneratorKind, OutputFormat, RoundingRule};
use crate::random::LcgGenerator;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default number of values generated when no sequence file is given
pub const DEFAULT_SEQUENCE_LENGTH: usize = 100_000;

/// Command line arguments structure
#[derive(Debug, Clone, Parser)]
#[command(
    name = "service-counter-simulator",
    version,
    about = "Service Counter Simulator - Recommends a staffing level for a retail service counter",
    long_about = "Simulates customer flow through a multi-server service counter over Morning and Afternoon shifts, with customers who balk at long lines. Each staffing level is replicated many times over the same pseudo-random sequence and summarized with a confidence interval and a go/no-go verdict against the target wait.

EXAMPLES:
    # Evaluate 1, 2 and 3 servers with the built-in generator
    service-counter-simulator

    # Use a sequence file and only evaluate two servers
    service-counter-simulator --sequence numbers.csv --servers 2

    # Write the full report as JSON
    service-counter-simulator --output-format json --output report.json

    # Generate configuration template
    service-counter-simulator --print-config > experiment.json

    # Keep the settings of a run for later reuse
    service-counter-simulator --servers 2,3 --days 10 --save-config experiment.json

    # Validate configuration without running
    service-counter-simulator --config experiment.json --dry-run

CONFIGURATION:
    Configuration can be provided via:
    1. Command line arguments (highest priority)
    2. Configuration file (--config flag)
    3. Default values (lowest priority)

    Supported configuration file formats: JSON (.json)"
)]
pub struct CliArgs {
    /// Configuration file path (JSON format)
    #[arg(
        short,
        long,
        help = "Configuration file path (JSON format)",
        long_help = "Path to a JSON configuration file. CLI arguments will override file settings."
    )]
    pub config: Option<String>,

    /// Staffing levels to evaluate
    #[arg(
        short,
        long,
        value_delimiter = ',',
        help = "Staffing levels to evaluate, e.g. 1,2,3",
        long_help = "Comma-separated list of server counts. Each level is simulated independently. Default: 1,2,3"
    )]
    pub servers: Option<Vec<usize>>,

    /// Replications per staffing level
    #[arg(
        short,
        long,
        help = "Replications per staffing level",
        long_help = "Independent replications per staffing level. At least 2 are needed for a standard deviation. Default: 50"
    )]
    pub replications: Option<usize>,

    /// Business days per replication
    #[arg(long, help = "Business days per replication (default: 20)")]
    pub days: Option<usize>,

    /// Significance level for the normality test and the interval
    #[arg(long, help = "Significance level alpha, in (0, 1) (default: 0.05)")]
    pub alpha: Option<f64>,

    /// Target mean wait in minutes
    #[arg(long, help = "Target mean wait in minutes (default: 6.0)")]
    pub target_wait: Option<f64>,

    /// Offset stride between replications
    #[arg(long, help = "Sequence offset stride between replications (default: 2000)")]
    pub stride: Option<usize>,

    /// Rounding rule for variates
    #[arg(
        long,
        help = "Rounding rule for variates (nearest-even or truncate)",
        long_help = "How continuous variates become whole minutes. nearest-even rounds halves to the even neighbour; truncate drops the fraction. Default: nearest-even"
    )]
    pub rounding: Option<RoundingRule>,

    /// Event budget per shift
    #[arg(long, help = "Maximum events per shift before the run is aborted")]
    pub max_events_per_shift: Option<usize>,

    /// Minimum replications before the normality test is trusted
    #[arg(long, help = "Minimum replications for the normality test (at least 8)")]
    pub normality_min_samples: Option<usize>,

    /// Pseudo-random sequence file
    #[arg(
        long,
        help = "Pseudo-random sequence file (.csv, .txt or .json)",
        long_help = "File holding values in [0, 1). CSV files may carry a header; the numero_pseudoaleatorio, value or uniform column is used, otherwise the last column. JSON files hold an array. Without this flag a sequence is generated."
    )]
    pub sequence: Option<String>,

    /// Generator used when no sequence file is given
    #[arg(long, help = "Generator when no sequence file is given (lcg or std-rng)")]
    pub generator: Option<GeneratorKind>,

    /// Length of the generated sequence
    #[arg(long, help = "Values to generate when no sequence file is given (default: 100000)")]
    pub sequence_length: Option<usize>,

    /// Seed for the generated sequence
    #[arg(long, help = "Seed for the generated sequence (default: 12345)")]
    pub seed: Option<u64>,

    /// Report format on stdout
    #[arg(long, help = "Report format on stdout (text, json or csv)")]
    pub output_format: Option<OutputFormat>,

    /// File receiving the JSON report
    #[arg(short, long, help = "Write the report to this file (CSV for .csv paths, JSON otherwise)")]
    pub output: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, help = "Enable verbose logging")]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(short, long, help = "Enable debug logging")]
    pub debug: bool,

    /// Emit logs as JSON
    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,

    /// Directory for rolling log files
    #[arg(long, help = "Also write daily-rolling log files to this directory")]
    pub log_dir: Option<String>,

    /// Dry run mode - validate configuration without running simulation
    #[arg(long, help = "Validate configuration and input without running simulation")]
    pub dry_run: bool,

    /// Print default configuration and exit
    #[arg(long, help = "Print default configuration in JSON format and exit")]
    pub print_config: bool,

    /// Write the resolved configuration to a JSON file
    #[arg(
        long,
        help = "Write the resolved configuration to a JSON file",
        long_help = "Write the configuration after file and CLI layering to this path. The file can be passed back with --config."
    )]
    pub save_config: Option<String>,
}

/// Configuration file structure (allows partial configuration)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConfigFile {
    /// Staffing levels to evaluate
    pub staffing_levels: Option<Vec<usize>>,
    /// Replications per staffing level
    pub replications: Option<usize>,
    /// Business days per replication
    pub business_days: Option<usize>,
    /// Significance level α
    pub significance_level: Option<f64>,
    /// Target mean wait in minutes
    pub target_wait_minutes: Option<f64>,
    /// Offset stride between replications
    pub replication_stride: Option<usize>,
    /// Rounding rule for variates
    pub rounding: Option<RoundingRule>,
    /// Event budget per shift
    pub max_events_per_shift: Option<usize>,
    /// Minimum replications for the normality test
    pub normality_min_samples: Option<usize>,
    /// Pseudo-random sequence file
    pub sequence_path: Option<String>,
    /// Generator used when no sequence file is given
    pub generator: Option<GeneratorKind>,
    /// Length of the generated sequence
    pub sequence_length: Option<usize>,
    /// Seed for the generated sequence
    pub seed: Option<u64>,
    /// Report format on stdout
    pub output_format: Option<OutputFormat>,
    /// File receiving the JSON report
    pub output_path: Option<String>,
}

/// Configuration for one experiment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    /// Staffing levels to evaluate, in order
    pub staffing_levels: Vec<usize>,
    /// Replications per staffing level
    pub replications: usize,
    /// Business days per replication
    pub business_days: usize,
    /// Significance level α for the normality test and the interval
    pub significance_level: f64,
    /// The objective is met when the grand mean wait is at most this many minutes
    pub target_wait_minutes: f64,
    /// Offset stride between replications
    pub replication_stride: usize,
    /// Rounding rule for variates
    pub rounding: RoundingRule,
    /// Event budget per shift
    pub max_events_per_shift: usize,
    /// Minimum replications before the normality test is trusted
    pub normality_min_samples: usize,
    /// Pseudo-random sequence file; a sequence is generated when absent
    pub sequence_path: Option<String>,
    /// Generator used when no sequence file is given
    pub generator: GeneratorKind,
    /// Length of the generated sequence
    pub sequence_length: usize,
    /// Seed for the generated sequence
    pub seed: u64,
    /// Report format on stdout
    pub output_format: OutputFormat,
    /// File receiving the JSON report
    pub output_path: Option<String>,
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    /// Configuration file read error
    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    /// JSON parsing error
    #[error("Failed to parse JSON configuration: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Unsupported configuration file format
    #[error("Unsupported configuration file format: {0} (supported: .json)")]
    UnsupportedFormat(String),
}

/// Validation errors for experiment configuration
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigValidationError {
    /// No staffing level to evaluate
    #[error("At least one staffing level is required")]
    EmptyStaffingLevels,

    /// A staffing level has no servers
    #[error("Staffing levels must be greater than 0, got {0}")]
    InvalidServerCount(usize),

    /// Too few replications for a sample standard deviation
    #[error("Replication count must be at least 2, got {0}")]
    InvalidReplicationCount(usize),

    /// Days count is invalid
    #[error("Business days must be greater than 0, got {0}")]
    InvalidDaysCount(usize),

    /// Significance level outside (0, 1)
    #[error("Significance level must lie strictly between 0 and 1, got {0}")]
    InvalidSignificanceLevel(f64),

    /// Target wait is not positive
    #[error("Target wait must be greater than 0 minutes, got {0}")]
    InvalidTargetWait(f64),

    /// Replication stride is zero
    #[error("Replication stride must be greater than 0")]
    InvalidStride,

    /// Event budget is zero
    #[error("Event budget per shift must be greater than 0")]
    InvalidEventBudget,

    /// Normality test threshold below its definition range
    #[error("Normality test needs at least 8 samples, got {0}")]
    InvalidNormalitySamples(usize),

    /// Nothing to generate
    #[error("Generated sequence length must be greater than 0")]
    InvalidSequenceLength,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            staffing_levels: vec![1, 2, 3],
            replications: 50,
            business_days: 20,
            significance_level: 0.05,
            target_wait_minutes: 6.0,
            replication_stride: 2000,
            rounding: RoundingRule::default(),
            max_events_per_shift: 1_000_000,
            normality_min_samples: 8,
            sequence_path: None,
            generator: GeneratorKind::default(),
            sequence_length: DEFAULT_SEQUENCE_LENGTH,
            seed: LcgGenerator::DEFAULT_SEED,
            output_format: OutputFormat::default(),
            output_path: None,
        }
    }
}

impl ExperimentConfig {
    /// Create configuration from parsed CLI arguments
    pub fn from_cli_args(args: CliArgs) -> Result<Self, ConfigError> {
        let mut config = match &args.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_cli_overrides(args);
        Ok(config)
    }

    /// Load configuration from a JSON file, filling gaps with defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => {
                let content = fs::read_to_string(path)?;
                let config_file: ConfigFile = serde_json::from_str(&content)?;
                Ok(Self::from_config_file(config_file))
            }
            Some(ext) => Err(ConfigError::UnsupportedFormat(ext.to_string())),
            None => Err(ConfigError::UnsupportedFormat("no extension".to_string())),
        }
    }

    fn from_config_file(file: ConfigFile) -> Self {
        let defaults = Self::default();

        Self {
            staffing_levels: file.staffing_levels.unwrap_or(defaults.staffing_levels),
            replications: file.replications.unwrap_or(defaults.replications),
            business_days: file.business_days.unwrap_or(defaults.business_days),
            significance_level: file.significance_level.unwrap_or(defaults.significance_level),
            target_wait_minutes: file.target_wait_minutes.unwrap_or(defaults.target_wait_minutes),
            replication_stride: file.replication_stride.unwrap_or(defaults.replication_stride),
            rounding: file.rounding.unwrap_or(defaults.rounding),
            max_events_per_shift: file
                .max_events_per_shift
                .unwrap_or(defaults.max_events_per_shift),
            normality_min_samples: file
                .normality_min_samples
                .unwrap_or(defaults.normality_min_samples),
            sequence_path: file.sequence_path.or(defaults.sequence_path),
            generator: file.generator.unwrap_or(defaults.generator),
            sequence_length: file.sequence_length.unwrap_or(defaults.sequence_length),
            seed: file.seed.unwrap_or(defaults.seed),
            output_format: file.output_format.unwrap_or(defaults.output_format),
            output_path: file.output_path.or(defaults.output_path),
        }
    }

    fn apply_cli_overrides(&mut self, args: CliArgs) {
        if let Some(levels) = args.servers {
            self.staffing_levels = levels;
        }
        if let Some(value) = args.replications {
            self.replications = value;
        }
        if let Some(value) = args.days {
            self.business_days = value;
        }
        if let Some(value) = args.alpha {
            self.significance_level = value;
        }
        if let Some(value) = args.target_wait {
            self.target_wait_minutes = value;
        }
        if let Some(value) = args.stride {
            self.replication_stride = value;
        }
        if let Some(value) = args.rounding {
            self.rounding = value;
        }
        if let Some(value) = args.max_events_per_shift {
            self.max_events_per_shift = value;
        }
        if let Some(value) = args.normality_min_samples {
            self.normality_min_samples = value;
        }
        if let Some(path) = args.sequence {
            self.sequence_path = Some(path);
        }
        if let Some(value) = args.generator {
            self.generator = value;
        }
        if let Some(value) = args.sequence_length {
            self.sequence_length = value;
        }
        if let Some(value) = args.seed {
            self.seed = value;
        }
        if let Some(value) = args.output_format {
            self.output_format = value;
        }
        if let Some(path) = args.output {
            self.output_path = Some(path);
        }
    }

    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        fs::write(path, self.print_json()?)?;
        Ok(())
    }

    /// Configuration as pretty JSON
    pub fn print_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validate the configuration parameters
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.staffing_levels.is_empty() {
            return Err(ConfigValidationError::EmptyStaffingLevels);
        }
        if let Some(&servers) = self.staffing_levels.iter().find(|&&servers| servers == 0) {
            return Err(ConfigValidationError::InvalidServerCount(servers));
        }
        if self.replications < 2 {
            return Err(ConfigValidationError::InvalidReplicationCount(self.replications));
        }
        if self.business_days == 0 {
            return Err(ConfigValidationError::InvalidDaysCount(self.business_days));
        }
        if !(self.significance_level > 0.0 && self.significance_level < 1.0) {
            return Err(ConfigValidationError::InvalidSignificanceLevel(self.significance_level));
        }
        if !(self.target_wait_minutes > 0.0) {
            return Err(ConfigValidationError::InvalidTargetWait(self.target_wait_minutes));
        }
        if self.replication_stride == 0 {
            return Err(ConfigValidationError::InvalidStride);
        }
        if self.max_events_per_shift == 0 {
            return Err(ConfigValidationError::InvalidEventBudget);
        }
        if self.normality_min_samples < 8 {
            return Err(ConfigValidationError::InvalidNormalitySamples(self.normality_min_samples));
        }
        if self.sequence_path.is_none() && self.sequence_length == 0 {
            return Err(ConfigValidationError::InvalidSequenceLength);
        }
        Ok(())
    }

    /// Total replications across all staffing levels
    pub fn total_replications(&self) -> usize {
        self.staffing_levels.len() * self.replications
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliArgs {
        CliArgs::try_parse_from(std::iter::once("test").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_experiment_config_default() {
        let config = ExperimentConfig::default();

        assert_eq!(config.staffing_levels, vec![1, 2, 3]);
        assert_eq!(config.replications, 50);
        assert_eq!(config.business_days, 20);
        assert_eq!(config.significance_level, 0.05);
        assert_eq!(config.target_wait_minutes, 6.0);
        assert_eq!(config.replication_stride, 2000);
        assert_eq!(config.rounding, RoundingRule::NearestEven);
        assert_eq!(config.seed, 12345);
        assert_eq!(config.sequence_length, DEFAULT_SEQUENCE_LENGTH);
        assert!(config.sequence_path.is_none());
        assert_eq!(config.total_replications(), 150);
        config.validate().unwrap();
    }

    #[test]
    fn test_cli_overrides() {
        let args = parse(&[
            "--servers",
            "2,4",
            "--replications",
            "12",
            "--days",
            "5",
            "--alpha",
            "0.1",
            "--rounding",
            "truncate",
            "--generator",
            "std-rng",
            "--output-format",
            "json",
        ]);
        let config = ExperimentConfig::from_cli_args(args).unwrap();

        assert_eq!(config.staffing_levels, vec![2, 4]);
        assert_eq!(config.replications, 12);
        assert_eq!(config.business_days, 5);
        assert_eq!(config.significance_level, 0.1);
        assert_eq!(config.rounding, RoundingRule::Truncate);
        assert_eq!(config.generator, GeneratorKind::StdRng);
        assert_eq!(config.output_format, OutputFormat::Json);
        // Untouched settings keep their defaults
        assert_eq!(config.target_wait_minutes, 6.0);
        assert_eq!(config.replication_stride, 2000);
    }

    #[test]
    fn test_config_file_loading() {
        use std::io::Write;
        use tempfile::Builder;

        let mut temp_file = Builder::new().suffix(".json").tempfile().unwrap();
        let config_json = r#"{
            "staffing_levels": [3],
            "replications": 30,
            "business_days": 10,
            "rounding": "truncate",
            "sequence_path": "numbers.csv"
        }"#;
        temp_file.write_all(config_json.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = ExperimentConfig::from_file(temp_file.path()).unwrap();

        assert_eq!(config.staffing_levels, vec![3]);
        assert_eq!(config.replications, 30);
        assert_eq!(config.business_days, 10);
        assert_eq!(config.rounding, RoundingRule::Truncate);
        assert_eq!(config.sequence_path.as_deref(), Some("numbers.csv"));
        assert_eq!(config.significance_level, 0.05);
    }

    #[test]
    fn test_cli_wins_over_file() {
        use std::io::Write;
        use tempfile::Builder;

        let mut temp_file = Builder::new().suffix(".json").tempfile().unwrap();
        temp_file.write_all(br#"{"replications": 30, "business_days": 10}"#).unwrap();
        temp_file.flush().unwrap();
        let path = temp_file.path().to_str().unwrap();

        let args = parse(&["--config", path, "--replications", "7"]);
        let config = ExperimentConfig::from_cli_args(args).unwrap();
        assert_eq!(config.replications, 7);
        assert_eq!(config.business_days, 10);
    }

    #[test]
    fn test_saved_config_loads_back_equal() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("experiment.json");
        let config = ExperimentConfig {
            staffing_levels: vec![2, 5],
            replications: 25,
            rounding: RoundingRule::Truncate,
            sequence_path: Some("numbers.csv".to_string()),
            output_format: OutputFormat::Csv,
            ..Default::default()
        };

        config.save_to_file(&path).unwrap();
        assert_eq!(ExperimentConfig::from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_config_file_errors() {
        assert!(matches!(
            ExperimentConfig::from_file("/definitely/not/here.json"),
            Err(ConfigError::FileNotFound(_))
        ));

        let temp_file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        assert!(matches!(
            ExperimentConfig::from_file(temp_file.path()),
            Err(ConfigError::UnsupportedFormat(ext)) if ext == "toml"
        ));
    }

    #[test]
    fn test_validation_rejects_each_bad_field() {
        let valid = ExperimentConfig::default();
        let cases: Vec<(ExperimentConfig, ConfigValidationError)> = vec![
            (
                ExperimentConfig { staffing_levels: vec![], ..valid.clone() },
                ConfigValidationError::EmptyStaffingLevels,
            ),
            (
                ExperimentConfig { staffing_levels: vec![2, 0], ..valid.clone() },
                ConfigValidationError::InvalidServerCount(0),
            ),
            (
                ExperimentConfig { replications: 1, ..valid.clone() },
                ConfigValidationError::InvalidReplicationCount(1),
            ),
            (
                ExperimentConfig { business_days: 0, ..valid.clone() },
                ConfigValidationError::InvalidDaysCount(0),
            ),
            (
                ExperimentConfig { significance_level: 1.0, ..valid.clone() },
                ConfigValidationError::InvalidSignificanceLevel(1.0),
            ),
            (
                ExperimentConfig { target_wait_minutes: 0.0, ..valid.clone() },
                ConfigValidationError::InvalidTargetWait(0.0),
            ),
            (
                ExperimentConfig { replication_stride: 0, ..valid.clone() },
                ConfigValidationError::InvalidStride,
            ),
            (
                ExperimentConfig { max_events_per_shift: 0, ..valid.clone() },
                ConfigValidationError::InvalidEventBudget,
            ),
            (
                ExperimentConfig { normality_min_samples: 7, ..valid.clone() },
                ConfigValidationError::InvalidNormalitySamples(7),
            ),
            (
                ExperimentConfig { sequence_length: 0, ..valid.clone() },
                ConfigValidationError::InvalidSequenceLength,
            ),
        ];

        for (config, expected) in cases {
            assert_eq!(config.validate().unwrap_err(), expected);
        }
    }

    #[test]
    fn test_config_serialization() {
        let config = ExperimentConfig::default();
        let json = config.print_json().unwrap();
        assert!(json.contains("\"rounding\": \"nearest_even\""));
        let parsed: ExperimentConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }
}
