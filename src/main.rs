// Service Counter Simulator - Main Entry Point
//
// You can run it via Cargo:
//
// ```console
// $ cargo build --release
// $ ./target/release/service-counter-simulator
// ```
//
// Or with a sequence file and custom staffing levels:
//
// ```console
// $ ./target/release/service-counter-simulator --sequence numbers.csv --servers 1,2,3,4 --verbose
// ```

use anyhow::Context;
use clap::Parser;
use service_counter_simulator::analysis::{render_csv, render_summary, write_report};
use service_counter_simulator::random::UniformSequence;
use service_counter_simulator::simulation::{ExperimentOrchestrator, LoggingConfig};
use service_counter_simulator::types::{CliArgs, ExperimentConfig, OutputFormat};
use std::process;
use tracing::{error, info};

fn main() {
    process::exit(run_cli());
}

/// Runs the command line and returns the exit code
///
/// Everything that holds the log file guard lives in here, so the guard is
/// dropped and the log file flushed before `process::exit`.
fn run_cli() -> i32 {
    let args = CliArgs::parse();

    if args.print_config {
        return match ExperimentConfig::default().print_json() {
            Ok(json) => {
                println!("{}", json);
                0
            }
            Err(e) => {
                eprintln!("Failed to serialize default configuration: {}", e);
                1
            }
        };
    }

    let mut logging = LoggingConfig::from_flags(args.verbose, args.debug);
    if args.json_logs {
        logging = logging.with_json_format();
    }
    if let Some(dir) = &args.log_dir {
        logging = logging.with_file_logging(dir.clone());
    }
    let _log_guard = match logging.init() {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            return 1;
        }
    };

    info!("Starting Service Counter Simulator");

    let dry_run = args.dry_run;
    let save_config = args.save_config.clone();
    let config = match ExperimentConfig::from_cli_args(args) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            eprintln!("Failed to load configuration: {}", e);
            return 1;
        }
    };

    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {}", e);
        eprintln!("Configuration validation failed: {}", e);
        return 1;
    }

    if let Some(path) = &save_config {
        if let Err(e) = config.save_to_file(path) {
            error!("Failed to save configuration to {}: {}", path, e);
            eprintln!("Failed to save configuration to {}: {}", path, e);
            return 1;
        }
        eprintln!("Configuration saved to: {}", path);
    }

    if let Err(e) = run(config, dry_run) {
        error!("Simulation failed: {:#}", e);
        eprintln!("Simulation failed: {:#}", e);
        return 1;
    }

    info!("Service Counter Simulator completed successfully");
    0
}

fn run(config: ExperimentConfig, dry_run: bool) -> anyhow::Result<()> {
    let sequence = load_sequence(&config)?;

    if dry_run {
        eprintln!("Configuration validation successful!");
        eprintln!("Dry run mode - simulation will not be executed.");
        print_configuration_summary(&config, &sequence);
        return Ok(());
    }

    print_configuration_summary(&config, &sequence);

    let orchestrator = ExperimentOrchestrator::new(config.clone(), sequence)
        .context("failed to set up the experiment")?;
    let report = orchestrator.run().context("experiment aborted")?;

    match config.output_format {
        OutputFormat::Text => print!("{}", render_summary(&report)),
        OutputFormat::Json => {
            let json =
                serde_json::to_string_pretty(&report).context("failed to serialize report")?;
            println!("{}", json);
        }
        OutputFormat::Csv => print!("{}", render_csv(&report)),
    }

    if let Some(path) = &config.output_path {
        write_report(path, &report)
            .with_context(|| format!("failed to write report to {}", path))?;
        eprintln!("Report written to: {}", path);
    }

    if report.recommendation.is_none() {
        eprintln!(
            "No evaluated staffing level meets the {:.1} minute target.",
            config.target_wait_minutes
        );
    }
    Ok(())
}

fn load_sequence(config: &ExperimentConfig) -> anyhow::Result<UniformSequence> {
    match &config.sequence_path {
        Some(path) => UniformSequence::from_path(path)
            .with_context(|| format!("cannot use random sequence from {}", path)),
        None => UniformSequence::generate(config.generator, config.seed, config.sequence_length)
            .context("cannot generate random sequence"),
    }
}

fn print_configuration_summary(config: &ExperimentConfig, sequence: &UniformSequence) {
    let source = config
        .sequence_path
        .clone()
        .unwrap_or_else(|| format!("{} generator, seed {}", config.generator, config.seed));

    eprintln!("Experiment Configuration:");
    eprintln!("  Staffing levels: {:?}", config.staffing_levels);
    eprintln!("  Replications: {} per level", config.replications);
    eprintln!("  Business days: {} (Morning + Afternoon shifts)", config.business_days);
    eprintln!("  Significance level: {}", config.significance_level);
    eprintln!("  Target wait: {} min", config.target_wait_minutes);
    eprintln!("  Rounding: {}", config.rounding);
    eprintln!("  Random sequence: {} values ({})", sequence.len(), source);
    eprintln!("  Replication stride: {}", config.replication_stride);
    if config.replication_stride % sequence.len() == 0 {
        eprintln!(
            "  Warning: the stride is a multiple of the sequence length, \
             every replication starts at offset 0"
        );
    }
    eprintln!();
}
