//! Experiment orchestrator
//!
//! Evaluates every configured staffing level over one shared sequence and
//! collects the per-level records into an [`ExperimentReport`].

use crate::analysis::{recommend, StaffingRecommendation};
use crate::counter::ShiftCalendar;
use crate::perf_span;
use crate::random::UniformSequence;
use crate::simulation::{
    ExperimentRecord, ReplicationRecord, ReplicationRunner, SimulationError, SimulationResult,
    StatisticsAggregator,
};
use crate::types::{ExperimentConfig, RunId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info, instrument};

/// Everything one experiment produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentReport {
    /// Identifier of this run
    pub run_id: RunId,
    /// When the report was assembled
    pub generated_at: DateTime<Utc>,
    /// Configuration the experiment ran with
    pub config: ExperimentConfig,
    /// Length of the random sequence
    pub sequence_len: usize,
    /// One record per staffing level, in evaluation order
    pub records: Vec<ExperimentRecord>,
    /// Smallest staffing level meeting the objective, if any
    pub recommendation: Option<StaffingRecommendation>,
}

impl ExperimentReport {
    /// Record for a staffing level
    pub fn record_for(&self, servers: usize) -> Option<&ExperimentRecord> {
        self.records.iter().find(|record| record.servers == servers)
    }
}

/// Runs an experiment over every configured staffing level
#[derive(Debug)]
pub struct ExperimentOrchestrator {
    config: ExperimentConfig,
    runner: ReplicationRunner,
    aggregator: StatisticsAggregator,
}

impl ExperimentOrchestrator {
    /// Create an orchestrator; the configuration is validated first
    #[instrument(
        skip(config, sequence),
        fields(levels = ?config.staffing_levels, sequence_len = sequence.len())
    )]
    pub fn new(config: ExperimentConfig, sequence: UniformSequence) -> SimulationResult<Self> {
        config
            .validate()
            .map_err(|e| SimulationError::configuration_error(e.to_string()))?;

        let calendar = ShiftCalendar::new(config.business_days, config.rounding);
        let runner = ReplicationRunner::new(sequence, calendar)
            .with_stride(config.replication_stride)
            .with_max_events(config.max_events_per_shift);
        let aggregator =
            StatisticsAggregator::new(config.significance_level, config.target_wait_minutes)
                .with_normality_min_samples(config.normality_min_samples);

        debug!(
            replications = config.replications,
            days = config.business_days,
            rounding = %config.rounding,
            "Experiment orchestrator ready"
        );
        Ok(Self { config, runner, aggregator })
    }

    /// Configuration in use
    pub fn config(&self) -> &ExperimentConfig {
        &self.config
    }

    /// Replication runner in use
    pub fn runner(&self) -> &ReplicationRunner {
        &self.runner
    }

    /// Aggregator in use
    pub fn aggregator(&self) -> &StatisticsAggregator {
        &self.aggregator
    }

    /// Raw replication records for one staffing level
    pub fn replicate(&self, servers: usize) -> SimulationResult<Vec<ReplicationRecord>> {
        self.runner.run(servers, self.config.replications)
    }

    /// Replicate and aggregate one staffing level
    pub fn evaluate(&self, servers: usize) -> SimulationResult<ExperimentRecord> {
        let _span = perf_span!("evaluate", servers = servers).entered();
        let replications = self.replicate(servers)?;
        let record = self.aggregator.aggregate(servers, &replications)?;
        info!(
            servers,
            mean_wait = record.mean_wait,
            ci_lower = record.ci_lower,
            ci_upper = record.ci_upper,
            loss_percentage = record.loss_percentage,
            objective_met = record.objective_met,
            "Staffing level evaluated"
        );
        Ok(record)
    }

    /// Evaluate every configured staffing level
    pub fn run(&self) -> SimulationResult<ExperimentReport> {
        let started = Instant::now();
        info!(
            levels = ?self.config.staffing_levels,
            replications = self.config.replications,
            days = self.config.business_days,
            "Starting experiment"
        );

        let records = self
            .config
            .staffing_levels
            .iter()
            .map(|&servers| self.evaluate(servers))
            .collect::<SimulationResult<Vec<_>>>()?;
        let recommendation = recommend(&records);

        let report = ExperimentReport {
            run_id: RunId::new(),
            generated_at: Utc::now(),
            config: self.config.clone(),
            sequence_len: self.runner.sequence().len(),
            records,
            recommendation,
        };
        info!(
            run_id = %report.run_id,
            recommended = ?report.recommendation.as_ref().map(|r| r.servers),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Experiment complete"
        );
        Ok(report)
    }
}
