//! Staffing recommendation and report output
//!
//! Turns the per-level records of an experiment into a recommendation, a
//! plain-text summary and a JSON or CSV export.

use crate::simulation::{ExperimentRecord, ExperimentReport, SimulationResult};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

/// The staffing level the experiment recommends
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaffingRecommendation {
    /// Recommended number of servers
    pub servers: usize,
    /// Grand mean wait at that level
    pub mean_wait: f64,
    /// Upper confidence bound of the mean wait
    pub ci_upper: f64,
    /// Largest estimated wait accepted at that level
    pub max_wait: f64,
    /// Share of customers lost to balking, in percent
    pub loss_percentage: f64,
}

impl From<&ExperimentRecord> for StaffingRecommendation {
    fn from(record: &ExperimentRecord) -> Self {
        Self {
            servers: record.servers,
            mean_wait: record.mean_wait,
            ci_upper: record.ci_upper,
            max_wait: record.max_wait,
            loss_percentage: record.loss_percentage,
        }
    }
}

/// Smallest staffing level whose record meets the objective
pub fn recommend(records: &[ExperimentRecord]) -> Option<StaffingRecommendation> {
    records
        .iter()
        .filter(|record| record.objective_met)
        .min_by_key(|record| record.servers)
        .map(StaffingRecommendation::from)
}

/// Plain-text summary of a report
pub fn render_summary(report: &ExperimentReport) -> String {
    let mut out = String::new();
    let config = &report.config;

    let _ = writeln!(out, "=== Service Counter Experiment {} ===", report.run_id);
    let _ = writeln!(out, "Generated at: {}", report.generated_at.to_rfc3339());
    let _ = writeln!(
        out,
        "Replications: {} x {} business days, alpha = {}, target wait <= {} min",
        config.replications,
        config.business_days,
        config.significance_level,
        config.target_wait_minutes
    );
    let _ = writeln!(
        out,
        "Random sequence: {} values, stride {}\n",
        report.sequence_len, config.replication_stride
    );

    let _ = writeln!(
        out,
        "{:>7} {:>10} {:>21} {:>10} {:>9} {:>8} {:>8} {:>7} {:>9}",
        "servers",
        "mean wait",
        "confidence interval",
        "method",
        "max wait",
        "served",
        "balked",
        "loss %",
        "objective"
    );
    for record in &report.records {
        let interval = format!("[{:.3}, {:.3}]", record.ci_lower, record.ci_upper);
        let _ = writeln!(
            out,
            "{:>7} {:>10.3} {:>21} {:>10} {:>9.1} {:>8} {:>8} {:>7.2} {:>9}",
            record.servers,
            record.mean_wait,
            interval,
            record.ci_method.to_string(),
            record.max_wait,
            record.served,
            record.balked,
            record.loss_percentage,
            if record.objective_met { "met" } else { "not met" }
        );
    }

    match &report.recommendation {
        Some(recommendation) => {
            let _ = writeln!(
                out,
                "\nRecommendation: {} server(s) \
                 (mean wait {:.3} min, upper bound {:.3} min, loss {:.2}%)",
                recommendation.servers,
                recommendation.mean_wait,
                recommendation.ci_upper,
                recommendation.loss_percentage
            );
        }
        None => {
            let _ = writeln!(
                out,
                "\nRecommendation: no evaluated staffing level meets the objective"
            );
        }
    }
    out
}

/// Header row of [`render_csv`]
pub const CSV_HEADER: &str = "servers,replications,mean_wait,std_dev,max_wait,served,balked,\
loss_percentage,objective_met,ci_lower,ci_upper,ci_method,normal,normality_p_value";

/// One CSV row per staffing level, header first
///
/// The p-value column is empty when the normality test was not run.
pub fn render_csv(report: &ExperimentReport) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push('\n');
    for record in &report.records {
        let p_value = record.normality_p_value.map(|p| p.to_string()).unwrap_or_default();
        let _ = writeln!(
            out,
            "{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
            record.servers,
            record.replications,
            record.mean_wait,
            record.std_dev,
            record.max_wait,
            record.served,
            record.balked,
            record.loss_percentage,
            record.objective_met,
            record.ci_lower,
            record.ci_upper,
            record.ci_method,
            record.normal,
            p_value
        );
    }
    out
}

/// Write the report to `path`
///
/// Paths ending in `.csv` get [`render_csv`]; anything else gets pretty JSON
/// of the whole report.
pub fn write_report<P: AsRef<Path>>(path: P, report: &ExperimentReport) -> SimulationResult<()> {
    let path = path.as_ref();
    let mut writer = BufWriter::new(File::create(path)?);
    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    if is_csv {
        writer.write_all(render_csv(report).as_bytes())?;
    } else {
        serde_json::to_writer_pretty(&mut writer, report)?;
    }
    writer.flush()?;
    info!(path = %path.display(), csv = is_csv, records = report.records.len(), "Report written");
    Ok(())
}
