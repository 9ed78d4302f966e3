//! Statistics aggregation across replications
//!
//! The replication means of one staffing level are reduced to a grand mean,
//! a sample standard deviation and a confidence interval. The interval uses
//! the Student-t quantile when the sample passes a D'Agostino-Pearson
//! normality test and falls back to `mean ± s / sqrt(R·α)` otherwise.

use crate::simulation::{ReplicationRecord, SimulationError, SimulationResult};
use crate::types::CiMethod;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ChiSquared, ContinuousCDF, StudentsT};
use std::fmt;
use tracing::{debug, instrument};

/// Smallest sample the omnibus normality test is defined for
pub const MIN_NORMALITY_SAMPLES: usize = 8;

/// Default objective: mean wait at or below six minutes
pub const DEFAULT_TARGET_WAIT_MINUTES: f64 = 6.0;

/// Default significance level
pub const DEFAULT_SIGNIFICANCE_LEVEL: f64 = 0.05;

/// Aggregated outcome for one staffing level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentRecord {
    /// Staffing level
    pub servers: usize,
    /// Replications aggregated
    pub replications: usize,
    /// Grand mean of the replication mean waits
    pub mean_wait: f64,
    /// Sample standard deviation of the replication mean waits
    pub std_dev: f64,
    /// Largest estimated wait accepted in any replication
    pub max_wait: f64,
    /// Customers served over all replications
    pub served: usize,
    /// Customers who balked over all replications
    pub balked: usize,
    /// `balked / (served + balked) · 100`, 0 when nobody arrived
    pub loss_percentage: f64,
    /// Whether the grand mean meets the target wait
    pub objective_met: bool,
    /// Lower confidence bound
    pub ci_lower: f64,
    /// Upper confidence bound
    pub ci_upper: f64,
    /// How the interval was built
    pub ci_method: CiMethod,
    /// Whether the replication means were judged normal
    pub normal: bool,
    /// p-value of the normality test, `None` when the test could not run
    pub normality_p_value: Option<f64>,
    /// The replication mean waits, in replication order
    pub replication_means: Vec<f64>,
}

impl fmt::Display for ExperimentRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} server(s): mean wait {:.3} min [{:.3}, {:.3}] ({}), max wait {:.1} min, \
             served {}, balked {} ({:.2}% loss), objective {}",
            self.servers,
            self.mean_wait,
            self.ci_lower,
            self.ci_upper,
            self.ci_method,
            self.max_wait,
            self.served,
            self.balked,
            self.loss_percentage,
            if self.objective_met { "met" } else { "not met" }
        )
    }
}

/// Result of the D'Agostino-Pearson omnibus test
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalityTest {
    /// Skewness z-score
    pub skewness_z: f64,
    /// Kurtosis z-score
    pub kurtosis_z: f64,
    /// `K² = Zs² + Zk²`
    pub statistic: f64,
    /// Chi-squared (2 degrees of freedom) survival of the statistic
    pub p_value: f64,
}

impl NormalityTest {
    /// Run the test on `values`
    ///
    /// Returns `Ok(None)` when fewer than [`MIN_NORMALITY_SAMPLES`] values are
    /// given, the sample has no spread, or the kurtosis transform is undefined.
    pub fn dagostino_pearson(values: &[f64]) -> SimulationResult<Option<Self>> {
        let n = values.len();
        if n < MIN_NORMALITY_SAMPLES {
            return Ok(None);
        }
        let (m2, m3, m4) = central_moments(values);
        if m2 <= 0.0 || !m2.is_finite() {
            return Ok(None);
        }

        let skewness_z = skewness_z(n as f64, m3 / m2.powf(1.5));
        let kurtosis_z = match kurtosis_z(n as f64, m4 / (m2 * m2)) {
            Some(z) => z,
            None => return Ok(None),
        };
        let statistic = skewness_z * skewness_z + kurtosis_z * kurtosis_z;
        if !statistic.is_finite() {
            return Ok(None);
        }

        let chi_squared =
            ChiSquared::new(2.0).map_err(|e| SimulationError::statistics_error(e.to_string()))?;
        Ok(Some(Self { skewness_z, kurtosis_z, statistic, p_value: chi_squared.sf(statistic) }))
    }

    /// Normal at significance level `alpha` iff `p >= alpha`
    pub fn is_normal(&self, alpha: f64) -> bool {
        self.p_value >= alpha
    }
}

/// Population central moments m2, m3, m4
fn central_moments(values: &[f64]) -> (f64, f64, f64) {
    let n = values.len() as f64;
    let mean = sample_mean(values);
    let (mut m2, mut m3, mut m4) = (0.0, 0.0, 0.0);
    for value in values {
        let d = value - mean;
        let d2 = d * d;
        m2 += d2;
        m3 += d2 * d;
        m4 += d2 * d2;
    }
    (m2 / n, m3 / n, m4 / n)
}

fn skewness_z(n: f64, b2: f64) -> f64 {
    let mut y = b2 * (((n + 1.0) * (n + 3.0)) / (6.0 * (n - 2.0))).sqrt();
    let beta2 = (3.0 * (n * n + 27.0 * n - 70.0) * (n + 1.0) * (n + 3.0))
        / ((n - 2.0) * (n + 5.0) * (n + 7.0) * (n + 9.0));
    let w2 = -1.0 + (2.0 * (beta2 - 1.0)).sqrt();
    let delta = 1.0 / (0.5 * w2.ln()).sqrt();
    let alpha = (2.0 / (w2 - 1.0)).sqrt();
    if y == 0.0 {
        y = 1.0;
    }
    let ratio = y / alpha;
    delta * (ratio + (ratio * ratio + 1.0).sqrt()).ln()
}

fn kurtosis_z(n: f64, b2: f64) -> Option<f64> {
    let expected = 3.0 * (n - 1.0) / (n + 1.0);
    let variance =
        24.0 * n * (n - 2.0) * (n - 3.0) / ((n + 1.0) * (n + 1.0) * (n + 3.0) * (n + 5.0));
    let x = (b2 - expected) / variance.sqrt();
    let sqrt_beta1 = 6.0 * (n * n - 5.0 * n + 2.0) / ((n + 7.0) * (n + 9.0))
        * ((6.0 * (n + 3.0) * (n + 5.0)) / (n * (n - 2.0) * (n - 3.0))).sqrt();
    let a = 6.0
        + 8.0 / sqrt_beta1 * (2.0 / sqrt_beta1 + (1.0 + 4.0 / (sqrt_beta1 * sqrt_beta1)).sqrt());
    let term1 = 1.0 - 2.0 / (9.0 * a);
    let denom = 1.0 + x * (2.0 / (a - 4.0)).sqrt();
    if denom == 0.0 {
        return None;
    }
    let term2 = denom.signum() * ((1.0 - 2.0 / a) / denom.abs()).cbrt();
    Some((term1 - term2) / (2.0 / (9.0 * a)).sqrt())
}

/// Arithmetic mean; 0 for an empty slice
pub fn sample_mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1 denominator); `None` below two values
pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mean = sample_mean(values);
    let sum_sq: f64 = values.iter().map(|value| (value - mean) * (value - mean)).sum();
    Some((sum_sq / (values.len() - 1) as f64).sqrt())
}

/// Two-sided Student-t quantile `t(probability, df)`
pub fn student_t_quantile(probability: f64, degrees_of_freedom: f64) -> SimulationResult<f64> {
    let distribution = StudentsT::new(0.0, 1.0, degrees_of_freedom)
        .map_err(|e| SimulationError::statistics_error(e.to_string()))?;
    Ok(distribution.inverse_cdf(probability))
}

/// Loss percentage; 0 when nobody arrived
pub fn loss_percentage(served: usize, balked: usize) -> f64 {
    let arrivals = served + balked;
    if arrivals == 0 {
        0.0
    } else {
        balked as f64 / arrivals as f64 * 100.0
    }
}

/// Confidence interval around a grand mean
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    /// Lower bound
    pub lower: f64,
    /// Upper bound
    pub upper: f64,
    /// Construction used
    pub method: CiMethod,
}

impl ConfidenceInterval {
    /// `mean ± t(1 - α/2, n - 1) · s / sqrt(n)`
    pub fn student_t(mean: f64, std_dev: f64, n: usize, alpha: f64) -> SimulationResult<Self> {
        let t = student_t_quantile(1.0 - alpha / 2.0, (n - 1) as f64)?;
        let half_width = t * std_dev / (n as f64).sqrt();
        Ok(Self { lower: mean - half_width, upper: mean + half_width, method: CiMethod::StudentT })
    }

    /// `mean ± s / sqrt(n · α)`
    pub fn fallback(mean: f64, std_dev: f64, n: usize, alpha: f64) -> Self {
        let half_width = std_dev / (n as f64 * alpha).sqrt();
        Self { lower: mean - half_width, upper: mean + half_width, method: CiMethod::Fallback }
    }

    /// Half of the interval width
    pub fn half_width(&self) -> f64 {
        (self.upper - self.lower) / 2.0
    }
}

/// Reduces replication records to an [`ExperimentRecord`]
#[derive(Debug, Clone, PartialEq)]
pub struct StatisticsAggregator {
    significance_level: f64,
    target_wait: f64,
    normality_min_samples: usize,
}

impl Default for StatisticsAggregator {
    fn default() -> Self {
        Self {
            significance_level: DEFAULT_SIGNIFICANCE_LEVEL,
            target_wait: DEFAULT_TARGET_WAIT_MINUTES,
            normality_min_samples: MIN_NORMALITY_SAMPLES,
        }
    }
}

impl StatisticsAggregator {
    /// Create an aggregator for significance level `alpha` and a target mean wait
    pub fn new(significance_level: f64, target_wait: f64) -> Self {
        Self { significance_level, target_wait, ..Self::default() }
    }

    /// Require more samples before trusting the normality test
    ///
    /// Values below [`MIN_NORMALITY_SAMPLES`] are raised to it.
    pub fn with_normality_min_samples(mut self, samples: usize) -> Self {
        self.normality_min_samples = samples.max(MIN_NORMALITY_SAMPLES);
        self
    }

    /// Significance level α
    pub fn significance_level(&self) -> f64 {
        self.significance_level
    }

    /// Target mean wait in minutes
    pub fn target_wait(&self) -> f64 {
        self.target_wait
    }

    /// Aggregate the replications of one staffing level
    #[instrument(skip(self, records), fields(replications = records.len()))]
    pub fn aggregate(
        &self,
        servers: usize,
        records: &[ReplicationRecord],
    ) -> SimulationResult<ExperimentRecord> {
        if records.is_empty() {
            return Err(SimulationError::EmptyReplicationSet { servers });
        }
        if !(self.significance_level > 0.0 && self.significance_level < 1.0) {
            return Err(SimulationError::statistics_error(format!(
                "significance level must lie in (0, 1), got {}",
                self.significance_level
            )));
        }

        let replication_means: Vec<f64> = records.iter().map(|record| record.mean_wait).collect();
        let replications = replication_means.len();
        let std_dev = sample_std_dev(&replication_means).ok_or_else(|| {
            SimulationError::statistics_error(format!(
                "at least 2 replications are needed for a standard deviation, got {replications}"
            ))
        })?;
        let mean_wait = sample_mean(&replication_means);

        let normality = if replications >= self.normality_min_samples {
            NormalityTest::dagostino_pearson(&replication_means)?
        } else {
            None
        };
        let normal = normality.is_some_and(|test| test.is_normal(self.significance_level));

        let alpha = self.significance_level;
        let interval = if normal {
            ConfidenceInterval::student_t(mean_wait, std_dev, replications, alpha)?
        } else {
            ConfidenceInterval::fallback(mean_wait, std_dev, replications, alpha)
        };

        let served: usize = records.iter().map(|record| record.served).sum();
        let balked: usize = records.iter().map(|record| record.balked).sum();
        let max_wait = records.iter().map(|record| record.max_wait).fold(0.0, f64::max);

        let record = ExperimentRecord {
            servers,
            replications,
            mean_wait,
            std_dev,
            max_wait,
            served,
            balked,
            loss_percentage: loss_percentage(served, balked),
            objective_met: mean_wait <= self.target_wait,
            ci_lower: interval.lower,
            ci_upper: interval.upper,
            ci_method: interval.method,
            normal,
            normality_p_value: normality.map(|test| test.p_value),
            replication_means,
        };
        debug!(
            servers,
            mean_wait,
            std_dev,
            normal,
            p_value = ?record.normality_p_value,
            "Aggregated replications"
        );
        Ok(record)
    }
}
