//! Replication runner
//!
//! One replication simulates every business day of the calendar for a fixed
//! staffing level. Each replication reads the shared sequence from its own
//! offset, `(index · stride) mod len`, and starts from an empty server pool.

use crate::counter::{BalkingPolicy, ServerPool, ShiftCalendar};
use crate::random::{SequenceCursor, UniformSequence, UniformStream};
use crate::simulation::{
    ShiftScheduler, SimulationError, SimulationResult, DEFAULT_MAX_EVENTS_PER_SHIFT,
};
use crate::{perf_span, sim_event};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

/// Distance between the starting offsets of consecutive replications
pub const DEFAULT_REPLICATION_STRIDE: usize = 2000;

/// Replications between two progress log lines
pub const PROGRESS_INTERVAL: usize = 10;

/// Outcome of one full replication (all days, both shifts)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplicationRecord {
    /// Replication index, 0-based
    pub replication: usize,
    /// Staffing level
    pub servers: usize,
    /// Sequence position the replication started from
    pub offset: usize,
    /// Sum of per-shift mean waits divided by the number of shifts
    pub mean_wait: f64,
    /// Customers served over all shifts
    pub served: usize,
    /// Customers who balked over all shifts
    pub balked: usize,
    /// Largest estimated wait accepted by any customer
    pub max_wait: f64,
    /// Shifts simulated
    pub shifts: usize,
    /// Shifts in which nobody was served
    pub idle_shifts: usize,
    /// Customers served by each server
    pub served_per_server: Vec<usize>,
    /// Values drawn from the sequence
    pub draws: u64,
    /// Times the cursor wrapped past the end of the sequence
    pub wraps: u64,
}

/// Runs replications for one or more staffing levels over a shared sequence
#[derive(Debug, Clone)]
pub struct ReplicationRunner {
    sequence: UniformSequence,
    calendar: ShiftCalendar,
    balking: BalkingPolicy,
    stride: usize,
    max_events: usize,
}

impl ReplicationRunner {
    /// Create a runner with the default balking table, stride and event budget
    pub fn new(sequence: UniformSequence, calendar: ShiftCalendar) -> Self {
        Self {
            sequence,
            calendar,
            balking: BalkingPolicy::default(),
            stride: DEFAULT_REPLICATION_STRIDE,
            max_events: DEFAULT_MAX_EVENTS_PER_SHIFT,
        }
    }

    /// Replace the balking table
    pub fn with_balking(mut self, balking: BalkingPolicy) -> Self {
        self.balking = balking;
        self
    }

    /// Set the offset stride between replications
    pub fn with_stride(mut self, stride: usize) -> Self {
        self.stride = stride;
        self
    }

    /// Set the per-shift event budget
    pub fn with_max_events(mut self, max_events: usize) -> Self {
        self.max_events = max_events;
        self
    }

    /// Calendar used for every replication
    pub fn calendar(&self) -> &ShiftCalendar {
        &self.calendar
    }

    /// Shared random sequence
    pub fn sequence(&self) -> &UniformSequence {
        &self.sequence
    }

    /// Starting sequence position of replication `index`
    pub fn offset_for(&self, index: usize) -> usize {
        let len = self.sequence.len() as u128;
        ((index as u128 * self.stride as u128) % len) as usize
    }

    /// Run replications `0..replications` for `servers` servers
    #[instrument(skip(self), fields(days = self.calendar.business_days()))]
    pub fn run(
        &self,
        servers: usize,
        replications: usize,
    ) -> SimulationResult<Vec<ReplicationRecord>> {
        let mut records = Vec::with_capacity(replications);
        for index in 0..replications {
            records.push(self.run_replication(servers, index)?);
            let completed = index + 1;
            if completed % PROGRESS_INTERVAL == 0 || completed == replications {
                sim_event!(
                    info,
                    "Replication progress",
                    servers = servers,
                    completed = completed,
                    total = replications
                );
            }
        }

        let wrapped = records.iter().filter(|record| record.wraps > 0).count();
        if wrapped > 0 {
            warn!(
                servers,
                wrapped,
                sequence_len = self.sequence.len(),
                "Random sequence wrapped during replications; draws are reused"
            );
        }
        Ok(records)
    }

    /// Run a single replication
    pub fn run_replication(
        &self,
        servers: usize,
        index: usize,
    ) -> SimulationResult<ReplicationRecord> {
        if servers == 0 {
            return Err(SimulationError::configuration_error(
                "staffing level must be at least 1 server",
            ));
        }
        let shifts = self.calendar.shift_count();
        if shifts == 0 {
            return Err(SimulationError::configuration_error("calendar has no business days"));
        }

        let _span = perf_span!("replication", servers = servers, index = index).entered();

        let offset = self.offset_for(index);
        let mut stream = SequenceCursor::with_offset(self.sequence.clone(), offset);
        let mut pool = ServerPool::new(servers);
        let mut scheduler =
            ShiftScheduler::new(&self.calendar, &self.balking).with_max_events(self.max_events);

        let mut shift_mean_total = 0.0;
        let mut served = 0;
        let mut balked = 0;
        let mut max_wait = 0.0_f64;
        let mut idle_shifts = 0;

        for shift in self.calendar.shifts() {
            let outcome = scheduler.run_shift(&shift, &mut pool, &mut stream)?;
            match outcome.mean_wait() {
                Some(mean) => shift_mean_total += mean,
                None => idle_shifts += 1,
            }
            served += outcome.served;
            balked += outcome.balked;
            max_wait = max_wait.max(outcome.max_estimated_wait);
        }

        let record = ReplicationRecord {
            replication: index,
            servers,
            offset,
            mean_wait: shift_mean_total / shifts as f64,
            served,
            balked,
            max_wait,
            shifts,
            idle_shifts,
            served_per_server: pool.served_per_server(),
            draws: stream.draws(),
            wraps: stream.wraps(),
        };
        debug!(
            servers,
            index,
            offset,
            mean_wait = record.mean_wait,
            served,
            balked,
            draws = record.draws,
            "Replication complete"
        );
        Ok(record)
    }
}
