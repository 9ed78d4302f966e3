//! Event scheduler for a single shift
//!
//! The scheduler is a two-event state machine. At every step it compares the
//! next arrival with the earliest pending departure (ties go to the arrival),
//! advances the clock to the winner and applies it. Arrivals stop being
//! scheduled once the nominal shift end has passed, but departures keep being
//! processed until every line is empty.
//!
//! Draws are taken from the stream in a fixed order: the next inter-arrival
//! time, then (only for long estimated waits) the balking draw, then (only
//! when the customer found the server idle) the service time. A departure
//! with customers still in line draws one service time.

use crate::counter::{
    estimated_wait, BalkDecision, BalkingPolicy, ServerPool, ShiftCalendar, ShiftContext,
};
use crate::random::UniformStream;
use crate::simulation::{SimulationError, SimulationResult};
use crate::types::{EventKind, ServerId, ShiftKind};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Default cap on events processed in one shift before the drain is declared stuck
pub const DEFAULT_MAX_EVENTS_PER_SHIFT: usize = 1_000_000;

/// One processed event, recorded when tracing is enabled
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SchedulerEvent {
    /// Clock value after the event
    pub time: f64,
    /// Arrival or departure
    pub kind: EventKind,
    /// Server the customer was assigned to, or the server that finished
    pub server: ServerId,
    /// Whether an arriving customer balked
    pub balked: bool,
    /// Customers in the system after the event
    pub in_system: usize,
}

/// What happened during one shift
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShiftOutcome {
    /// Business day, 0-based
    pub day: usize,
    /// Shift kind
    pub kind: ShiftKind,
    /// Customers whose service completed
    pub served: usize,
    /// Customers who left without joining a line
    pub balked: usize,
    /// Sum over served customers of (service start - arrival)
    pub total_wait: f64,
    /// Largest estimated wait accepted by a customer
    pub max_estimated_wait: f64,
    /// Clock value when the last customer left
    pub end_time: f64,
    /// Events processed
    pub events: usize,
}

impl ShiftOutcome {
    /// Mean time in line per served customer, `None` when nobody was served
    pub fn mean_wait(&self) -> Option<f64> {
        if self.served == 0 {
            None
        } else {
            Some(self.total_wait / self.served as f64)
        }
    }
}

enum NextEvent {
    Arrival(f64),
    Departure(ServerId, f64),
}

/// Runs shifts against a server pool and a random stream
#[derive(Debug)]
pub struct ShiftScheduler<'a> {
    calendar: &'a ShiftCalendar,
    balking: &'a BalkingPolicy,
    max_events: usize,
    trace: Option<Vec<SchedulerEvent>>,
}

impl<'a> ShiftScheduler<'a> {
    /// Create a scheduler
    pub fn new(calendar: &'a ShiftCalendar, balking: &'a BalkingPolicy) -> Self {
        Self { calendar, balking, max_events: DEFAULT_MAX_EVENTS_PER_SHIFT, trace: None }
    }

    /// Cap the number of events per shift
    pub fn with_max_events(mut self, max_events: usize) -> Self {
        self.max_events = max_events;
        self
    }

    /// Record every processed event
    pub fn with_trace(mut self) -> Self {
        self.trace = Some(Vec::new());
        self
    }

    /// Events recorded so far (empty unless tracing is enabled)
    pub fn trace(&self) -> &[SchedulerEvent] {
        self.trace.as_deref().unwrap_or(&[])
    }

    /// Take the recorded events, leaving tracing enabled
    pub fn take_trace(&mut self) -> Vec<SchedulerEvent> {
        self.trace.as_mut().map(std::mem::take).unwrap_or_default()
    }

    /// Simulate one shift
    ///
    /// The pool must be empty on entry and is empty again on success. The
    /// shift clock starts at 0 and the first arrival is one inter-arrival
    /// draw away.
    pub fn run_shift<S: UniformStream + ?Sized>(
        &mut self,
        shift: &ShiftContext,
        pool: &mut ServerPool,
        stream: &mut S,
    ) -> SimulationResult<ShiftOutcome> {
        if pool.is_empty() {
            return Err(SimulationError::configuration_error("server pool has no servers"));
        }
        if pool.any_occupied() {
            return Err(SimulationError::configuration_error(
                "server pool must be empty at the start of a shift",
            ));
        }

        let shift_end = shift.shift_end;
        let mut clock = 0.0_f64;
        let mut next_arrival = Some(f64::from(self.calendar.draw_inter_arrival(shift, stream)));
        let mut draining = true;
        let mut in_system = 0usize;

        let mut outcome = ShiftOutcome {
            day: shift.day,
            kind: shift.kind,
            served: 0,
            balked: 0,
            total_wait: 0.0,
            max_estimated_wait: 0.0,
            end_time: 0.0,
            events: 0,
        };

        while clock <= shift_end || draining {
            if outcome.events >= self.max_events {
                return Err(SimulationError::DrainDidNotTerminate {
                    events: outcome.events,
                    occupied: pool.in_system(),
                });
            }
            outcome.events += 1;

            let next = match (next_arrival, pool.earliest_departure()) {
                (Some(arrival), Some((_, leaves))) if arrival <= leaves => {
                    NextEvent::Arrival(arrival)
                }
                (Some(arrival), None) => NextEvent::Arrival(arrival),
                (_, Some((server, leaves))) => NextEvent::Departure(server, leaves),
                (None, None) => {
                    return Err(SimulationError::SchedulerStalled {
                        time: clock,
                        shift: shift.kind.to_string(),
                    });
                }
            };

            let event = match next {
                NextEvent::Arrival(arrival) => {
                    clock = arrival;
                    next_arrival = if clock <= shift_end {
                        Some(clock + f64::from(self.calendar.draw_inter_arrival(shift, stream)))
                    } else {
                        None
                    };
                    self.arrive(clock, pool, stream, &mut outcome, &mut in_system)
                }
                NextEvent::Departure(server, leaves) => {
                    clock = leaves;
                    self.depart(server, clock, pool, stream, &mut outcome, &mut in_system)
                }
            };

            debug_assert_eq!(
                pool.in_system(),
                in_system,
                "occupancy must match customers in system"
            );
            trace!(time = clock, kind = %event.kind, server = %event.server, in_system, "Event");
            if let Some(trace) = self.trace.as_mut() {
                trace.push(event);
            }

            if clock > shift_end {
                if pool.any_occupied() {
                    next_arrival = None;
                    draining = true;
                } else {
                    draining = false;
                }
            }
        }

        outcome.end_time = clock;
        debug!(
            day = shift.day,
            shift = %shift.kind,
            served = outcome.served,
            balked = outcome.balked,
            events = outcome.events,
            end_time = clock,
            "Shift complete"
        );
        Ok(outcome)
    }

    fn arrive<S: UniformStream + ?Sized>(
        &self,
        clock: f64,
        pool: &mut ServerPool,
        stream: &mut S,
        outcome: &mut ShiftOutcome,
        in_system: &mut usize,
    ) -> SchedulerEvent {
        let server = pool.shortest_queue();
        let line = pool.server(server);
        let wait = estimated_wait(line.occupancy(), line.next_departure(), clock);

        let balked = match self.balking.decide(wait, stream) {
            BalkDecision::Balk => {
                outcome.balked += 1;
                true
            }
            BalkDecision::Stay => {
                *in_system += 1;
                outcome.max_estimated_wait = outcome.max_estimated_wait.max(wait);
                if pool.admit(server, clock) {
                    let service = self.calendar.draw_service_time(stream);
                    pool.start_service(server, clock, service);
                }
                false
            }
        };

        SchedulerEvent {
            time: clock,
            kind: EventKind::Arrival,
            server,
            balked,
            in_system: *in_system,
        }
    }

    fn depart<S: UniformStream + ?Sized>(
        &self,
        server: ServerId,
        clock: f64,
        pool: &mut ServerPool,
        stream: &mut S,
        outcome: &mut ShiftOutcome,
        in_system: &mut usize,
    ) -> SchedulerEvent {
        let completion = pool.complete_service(server);
        outcome.served += 1;
        *in_system -= 1;

        if completion.remaining > 0 {
            let service = self.calendar.draw_service_time(stream);
            outcome.total_wait += pool.start_service(server, clock, service);
        }

        SchedulerEvent {
            time: clock,
            kind: EventKind::Departure,
            server,
            balked: false,
            in_system: *in_system,
        }
    }
}
