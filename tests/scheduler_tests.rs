//! Tests for the shift scheduler
//!
//! Covers the hand-checkable single-server scenario, the drain policy, the
//! monotonic clock and occupancy conservation on recorded event traces.

use service_counter_simulator::counter::{BalkingPolicy, ServerPool, ShiftCalendar, ShiftContext};
use service_counter_simulator::random::{LcgGenerator, SequenceCursor, UniformSequence};
use service_counter_simulator::simulation::{SchedulerEvent, ShiftOutcome, ShiftScheduler};
use service_counter_simulator::types::{EventKind, RoundingRule, ServerId, ShiftKind};

const SCENARIO: [f64; 6] = [0.0, 0.0, 0.9, 0.0, 0.0, 0.0];

fn shift(calendar: &ShiftCalendar, kind: ShiftKind) -> ShiftContext {
    calendar.shifts().find(|shift| shift.kind == kind).unwrap()
}

fn run(
    values: Vec<f64>,
    servers: usize,
    kind: ShiftKind,
    rounding: RoundingRule,
) -> (ShiftOutcome, Vec<SchedulerEvent>, SequenceCursor) {
    let calendar = ShiftCalendar::new(1, rounding);
    let balking = BalkingPolicy::default();
    let mut scheduler = ShiftScheduler::new(&calendar, &balking).with_trace();
    let mut pool = ServerPool::new(servers);
    let mut stream = SequenceCursor::new(UniformSequence::new(values).unwrap());

    let outcome = scheduler.run_shift(&shift(&calendar, kind), &mut pool, &mut stream).unwrap();
    assert!(!pool.any_occupied(), "pool must be empty after the drain");
    (outcome, scheduler.take_trace(), stream)
}

fn lcg(len: usize) -> Vec<f64> {
    LcgGenerator::default().take(len).collect()
}

#[test]
fn test_single_server_scenario() {
    let (outcome, trace, stream) =
        run(SCENARIO.to_vec(), 1, ShiftKind::Morning, RoundingRule::NearestEven);

    // Draw 1 schedules the first arrival at t=1, draw 2 the next one at t=2,
    // draw 3 is the first service time: 3 + 17 * 0.9 = 18.3 -> 18, leaving at t=19
    let first = trace[0];
    assert_eq!(first.kind, EventKind::Arrival);
    assert_eq!(first.time, 1.0);
    assert!(!first.balked);
    assert_eq!(first.server, ServerId(0));

    // Second customer faces 17 minutes and draws 0.0 <= 0.20
    assert_eq!(trace[1].time, 2.0);
    assert!(trace[1].balked);

    let first_departure = trace.iter().find(|e| e.kind == EventKind::Departure).unwrap();
    assert_eq!(first_departure.time, 19.0);

    assert_eq!(outcome.served, 45);
    assert_eq!(outcome.balked, 26);
    assert_eq!(outcome.total_wait, 100.0);
    assert_eq!(outcome.max_estimated_wait, 23.5);
    assert_eq!(outcome.end_time, 278.0);
    assert_eq!(outcome.events, 116);
    assert_eq!(stream.draws(), 145);
}

#[test]
fn test_single_server_scenario_truncated() {
    let (outcome, _, stream) =
        run(SCENARIO.to_vec(), 1, ShiftKind::Morning, RoundingRule::Truncate);

    assert_eq!(outcome.served, 47);
    assert_eq!(outcome.balked, 26);
    assert_eq!(outcome.total_wait, 102.0);
    assert_eq!(outcome.end_time, 274.0);
    assert_eq!(stream.draws(), 149);
}

#[test]
fn test_afternoon_shift_without_balking() {
    let (outcome, trace, stream) =
        run(vec![0.5, 0.25, 0.75], 1, ShiftKind::Afternoon, RoundingRule::NearestEven);

    // 4 + 16 * 0.5 = 12, then 4 + 16 * 0.25 = 8
    assert_eq!(trace[0].time, 12.0);
    assert_eq!(trace[1].time, 20.0);
    assert_eq!(trace[2].kind, EventKind::Departure);
    assert_eq!(trace[2].time, 28.0);

    assert_eq!(outcome.served, 20);
    assert_eq!(outcome.balked, 0);
    assert_eq!(outcome.total_wait, 74.0);
    assert_eq!(outcome.max_estimated_wait, 8.0);
    assert_eq!(outcome.end_time, 251.0);
    assert_eq!(stream.draws(), 41);
}

#[test]
fn test_clock_is_monotonic() {
    for servers in 1..=3 {
        for kind in ShiftKind::DAILY_ORDER {
            let (_, trace, _) = run(lcg(5000), servers, kind, RoundingRule::NearestEven);
            assert!(trace.windows(2).all(|pair| pair[0].time <= pair[1].time));
        }
    }
}

#[test]
fn test_occupancy_is_conserved() {
    let (outcome, trace, _) = run(lcg(5000), 2, ShiftKind::Morning, RoundingRule::NearestEven);

    let mut in_system = 0i64;
    for event in &trace {
        match (event.kind, event.balked) {
            (EventKind::Arrival, false) => in_system += 1,
            (EventKind::Arrival, true) => {}
            (EventKind::Departure, _) => in_system -= 1,
        }
        assert!(in_system >= 0);
        assert_eq!(in_system as usize, event.in_system);
    }
    assert_eq!(in_system, 0);

    let accepted = trace.iter().filter(|e| e.kind == EventKind::Arrival && !e.balked).count();
    let balked = trace.iter().filter(|e| e.balked).count();
    assert_eq!(accepted, outcome.served);
    assert_eq!(balked, outcome.balked);
    assert_eq!(trace.len(), outcome.events);
}

#[test]
fn test_drain_processes_only_departures_after_close() {
    let calendar = ShiftCalendar::new(1, RoundingRule::NearestEven);
    let morning = shift(&calendar, ShiftKind::Morning);

    for seed in [1, 7, 12345, 99_999] {
        let values: Vec<f64> = LcgGenerator::new(seed).take(3000).collect();
        let (outcome, trace, _) = run(values, 1, ShiftKind::Morning, RoundingRule::NearestEven);

        // At most one arrival lands past the nominal end; it was scheduled before the close
        let late_arrivals = trace
            .iter()
            .filter(|e| e.kind == EventKind::Arrival && e.time > morning.shift_end)
            .count();
        assert!(late_arrivals <= 1);

        let last = trace.last().unwrap();
        assert_eq!(last.in_system, 0);
        assert!(outcome.end_time > morning.shift_end);
    }
}

#[test]
fn test_two_servers_share_load_and_start_with_lowest_index() {
    let (outcome, trace, _) = run(lcg(5000), 2, ShiftKind::Morning, RoundingRule::NearestEven);
    assert_eq!(trace[0].server, ServerId(0));
    assert!(trace.iter().any(|e| e.kind == EventKind::Departure && e.server == ServerId(1)));
    assert!(outcome.served > 0);
}
