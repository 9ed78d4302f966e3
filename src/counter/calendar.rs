//! Shift calendar and inverse-transform variates
//!
//! A business day is a Morning shift followed by an Afternoon shift. Each shift
//! runs its own clock from 0 to its duration and has its own inter-arrival law;
//! the service-time law is shared.

use crate::random::UniformStream;
use crate::types::{RoundingRule, ShiftKind};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// Mean service time in minutes (midpoint of [3, 20])
pub const MEAN_SERVICE_MINUTES: f64 = 11.5;

/// Discrete uniform law sampled by inverse transform: `min + span·r`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UniformLaw {
    /// Smallest value
    pub min: f64,
    /// Width of the interval
    pub span: f64,
}

impl UniformLaw {
    /// Service time, [3, 20] minutes
    pub const SERVICE: UniformLaw = UniformLaw { min: 3.0, span: 17.0 };
    /// Morning inter-arrival, [1, 14] minutes
    pub const MORNING_ARRIVALS: UniformLaw = UniformLaw { min: 1.0, span: 13.0 };
    /// Afternoon inter-arrival, [4, 20] minutes
    pub const AFTERNOON_ARRIVALS: UniformLaw = UniformLaw { min: 4.0, span: 16.0 };

    /// Whole minutes for draw `r` in [0, 1)
    pub fn sample(&self, r: f64, rounding: RoundingRule) -> u32 {
        rounding.apply(self.min + self.span * r)
    }

    /// Values reachable for draws in [0, 1) under `rounding`
    pub fn support(&self, rounding: RoundingRule) -> RangeInclusive<u32> {
        let low = self.min as u32;
        let high = match rounding {
            RoundingRule::NearestEven => (self.min + self.span) as u32,
            RoundingRule::Truncate => ((self.min + self.span) as u32).saturating_sub(1),
        };
        low..=high
    }
}

/// Fixed parameters of one shift kind
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShiftProfile {
    /// Which shift this is
    pub kind: ShiftKind,
    /// Nominal length in minutes
    pub duration: f64,
    /// Law of the minutes between consecutive arrivals
    pub inter_arrival: UniformLaw,
}

impl ShiftProfile {
    /// 8:00 to 12:30
    pub const MORNING: ShiftProfile = ShiftProfile {
        kind: ShiftKind::Morning,
        duration: 270.0,
        inter_arrival: UniformLaw::MORNING_ARRIVALS,
    };

    /// 16:30 to 20:30
    pub const AFTERNOON: ShiftProfile = ShiftProfile {
        kind: ShiftKind::Afternoon,
        duration: 240.0,
        inter_arrival: UniformLaw::AFTERNOON_ARRIVALS,
    };

    /// Profile for a shift kind
    pub fn for_kind(kind: ShiftKind) -> ShiftProfile {
        match kind {
            ShiftKind::Morning => Self::MORNING,
            ShiftKind::Afternoon => Self::AFTERNOON,
        }
    }
}

/// Parameters of the shift currently being simulated
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShiftContext {
    /// Business day, 0-based
    pub day: usize,
    /// Shift kind
    pub kind: ShiftKind,
    /// Nominal end of the shift on the shift clock
    pub shift_end: f64,
    /// Minutes of the day already spent in earlier shifts
    pub elapsed_in_day: f64,
    /// Inter-arrival law for this shift
    pub inter_arrival: UniformLaw,
}

/// Alternating Morning/Afternoon calendar over a number of business days
#[derive(Debug, Clone, PartialEq)]
pub struct ShiftCalendar {
    business_days: usize,
    rounding: RoundingRule,
}

impl ShiftCalendar {
    /// Create a calendar
    pub fn new(business_days: usize, rounding: RoundingRule) -> Self {
        Self { business_days, rounding }
    }

    /// Number of business days
    pub fn business_days(&self) -> usize {
        self.business_days
    }

    /// Rounding rule applied to every variate
    pub fn rounding(&self) -> RoundingRule {
        self.rounding
    }

    /// Total shifts across all days
    pub fn shift_count(&self) -> usize {
        self.business_days * ShiftKind::DAILY_ORDER.len()
    }

    /// Minutes simulated per business day
    pub fn day_length(&self) -> f64 {
        ShiftKind::DAILY_ORDER.iter().map(|kind| ShiftProfile::for_kind(*kind).duration).sum()
    }

    /// Every shift in simulation order
    pub fn shifts(&self) -> impl Iterator<Item = ShiftContext> + '_ {
        (0..self.business_days).flat_map(|day| {
            let mut elapsed_in_day = 0.0;
            ShiftKind::DAILY_ORDER.into_iter().map(move |kind| {
                let profile = ShiftProfile::for_kind(kind);
                let context = ShiftContext {
                    day,
                    kind: profile.kind,
                    shift_end: profile.duration,
                    elapsed_in_day,
                    inter_arrival: profile.inter_arrival,
                };
                elapsed_in_day += profile.duration;
                context
            })
        })
    }

    /// Which day and shift contain `elapsed` minutes of calendar time
    ///
    /// Returns `None` past the last business day.
    pub fn shift_at(&self, elapsed: f64) -> Option<(usize, ShiftKind)> {
        if elapsed < 0.0 {
            return None;
        }
        let day_length = self.day_length();
        let day = (elapsed / day_length) as usize;
        if day >= self.business_days {
            return None;
        }
        let within_day = elapsed - day as f64 * day_length;
        if within_day < ShiftProfile::MORNING.duration {
            Some((day, ShiftKind::Morning))
        } else {
            Some((day, ShiftKind::Afternoon))
        }
    }

    /// Draw the minutes until the next arrival in `shift`
    pub fn draw_inter_arrival<S: UniformStream + ?Sized>(
        &self,
        shift: &ShiftContext,
        stream: &mut S,
    ) -> u32 {
        shift.inter_arrival.sample(stream.next_uniform(), self.rounding)
    }

    /// Draw a service time
    pub fn draw_service_time<S: UniformStream + ?Sized>(&self, stream: &mut S) -> u32 {
        UniformLaw::SERVICE.sample(stream.next_uniform(), self.rounding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shift_profiles() {
        assert_eq!(ShiftProfile::MORNING.duration, 270.0);
        assert_eq!(ShiftProfile::AFTERNOON.duration, 240.0);
        assert_eq!(ShiftProfile::for_kind(ShiftKind::Afternoon).inter_arrival.min, 4.0);
    }

    #[test]
    fn test_calendar_alternates_shifts() {
        let calendar = ShiftCalendar::new(3, RoundingRule::NearestEven);
        let shifts: Vec<_> = calendar.shifts().collect();

        assert_eq!(shifts.len(), 6);
        assert_eq!(calendar.shift_count(), 6);
        for (i, shift) in shifts.iter().enumerate() {
            assert_eq!(shift.day, i / 2);
            let expected = if i % 2 == 0 { ShiftKind::Morning } else { ShiftKind::Afternoon };
            assert_eq!(shift.kind, expected);
        }
        assert_eq!(shifts[1].elapsed_in_day, 270.0);
        assert_eq!(shifts[1].shift_end, 240.0);
    }

    #[test]
    fn test_shift_at_maps_elapsed_time() {
        let calendar = ShiftCalendar::new(2, RoundingRule::NearestEven);
        assert_eq!(calendar.day_length(), 510.0);
        assert_eq!(calendar.shift_at(0.0), Some((0, ShiftKind::Morning)));
        assert_eq!(calendar.shift_at(269.9), Some((0, ShiftKind::Morning)));
        assert_eq!(calendar.shift_at(270.0), Some((0, ShiftKind::Afternoon)));
        assert_eq!(calendar.shift_at(510.0), Some((1, ShiftKind::Morning)));
        assert_eq!(calendar.shift_at(1020.0), None);
        assert_eq!(calendar.shift_at(-1.0), None);
    }

    #[test]
    fn test_sample_extremes() {
        let rounding = RoundingRule::NearestEven;
        let almost_one = 1.0 - f64::EPSILON;
        assert_eq!(UniformLaw::MORNING_ARRIVALS.sample(0.0, rounding), 1);
        assert_eq!(UniformLaw::MORNING_ARRIVALS.sample(almost_one, rounding), 14);
        assert_eq!(UniformLaw::AFTERNOON_ARRIVALS.sample(almost_one, rounding), 20);
        assert_eq!(UniformLaw::SERVICE.sample(0.9, rounding), 18);
        assert_eq!(UniformLaw::SERVICE.sample(almost_one, RoundingRule::Truncate), 19);
    }

    #[test]
    fn test_support_bounds() {
        assert_eq!(UniformLaw::SERVICE.support(RoundingRule::NearestEven), 3..=20);
        assert_eq!(UniformLaw::SERVICE.support(RoundingRule::Truncate), 3..=19);
        assert_eq!(UniformLaw::MORNING_ARRIVALS.support(RoundingRule::NearestEven), 1..=14);
    }

    #[test]
    fn test_support_of_sub_minute_law() {
        let law = UniformLaw { min: 0.0, span: 0.5 };
        assert_eq!(law.support(RoundingRule::Truncate), 0..=0);
        assert_eq!(law.support(RoundingRule::NearestEven), 0..=0);
        assert_eq!(law.sample(0.99, RoundingRule::Truncate), 0);
    }
}
