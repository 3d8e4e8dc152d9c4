//! Simulation clock: the current (year, month) and the termination predicate.
//!
//! `SimClock` is a plain value. `SharedClock` is the copy every participant
//! reads during a run; only the coordinator advances it, and only between
//! the DoneAssigning and DonePrinting rendezvous.

use crate::{
    error::{SimError, SimResult},
    types::{Month, Year, MONTHS_PER_YEAR},
};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicI32, AtomicU32, Ordering};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SimClock {
    pub start_year: Year,
    pub end_year:   Year,
    pub year:       Year,
    pub month:      Month,
}

impl SimClock {
    pub fn new(start_year: Year, end_year: Year) -> SimResult<Self> {
        if end_year < start_year {
            return Err(SimError::InvalidYearRange { start: start_year, end: end_year });
        }
        Ok(Self { start_year, end_year, year: start_year, month: 0 })
    }

    /// The loop predicate every participant evaluates at the top of a step.
    pub fn is_running(&self) -> bool {
        self.year < self.end_year
    }

    /// Advance one month, wrapping 11 -> 0 with a year increment.
    pub fn advance(&mut self) {
        let next = self.month + 1;
        if next >= MONTHS_PER_YEAR {
            self.month = 0;
            self.year += 1;
        } else {
            self.month = next;
        }
    }

    /// Months since the start of the run. Used as the CSV x-axis.
    pub fn months_elapsed(&self) -> u64 {
        let years = (i64::from(self.year) - i64::from(self.start_year)).max(0) as u64;
        years * MONTHS_PER_YEAR as u64 + self.month as u64
    }

    /// Number of steps a fresh clock will run before `is_running` is false.
    pub fn total_steps(&self) -> u64 {
        let years = (i64::from(self.end_year) - i64::from(self.start_year)).max(0) as u64;
        years * MONTHS_PER_YEAR as u64
    }
}

/// The clock as seen by all participants of a running simulation.
///
/// Reads and writes never overlap: the coordinator writes after the
/// DoneAssigning rendezvous and every reader re-reads only after the
/// DonePrinting rendezvous.
#[derive(Debug)]
pub struct SharedClock {
    start_year: Year,
    end_year:   Year,
    year:       AtomicI32,
    month:      AtomicU32,
}

impl SharedClock {
    pub fn new(clock: SimClock) -> SimResult<Self> {
        if clock.month >= MONTHS_PER_YEAR {
            return Err(SimError::InvalidMonth(clock.month));
        }
        Ok(Self {
            start_year: clock.start_year,
            end_year:   clock.end_year,
            year:       AtomicI32::new(clock.year),
            month:      AtomicU32::new(clock.month),
        })
    }

    pub fn read(&self) -> SimClock {
        SimClock {
            start_year: self.start_year,
            end_year:   self.end_year,
            year:       self.year.load(Ordering::Acquire),
            month:      self.month.load(Ordering::Acquire),
        }
    }

    pub fn is_running(&self) -> bool {
        self.read().is_running()
    }

    /// Only the coordinator calls this.
    pub(crate) fn advance(&self) -> SimClock {
        let mut clock = self.read();
        clock.advance();
        self.month.store(clock.month, Ordering::Release);
        self.year.store(clock.year, Ordering::Release);
        clock
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_wraps_into_next_year() {
        let mut clock = SimClock::new(2023, 2025).unwrap();
        for _ in 0..11 {
            clock.advance();
        }
        assert_eq!((clock.year, clock.month), (2023, 11));
        clock.advance();
        assert_eq!((clock.year, clock.month), (2024, 0));
        assert_eq!(clock.months_elapsed(), 12);
    }

    #[test]
    fn stops_running_at_end_year() {
        let mut clock = SimClock::new(2023, 2024).unwrap();
        let mut steps = 0;
        while clock.is_running() {
            clock.advance();
            steps += 1;
        }
        assert_eq!(steps, 12);
        assert_eq!(clock.total_steps(), 12);
    }

    #[test]
    fn widest_year_span_counts_without_overflow() {
        let mut clock = SimClock::new(i32::MIN, i32::MAX).unwrap();
        assert_eq!(clock.total_steps(), u32::MAX as u64 * 12);
        assert_eq!(clock.months_elapsed(), 0);
        clock.year = i32::MAX - 1;
        clock.month = 3;
        assert_eq!(clock.months_elapsed(), (u32::MAX as u64 - 1) * 12 + 3);
        assert!(clock.is_running());
    }

    #[test]
    fn equal_years_run_zero_steps() {
        let clock = SimClock::new(2023, 2023).unwrap();
        assert!(!clock.is_running());
        assert_eq!(clock.total_steps(), 0);
    }

    #[test]
    fn rejects_reversed_year_range() {
        assert!(matches!(
            SimClock::new(2024, 2023),
            Err(SimError::InvalidYearRange { start: 2024, end: 2023 })
        ));
    }

    #[test]
    fn shared_clock_advance_is_visible_to_readers() {
        let shared = SharedClock::new(SimClock::new(2023, 2024).unwrap()).unwrap();
        let after = shared.advance();
        assert_eq!(shared.read(), after);
        assert_eq!(after.month, 1);
    }
}
