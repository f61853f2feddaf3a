//! Timer period search
//!
//! For each legal prescaler the exact tick count for the desired period is
//! rarely an integer, and truncation means neither the floor nor the ceiling
//! is always the better choice, so both are evaluated. The candidate with the
//! smallest period error wins.
//!
//! Errors that are equal up to a small relative tolerance count as a tie.
//! A tie goes to the mode with fewer callback slots (CTC over Normal); a tie
//! within the same mode keeps the earlier candidate, i.e. the smaller
//! prescaler, ceiling before floor.

use cowpi_hal::TimerSetup;
use libm::{ceilf, fabsf, floorf};

use super::{TimerError, TimerMode};
use crate::config::{SystemClock, TimerSpec};

/// Shortest period the search accepts, in microseconds
pub const MIN_PERIOD_US: f32 = 1.0;

/// Relative tolerance under which two period errors are considered equal
pub const TIE_TOLERANCE: f32 = 1e-6;

/// Outcome of the period search
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimerChoice {
    /// Index into the timer's prescaler table
    pub prescaler_index: usize,
    /// Chosen clock divisor
    pub prescaler: u16,
    /// Counter ticks per period
    pub count: u32,
    /// Mode implied by the tick count
    pub mode: TimerMode,
    /// Period the hardware will actually produce
    pub period_us: f32,
    /// Distance from the requested period
    pub error_us: f32,
}

impl TimerChoice {
    /// Compare register values (A, B)
    ///
    /// In CTC mode A is the counter top and B sits halfway. In Normal mode
    /// A and B split the period into thirds.
    pub fn compare_values(&self) -> (u16, u16) {
        let top = self.count.saturating_sub(1);
        let compare_a = match self.mode {
            TimerMode::Ctc => top,
            TimerMode::Normal => 2 * top / 3,
        };
        (compare_a as u16, (compare_a / 2) as u16)
    }

    /// Register values realizing this choice on `spec`
    pub fn setup(&self, spec: &TimerSpec) -> TimerSetup {
        let (compare_a, compare_b) = self.compare_values();
        TimerSetup {
            control: spec.control_bits(self.mode, self.prescaler_index),
            compare_a,
            compare_b,
        }
    }

    fn beats(&self, incumbent: &TimerChoice, tolerance: f32) -> bool {
        if fabsf(self.error_us - incumbent.error_us) <= tolerance {
            self.mode.slots() < incumbent.mode.slots()
        } else {
            self.error_us < incumbent.error_us
        }
    }
}

/// Find the configuration of `spec` whose period is closest to `desired_us`
pub fn search(
    spec: &TimerSpec,
    clock: SystemClock,
    desired_us: f32,
) -> Result<TimerChoice, TimerError> {
    if desired_us.is_nan() || desired_us.is_infinite() {
        return Err(TimerError::PeriodUnachievable);
    }
    let fastest = spec
        .fastest_prescaler()
        .ok_or(TimerError::PeriodUnachievable)?;
    if desired_us < MIN_PERIOD_US || desired_us < f32::from(fastest) / clock.cycles_per_us {
        return Err(TimerError::PeriodTooShort);
    }

    let tolerance = TIE_TOLERANCE * desired_us.max(1.0);
    let max_count = spec.counter_values as f32;
    let mut best: Option<TimerChoice> = None;

    for (prescaler_index, &prescaler) in spec.prescalers.iter().enumerate() {
        if prescaler == 0 {
            continue;
        }
        let exact = desired_us * clock.cycles_per_us / f32::from(prescaler);

        for count in [ceilf(exact), floorf(exact)] {
            if count < 1.0 || count > max_count {
                continue;
            }
            let count = count as u32;
            let period_us = count as f32 * f32::from(prescaler) / clock.cycles_per_us;
            let candidate = TimerChoice {
                prescaler_index,
                prescaler,
                count,
                mode: TimerMode::for_count(count, spec.counter_values),
                period_us,
                error_us: fabsf(period_us - desired_us),
            };
            if best.map_or(true, |incumbent| candidate.beats(&incumbent, tolerance)) {
                best = Some(candidate);
            }
        }
    }

    best.ok_or(TimerError::PeriodUnachievable)
}
