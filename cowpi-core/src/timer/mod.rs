//! Timers
//!
//! - [`search`]: choose a prescaler and compare value for a desired period
//! - [`periodic`]: configure hardware timers and dispatch their callback slots
//! - [`ticker`]: virtual periodic timers on platforms with an OS ticker
//! - [`overflow`]: wrap counter of the reference timer

pub mod overflow;
pub mod periodic;
pub mod search;
pub mod ticker;

pub use overflow::OverflowCounter;
pub use periodic::PeriodicTimers;
pub use search::{search, TimerChoice};
pub use ticker::{TickerError, TickerTimers, MAX_TICKERS};

use cowpi_hal::TimerVector;

/// Timer operating mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimerMode {
    /// Clear-on-compare: the counter resets at compare A
    ///
    /// Slot 0 fires at the reset, slot 1 halfway through the period.
    Ctc,
    /// Free-running: the counter wraps at its maximum value
    ///
    /// Slot 0 fires at the wrap, slots 1 and 2 split the period into thirds.
    Normal,
}

impl TimerMode {
    /// Mode needed for a period of `count` ticks
    pub fn for_count(count: u32, counter_values: u32) -> Self {
        if count == counter_values {
            TimerMode::Normal
        } else {
            TimerMode::Ctc
        }
    }

    /// Number of callback slots this mode offers
    pub const fn slots(self) -> usize {
        match self {
            TimerMode::Ctc => 2,
            TimerMode::Normal => 3,
        }
    }

    /// Interrupt vector that serves `slot`
    pub fn vector_for_slot(self, slot: usize) -> Option<TimerVector> {
        match (self, slot) {
            (TimerMode::Ctc, 0) => Some(TimerVector::CompareA),
            (TimerMode::Ctc, 1) => Some(TimerVector::CompareB),
            (TimerMode::Normal, 0) => Some(TimerVector::Overflow),
            (TimerMode::Normal, 1) => Some(TimerVector::CompareA),
            (TimerMode::Normal, 2) => Some(TimerVector::CompareB),
            _ => None,
        }
    }
}

/// Errors from timer configuration and registration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimerError {
    /// No configurable timer with that number
    InvalidTimer,
    /// Period shorter than one tick of the fastest prescaler (or 1 µs)
    PeriodTooShort,
    /// No prescaler / compare value pair fits the counter
    PeriodUnachievable,
    /// Timer has not been configured yet
    NotConfigured,
    /// Slot not offered by the timer's current mode
    SlotOutOfRange,
}

impl core::fmt::Display for TimerError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            TimerError::InvalidTimer => write!(f, "invalid timer"),
            TimerError::PeriodTooShort => write!(f, "period too short"),
            TimerError::PeriodUnachievable => write!(f, "period unachievable"),
            TimerError::NotConfigured => write!(f, "timer not configured"),
            TimerError::SlotOutOfRange => write!(f, "ISR slot out of range"),
        }
    }
}

/// Collapse a configuration result to a period, with infinity for failure
///
/// This is the float-sentinel form of the configuration API.
pub fn period_or_infinity(result: Result<f32, TimerError>) -> f32 {
    result.unwrap_or(f32::INFINITY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_slots() {
        assert_eq!(TimerMode::Ctc.slots(), 2);
        assert_eq!(TimerMode::Normal.slots(), 3);
        assert_eq!(TimerMode::Ctc.vector_for_slot(2), None);
        assert_eq!(
            TimerMode::Normal.vector_for_slot(0),
            Some(TimerVector::Overflow)
        );
    }

    #[test]
    fn test_mode_for_count() {
        assert_eq!(TimerMode::for_count(256, 256), TimerMode::Normal);
        assert_eq!(TimerMode::for_count(255, 256), TimerMode::Ctc);
    }

    #[test]
    fn test_period_or_infinity() {
        assert_eq!(period_or_infinity(Ok(250.0)), 250.0);
        assert!(period_or_infinity(Err(TimerError::InvalidTimer)).is_infinite());
    }
}
