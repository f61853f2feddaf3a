//! Virtual periodic timers
//!
//! Boards whose platform provides a periodic ticker (RP2040 under mbed) get
//! a fixed table of tickers instead of prescaled hardware timers. Each entry
//! remembers its period and callback so it can be restarted.

use cowpi_hal::{Isr, TickerHardware};

/// Number of virtual timers
pub const MAX_TICKERS: usize = 8;

/// Periods at or below this are refused, in microseconds
pub const MIN_TICKER_PERIOD_US: u32 = 2;

/// Errors from ticker registration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TickerError {
    /// Ticker number outside the table
    InvalidTimer,
    /// Period too short for the platform ticker to keep up
    PeriodTooShort,
}

impl core::fmt::Display for TickerError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            TickerError::InvalidTimer => write!(f, "invalid ticker"),
            TickerError::PeriodTooShort => write!(f, "ticker period too short"),
        }
    }
}

#[derive(Clone, Copy)]
struct TickerEntry {
    period_us: u32,
    isr: Isr,
}

/// Table of platform tickers
pub struct TickerTimers<H> {
    hw: H,
    entries: [Option<TickerEntry>; MAX_TICKERS],
}

impl<H: TickerHardware> TickerTimers<H> {
    /// Take the platform ticker; every slot starts unused
    pub fn new(hw: H) -> Self {
        Self {
            hw,
            entries: [None; MAX_TICKERS],
        }
    }

    /// Call `isr` every `period_us` microseconds on ticker `timer`
    ///
    /// Any callback previously registered on the ticker is replaced.
    pub fn register(&mut self, timer: usize, period_us: u32, isr: Isr) -> Result<(), TickerError> {
        let entry = self.entries.get_mut(timer).ok_or(TickerError::InvalidTimer)?;
        if period_us <= MIN_TICKER_PERIOD_US {
            return Err(TickerError::PeriodTooShort);
        }

        *entry = Some(TickerEntry { period_us, isr });
        self.hw.attach(timer, period_us, isr);

        #[cfg(feature = "defmt")]
        defmt::debug!("ticker {}: every {} us", timer, period_us);

        Ok(())
    }

    /// Restart ticker `timer` so its next call is one full period away
    ///
    /// Unknown or unused tickers are left alone.
    pub fn reset(&mut self, timer: usize) {
        let Some(Some(entry)) = self.entries.get(timer).copied() else {
            return;
        };
        self.hw.detach(timer);
        self.hw.attach(timer, entry.period_us, entry.isr);
    }

    /// Period of ticker `timer`, if it is in use
    pub fn period(&self, timer: usize) -> Option<u32> {
        self.entries
            .get(timer)
            .copied()
            .flatten()
            .map(|entry| entry.period_us)
    }

    /// Borrow the underlying hardware
    pub fn hardware(&self) -> &H {
        &self.hw
    }
}
