//! Timer hardware abstractions
//!
//! Three flavors of periodic hardware are covered:
//!
//! - [`TimerHardware`]: a counter with a prescaler, two compare registers and
//!   overflow / compare-match interrupts (AVR style)
//! - [`TickerHardware`]: an OS-provided periodic ticker that calls a function
//!   (mbed style)
//! - [`TickSource`]: the free-running reference timer whose wraps are counted

use crate::Isr;

/// Interrupt source of a hardware timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimerVector {
    /// Counter wrapped past its maximum value
    Overflow,
    /// Counter matched compare register A
    CompareA,
    /// Counter matched compare register B
    CompareB,
}

impl TimerVector {
    /// All vectors in interrupt-mask bit order
    pub const ALL: [TimerVector; 3] = [
        TimerVector::Overflow,
        TimerVector::CompareA,
        TimerVector::CompareB,
    ];

    /// Bit position of this vector's enable flag in the interrupt mask register
    pub const fn index(self) -> usize {
        match self {
            TimerVector::Overflow => 0,
            TimerVector::CompareA => 1,
            TimerVector::CompareB => 2,
        }
    }

    /// Enable flag for this vector in the interrupt mask register
    pub const fn enable_bit(self) -> u8 {
        1 << self.index()
    }
}

/// Register values produced by timer configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimerSetup {
    /// Control registers A and B (waveform mode and clock select bits)
    pub control: [u8; 2],
    /// Compare register A
    pub compare_a: u16,
    /// Compare register B
    pub compare_b: u16,
}

/// Prescaled hardware timer with overflow and two compare interrupts
pub trait TimerHardware {
    /// Load a new configuration
    ///
    /// Implementations write the control and compare registers, zero the
    /// counter and disable all of the timer's interrupts.
    fn apply(&mut self, timer: u8, setup: &TimerSetup);

    /// Enable one of the timer's interrupts
    fn enable_vector(&mut self, timer: u8, vector: TimerVector);

    /// Restart the counter from zero
    fn reset_counter(&mut self, timer: u8);
}

/// Periodic ticker provided by the platform
pub trait TickerHardware {
    /// Call `isr` every `period_us` microseconds, replacing any earlier attachment
    fn attach(&mut self, ticker: usize, period_us: u32, isr: Isr);

    /// Stop calling the ticker's function
    fn detach(&mut self, ticker: usize);
}

/// Reference timer whose wrap interrupt drives the overflow counter
pub trait TickSource {
    /// Enable the interrupt that fires once per counter wrap
    fn enable_wrap_interrupt(&mut self);
}
