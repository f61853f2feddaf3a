//! TIMER0 time base
//!
//! TIMER0 counts at 16 MHz / 64, one tick every 4 µs, and wraps every
//! 1024 µs. Its compare A match at [`KIT_WRAP_COMPARE`] bumps an
//! [`OverflowCounter`]; elapsed time is `1024 * wraps + 4 * TCNT0`.

use avr_device::atmega328p::TC0;
use cowpi_core::timer::overflow::KIT_WRAP_COMPARE;
use cowpi_core::OverflowCounter;
use cowpi_hal::{Clock, TickSource};
use embedded_hal::delay::DelayNs;

/// Clock select for a /64 prescaler
const CLOCK_DIV_64: u8 = 0x03;

/// Compare A interrupt enable / pending flag
const OCF0A: u8 = 1 << 1;

const US_PER_WRAP: u64 = 1024;
const US_PER_TICK: u64 = 4;

/// Free-running TIMER0 plus its wrap count
pub struct TickClock {
    tc0: TC0,
    wraps: &'static OverflowCounter,
}

impl TickClock {
    /// Start TIMER0 in Normal mode at /64
    ///
    /// The wrap interrupt is armed separately through
    /// [`OverflowCounter::initialize`].
    pub fn new(tc0: TC0, wraps: &'static OverflowCounter) -> Self {
        tc0.tccr0a.write(|w| unsafe { w.bits(0) });
        tc0.tcnt0.write(|w| unsafe { w.bits(0) });
        tc0.tccr0b.write(|w| unsafe { w.bits(CLOCK_DIV_64) });
        Self { tc0, wraps }
    }

    /// Microseconds since the clock started, without 32-bit truncation
    pub fn elapsed_us(&self) -> u64 {
        critical_section::with(|_| {
            let ticks = self.tc0.tcnt0.read().bits();
            let pending = self.tc0.tifr0.read().bits() & OCF0A != 0;
            let mut wraps = self.wraps.count();

            // The counter is bumped at the compare match rather than at zero.
            // Before its ISR runs the new wrap is missing; after it runs the
            // two ticks past the match are already counted.
            if pending && ticks < KIT_WRAP_COMPARE {
                wraps = wraps.wrapping_add(1);
            } else if !pending && ticks >= KIT_WRAP_COMPARE {
                wraps = wraps.wrapping_sub(1);
            }

            u64::from(wraps) * US_PER_WRAP + u64::from(ticks) * US_PER_TICK
        })
    }
}

impl TickSource for TickClock {
    fn enable_wrap_interrupt(&mut self) {
        self.tc0.ocr0a.write(|w| unsafe { w.bits(KIT_WRAP_COMPARE) });
        // Drop any match latched against the reset compare value
        self.tc0.tifr0.write(|w| unsafe { w.bits(OCF0A) });
        self.tc0
            .timsk0
            .modify(|r, w| unsafe { w.bits(r.bits() | OCF0A) });
    }
}

impl Clock for TickClock {
    fn millis(&self) -> u32 {
        (self.elapsed_us() / 1000) as u32
    }

    fn micros(&self) -> u32 {
        self.elapsed_us() as u32
    }
}

impl DelayNs for TickClock {
    /// Busy-wait; needs interrupts enabled once the wait exceeds one wrap
    fn delay_ns(&mut self, ns: u32) {
        let wait_us = ns.div_ceil(1000);
        let start = self.micros();
        while self.micros().wrapping_sub(start) < wait_us {}
    }
}
