//! TIMER1 and TIMER2
//!
//! Both timers share one register layout: two control registers, a counter,
//! compare registers A and B, and an interrupt mask whose bits 0-2 enable the
//! overflow, compare A and compare B vectors. TIMER2's registers are 8 bits
//! wide.

use avr_device::atmega328p::{TC1, TC2};
use cowpi_hal::{TimerHardware, TimerSetup, TimerVector};

/// Pending-flag bits for overflow, compare A and compare B
const ALL_FLAGS: u8 = 0x07;

/// The two timers the library hands out
pub struct AvrTimers {
    tc1: TC1,
    tc2: TC2,
}

impl AvrTimers {
    /// Take both timers, stopped and with interrupts disabled
    pub fn new(tc1: TC1, tc2: TC2) -> Self {
        tc1.timsk1.write(|w| unsafe { w.bits(0) });
        tc1.tccr1b.write(|w| unsafe { w.bits(0) });
        tc2.timsk2.write(|w| unsafe { w.bits(0) });
        tc2.tccr2b.write(|w| unsafe { w.bits(0) });
        Self { tc1, tc2 }
    }
}

impl TimerHardware for AvrTimers {
    fn apply(&mut self, timer: u8, setup: &TimerSetup) {
        match timer {
            1 => {
                let tc = &self.tc1;
                tc.timsk1.write(|w| unsafe { w.bits(0) });
                // Stop the clock while the period is rewritten
                tc.tccr1b.write(|w| unsafe { w.bits(0) });
                tc.tccr1a.write(|w| unsafe { w.bits(setup.control[0]) });
                tc.ocr1a.write(|w| unsafe { w.bits(setup.compare_a) });
                tc.ocr1b.write(|w| unsafe { w.bits(setup.compare_b) });
                tc.tcnt1.write(|w| unsafe { w.bits(0) });
                tc.tifr1.write(|w| unsafe { w.bits(ALL_FLAGS) });
                tc.tccr1b.write(|w| unsafe { w.bits(setup.control[1]) });
            }
            2 => {
                let tc = &self.tc2;
                tc.timsk2.write(|w| unsafe { w.bits(0) });
                tc.tccr2b.write(|w| unsafe { w.bits(0) });
                tc.tccr2a.write(|w| unsafe { w.bits(setup.control[0]) });
                tc.ocr2a.write(|w| unsafe { w.bits(setup.compare_a as u8) });
                tc.ocr2b.write(|w| unsafe { w.bits(setup.compare_b as u8) });
                tc.tcnt2.write(|w| unsafe { w.bits(0) });
                tc.tifr2.write(|w| unsafe { w.bits(ALL_FLAGS) });
                tc.tccr2b.write(|w| unsafe { w.bits(setup.control[1]) });
            }
            _ => {}
        }
    }

    fn enable_vector(&mut self, timer: u8, vector: TimerVector) {
        let bit = vector.enable_bit();
        match timer {
            1 => self
                .tc1
                .timsk1
                .modify(|r, w| unsafe { w.bits(r.bits() | bit) }),
            2 => self
                .tc2
                .timsk2
                .modify(|r, w| unsafe { w.bits(r.bits() | bit) }),
            _ => {}
        }
    }

    fn reset_counter(&mut self, timer: u8) {
        match timer {
            1 => self.tc1.tcnt1.write(|w| unsafe { w.bits(0) }),
            2 => self.tc2.tcnt2.write(|w| unsafe { w.bits(0) }),
            _ => {}
        }
    }
}
