//! Interrupt vector glue
//!
//! The dispatchers live in statics guarded by critical sections. Each vector
//! forwards to the dispatcher that owns it; application code reaches the
//! same dispatchers through the `with_*` accessors.

use core::cell::RefCell;

use cowpi_core::config::Board;
use cowpi_core::{OverflowCounter, PeriodicTimers, PinInterrupts};
use critical_section::Mutex;

use crate::pins::AvrPinChange;
use crate::timers::AvrTimers;

/// TIMER0 wrap count
pub static WRAPS: OverflowCounter = OverflowCounter::new();

static PIN_INTERRUPTS: Mutex<RefCell<Option<PinInterrupts<AvrPinChange>>>> =
    Mutex::new(RefCell::new(None));

static TIMERS: Mutex<RefCell<Option<PeriodicTimers<AvrTimers>>>> =
    Mutex::new(RefCell::new(None));

/// Hand the pin-change controller to the vector table
pub fn install_pin_interrupts(hw: AvrPinChange) {
    critical_section::with(|cs| {
        PIN_INTERRUPTS
            .borrow(cs)
            .replace(Some(PinInterrupts::new(hw, Board::Atmega328p)));
    });
}

/// Hand TIMER1 and TIMER2 to the vector table
pub fn install_timers(hw: AvrTimers) {
    critical_section::with(|cs| {
        TIMERS
            .borrow(cs)
            .replace(Some(PeriodicTimers::new(hw, Board::Atmega328p)));
    });
}

/// Run `f` on the pin-change dispatcher with interrupts disabled
///
/// Returns `None` if [`install_pin_interrupts`] has not been called, or when
/// called from inside a pin callback.
pub fn with_pin_interrupts<R>(f: impl FnOnce(&mut PinInterrupts<AvrPinChange>) -> R) -> Option<R> {
    critical_section::with(|cs| {
        let mut slot = PIN_INTERRUPTS.borrow(cs).try_borrow_mut().ok()?;
        slot.as_mut().map(f)
    })
}

/// Run `f` on the periodic timers with interrupts disabled
///
/// Returns `None` if [`install_timers`] has not been called.
pub fn with_timers<R>(f: impl FnOnce(&mut PeriodicTimers<AvrTimers>) -> R) -> Option<R> {
    critical_section::with(|cs| {
        let mut slot = TIMERS.borrow(cs).try_borrow_mut().ok()?;
        slot.as_mut().map(f)
    })
}

#[cfg(target_arch = "avr")]
mod isr {
    use cowpi_hal::TimerVector;

    use super::*;

    fn pin_change(bank: usize) {
        critical_section::with(|cs| {
            if let Ok(mut slot) = PIN_INTERRUPTS.borrow(cs).try_borrow_mut() {
                if let Some(pins) = slot.as_mut() {
                    pins.service(bank);
                }
            }
        });
    }

    fn timer(timer: u8, vector: TimerVector) {
        // Copy the callback out so it may itself reach the timers
        let isr = critical_section::with(|cs| {
            TIMERS
                .borrow(cs)
                .try_borrow()
                .ok()
                .and_then(|slot| slot.as_ref().map(|timers| timers.isr_for(timer, vector)))
        });
        if let Some(isr) = isr {
            isr();
        }
    }

    #[avr_device::interrupt(atmega328p)]
    fn PCINT0() {
        pin_change(0);
    }

    #[avr_device::interrupt(atmega328p)]
    fn PCINT1() {
        pin_change(1);
    }

    #[avr_device::interrupt(atmega328p)]
    fn PCINT2() {
        pin_change(2);
    }

    #[avr_device::interrupt(atmega328p)]
    fn TIMER0_COMPA() {
        WRAPS.increment();
    }

    #[avr_device::interrupt(atmega328p)]
    fn TIMER1_OVF() {
        timer(1, TimerVector::Overflow);
    }

    #[avr_device::interrupt(atmega328p)]
    fn TIMER1_COMPA() {
        timer(1, TimerVector::CompareA);
    }

    #[avr_device::interrupt(atmega328p)]
    fn TIMER1_COMPB() {
        timer(1, TimerVector::CompareB);
    }

    #[avr_device::interrupt(atmega328p)]
    fn TIMER2_OVF() {
        timer(2, TimerVector::Overflow);
    }

    #[avr_device::interrupt(atmega328p)]
    fn TIMER2_COMPA() {
        timer(2, TimerVector::CompareA);
    }

    #[avr_device::interrupt(atmega328p)]
    fn TIMER2_COMPB() {
        timer(2, TimerVector::CompareB);
    }
}
