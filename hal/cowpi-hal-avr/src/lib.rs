//! ATmega328P HAL for the CowPi kit
//!
//! This crate implements the `cowpi-hal` traits on the ATmega328P registers
//! (Arduino Uno / Nano) and owns the interrupt vectors that feed the
//! `cowpi-core` dispatchers:
//!
//! - [`pins`] - PCICR / PCMSKx pin-change control, PINx inputs and PORTx outputs
//! - [`timers`] - TIMER1 and TIMER2 configuration registers
//! - [`clock`] - TIMER0 time base and its wrap interrupt
//! - [`vectors`] - dispatcher statics and the ISR glue
//!
//! # Usage
//!
//! ```ignore
//! let dp = avr_device::atmega328p::Peripherals::take().unwrap();
//! let clock = cowpi_hal_avr::init(dp);
//! unsafe { avr_device::interrupt::enable() };
//!
//! cowpi_hal_avr::with_timers(|timers| timers.configure_timer(1, 1000.0));
//! ```

#![no_std]
#![cfg_attr(target_arch = "avr", feature(abi_avr_interrupt))]

pub mod clock;
pub mod pins;
pub mod timers;
pub mod vectors;

use avr_device::atmega328p::Peripherals;

pub use clock::TickClock;
pub use pins::{AvrPinChange, KitInput, KitOutput};
pub use timers::AvrTimers;
pub use vectors::{install_pin_interrupts, install_timers, with_pin_interrupts, with_timers, WRAPS};

/// Bring up the kit's interrupt and timer plumbing
///
/// Starts the TIMER0 time base, arms its wrap interrupt and installs the
/// pin-change and periodic timer dispatchers. Global interrupts are left
/// for the caller to enable.
pub fn init(dp: Peripherals) -> TickClock {
    let mut clock = TickClock::new(dp.TC0, &WRAPS);
    WRAPS.initialize(&mut clock);
    install_pin_interrupts(AvrPinChange::new(dp.EXINT));
    install_timers(AvrTimers::new(dp.TC1, dp.TC2));
    clock
}
