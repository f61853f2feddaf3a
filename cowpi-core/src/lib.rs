//! Board-agnostic core logic for the CowPi kit
//!
//! This crate contains the parts of the kit library that do not depend on
//! specific hardware implementations:
//!
//! - Board layouts (pin banks, hardware timer tables, system clock)
//! - Input debouncing for the kit's buttons, switches and keypad
//! - Keypad matrix scanning
//! - Pin-change interrupt dispatch to per-pin callbacks
//! - Timer period search, callback slots and virtual tickers
//! - The reference timer overflow counter
//! - Host-side fakes of the hardware traits (`mocks`)

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod config;
pub mod input;
pub mod interrupts;
#[cfg(any(test, feature = "mocks"))]
pub mod mocks;
#[cfg(test)]
mod testing;
pub mod timer;

pub use config::{Board, DebounceConfig, SystemClock};
pub use input::{Debouncer, InputName, KeypadScanner};
pub use interrupts::PinInterrupts;
pub use timer::{period_or_infinity, OverflowCounter, PeriodicTimers, TimerError, TickerTimers};
