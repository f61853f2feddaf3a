//! CowPi Hardware Abstraction Layer
//!
//! This crate defines the hardware abstraction traits that the interrupt,
//! timer and debounce logic in `cowpi-core` is written against. Chip-specific
//! HALs (ATmega328P, RP2040, ...) implement them; host tests implement them
//! with fakes.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Student application / lab code         │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  cowpi-core (dispatch, timers, debounce)│
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  cowpi-hal (this crate - traits)        │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ cowpi-hal-avr │       │ host mocks    │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`gpio::InputPin`] - Digital input read by the debounced inputs
//! - [`gpio::OutputPin`] - Digital output driving the keypad rows
//! - [`clock::Clock`] - Monotonic millisecond / microsecond time
//! - [`pin_change::PinChangeHardware`] - Banked pin-change interrupt control
//! - [`timer::TimerHardware`] - Hardware timer registers
//! - [`timer::TickerHardware`] - Virtual periodic tickers (mbed-style targets)
//! - [`timer::TickSource`] - Reference timer behind the overflow counter

#![no_std]
#![deny(unsafe_code)]

pub mod clock;
pub mod gpio;
pub mod pin_change;
pub mod timer;

// Re-export key traits at crate root for convenience
pub use clock::Clock;
pub use gpio::{InputPin, OutputPin};
pub use pin_change::PinChangeHardware;
pub use timer::{TickSource, TickerHardware, TimerHardware, TimerSetup, TimerVector};

/// Interrupt service routine
///
/// Callbacks are plain function pointers: registering one transfers no
/// ownership and captures no state.
pub type Isr = fn();
