//! Pin-change interrupts
//!
//! Per-pin handlers dispatched from banked hardware change interrupts.

pub mod pin_change;

pub use pin_change::{do_nothing, PinInterrupts};
