//! Input filtering
//!
//! Debounce history per kit input, debounced pin wrappers and the keypad
//! scanner.

pub mod debounce;
pub mod keypad;
pub mod names;
pub mod pin;

pub use debounce::{
    BoolDebouncer, ByteDebouncer, DebounceRecord, Debouncer, Sample, ShortDebouncer,
    WordDebouncer,
};
pub use keypad::KeypadScanner;
pub use names::InputName;
pub use pin::DebouncedPin;
