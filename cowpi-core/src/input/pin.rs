//! Debounced digital inputs
//!
//! Buttons on the kit pull their pin low when pressed and the slide switches
//! read low in the left position, so most inputs are wrapped active-low.

use cowpi_hal::InputPin;

use super::debounce::BoolDebouncer;
use super::names::InputName;

/// An input pin read through the debounce filter
pub struct DebouncedPin<P> {
    pin: P,
    input: InputName,
    active_low: bool,
}

impl<P: InputPin> DebouncedPin<P> {
    /// Wrap a pin that reads high when active
    pub fn active_high(pin: P, input: InputName) -> Self {
        Self {
            pin,
            input,
            active_low: false,
        }
    }

    /// Wrap a pin that reads low when active (buttons, switches)
    pub fn active_low(pin: P, input: InputName) -> Self {
        Self {
            pin,
            input,
            active_low: true,
        }
    }

    /// Raw, unfiltered activity
    pub fn is_active_raw(&self) -> bool {
        self.pin.is_high() != self.active_low
    }

    /// Poll the pin and return its debounced activity
    pub fn is_active(&self, debouncer: &mut BoolDebouncer, now_ms: u32) -> bool {
        debouncer.debounce(self.is_active_raw(), self.input, now_ms)
    }

    /// Identity this pin is debounced under
    pub fn input(&self) -> InputName {
        self.input
    }

    /// Release the underlying pin
    pub fn into_inner(self) -> P {
        self.pin
    }
}
