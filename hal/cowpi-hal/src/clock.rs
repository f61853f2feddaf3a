//! Monotonic time source
//!
//! The debounce filter compares against a millisecond clock supplied by the
//! hosting platform. Both counters wrap; consumers use wrapping arithmetic.

/// Monotonic clock since power-up
pub trait Clock {
    /// Milliseconds since power-up (wrapping)
    fn millis(&self) -> u32;

    /// Microseconds since power-up (wrapping)
    fn micros(&self) -> u32;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn millis(&self) -> u32 {
        (**self).millis()
    }

    fn micros(&self) -> u32 {
        (**self).micros()
    }
}
