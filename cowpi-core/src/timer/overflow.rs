//! Reference timer wrap counter
//!
//! The counter is bumped from the wrap interrupt and read from application
//! code. Reads take a critical section, so a snapshot is never torn on
//! targets without atomic 32-bit loads.

use core::cell::Cell;

use cowpi_hal::TickSource;
use critical_section::Mutex;

/// Compare value that makes the kit's TIMER0 wrap interrupt fire
///
/// The compare A match at 0xFE stands in for the overflow vector, which the
/// Arduino core already owns.
pub const KIT_WRAP_COMPARE: u8 = 0xFE;

/// Count of reference timer wraps
pub struct OverflowCounter {
    count: Mutex<Cell<u32>>,
}

impl OverflowCounter {
    /// Counter at zero, usable in a `static`
    pub const fn new() -> Self {
        Self {
            count: Mutex::new(Cell::new(0)),
        }
    }

    /// Arm the reference timer's wrap interrupt
    pub fn initialize(&self, source: &mut impl TickSource) {
        source.enable_wrap_interrupt();

        #[cfg(feature = "defmt")]
        defmt::debug!("overflow counter armed at {}", self.count());
    }

    /// Record one wrap; called from the wrap interrupt
    pub fn increment(&self) {
        critical_section::with(|cs| {
            let count = self.count.borrow(cs);
            count.set(count.get().wrapping_add(1));
        });
    }

    /// Consistent snapshot of the wrap count
    pub fn count(&self) -> u32 {
        critical_section::with(|cs| self.count.borrow(cs).get())
    }
}

impl Default for OverflowCounter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::FakeTickSource;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_initialize_arms_interrupt() {
        let counter = OverflowCounter::new();
        let mut source = FakeTickSource::default();
        counter.initialize(&mut source);
        assert!(source.is_armed());
        assert_eq!(counter.count(), 0);
    }

    #[test]
    fn test_increment_wraps() {
        let counter = OverflowCounter::new();
        critical_section::with(|cs| counter.count.borrow(cs).set(u32::MAX));
        counter.increment();
        assert_eq!(counter.count(), 0);
    }

    #[test]
    fn test_static_counter() {
        static COUNTER: OverflowCounter = OverflowCounter::new();
        COUNTER.increment();
        COUNTER.increment();
        assert_eq!(COUNTER.count(), 2);
    }

    #[test]
    fn test_concurrent_reads_are_consistent() {
        let counter = Arc::new(OverflowCounter::new());
        let writer = {
            let counter = Arc::clone(&counter);
            thread::spawn(move || {
                for _ in 0..10_000 {
                    counter.increment();
                }
            })
        };

        // Each snapshot is either the last value seen or later, never torn
        let mut last = 0;
        while !writer.is_finished() {
            let n = counter.count();
            assert!(n >= last);
            assert!(n <= 10_000);
            last = n;
        }
        writer.join().unwrap();
        assert_eq!(counter.count(), 10_000);
    }

    #[test]
    fn test_snapshot_brackets_one_increment() {
        let counter = OverflowCounter::new();
        let before = counter.count();
        let reader = thread::scope(|s| {
            let handle = s.spawn(|| counter.count());
            counter.increment();
            handle.join().unwrap()
        });
        assert!(reader == before || reader == before + 1);
    }
}
