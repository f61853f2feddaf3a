//! Call log for plain `fn()` callbacks under test
//!
//! Callbacks cannot capture state, so test handlers append a byte to a
//! per-thread log which the test then drains.

use std::cell::RefCell;
use std::vec::Vec;

std::thread_local! {
    static CALLS: RefCell<Vec<u8>> = const { RefCell::new(Vec::new()) };
}

/// Append `tag` to this thread's call log
pub fn record(tag: u8) {
    CALLS.with(|calls| calls.borrow_mut().push(tag));
}

/// Drain this thread's call log
pub fn take_log() -> Vec<u8> {
    CALLS.with(|calls| calls.take())
}
