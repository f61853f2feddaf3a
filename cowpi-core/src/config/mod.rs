//! Configuration types
//!
//! Board layouts and timing tunables, selected at init time.

pub mod board;
pub mod timing;

pub use board::*;
pub use timing::*;
