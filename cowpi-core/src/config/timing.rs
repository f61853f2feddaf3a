//! Timing configuration
//!
//! Tunables for the debounce filter and the CPU clock used by the timer
//! period search.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default debounce window in milliseconds
pub const DEFAULT_DEBOUNCE_THRESHOLD_MS: u32 = 40;

/// CPU clock rate as seen by the timer prescalers
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SystemClock {
    /// Clock cycles per microsecond (MHz)
    pub cycles_per_us: f32,
}

impl SystemClock {
    /// Create a clock description from its rate in MHz
    pub const fn new(cycles_per_us: f32) -> Self {
        Self { cycles_per_us }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new(16.0)
    }
}

/// Debounce filter configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DebounceConfig {
    /// How long a raw value must hold before it is accepted
    pub threshold_ms: u32,
}

impl DebounceConfig {
    /// Create a configuration with the given window
    pub const fn new(threshold_ms: u32) -> Self {
        Self { threshold_ms }
    }

    /// Longest gap between polls that still counts as continuous sampling
    pub const fn max_sample_gap_ms(&self) -> u32 {
        self.threshold_ms / 2
    }
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE_THRESHOLD_MS)
    }
}
