//! Time-windowed debounce filter
//!
//! A raw reading is accepted as the new stable value once it has held for
//! the whole debounce window, and only while the caller is polling at least
//! twice per window. Polling slower than that cannot rule out a bounce that
//! happened between two reads, so the previous stable value is kept.
//!
//! The filter has no timer of its own: it is driven entirely by the caller's
//! polling, with the current time passed in (or read from a [`Clock`]).

use cowpi_hal::Clock;

use super::names::InputName;
use crate::config::DebounceConfig;

/// A raw input sample: a single level or a bit-vector of levels
pub trait Sample: Copy + PartialEq + Default {}

impl Sample for bool {}
impl Sample for u8 {}
impl Sample for u16 {}
impl Sample for u32 {}

/// Debounce history for one input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceRecord<T> {
    /// Raw value seen on the previous poll
    last_raw: T,
    /// Value most recently accepted as stable
    good: T,
    /// When the raw value last changed; `None` until it has changed once
    last_change_ms: Option<u32>,
    /// When the input was last polled; `None` before the first poll
    last_poll_ms: Option<u32>,
}

impl<T: Sample> Default for DebounceRecord<T> {
    fn default() -> Self {
        Self {
            last_raw: T::default(),
            good: T::default(),
            last_change_ms: None,
            last_poll_ms: None,
        }
    }
}

impl<T: Sample> DebounceRecord<T> {
    /// Feed one raw sample and return the stable value
    ///
    /// The very first sample has no history to contradict it and is accepted
    /// immediately.
    pub fn update(&mut self, raw: T, now_ms: u32, config: &DebounceConfig) -> T {
        if self.last_poll_ms.is_some() && raw != self.last_raw {
            self.last_change_ms = Some(now_ms);
        }

        let sampled_densely = self
            .last_poll_ms
            .map_or(true, |prev| now_ms.wrapping_sub(prev) <= config.max_sample_gap_ms());
        let settled = self
            .last_change_ms
            .map_or(true, |changed| now_ms.wrapping_sub(changed) >= config.threshold_ms);

        if sampled_densely && settled {
            self.good = raw;
        }

        self.last_raw = raw;
        self.last_poll_ms = Some(now_ms);
        self.good
    }

    /// Value most recently accepted as stable
    pub fn stable(&self) -> T {
        self.good
    }

    /// Check if the input has been polled at least once
    pub fn is_initialized(&self) -> bool {
        self.last_poll_ms.is_some()
    }
}

/// Debounce filter with one history record per [`InputName`]
///
/// Each input must be polled at least every `threshold_ms / 2`. A caller
/// polling more slowly never has a change accepted: with the default 40 ms
/// window, polling every 25 ms keeps the first value forever.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    config: DebounceConfig,
    records: [DebounceRecord<T>; InputName::COUNT],
}

/// Filter for single-level inputs (buttons, switch positions)
pub type BoolDebouncer = Debouncer<bool>;
/// Filter for 8-bit input vectors
pub type ByteDebouncer = Debouncer<u8>;
/// Filter for 16-bit input vectors (the keypad)
pub type ShortDebouncer = Debouncer<u16>;
/// Filter for 32-bit input vectors
pub type WordDebouncer = Debouncer<u32>;

impl<T: Sample> Default for Debouncer<T> {
    fn default() -> Self {
        Self::new(DebounceConfig::default())
    }
}

impl<T: Sample> Debouncer<T> {
    /// Create a filter with no history
    pub fn new(config: DebounceConfig) -> Self {
        Self {
            config,
            records: [DebounceRecord::default(); InputName::COUNT],
        }
    }

    /// Feed a raw sample for `input` taken at `now_ms`; returns the stable value
    pub fn debounce(&mut self, raw: T, input: InputName, now_ms: u32) -> T {
        let record = &mut self.records[input.index()];
        #[cfg(feature = "defmt")]
        let before = record.stable();
        let stable = record.update(raw, now_ms, &self.config);

        #[cfg(feature = "defmt")]
        {
            if stable != before {
                defmt::trace!("debounce: {} settled at {} ms", input, now_ms);
            }
        }

        stable
    }

    /// Feed a raw sample, reading the time from `clock`
    pub fn debounce_at<C: Clock>(&mut self, raw: T, input: InputName, clock: &C) -> T {
        self.debounce(raw, input, clock.millis())
    }

    /// Value most recently accepted for `input`, without polling
    pub fn stable(&self, input: InputName) -> T {
        self.records[input.index()].stable()
    }

    /// History record for `input`
    pub fn record(&self, input: InputName) -> &DebounceRecord<T> {
        &self.records[input.index()]
    }

    /// Active configuration
    pub fn config(&self) -> &DebounceConfig {
        &self.config
    }

    /// Change the debounce window; existing history is kept
    pub fn set_threshold_ms(&mut self, threshold_ms: u32) {
        self.config.threshold_ms = threshold_ms;
    }
}
