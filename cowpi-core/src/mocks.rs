//! Host-side fakes of the hardware traits
//!
//! Available to unit tests and, with the `mocks` feature, to downstream
//! crates testing their own application logic off-target.

use core::cell::Cell;

use cowpi_hal::{
    Clock, InputPin, Isr, OutputPin, PinChangeHardware, TickSource, TickerHardware,
    TimerHardware, TimerSetup, TimerVector,
};
use heapless::Vec;

use crate::config::{Board, MAX_BANKS, MAX_TIMERS};
use crate::input::keypad::{KEYPAD_SIZE, KEY_LEGENDS};
use crate::timer::MAX_TICKERS;

/// Manually advanced clock
#[derive(Debug, Default)]
pub struct FakeClock {
    ms: Cell<u32>,
    us: Cell<u32>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance_ms(&self, ms: u32) {
        self.ms.set(self.ms.get().wrapping_add(ms));
        self.us.set(self.us.get().wrapping_add(ms.wrapping_mul(1000)));
    }

    pub fn set_ms(&self, ms: u32) {
        self.ms.set(ms);
        self.us.set(ms.wrapping_mul(1000));
    }
}

impl Clock for FakeClock {
    fn millis(&self) -> u32 {
        self.ms.get()
    }

    fn micros(&self) -> u32 {
        self.us.get()
    }
}

/// Input pin whose level is set by the test
#[derive(Debug, Default)]
pub struct FakeInputPin {
    high: Cell<bool>,
}

impl FakeInputPin {
    pub fn new(high: bool) -> Self {
        Self {
            high: Cell::new(high),
        }
    }

    pub fn set_high(&self, high: bool) {
        self.high.set(high);
    }
}

impl InputPin for FakeInputPin {
    fn is_high(&self) -> bool {
        self.high.get()
    }
}

/// Keypad wiring: key switches between row outputs and column inputs
///
/// A column reads low while any pressed key in it sits on a row that is
/// driven low.
#[derive(Debug, Default)]
pub struct FakeKeyMatrix {
    /// Bit `row * 4 + column` per pressed key
    pressed: Cell<u16>,
    /// One bit per row driven low
    driven_low: Cell<u8>,
}

impl FakeKeyMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&self, row: usize, column: usize) {
        self.pressed
            .set(self.pressed.get() | 1 << (row * KEYPAD_SIZE + column));
    }

    /// Press the key with legend `key`; unknown legends are ignored
    pub fn press_key(&self, key: char) {
        for (row, legends) in KEY_LEGENDS.iter().enumerate() {
            if let Some(column) = legends.iter().position(|&legend| legend == key) {
                self.press(row, column);
            }
        }
    }

    pub fn release_all(&self) {
        self.pressed.set(0);
    }

    /// Rows currently driven low, one bit per row
    pub fn driven_low(&self) -> u8 {
        self.driven_low.get()
    }

    /// Column levels, one bit per column, set when high
    pub fn column_levels(&self) -> u8 {
        (0..KEYPAD_SIZE).fold(0, |levels, column| {
            if self.column_is_low(column) {
                levels
            } else {
                levels | 1 << column
            }
        })
    }

    pub fn rows(&self) -> [FakeRowPin<'_>; KEYPAD_SIZE] {
        core::array::from_fn(|row| FakeRowPin { matrix: self, row })
    }

    pub fn columns(&self) -> [FakeColumnPin<'_>; KEYPAD_SIZE] {
        core::array::from_fn(|column| FakeColumnPin {
            matrix: self,
            column,
        })
    }

    fn column_is_low(&self, column: usize) -> bool {
        let pressed = self.pressed.get();
        let driven_low = self.driven_low.get();
        (0..KEYPAD_SIZE).any(|row| {
            pressed & (1 << (row * KEYPAD_SIZE + column)) != 0 && driven_low & (1 << row) != 0
        })
    }
}

/// Row output of a [`FakeKeyMatrix`]
#[derive(Debug)]
pub struct FakeRowPin<'a> {
    matrix: &'a FakeKeyMatrix,
    row: usize,
}

impl OutputPin for FakeRowPin<'_> {
    fn set_high(&mut self) {
        let low = self.matrix.driven_low.get();
        self.matrix.driven_low.set(low & !(1 << self.row));
    }

    fn set_low(&mut self) {
        let low = self.matrix.driven_low.get();
        self.matrix.driven_low.set(low | 1 << self.row);
    }

    fn is_set_high(&self) -> bool {
        self.matrix.driven_low.get() & (1 << self.row) == 0
    }
}

/// Column input of a [`FakeKeyMatrix`]
#[derive(Debug)]
pub struct FakeColumnPin<'a> {
    matrix: &'a FakeKeyMatrix,
    column: usize,
}

impl InputPin for FakeColumnPin<'_> {
    fn is_high(&self) -> bool {
        !self.matrix.column_is_low(self.column)
    }
}

/// Pin-change register access, in call order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinOp {
    Mask(usize),
    Unmask(usize),
    Arm(usize, u8),
    Disarm(usize, u8),
}

/// Pin-change controller with latched per-bank pending flags
///
/// A level change on an armed pin latches its bank's flag even while the
/// bank is masked; the flag is delivered once the bank is unmasked.
pub struct FakePinBanks {
    board: Board,
    levels: [u32; MAX_BANKS],
    armed: [u32; MAX_BANKS],
    masked: u32,
    pending: u32,
    log: Vec<PinOp, 128>,
}

impl FakePinBanks {
    pub fn new(board: Board) -> Self {
        Self {
            board,
            levels: [0; MAX_BANKS],
            armed: [0; MAX_BANKS],
            masked: 0,
            pending: 0,
            log: Vec::new(),
        }
    }

    /// Drive a board pin
    pub fn set_pin(&mut self, pin: u8, high: bool) {
        let Some((bank, bit)) = self.board.locate(pin) else {
            return;
        };
        let levels = if high {
            self.levels[bank] | (1 << bit)
        } else {
            self.levels[bank] & !(1 << bit)
        };
        self.set_bank_levels(bank, levels);
    }

    /// Drive every pin of a bank at once
    pub fn set_bank_levels(&mut self, bank: usize, levels: u32) {
        if bank >= MAX_BANKS {
            return;
        }
        if (self.levels[bank] ^ levels) & self.armed[bank] != 0 {
            self.pending |= 1 << bank;
        }
        self.levels[bank] = levels;
    }

    /// Take the lowest pending bank that is not masked
    pub fn take_pending(&mut self) -> Option<usize> {
        let deliverable = self.pending & !self.masked;
        if deliverable == 0 {
            return None;
        }
        let bank = deliverable.trailing_zeros() as usize;
        self.pending &= !(1 << bank);
        Some(bank)
    }

    /// Banks currently masked, one bit per bank
    pub fn masked_banks(&self) -> u32 {
        self.masked
    }

    pub fn log(&self) -> &[PinOp] {
        &self.log
    }

    pub fn clear_log(&mut self) {
        self.log.clear();
    }

    fn push(&mut self, op: PinOp) {
        // Oldest entries are kept; a full log stops recording
        let _ = self.log.push(op);
    }
}

impl PinChangeHardware for FakePinBanks {
    fn mask_bank(&mut self, bank: usize) {
        self.masked |= 1 << bank;
        self.push(PinOp::Mask(bank));
    }

    fn unmask_bank(&mut self, bank: usize) {
        self.masked &= !(1 << bank);
        self.push(PinOp::Unmask(bank));
    }

    fn arm(&mut self, bank: usize, bit: u8) {
        if let Some(armed) = self.armed.get_mut(bank) {
            *armed |= 1 << bit;
        }
        self.push(PinOp::Arm(bank, bit));
    }

    fn disarm(&mut self, bank: usize, bit: u8) {
        if let Some(armed) = self.armed.get_mut(bank) {
            *armed &= !(1 << bit);
        }
        self.push(PinOp::Disarm(bank, bit));
    }

    fn read_bank(&self, bank: usize) -> u32 {
        match (self.levels.get(bank), self.armed.get(bank)) {
            (Some(levels), Some(armed)) => levels & armed,
            _ => 0,
        }
    }
}

/// Timer registers as last written
#[derive(Debug, Default)]
pub struct FakeTimers {
    setups: [Option<TimerSetup>; MAX_TIMERS],
    enabled: [u8; MAX_TIMERS],
    applies: [u32; MAX_TIMERS],
    resets: [u32; MAX_TIMERS],
}

impl FakeTimers {
    pub fn setup(&self, timer: u8) -> Option<TimerSetup> {
        self.setups.get(usize::from(timer)).copied().flatten()
    }

    /// Interrupt enable flags, [`TimerVector::enable_bit`] per vector
    pub fn enabled(&self, timer: u8) -> u8 {
        self.enabled.get(usize::from(timer)).copied().unwrap_or(0)
    }

    pub fn applies(&self, timer: u8) -> u32 {
        self.applies.get(usize::from(timer)).copied().unwrap_or(0)
    }

    pub fn resets(&self, timer: u8) -> u32 {
        self.resets.get(usize::from(timer)).copied().unwrap_or(0)
    }
}

impl TimerHardware for FakeTimers {
    fn apply(&mut self, timer: u8, setup: &TimerSetup) {
        let t = usize::from(timer);
        if t >= MAX_TIMERS {
            return;
        }
        self.setups[t] = Some(*setup);
        self.enabled[t] = 0;
        self.applies[t] += 1;
    }

    fn enable_vector(&mut self, timer: u8, vector: TimerVector) {
        if let Some(enabled) = self.enabled.get_mut(usize::from(timer)) {
            *enabled |= vector.enable_bit();
        }
    }

    fn reset_counter(&mut self, timer: u8) {
        if let Some(resets) = self.resets.get_mut(usize::from(timer)) {
            *resets += 1;
        }
    }
}

/// Platform ticker that fires only when told to
#[derive(Default)]
pub struct FakeTicker {
    attached: [Option<(u32, Isr)>; MAX_TICKERS],
    attaches: [u32; MAX_TICKERS],
    detaches: [u32; MAX_TICKERS],
}

impl FakeTicker {
    /// Period of the current attachment
    pub fn period(&self, ticker: usize) -> Option<u32> {
        self.attached
            .get(ticker)
            .copied()
            .flatten()
            .map(|(period, _)| period)
    }

    /// Simulate one tick
    pub fn fire(&self, ticker: usize) {
        if let Some(Some((_, isr))) = self.attached.get(ticker) {
            isr();
        }
    }

    pub fn attaches(&self, ticker: usize) -> u32 {
        self.attaches.get(ticker).copied().unwrap_or(0)
    }

    pub fn detaches(&self, ticker: usize) -> u32 {
        self.detaches.get(ticker).copied().unwrap_or(0)
    }
}

impl TickerHardware for FakeTicker {
    fn attach(&mut self, ticker: usize, period_us: u32, isr: Isr) {
        if ticker >= MAX_TICKERS {
            return;
        }
        self.attached[ticker] = Some((period_us, isr));
        self.attaches[ticker] += 1;
    }

    fn detach(&mut self, ticker: usize) {
        if ticker >= MAX_TICKERS {
            return;
        }
        self.attached[ticker] = None;
        self.detaches[ticker] += 1;
    }
}

/// Reference timer that records whether its wrap interrupt was armed
#[derive(Debug, Default)]
pub struct FakeTickSource {
    armed: bool,
}

impl FakeTickSource {
    pub fn is_armed(&self) -> bool {
        self.armed
    }
}

impl TickSource for FakeTickSource {
    fn enable_wrap_interrupt(&mut self) {
        self.armed = true;
    }
}
