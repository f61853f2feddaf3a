//! Board layouts
//!
//! Each supported microcontroller is a tagged record describing how its pins
//! are grouped into change-interrupt banks and which hardware timers the
//! library may configure. Register-level details stay in the chip HALs.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::timing::SystemClock;
use crate::timer::TimerMode;

/// Maximum number of pins addressable by a pin mask
pub const MAX_PINS: usize = 32;

/// Maximum number of change-interrupt banks on any supported board
pub const MAX_BANKS: usize = 4;

/// Maximum number of hardware timers on any supported board
pub const MAX_TIMERS: usize = 4;

/// Consecutive board pins sharing one input register and change vector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinBank {
    /// Board pin number wired to bit 0 of the bank
    pub first_pin: u8,
    /// Number of pins in the bank
    pub pin_count: u8,
}

impl PinBank {
    /// Check if a board pin belongs to this bank
    pub const fn contains(&self, pin: u8) -> bool {
        pin >= self.first_pin && pin - self.first_pin < self.pin_count
    }

    /// Bank-local mask covering every pin of the bank
    pub const fn mask(&self) -> u32 {
        if self.pin_count >= 32 {
            u32::MAX
        } else {
            (1u32 << self.pin_count) - 1
        }
    }

    /// Board-level pin mask covering every pin of the bank
    pub const fn pin_mask(&self) -> u32 {
        self.mask() << self.first_pin
    }
}

/// Prescaled hardware timer description
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimerSpec {
    /// Legal clock divisors, fastest first
    pub prescalers: &'static [u16],
    /// Clock-select code for each prescaler (same order)
    pub clock_select: &'static [u8],
    /// Number of values the counter can hold (256 for 8-bit, 65536 for 16-bit)
    pub counter_values: u32,
    /// Waveform-generation bits for Normal mode, control registers A and B
    pub normal_mode_bits: [u8; 2],
    /// Waveform-generation bits for CTC mode, control registers A and B
    pub ctc_mode_bits: [u8; 2],
}

impl TimerSpec {
    /// Control register values for a mode and prescaler
    pub fn control_bits(&self, mode: TimerMode, prescaler_index: usize) -> [u8; 2] {
        let mode_bits = match mode {
            TimerMode::Normal => self.normal_mode_bits,
            TimerMode::Ctc => self.ctc_mode_bits,
        };
        let clock_select = self.clock_select.get(prescaler_index).copied().unwrap_or(0);
        [mode_bits[0], mode_bits[1] | clock_select]
    }

    /// Fastest available prescaler
    pub fn fastest_prescaler(&self) -> Option<u16> {
        self.prescalers.iter().copied().min()
    }
}

/// ATmega328P pin-change banks, in PCINT vector order
///
/// PCINT0 covers D8-D13 (PORTB), PCINT1 covers D14-D19 (PORTC) and PCINT2
/// covers D0-D7 (PORTD).
const ATMEGA328P_BANKS: [PinBank; 3] = [
    PinBank { first_pin: 8, pin_count: 6 },
    PinBank { first_pin: 14, pin_count: 6 },
    PinBank { first_pin: 0, pin_count: 8 },
];

/// RP2040 raises per-pin edge interrupts; all 30 GPIOs form one bank
const RP2040_BANKS: [PinBank; 1] = [PinBank { first_pin: 0, pin_count: 30 }];

/// ATmega328P TIMER1 (16-bit); CTC is WGM12 in TCCR1B
const ATMEGA328P_TIMER1: TimerSpec = TimerSpec {
    prescalers: &[1, 8, 64, 256, 1024],
    clock_select: &[1, 2, 3, 4, 5],
    counter_values: 1 << 16,
    normal_mode_bits: [0, 0],
    ctc_mode_bits: [0, 1 << 3],
};

/// ATmega328P TIMER2 (8-bit, extra prescalers); CTC is WGM21 in TCCR2A
const ATMEGA328P_TIMER2: TimerSpec = TimerSpec {
    prescalers: &[1, 8, 32, 64, 128, 256, 1024],
    clock_select: &[1, 2, 3, 4, 5, 6, 7],
    counter_values: 1 << 8,
    normal_mode_bits: [0, 0],
    ctc_mode_bits: [1 << 1, 0],
};

/// TIMER0 drives the tick counter and is never handed out
const ATMEGA328P_TIMERS: [Option<TimerSpec>; 3] =
    [None, Some(ATMEGA328P_TIMER1), Some(ATMEGA328P_TIMER2)];

/// Supported microcontroller boards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Board {
    /// Arduino Uno / Nano class boards
    #[default]
    Atmega328p,
    /// Raspberry Pi Pico class boards
    Rp2040,
}

impl Board {
    /// Change-interrupt banks, indexed by bank number
    pub const fn pin_banks(self) -> &'static [PinBank] {
        match self {
            Board::Atmega328p => &ATMEGA328P_BANKS,
            Board::Rp2040 => &RP2040_BANKS,
        }
    }

    /// Configurable hardware timers, indexed by timer number
    ///
    /// `None` marks a timer that exists but is reserved.
    pub const fn timers(self) -> &'static [Option<TimerSpec>] {
        match self {
            Board::Atmega328p => &ATMEGA328P_TIMERS,
            Board::Rp2040 => &[],
        }
    }

    /// CPU clock feeding the timer prescalers
    pub const fn system_clock(self) -> SystemClock {
        match self {
            Board::Atmega328p => SystemClock::new(16.0),
            Board::Rp2040 => SystemClock::new(125.0),
        }
    }

    /// Look up a configurable timer by number
    pub fn timer(self, timer: u8) -> Option<TimerSpec> {
        self.timers().get(usize::from(timer)).copied().flatten()
    }

    /// Find the bank and bank-local bit of a board pin
    pub fn locate(self, pin: u8) -> Option<(usize, u8)> {
        self.pin_banks()
            .iter()
            .enumerate()
            .find(|(_, bank)| bank.contains(pin))
            .map(|(index, bank)| (index, pin - bank.first_pin))
    }

    /// Mask of every pin that can raise a change interrupt
    pub fn interrupt_pins(self) -> u32 {
        self.pin_banks()
            .iter()
            .fold(0, |mask, bank| mask | bank.pin_mask())
    }
}
