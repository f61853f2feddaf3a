//! Digital inputs and outputs and pin-change interrupts
//!
//! Bank numbers follow the PCINT vectors: bank 0 is PORTB (D8-D13), bank 1
//! is PORTC (D14-D19) and bank 2 is PORTD (D0-D7).

use avr_device::atmega328p::{EXINT, PORTB, PORTC, PORTD};
use cowpi_core::config::Board;
use cowpi_hal::{InputPin, OutputPin, PinChangeHardware};

/// Number of pin-change banks
pub const BANKS: usize = 3;

/// Read the input register of a bank
///
/// PINx reads have no side effects, so any owner of the port may be
/// writing it concurrently.
fn read_port(bank: usize) -> u8 {
    // SAFETY: volatile read of a read-only input register
    unsafe {
        match bank {
            0 => (*PORTB::ptr()).pinb.read().bits(),
            1 => (*PORTC::ptr()).pinc.read().bits(),
            2 => (*PORTD::ptr()).pind.read().bits(),
            _ => 0,
        }
    }
}

/// Pin-change controller (PCICR / PCMSKx)
pub struct AvrPinChange {
    exint: EXINT,
}

impl AvrPinChange {
    /// Take the external interrupt block with every bank masked and every
    /// pin disarmed
    pub fn new(exint: EXINT) -> Self {
        exint.pcicr.write(|w| unsafe { w.bits(0) });
        exint.pcmsk0.write(|w| unsafe { w.bits(0) });
        exint.pcmsk1.write(|w| unsafe { w.bits(0) });
        exint.pcmsk2.write(|w| unsafe { w.bits(0) });
        // Flags are cleared by writing ones
        exint.pcifr.write(|w| unsafe { w.bits(0x07) });
        Self { exint }
    }

    fn pin_mask(&self, bank: usize) -> u8 {
        match bank {
            0 => self.exint.pcmsk0.read().bits(),
            1 => self.exint.pcmsk1.read().bits(),
            2 => self.exint.pcmsk2.read().bits(),
            _ => 0,
        }
    }

    fn set_pin_mask(&mut self, bank: usize, mask: u8) {
        match bank {
            0 => self.exint.pcmsk0.write(|w| unsafe { w.bits(mask) }),
            1 => self.exint.pcmsk1.write(|w| unsafe { w.bits(mask) }),
            2 => self.exint.pcmsk2.write(|w| unsafe { w.bits(mask) }),
            _ => {}
        }
    }
}

impl PinChangeHardware for AvrPinChange {
    fn mask_bank(&mut self, bank: usize) {
        if bank < BANKS {
            self.exint
                .pcicr
                .modify(|r, w| unsafe { w.bits(r.bits() & !(1 << bank)) });
        }
    }

    fn unmask_bank(&mut self, bank: usize) {
        if bank < BANKS {
            self.exint
                .pcicr
                .modify(|r, w| unsafe { w.bits(r.bits() | (1 << bank)) });
        }
    }

    fn arm(&mut self, bank: usize, bit: u8) {
        let mask = self.pin_mask(bank) | (1 << bit);
        self.set_pin_mask(bank, mask);
    }

    fn disarm(&mut self, bank: usize, bit: u8) {
        let mask = self.pin_mask(bank) & !(1 << bit);
        self.set_pin_mask(bank, mask);
    }

    fn read_bank(&self, bank: usize) -> u32 {
        u32::from(read_port(bank) & self.pin_mask(bank))
    }
}

/// One of the kit's digital inputs, read straight from its PINx register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KitInput {
    bank: usize,
    bit: u8,
}

impl KitInput {
    /// Input on Arduino pin `pin` (D0-D19)
    pub fn new(pin: u8) -> Option<Self> {
        Board::Atmega328p
            .locate(pin)
            .map(|(bank, bit)| Self { bank, bit })
    }

    /// Configure the pin as an input with its internal pull-up enabled
    pub fn with_pull_up(self) -> Self {
        let bit = 1u8 << self.bit;
        critical_section::with(|_| {
            // SAFETY: read-modify-write of one bit inside a critical section
            unsafe {
                match self.bank {
                    0 => {
                        let port = &*PORTB::ptr();
                        port.ddrb.modify(|r, w| w.bits(r.bits() & !bit));
                        port.portb.modify(|r, w| w.bits(r.bits() | bit));
                    }
                    1 => {
                        let port = &*PORTC::ptr();
                        port.ddrc.modify(|r, w| w.bits(r.bits() & !bit));
                        port.portc.modify(|r, w| w.bits(r.bits() | bit));
                    }
                    _ => {
                        let port = &*PORTD::ptr();
                        port.ddrd.modify(|r, w| w.bits(r.bits() & !bit));
                        port.portd.modify(|r, w| w.bits(r.bits() | bit));
                    }
                }
            }
        });
        self
    }
}

impl InputPin for KitInput {
    fn is_high(&self) -> bool {
        read_port(self.bank) & (1 << self.bit) != 0
    }
}

/// One of the kit's digital outputs, such as a keypad row
#[derive(Debug, PartialEq, Eq)]
pub struct KitOutput {
    bank: usize,
    bit: u8,
}

impl KitOutput {
    /// Configure Arduino pin `pin` (D0-D19) as an output driven low
    pub fn new(pin: u8) -> Option<Self> {
        let (bank, bit) = Board::Atmega328p.locate(pin)?;
        let mut output = Self { bank, bit };
        output.set_low();
        let mask = 1u8 << bit;
        critical_section::with(|_| {
            // SAFETY: read-modify-write of one bit inside a critical section
            unsafe {
                match bank {
                    0 => (*PORTB::ptr()).ddrb.modify(|r, w| w.bits(r.bits() | mask)),
                    1 => (*PORTC::ptr()).ddrc.modify(|r, w| w.bits(r.bits() | mask)),
                    _ => (*PORTD::ptr()).ddrd.modify(|r, w| w.bits(r.bits() | mask)),
                }
            }
        });
        Some(output)
    }

    fn write(&mut self, high: bool) {
        let mask = 1u8 << self.bit;
        let update = |bits: u8| if high { bits | mask } else { bits & !mask };
        critical_section::with(|_| {
            // SAFETY: read-modify-write of one bit inside a critical section
            unsafe {
                match self.bank {
                    0 => (*PORTB::ptr()).portb.modify(|r, w| w.bits(update(r.bits()))),
                    1 => (*PORTC::ptr()).portc.modify(|r, w| w.bits(update(r.bits()))),
                    _ => (*PORTD::ptr()).portd.modify(|r, w| w.bits(update(r.bits()))),
                }
            }
        });
    }
}

impl OutputPin for KitOutput {
    fn set_high(&mut self) {
        self.write(true);
    }

    fn set_low(&mut self) {
        self.write(false);
    }

    fn is_set_high(&self) -> bool {
        // SAFETY: volatile read of the output latch
        let latch = unsafe {
            match self.bank {
                0 => (*PORTB::ptr()).portb.read().bits(),
                1 => (*PORTC::ptr()).portc.read().bits(),
                _ => (*PORTD::ptr()).portd.read().bits(),
            }
        };
        latch & (1 << self.bit) != 0
    }
}
