//! Pin-change interrupt hardware
//!
//! Pins are grouped into banks that share one input register and one
//! change-interrupt vector. Bit `n` of a bank value is the `n`-th pin of that
//! bank; the mapping from board pin numbers to (bank, bit) lives in the
//! board layout, not here.

/// Banked pin-change interrupt controller
pub trait PinChangeHardware {
    /// Disable the change interrupt for a whole bank
    ///
    /// Called before the handler table is touched so the bank's ISR cannot
    /// observe a half-written table.
    fn mask_bank(&mut self, bank: usize);

    /// Re-enable the change interrupt for a bank
    fn unmask_bank(&mut self, bank: usize);

    /// Enable change detection for one pin of a bank
    fn arm(&mut self, bank: usize, bit: u8);

    /// Disable change detection for one pin of a bank
    fn disarm(&mut self, bank: usize, bit: u8);

    /// Current levels of the bank's armed pins
    ///
    /// Pins that are not armed read as 0.
    fn read_bank(&self, bank: usize) -> u32;
}
