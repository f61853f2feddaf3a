//! Pin-change interrupt dispatch
//!
//! Change interrupts arrive per bank, not per pin. The dispatcher keeps the
//! bank's input value from the previous interrupt, XORs it with the new value
//! and calls the handler of every pin whose bit flipped, lowest pin first.
//!
//! Handler-table updates happen from application context while the bank
//! interrupts are masked, so an interrupt never sees a partially written
//! table and a deregistered handler can no longer fire once the call returns.

use cowpi_hal::{Isr, PinChangeHardware};

use crate::config::{Board, MAX_BANKS, MAX_PINS};

/// Handler installed in every unregistered slot
pub fn do_nothing() {}

/// Pin-change interrupt dispatcher for one board
pub struct PinInterrupts<H> {
    hw: H,
    board: Board,
    /// Handler per board pin
    handlers: [Isr; MAX_PINS],
    /// Bank input values as of the last serviced interrupt
    snapshots: [u32; MAX_BANKS],
    /// Pins with a registered handler
    monitored: u32,
}

impl<H: PinChangeHardware> PinInterrupts<H> {
    /// Create a dispatcher with every slot unregistered
    pub fn new(hw: H, board: Board) -> Self {
        Self {
            hw,
            board,
            handlers: [do_nothing as Isr; MAX_PINS],
            snapshots: [0; MAX_BANKS],
            monitored: 0,
        }
    }

    /// Install `isr` for every pin set in `pin_mask`
    ///
    /// Pins already registered get the new handler. Pins the board cannot
    /// watch are ignored.
    pub fn register(&mut self, pin_mask: u32, isr: Isr) {
        self.update(pin_mask, Some(isr));

        #[cfg(feature = "defmt")]
        defmt::debug!("pin interrupts: registered {=u32:#x}, monitoring {=u32:#x}", pin_mask, self.monitored);
    }

    /// Restore the no-op handler for every pin set in `pin_mask`
    pub fn deregister(&mut self, pin_mask: u32) {
        self.update(pin_mask, None);

        #[cfg(feature = "defmt")]
        defmt::debug!("pin interrupts: deregistered {=u32:#x}, monitoring {=u32:#x}", pin_mask, self.monitored);
    }

    fn update(&mut self, pin_mask: u32, isr: Option<Isr>) {
        let pin_mask = pin_mask & self.board.interrupt_pins();
        let banks = self.banks_touched(pin_mask);

        for bank in bit_indices(banks) {
            self.hw.mask_bank(bank);
        }

        for pin in bit_indices(pin_mask) {
            let Some((bank, bit)) = self.board.locate(pin as u8) else {
                continue;
            };
            let bank_bit = 1u32 << bit;
            match isr {
                Some(isr) => {
                    self.handlers[pin] = isr;
                    self.monitored |= 1 << pin;
                    self.hw.arm(bank, bit);
                    // Only the new pin's bit is refreshed; a change already
                    // pending on a neighbour must still be seen by the ISR.
                    let level = self.hw.read_bank(bank) & bank_bit;
                    self.snapshots[bank] = (self.snapshots[bank] & !bank_bit) | level;
                }
                None => {
                    self.handlers[pin] = do_nothing;
                    self.monitored &= !(1 << pin);
                    self.hw.disarm(bank, bit);
                    // Disarmed pins read as 0
                    self.snapshots[bank] &= !bank_bit;
                }
            }
        }

        for bank in bit_indices(banks) {
            self.hw.unmask_bank(bank);
        }
    }

    fn banks_touched(&self, pin_mask: u32) -> u32 {
        self.board
            .pin_banks()
            .iter()
            .enumerate()
            .filter(|(_, bank)| bank.pin_mask() & pin_mask != 0)
            .fold(0, |banks, (index, _)| banks | (1 << index))
    }

    /// Service a change interrupt for `bank`
    ///
    /// Called from the bank's interrupt vector. Every pin whose input changed
    /// since the previous interrupt has its handler called once, in ascending
    /// pin order.
    pub fn service(&mut self, bank: usize) {
        let Some(layout) = self.board.pin_banks().get(bank).copied() else {
            return;
        };
        let current = self.hw.read_bank(bank) & layout.mask();
        let changed = current ^ self.snapshots[bank];
        let first_pin = usize::from(layout.first_pin);

        if changed.is_power_of_two() {
            // Common case: a single pin moved
            let isr = self.handlers[first_pin + changed.trailing_zeros() as usize];
            isr();
        } else {
            for bit in bit_indices(changed) {
                let isr = self.handlers[first_pin + bit];
                isr();
            }
        }

        self.snapshots[bank] = current;
    }

    /// Pins with a registered handler
    pub fn monitored(&self) -> u32 {
        self.monitored
    }

    /// Check if `pin` has a registered handler
    pub fn is_registered(&self, pin: u8) -> bool {
        pin < 32 && self.monitored & (1 << pin) != 0
    }

    /// Handler currently installed for `pin`
    pub fn handler(&self, pin: u8) -> Option<Isr> {
        self.handlers.get(usize::from(pin)).copied()
    }

    /// Bank value recorded at the last interrupt
    pub fn snapshot(&self, bank: usize) -> Option<u32> {
        if bank < self.board.pin_banks().len() {
            Some(self.snapshots[bank])
        } else {
            None
        }
    }

    /// Board layout in use
    pub fn board(&self) -> Board {
        self.board
    }

    /// Borrow the underlying hardware
    pub fn hardware(&self) -> &H {
        &self.hw
    }

    /// Mutably borrow the underlying hardware
    pub fn hardware_mut(&mut self) -> &mut H {
        &mut self.hw
    }
}

/// Indices of the set bits of `mask`, lowest first
fn bit_indices(mask: u32) -> impl Iterator<Item = usize> {
    let mut remaining = mask;
    core::iter::from_fn(move || {
        if remaining == 0 {
            return None;
        }
        let bit = remaining.trailing_zeros() as usize;
        remaining &= remaining - 1;
        Some(bit)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{FakePinBanks, PinOp};
    use crate::testing::{record, take_log};
    use proptest::prelude::*;

    fn isr_a() {
        record(b'a');
    }
    fn isr_b() {
        record(b'b');
    }

    macro_rules! pin_isrs {
        ($($name:ident = $pin:expr),* $(,)?) => {
            $(fn $name() { record($pin); })*
            const PIN_ISRS: [Isr; 20] = [$($name),*];
        };
    }

    pin_isrs!(
        p0 = 0, p1 = 1, p2 = 2, p3 = 3, p4 = 4, p5 = 5, p6 = 6, p7 = 7, p8 = 8, p9 = 9,
        p10 = 10, p11 = 11, p12 = 12, p13 = 13, p14 = 14, p15 = 15, p16 = 16, p17 = 17,
        p18 = 18, p19 = 19,
    );

    fn dispatcher() -> PinInterrupts<FakePinBanks> {
        PinInterrupts::new(FakePinBanks::new(Board::Atmega328p), Board::Atmega328p)
    }

    /// Deliver every pending bank interrupt, as the vector table would
    fn run_pending(pins: &mut PinInterrupts<FakePinBanks>) {
        while let Some(bank) = pins.hardware_mut().take_pending() {
            pins.service(bank);
        }
    }

    #[test]
    fn test_single_pin_change() {
        let _ = take_log();
        let mut pins = dispatcher();
        pins.register(1 << 2, isr_a);
        assert!(pins.is_registered(2));

        pins.hardware_mut().set_pin(2, true);
        run_pending(&mut pins);
        pins.hardware_mut().set_pin(2, false);
        run_pending(&mut pins);

        assert_eq!(take_log().as_slice(), b"aa");
    }

    #[test]
    fn test_shared_handler_per_pin() {
        let _ = take_log();
        let mut pins = dispatcher();
        pins.register((1 << 8) | (1 << 15), isr_b);

        pins.hardware_mut().set_pin(8, true);
        pins.hardware_mut().set_pin(15, true);
        run_pending(&mut pins);

        assert_eq!(take_log().as_slice(), b"bb");
        assert_eq!(pins.monitored(), (1 << 8) | (1 << 15));
    }

    #[test]
    fn test_simultaneous_changes_ascending() {
        let _ = take_log();
        let mut pins = dispatcher();
        for pin in 0..8 {
            pins.register(1 << pin, PIN_ISRS[pin]);
        }

        // D7, D3 and D0 change inside one latency window
        pins.hardware_mut().set_bank_levels(2, 0b1000_1001);
        run_pending(&mut pins);

        assert_eq!(take_log().as_slice(), &[0, 3, 7]);
        assert_eq!(pins.snapshot(2), Some(0b1000_1001));
    }

    #[test]
    fn test_unregistered_pin_is_silent() {
        let _ = take_log();
        let mut pins = dispatcher();
        pins.register(1 << 9, isr_a);

        // D10 is in the same bank but was never armed
        pins.hardware_mut().set_pin(10, true);
        run_pending(&mut pins);
        pins.service(0);

        assert!(take_log().is_empty());
    }

    #[test]
    fn test_deregister() {
        let _ = take_log();
        let mut pins = dispatcher();
        pins.register(1 << 4, isr_a);
        pins.deregister(1 << 4);
        assert!(!pins.is_registered(4));

        pins.hardware_mut().set_pin(4, true);
        run_pending(&mut pins);
        pins.service(2);

        assert!(take_log().is_empty());
    }

    #[test]
    fn test_deregister_unregistered_is_noop() {
        let _ = take_log();
        let mut pins = dispatcher();
        pins.register(1 << 3, isr_a);
        pins.deregister(1 << 12);
        pins.deregister(1 << 12);
        assert_eq!(pins.monitored(), 1 << 3);

        pins.hardware_mut().set_pin(3, true);
        run_pending(&mut pins);
        assert_eq!(take_log().as_slice(), b"a");
    }

    #[test]
    fn test_reregister_replaces_handler() {
        let _ = take_log();
        let mut pins = dispatcher();
        pins.register(1 << 17, isr_a);
        pins.register(1 << 17, isr_b);

        pins.hardware_mut().set_pin(17, true);
        run_pending(&mut pins);

        assert_eq!(take_log().as_slice(), b"b");
    }

    #[test]
    fn test_update_masks_touched_banks() {
        let mut pins = dispatcher();
        pins.hardware_mut().clear_log();
        pins.register((1 << 1) | (1 << 9), isr_a);

        let log = pins.hardware().log();
        let first_arm = log
            .iter()
            .position(|op| matches!(op, PinOp::Arm(..)))
            .unwrap();
        let last_arm = log
            .iter()
            .rposition(|op| matches!(op, PinOp::Arm(..)))
            .unwrap();

        for op in &log[..first_arm] {
            assert!(matches!(op, PinOp::Mask(_)));
        }
        for op in &log[last_arm + 1..] {
            assert!(matches!(op, PinOp::Unmask(_)));
        }
        assert!(log.contains(&PinOp::Mask(0)));
        assert!(log.contains(&PinOp::Mask(2)));
        assert!(!log.contains(&PinOp::Mask(1)));
        assert!(pins.hardware().masked_banks() == 0);
    }

    #[test]
    fn test_deregister_masks_touched_banks() {
        let mut pins = dispatcher();
        pins.register((1 << 1) | (1 << 9), isr_a);
        pins.hardware_mut().clear_log();
        pins.deregister((1 << 1) | (1 << 9));

        let log = pins.hardware().log();
        let first_disarm = log
            .iter()
            .position(|op| matches!(op, PinOp::Disarm(..)))
            .unwrap();
        let last_disarm = log
            .iter()
            .rposition(|op| matches!(op, PinOp::Disarm(..)))
            .unwrap();

        assert!(first_disarm > 0);
        for op in &log[..first_disarm] {
            assert!(matches!(op, PinOp::Mask(_)));
        }
        for op in &log[first_disarm..=last_disarm] {
            assert!(matches!(op, PinOp::Disarm(..)));
        }
        assert!(last_disarm + 1 < log.len());
        for op in &log[last_disarm + 1..] {
            assert!(matches!(op, PinOp::Unmask(_)));
        }
        assert!(log.contains(&PinOp::Mask(0)));
        assert!(log.contains(&PinOp::Mask(2)));
        assert!(!log.contains(&PinOp::Mask(1)));
        assert!(log.contains(&PinOp::Unmask(0)));
        assert!(log.contains(&PinOp::Unmask(2)));
        assert_eq!(pins.hardware().masked_banks(), 0);
        assert_eq!(pins.monitored(), 0);
    }

    #[test]
    fn test_pending_neighbour_survives_deregistration() {
        let _ = take_log();
        let mut pins = dispatcher();
        pins.register(1 << 0, isr_a);
        pins.register(1 << 1, isr_b);

        pins.hardware_mut().set_pin(0, true);
        run_pending(&mut pins);

        // D1 changes, then D0 is dropped before the interrupt is serviced
        pins.hardware_mut().set_pin(1, true);
        pins.deregister(1 << 0);
        assert_eq!(pins.hardware().masked_banks(), 0);
        run_pending(&mut pins);

        assert_eq!(take_log().as_slice(), b"ab");
        assert_eq!(pins.snapshot(2), Some(1 << 1));
    }

    #[test]
    fn test_pending_neighbour_survives_registration() {
        let _ = take_log();
        let mut pins = dispatcher();
        pins.register(1 << 0, isr_a);

        // D0 changes, then D1 is registered before the interrupt is serviced
        pins.hardware_mut().set_pin(0, true);
        pins.register(1 << 1, isr_b);
        run_pending(&mut pins);

        assert_eq!(take_log().as_slice(), b"a");
    }

    #[test]
    fn test_registering_high_pin_does_not_fire() {
        let _ = take_log();
        let mut pins = dispatcher();
        pins.hardware_mut().set_pin(18, true);
        pins.register(1 << 18, isr_a);
        run_pending(&mut pins);
        pins.service(1);

        assert!(take_log().is_empty());
        assert_eq!(pins.snapshot(1), Some(1 << 4));
    }

    #[test]
    fn test_out_of_range_pins_ignored() {
        let mut pins = dispatcher();
        pins.register(0xFFF0_0000, isr_a);
        assert_eq!(pins.monitored(), 0);
        assert!(pins.snapshot(3).is_none());
        pins.service(7);
    }

    proptest! {
        /// Exactly the registered pins that changed fire, once each, ascending.
        #[test]
        fn prop_dispatch_matches_registered_changes(
            registered in 0u32..(1 << 20),
            initial in 0u32..(1 << 20),
            next in 0u32..(1 << 20),
        ) {
            let _ = take_log();
            let mut pins = dispatcher();
            for pin in 0..20u8 {
                pins.hardware_mut().set_pin(pin, initial & (1 << pin) != 0);
            }
            for pin in 0..20usize {
                if registered & (1 << pin) != 0 {
                    pins.register(1 << pin, PIN_ISRS[pin]);
                }
            }
            run_pending(&mut pins);
            prop_assert!(take_log().is_empty());

            for pin in 0..20u8 {
                pins.hardware_mut().set_pin(pin, next & (1 << pin) != 0);
            }
            run_pending(&mut pins);

            let log = take_log();
            let fired: u32 = log.iter().fold(0, |mask, pin| mask | (1 << pin));
            prop_assert_eq!(fired, registered & (initial ^ next));
            prop_assert_eq!(log.len() as u32, fired.count_ones());

            // Ascending within each bank (PCINT0, PCINT1, PCINT2 service order)
            for bank_pins in [8u8..14, 14..20, 0..8] {
                let in_bank: std::vec::Vec<u8> =
                    log.iter().copied().filter(|p| bank_pins.contains(p)).collect();
                prop_assert!(in_bank.windows(2).all(|w| w[0] < w[1]));
            }
        }
    }
}
