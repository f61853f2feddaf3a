//! Hardware periodic timers
//!
//! A configured timer offers two callback slots in CTC mode and three in
//! Normal mode. Each slot is served by one of the timer's interrupt vectors;
//! the vector is only enabled once a callback is registered for its slot.

use cowpi_hal::{Isr, TimerHardware, TimerVector};

use super::search::{search, TimerChoice};
use super::{TimerError, TimerMode};
use crate::config::{Board, SystemClock, TimerSpec, MAX_TIMERS};
use crate::interrupts::do_nothing;

/// Most slots any mode offers
pub const MAX_SLOTS: usize = TimerMode::Normal.slots();

#[derive(Clone, Copy)]
struct TimerState {
    choice: Option<TimerChoice>,
    slots: [Isr; MAX_SLOTS],
}

impl TimerState {
    const UNCONFIGURED: Self = Self {
        choice: None,
        slots: [do_nothing as Isr; MAX_SLOTS],
    };
}

/// Periodic timer manager for one board
pub struct PeriodicTimers<H> {
    hw: H,
    board: Board,
    clock: SystemClock,
    timers: [TimerState; MAX_TIMERS],
}

impl<H: TimerHardware> PeriodicTimers<H> {
    /// Create a manager using the board's own CPU clock
    pub fn new(hw: H, board: Board) -> Self {
        Self::with_clock(hw, board, board.system_clock())
    }

    /// Create a manager for a board clocked at a non-standard rate
    pub fn with_clock(hw: H, board: Board, clock: SystemClock) -> Self {
        Self {
            hw,
            board,
            clock,
            timers: [TimerState::UNCONFIGURED; MAX_TIMERS],
        }
    }

    fn spec(&self, timer: u8) -> Result<TimerSpec, TimerError> {
        self.board.timer(timer).ok_or(TimerError::InvalidTimer)
    }

    /// Configure `timer` for the period closest to `desired_us`
    ///
    /// Returns the period the hardware will actually produce. A successful
    /// configuration disables the timer's interrupts and clears all of its
    /// slots; a failed one leaves the previous configuration running.
    pub fn configure_timer(&mut self, timer: u8, desired_us: f32) -> Result<f32, TimerError> {
        let spec = self.spec(timer)?;
        let choice = match search(&spec, self.clock, desired_us) {
            Ok(choice) => choice,
            Err(e) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("timer {}: cannot produce {} us: {}", timer, desired_us, e);
                return Err(e);
            }
        };

        self.hw.apply(timer, &choice.setup(&spec));
        self.timers[usize::from(timer)] = TimerState {
            choice: Some(choice),
            ..TimerState::UNCONFIGURED
        };

        #[cfg(feature = "defmt")]
        defmt::debug!(
            "timer {}: /{} x {} ticks = {} us ({})",
            timer,
            choice.prescaler,
            choice.count,
            choice.period_us,
            choice.mode
        );

        Ok(choice.period_us)
    }

    /// Bind `isr` to `slot` of a configured timer and enable its vector
    ///
    /// A callback already in the slot is replaced.
    pub fn register_periodic_callback(
        &mut self,
        timer: u8,
        slot: usize,
        isr: Isr,
    ) -> Result<(), TimerError> {
        self.spec(timer)?;
        let state = &mut self.timers[usize::from(timer)];
        let mode = state.choice.ok_or(TimerError::NotConfigured)?.mode;
        let vector = mode
            .vector_for_slot(slot)
            .ok_or(TimerError::SlotOutOfRange)?;

        state.slots[slot] = isr;
        self.hw.enable_vector(timer, vector);
        Ok(())
    }

    /// Restart `timer` so slot 0 next fires one full period from now
    pub fn reset_timer(&mut self, timer: u8) -> Result<(), TimerError> {
        self.spec(timer)?;
        if self.timers[usize::from(timer)].choice.is_none() {
            return Err(TimerError::NotConfigured);
        }
        self.hw.reset_counter(timer);
        Ok(())
    }

    /// Callback currently bound to `vector` of `timer`
    ///
    /// Vectors outside the timer's mode and unconfigured timers yield the
    /// no-op callback.
    pub fn isr_for(&self, timer: u8, vector: TimerVector) -> Isr {
        let Some(state) = self.timers.get(usize::from(timer)) else {
            return do_nothing;
        };
        let Some(choice) = state.choice else {
            return do_nothing;
        };
        (0..choice.mode.slots())
            .find(|&slot| choice.mode.vector_for_slot(slot) == Some(vector))
            .map_or(do_nothing as Isr, |slot| state.slots[slot])
    }

    /// Service an interrupt of `timer`; called from its vector
    pub fn service(&self, timer: u8, vector: TimerVector) {
        let isr = self.isr_for(timer, vector);
        isr();
    }

    /// Current configuration of `timer`
    pub fn config(&self, timer: u8) -> Option<TimerChoice> {
        self.timers.get(usize::from(timer)).and_then(|state| state.choice)
    }

    /// Number of slots `timer` offers in its current mode
    pub fn slot_count(&self, timer: u8) -> usize {
        self.config(timer).map_or(0, |choice| choice.mode.slots())
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::FakeTimers;
    use crate::testing::{record, take_log};

    fn isr_a() {
        record(b'a');
    }
    fn isr_b() {
        record(b'b');
    }
    fn isr_c() {
        record(b'c');
    }

    fn timers() -> PeriodicTimers<FakeTimers> {
        PeriodicTimers::new(FakeTimers::default(), Board::Atmega328p)
    }

    #[test]
    fn test_configure_writes_registers() {
        let mut timers = timers();
        assert_eq!(timers.configure_timer(2, 1000.0), Ok(1000.0));

        let setup = timers.hardware().setup(2).unwrap();
        assert_eq!(setup.compare_a, 249);
        assert_eq!(setup.compare_b, 124);
        assert_eq!(timers.hardware().enabled(2), 0);
        assert_eq!(timers.slot_count(2), 2);
    }

    #[test]
    fn test_invalid_timer() {
        let mut timers = timers();
        assert_eq!(timers.configure_timer(0, 1000.0), Err(TimerError::InvalidTimer));
        assert_eq!(timers.configure_timer(3, 1000.0), Err(TimerError::InvalidTimer));
        assert_eq!(
            timers.register_periodic_callback(0, 0, isr_a),
            Err(TimerError::InvalidTimer)
        );
        assert_eq!(timers.reset_timer(7), Err(TimerError::InvalidTimer));
        assert!(timers.hardware().setup(0).is_none());
    }

    #[test]
    fn test_register_requires_configuration() {
        let mut timers = timers();
        assert_eq!(
            timers.register_periodic_callback(1, 0, isr_a),
            Err(TimerError::NotConfigured)
        );
        assert_eq!(timers.reset_timer(1), Err(TimerError::NotConfigured));
    }

    #[test]
    fn test_ctc_slots() {
        let _ = take_log();
        let mut timers = timers();
        timers.configure_timer(1, 500.0).unwrap();
        timers.register_periodic_callback(1, 0, isr_a).unwrap();
        timers.register_periodic_callback(1, 1, isr_b).unwrap();
        assert_eq!(
            timers.register_periodic_callback(1, 2, isr_c),
            Err(TimerError::SlotOutOfRange)
        );

        let enabled = timers.hardware().enabled(1);
        assert_eq!(
            enabled,
            TimerVector::CompareA.enable_bit() | TimerVector::CompareB.enable_bit()
        );

        timers.service(1, TimerVector::CompareA);
        timers.service(1, TimerVector::CompareB);
        timers.service(1, TimerVector::Overflow);
        assert_eq!(take_log().as_slice(), b"ab");
    }

    #[test]
    fn test_normal_slots() {
        let _ = take_log();
        let mut timers = timers();
        assert_eq!(timers.configure_timer(2, 16384.0), Ok(16384.0));
        assert_eq!(timers.slot_count(2), 3);

        timers.register_periodic_callback(2, 0, isr_a).unwrap();
        timers.register_periodic_callback(2, 1, isr_b).unwrap();
        timers.register_periodic_callback(2, 2, isr_c).unwrap();
        assert_eq!(timers.hardware().enabled(2), 0b111);

        timers.service(2, TimerVector::CompareB);
        timers.service(2, TimerVector::Overflow);
        timers.service(2, TimerVector::CompareA);
        assert_eq!(take_log().as_slice(), b"cab");
    }

    #[test]
    fn test_reconfiguration_clears_slots() {
        let _ = take_log();
        let mut timers = timers();
        timers.configure_timer(1, 1000.0).unwrap();
        timers.register_periodic_callback(1, 0, isr_a).unwrap();
        timers.register_periodic_callback(1, 1, isr_b).unwrap();

        timers.configure_timer(1, 2000.0).unwrap();
        assert_eq!(timers.hardware().enabled(1), 0);
        timers.service(1, TimerVector::CompareA);
        timers.service(1, TimerVector::CompareB);
        assert!(take_log().is_empty());
    }

    #[test]
    fn test_failed_configuration_keeps_previous() {
        let _ = take_log();
        let mut timers = timers();
        timers.configure_timer(2, 1000.0).unwrap();
        timers.register_periodic_callback(2, 0, isr_a).unwrap();
        let applied = timers.hardware().applies(2);

        assert_eq!(
            timers.configure_timer(2, 50_000.0),
            Err(TimerError::PeriodUnachievable)
        );
        assert_eq!(timers.configure_timer(2, 0.25), Err(TimerError::PeriodTooShort));
        assert_eq!(timers.hardware().applies(2), applied);
        assert_eq!(timers.config(2).map(|c| c.period_us), Some(1000.0));

        timers.service(2, TimerVector::CompareA);
        assert_eq!(take_log().as_slice(), b"a");
    }

    #[test]
    fn test_reset_keeps_callbacks() {
        let _ = take_log();
        let mut timers = timers();
        timers.configure_timer(1, 1000.0).unwrap();
        timers.register_periodic_callback(1, 0, isr_a).unwrap();

        timers.reset_timer(1).unwrap();
        assert_eq!(timers.hardware().resets(1), 1);
        assert_eq!(timers.config(1).map(|c| c.period_us), Some(1000.0));

        timers.service(1, TimerVector::CompareA);
        assert_eq!(take_log().as_slice(), b"a");
    }

    #[test]
    fn test_service_unconfigured_is_noop() {
        let _ = take_log();
        let timers = timers();
        timers.service(1, TimerVector::CompareA);
        timers.service(9, TimerVector::Overflow);
        assert!(take_log().is_empty());
    }

    #[test]
    fn test_custom_clock() {
        // At 8 MHz /32 reaches 1000 us in 250 ticks
        let mut timers =
            PeriodicTimers::with_clock(FakeTimers::default(), Board::Atmega328p, SystemClock::new(8.0));
        assert_eq!(timers.configure_timer(2, 1000.0), Ok(1000.0));
        assert_eq!(timers.config(2).map(|c| (c.prescaler, c.count)), Some((32, 250)));
    }
}
