//! 4x4 matrix keypad
//!
//! ```text
//!          col 0  col 1  col 2  col 3
//! row 0      1      2      3      A
//! row 1      4      5      6      B
//! row 2      7      8      9      C
//! row 3      *      0      #      D
//! ```
//!
//! Rows are outputs and columns are pulled-up inputs. A row is selected by
//! driving it low with the others high; a pressed key then pulls its column
//! low. Between scans every row is left low so that any keypress pulls a
//! column low, which lets a pin-change interrupt on the columns wake the
//! application.
//!
//! On the Uno / Nano kit the rows are D4-D7 and the columns are D14-D17.

use cowpi_hal::{InputPin, OutputPin};

use super::debounce::ShortDebouncer;
use super::names::InputName;

/// Keypad rows and columns
pub const KEYPAD_SIZE: usize = 4;

/// Legend of each key, indexed `[row][column]`
pub const KEY_LEGENDS: [[char; KEYPAD_SIZE]; KEYPAD_SIZE] = [
    ['1', '2', '3', 'A'],
    ['4', '5', '6', 'B'],
    ['7', '8', '9', 'C'],
    ['*', '0', '#', 'D'],
];

/// Bit of each key in a pressed-key vector, indexed `[row][column]`
///
/// Digits and letters use their hexadecimal value; `#` is 14 and `*` is 15.
pub const KEY_BITS: [[u8; KEYPAD_SIZE]; KEYPAD_SIZE] = [
    [1, 2, 3, 10],
    [4, 5, 6, 11],
    [7, 8, 9, 12],
    [15, 0, 14, 13],
];

/// Bit of `key` in a pressed-key vector
pub fn key_bit(key: char) -> Option<u8> {
    KEY_LEGENDS.iter().enumerate().find_map(|(row, legends)| {
        legends
            .iter()
            .position(|&legend| legend == key)
            .map(|column| KEY_BITS[row][column])
    })
}

/// Matrix keypad scanner
pub struct KeypadScanner<R, C> {
    rows: [R; KEYPAD_SIZE],
    columns: [C; KEYPAD_SIZE],
}

impl<R: OutputPin, C: InputPin> KeypadScanner<R, C> {
    /// Take the row outputs and column inputs; every row is driven low
    pub fn new(rows: [R; KEYPAD_SIZE], columns: [C; KEYPAD_SIZE]) -> Self {
        let mut scanner = Self { rows, columns };
        scanner.release_rows();
        scanner
    }

    fn select_row(&mut self, selected: usize) {
        for (row, pin) in self.rows.iter_mut().enumerate() {
            pin.set_state(row != selected);
        }
    }

    fn release_rows(&mut self) {
        for pin in self.rows.iter_mut() {
            pin.set_low();
        }
    }

    fn is_pressed(&mut self, row: usize, column: usize) -> bool {
        self.select_row(row);
        self.columns[column].is_low()
    }

    /// First pressed key, or `None` if no key is pressed
    ///
    /// Keys are checked a column at a time, top to bottom, so with several
    /// keys down the leftmost column wins.
    pub fn keypress(&mut self) -> Option<char> {
        let mut found = None;
        'scan: for column in 0..KEYPAD_SIZE {
            for row in 0..KEYPAD_SIZE {
                if self.is_pressed(row, column) {
                    found = Some(KEY_LEGENDS[row][column]);
                    break 'scan;
                }
            }
        }
        self.release_rows();
        found
    }

    /// Every pressed key as a bit-vector, one bit per [`KEY_BITS`] entry
    pub fn keypresses(&mut self) -> u16 {
        let mut pressed = 0u16;
        for column in 0..KEYPAD_SIZE {
            for row in 0..KEYPAD_SIZE {
                if self.is_pressed(row, column) {
                    pressed |= 1 << KEY_BITS[row][column];
                }
            }
        }
        self.release_rows();
        pressed
    }

    /// Scan every key and run the vector through the keypad's debounce record
    pub fn debounced_keypresses(&mut self, debouncer: &mut ShortDebouncer, now_ms: u32) -> u16 {
        let raw = self.keypresses();
        debouncer.debounce(raw, InputName::Keypad, now_ms)
    }

    /// Release the pins
    pub fn into_inner(self) -> ([R; KEYPAD_SIZE], [C; KEYPAD_SIZE]) {
        (self.rows, self.columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::FakeKeyMatrix;

    fn bits(keys: &str) -> u16 {
        keys.chars()
            .map(|key| 1u16 << key_bit(key).unwrap())
            .fold(0, |mask, bit| mask | bit)
    }

    #[test]
    fn test_no_key() {
        let matrix = FakeKeyMatrix::new();
        let mut keypad = KeypadScanner::new(matrix.rows(), matrix.columns());
        assert_eq!(keypad.keypress(), None);
        assert_eq!(keypad.keypresses(), 0);
    }

    #[test]
    fn test_every_key_alone() {
        let matrix = FakeKeyMatrix::new();
        let mut keypad = KeypadScanner::new(matrix.rows(), matrix.columns());
        for (row, legends) in KEY_LEGENDS.iter().enumerate() {
            for (column, &legend) in legends.iter().enumerate() {
                matrix.release_all();
                matrix.press(row, column);
                assert_eq!(keypad.keypress(), Some(legend));
                assert_eq!(keypad.keypresses(), 1 << KEY_BITS[row][column]);
            }
        }
    }

    #[test]
    fn test_key_bits_are_hex_values() {
        assert_eq!(key_bit('0'), Some(0));
        assert_eq!(key_bit('9'), Some(9));
        assert_eq!(key_bit('D'), Some(13));
        assert_eq!(key_bit('#'), Some(14));
        assert_eq!(key_bit('*'), Some(15));
        assert_eq!(key_bit('E'), None);
    }

    #[test]
    fn test_digits_and_pound() {
        let matrix = FakeKeyMatrix::new();
        let mut keypad = KeypadScanner::new(matrix.rows(), matrix.columns());
        for key in "1234#".chars() {
            matrix.press_key(key);
        }
        assert_eq!(keypad.keypresses(), bits("1234#"));
        assert_eq!(keypad.keypresses(), 0b0100_0000_0001_1110);
    }

    #[test]
    fn test_multiple_keys_leftmost_column_wins() {
        let matrix = FakeKeyMatrix::new();
        let mut keypad = KeypadScanner::new(matrix.rows(), matrix.columns());
        matrix.press_key('5');
        matrix.press_key('7');
        matrix.press_key('D');
        assert_eq!(keypad.keypress(), Some('7'));
        assert_eq!(keypad.keypresses(), bits("57D"));
    }

    #[test]
    fn test_rows_low_between_scans() {
        let matrix = FakeKeyMatrix::new();
        let mut keypad = KeypadScanner::new(matrix.rows(), matrix.columns());
        assert_eq!(matrix.driven_low(), 0b1111);

        matrix.press_key('8');
        keypad.keypresses();
        assert_eq!(matrix.driven_low(), 0b1111);
        // Any key pulls its column low while idle
        assert_eq!(matrix.column_levels(), 0b1101);
    }

    #[test]
    fn test_debounced_keypresses() {
        let matrix = FakeKeyMatrix::new();
        let mut keypad = KeypadScanner::new(matrix.rows(), matrix.columns());
        let mut debouncer = ShortDebouncer::default();
        assert_eq!(keypad.debounced_keypresses(&mut debouncer, 0), 0);

        matrix.press_key('0');
        assert_eq!(keypad.debounced_keypresses(&mut debouncer, 10), 0);
        assert_eq!(keypad.debounced_keypresses(&mut debouncer, 30), 0);
        assert_eq!(keypad.debounced_keypresses(&mut debouncer, 50), 1);
        assert_eq!(debouncer.stable(InputName::Keypad), 1);
    }
}
