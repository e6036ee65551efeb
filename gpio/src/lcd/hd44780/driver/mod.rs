//! HD44780 command set and the 4-bit GPIO implementation.
//!
//! [HD44780Driver] builds every instruction byte from its flags and hands it over to
//! [HD44780Driver::send_command]; the bus specific part is implemented by
//! [GpioHD44780Display].

mod address;
mod gpio;
mod pins;
mod text;

use crate::{GpioError, GpioResult};
pub use address::*;
pub use gpio::*;
pub use pins::*;
use std::fmt::Debug;

/// Clear display instruction.
pub const CLEAR_DISPLAY: u8 = 0b00000001;
/// Set DDRAM address instruction, address in the low 7 bits.
pub const SET_DDRAM_ADDRESS: u8 = 0b10000000;

pub trait HD44780Driver: Debug {
    /// Clears the display and sets the cursor to the home position.
    fn clear_display(&mut self) -> GpioResult<()> {
        self.send_command(CLEAR_DISPLAY)
    }

    /// Sets the display to the specified entry mode.
    fn set_entry_mode(&mut self, cursor_direction: CursorDirection, shift: bool) -> GpioResult<()> {
        let mut command = 0b00000100;
        if cursor_direction == CursorDirection::Right {
            command |= 0b00000010;
        }
        if shift {
            command |= 0b00000001;
        }
        self.send_command(command)
    }

    /// Sets the display on/off, cursor on/off, and blinking on/off.
    fn set_display_control(
        &mut self,
        display_on: bool,
        cursor_on: bool,
        blink_on: bool,
    ) -> GpioResult<()> {
        let mut command = 0b00001000;
        if display_on {
            command |= 0b00000100;
        }
        if cursor_on {
            command |= 0b00000010;
        }
        if blink_on {
            command |= 0b00000001;
        }
        self.send_command(command)
    }

    /// Sets the bus width, line mode and font.
    ///
    /// `data_length` selects the 8-bit bus, `two_lines` the two-line addressing mode and `font`
    /// the 5x10 dot font.
    fn function_set(&mut self, data_length: bool, two_lines: bool, font: bool) -> GpioResult<()> {
        let mut command = 0b00100000;
        if data_length {
            command |= 0b00010000;
        }
        if two_lines {
            command |= 0b00001000;
        }
        if font {
            command |= 0b00000100;
        }
        self.send_command(command)
    }

    /// Sets the CGRAM address.
    fn set_cgram_address(&mut self, address: u8) -> GpioResult<()> {
        if address > 0b00111111 {
            return Err(GpioError::InvalidArgument);
        }
        let command = 0b01000000 | address;
        self.send_command(command)
    }

    /// Sets the DDRAM address. Bit 7 of `address` is ignored.
    fn set_ddram_address(&mut self, address: u8) -> GpioResult<()> {
        self.send_command(SET_DDRAM_ADDRESS | address)
    }

    /// Sends an instruction byte with RS low.
    fn send_command(&mut self, command: u8) -> GpioResult<()>;

    /// Sends a data byte with RS high.
    fn send_data(&mut self, data: u8) -> GpioResult<()>;
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum CursorDirection {
    /// Moves the cursor to the left after writing data.
    Left,
    /// Moves the cursor to the right after writing data.
    Right,
}
