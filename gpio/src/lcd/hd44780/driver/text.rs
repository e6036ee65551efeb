use crate::GpioResult;
use crate::lcd::hd44780::driver::{GpioHD44780Display, HD44780Driver, ddram_address};
use log::warn;

impl GpioHD44780Display<'_> {
    /// Moves the cursor to a column and row.
    ///
    /// Positions outside of the configured geometry are still sent, the controller decides what
    /// happens with them.
    pub fn goto_position(&mut self, column: u8, row: u8) -> GpioResult<()> {
        if column >= self.columns() || row >= self.rows().max(1) {
            warn!(
                "Position ({}, {}) is outside of the {}x{} display",
                column,
                row,
                self.columns(),
                self.rows()
            );
        }
        let address = ddram_address(self.rows(), column, row);
        self.set_ddram_address(address as u8)
    }

    /// Writes the text at the cursor, stopping at the first NUL.
    ///
    /// The controller advances the cursor by itself; rows are not wrapped.
    pub fn print(&mut self, text: &str) -> GpioResult<()> {
        for c in text.chars().take_while(|&c| c != '\0') {
            self.send_data(char_code(c))?;
        }
        Ok(())
    }

    /// Writes the text from the top left corner, continuing on the next row every
    /// [Self::columns] characters.
    pub fn print_wrapped(&mut self, text: &str) -> GpioResult<()> {
        let columns = self.columns() as usize;
        self.goto_position(0, 0)?;

        for (i, c) in text.chars().take_while(|&c| c != '\0').enumerate() {
            self.send_data(char_code(c))?;
            let written = i + 1;
            if written % columns == 0 {
                self.goto_position(0, (written / columns) as u8)?;
            }
        }
        Ok(())
    }
}

/// Character ROM code of a char. Only ASCII maps 1:1.
fn char_code(c: char) -> u8 {
    if c.is_ascii() {
        c as u8
    } else {
        warn!("Non-ASCII character: {}", c);
        b'?'
    }
}
