//! HD44780 LCD module.
//!
//! Driver for HD44780-compatible character displays (1602, 2004 and alike) connected through a
//! 4-bit parallel bus: four data lines (D4-D7), register select and enable. R/W must be tied to
//! GND, the display is never read.
//!
//! The six signals can sit on any pins of one 32-pin GPIO bank. Every bus cycle writes the data
//! lines and RS with a single masked write, see [driver::PinMap] and [driver::GpioHD44780Display].

pub mod driver;
