//! GPIO through the Linux GPIO character device, using the gpiod library.
//!
//! All the claimed pins are requested as one set of output lines, so a masked write is a single
//! `set_values` call on the kernel side.
use crate::{BANK_WIDTH, GpioError, GpioResult, MaskedGpio, mask_pins};
use gpiod::Masked;
use log::debug;
use std::fmt::{Debug, Formatter};

/// GpiodDriver is a GPIO driver that uses the gpiod library to drive output lines.
pub struct GpiodDriver {
    chip: gpiod::Chip,
    /// Requested lines, and the pin behind each line offset of the request.
    lines: Option<(gpiod::Lines<gpiod::Output>, Vec<u8>)>,
}

impl GpiodDriver {
    pub fn new(chip: gpiod::Chip) -> Self {
        Self { chip, lines: None }
    }

    /// Opens a GPIO chip, eg. `/dev/gpiochip0`.
    pub fn open(path: &str) -> GpioResult<Self> {
        Ok(Self::new(gpiod::Chip::new(path)?))
    }
}

/// Translates a pin mask and value into line values of a request made for `pins`.
///
/// Bit `i` of the result stands for `pins[i]`.
///
/// # Errors
/// - `GpioError::InvalidArgument` if the mask contains a pin that wasn't requested.
fn line_values(pins: &[u8], mask: u32, value: u32) -> GpioResult<Masked<u32>> {
    let mut values = Masked { bits: 0, mask: 0 };
    for pin in mask_pins(mask) {
        let offset = pins
            .iter()
            .position(|&p| p == pin)
            .ok_or(GpioError::InvalidArgument)?;
        values.mask |= 1 << offset;
        if value & (1 << pin) != 0 {
            values.bits |= 1 << offset;
        }
    }
    Ok(values)
}

impl Debug for GpiodDriver {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "GpiodDriver({})", self.chip.name())
    }
}

impl MaskedGpio for GpiodDriver {
    /// Requests all the pins of the mask at once. A driver can only make one request.
    fn init_outputs(&mut self, mask: u32) -> GpioResult<()> {
        if self.lines.is_some() {
            return Err(GpioError::AlreadyInUse);
        }

        let n = (self.chip.num_lines() as usize).min(BANK_WIDTH as usize);
        if mask_pins(mask).any(|pin| pin as usize >= n) {
            return Err(GpioError::InvalidArgument);
        }

        let pins: Vec<u8> = mask_pins(mask).collect();
        let lines = self.chip.request_lines(
            gpiod::Options::output(pins.iter().map(|&pin| pin as u32).collect::<Vec<_>>())
                .values(vec![false; pins.len()])
                .consumer(env!("CARGO_PKG_NAME")),
        )?;
        self.lines = Some((lines, pins));

        debug!("{:?} requested outputs {:#010x}", self, mask);
        Ok(())
    }

    fn write_masked(&mut self, mask: u32, value: u32) -> GpioResult<()> {
        let (lines, pins) = self.lines.as_ref().ok_or(GpioError::InvalidArgument)?;
        lines.set_values(line_values(pins, mask, value)?)?;
        Ok(())
    }

    fn write_pin(&mut self, pin: u8, level: bool) -> GpioResult<()> {
        if pin >= BANK_WIDTH {
            return Err(GpioError::InvalidArgument);
        }
        let bit = 1 << pin;
        self.write_masked(bit, if level { bit } else { 0 })
    }
}
