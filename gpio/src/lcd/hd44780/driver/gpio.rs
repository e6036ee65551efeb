use crate::lcd::hd44780::driver::{
    CLEAR_DISPLAY, CursorDirection, HD44780Driver, PinMap, PinRole,
};
use crate::{Delay, GpioError, GpioResult, MaskedGpio};
use log::{debug, trace};

/// RS level of instruction bytes.
pub const COMMAND: bool = false;
/// RS level of character bytes.
pub const DATA: bool = true;

/// Upper nibble of the 8-bit function set, sent alone while the bus width is unknown.
const SYNC_8BIT: u8 = 0b0011;
/// Upper nibble of the 4-bit function set, switches the bus width.
const SYNC_4BIT: u8 = 0b0010;

/// Fixed waits of the bus protocol, in milliseconds.
///
/// The controller only needs microseconds for the enable pulse, but slow GPIO backends don't
/// always keep up, so the defaults are generous.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Timing {
    /// Wait after each edge of the enable pulse.
    pub enable_hold_ms: u32,
    /// Extra wait after clearing the display.
    pub clear_settle_ms: u32,
}

impl Default for Timing {
    fn default() -> Self {
        Timing {
            enable_hold_ms: 5,
            clear_settle_ms: 10,
        }
    }
}

/// HD44780 character display on a 4-bit bus, driven through a [MaskedGpio] bank.
///
/// The display is write-only (R/W tied to GND). Every byte goes out as two bus cycles, high
/// nibble first; in each cycle D7-D4 and RS are written at once, then E is pulsed and the
/// controller latches the nibble on the falling edge.
///
/// [Self::initialize] must be called once before anything else.
#[derive(Debug)]
pub struct GpioHD44780Display<'a> {
    gpio: &'a mut dyn MaskedGpio,
    delay: &'a mut dyn Delay,
    pins: PinMap,
    columns: u8,
    rows: u8,
    timing: Timing,
}

impl<'a> GpioHD44780Display<'a> {
    /// Creates a new display handle.
    ///
    /// # Parameters
    ///
    /// - `gpio`: GPIO bank the six signal pins belong to.
    /// - `delay`: Blocking delay used for the bus timing.
    /// - `pins`: Assignment of the bus signals to the pins of `gpio`.
    /// - `columns`: Visible characters per row, used for wrapping.
    /// - `rows`: Number of rows. 2 and 4 get their own addressing, anything else is addressed
    ///   as a single line.
    ///
    /// # Errors
    /// - `GpioError::InvalidArgument` if `columns` is 0.
    pub fn new(
        gpio: &'a mut dyn MaskedGpio,
        delay: &'a mut dyn Delay,
        pins: PinMap,
        columns: u8,
        rows: u8,
    ) -> GpioResult<Self> {
        if columns == 0 {
            return Err(GpioError::InvalidArgument);
        }

        Ok(GpioHD44780Display {
            gpio,
            delay,
            pins,
            columns,
            rows,
            timing: Timing::default(),
        })
    }

    pub fn with_timing(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }

    pub fn pins(&self) -> &PinMap {
        &self.pins
    }

    pub fn columns(&self) -> u8 {
        self.columns
    }

    pub fn rows(&self) -> u8 {
        self.rows
    }

    pub fn timing(&self) -> Timing {
        self.timing
    }

    /// 4-line panels are driven in two-line mode too, with the rows split by [super::ddram_address].
    fn two_line_mode(&self) -> bool {
        matches!(self.rows, 2 | 4)
    }

    /// Configures the pins and runs the reset sequence of the controller.
    ///
    /// The controller may be in 8-bit mode or halfway through a 4-bit byte, so the 8-bit function
    /// set is sent as a single cycle three times before switching to 4 bits. After that the line
    /// mode, entry mode and display control are programmed and the display is cleared.
    pub fn initialize(&mut self) -> GpioResult<()> {
        debug!(
            "Initializing {}x{} display, mask {:#010x}",
            self.columns,
            self.rows,
            self.pins.full_mask()
        );
        self.gpio.init_outputs(self.pins.full_mask())?;

        // Synchronize
        for _ in 0..3 {
            self.send_cycle(COMMAND, SYNC_8BIT)?;
        }
        self.send_cycle(COMMAND, SYNC_4BIT)?;
        debug!("Bus in 4-bit mode");

        self.function_set(false, self.two_line_mode(), false)?;
        self.set_entry_mode(CursorDirection::Right, false)?;
        self.set_display_control(true, false, false)?;
        self.clear_display()
    }

    /// Writes one nibble with the given RS level and pulses E.
    ///
    /// Only the low 4 bits of `nibble` are used. Pins outside of the data mask are left untouched.
    pub fn send_cycle(&mut self, rs: bool, nibble: u8) -> GpioResult<()> {
        let value = self.pins.encode_cycle(rs, nibble);
        trace!("Writing nibble: {:04b}, RS: {}", nibble & 0x0F, rs);
        self.gpio.write_masked(self.pins.data_mask(), value)?;
        self.pulse_e()
    }

    fn pulse_e(&mut self) -> GpioResult<()> {
        let pin_e = self.pins.pin(PinRole::E);
        // Set E pin to high
        self.gpio.write_pin(pin_e, true)?;
        self.delay.delay_ms(self.timing.enable_hold_ms);
        // Set E pin to low, the controller latches here
        self.gpio.write_pin(pin_e, false)?;
        self.delay.delay_ms(self.timing.enable_hold_ms);
        Ok(())
    }

    /// Sends a full byte as two bus cycles, high nibble first.
    pub fn send_byte(&mut self, rs: bool, byte: u8) -> GpioResult<()> {
        trace!("Sending data: {:08b}, RS: {}", byte, rs);
        self.send_cycle(rs, byte >> 4)?;
        self.send_cycle(rs, byte & 0x0F)
    }

    /// Clears the display and returns the cursor home.
    pub fn clear(&mut self) -> GpioResult<()> {
        self.clear_display()
    }

    /// Shows a blinking cursor.
    pub fn cursor_on(&mut self) -> GpioResult<()> {
        self.set_display_control(true, true, true)
    }

    /// Hides the cursor. The display stays on.
    pub fn cursor_off(&mut self) -> GpioResult<()> {
        self.set_display_control(true, false, false)
    }

    /// Defines one of the eight custom glyphs (character codes 0-7).
    ///
    /// Each of the 8 `glyph` bytes is one row of pixels, top first, using the low 5 bits. The
    /// cursor is moved back home afterwards, since the CGRAM write leaves the address counter
    /// pointing into CGRAM.
    ///
    /// # Errors
    /// - `GpioError::InvalidArgument` if `slot` is above 7.
    pub fn create_char(&mut self, slot: u8, glyph: [u8; 8]) -> GpioResult<()> {
        if slot > 7 {
            return Err(GpioError::InvalidArgument);
        }
        self.set_cgram_address(slot << 3)?;
        for row in glyph {
            self.send_data(row & 0b00011111)?;
        }
        self.set_ddram_address(0)
    }
}

impl HD44780Driver for GpioHD44780Display<'_> {
    fn clear_display(&mut self) -> GpioResult<()> {
        self.send_command(CLEAR_DISPLAY)?;
        self.delay.delay_ms(self.timing.clear_settle_ms);
        Ok(())
    }

    fn send_command(&mut self, command: u8) -> GpioResult<()> {
        self.send_byte(COMMAND, command)
    }

    fn send_data(&mut self, data: u8) -> GpioResult<()> {
        self.send_byte(DATA, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{Event, bytes, cycles, recorder};
    use proptest::prelude::*;

    fn pins() -> PinMap {
        PinMap::new(2, 3, 4, 5, 6, 7).unwrap()
    }

    #[test]
    fn rejects_zero_columns() {
        let (mut gpio, mut delay, _) = recorder();
        let result = GpioHD44780Display::new(&mut gpio, &mut delay, pins(), 0, 2);
        assert_eq!(result.err(), Some(GpioError::InvalidArgument));
    }

    #[test]
    fn cycle_writes_then_pulses() {
        let (mut gpio, mut delay, log) = recorder();
        let mut lcd = GpioHD44780Display::new(&mut gpio, &mut delay, pins(), 16, 2).unwrap();
        lcd.send_cycle(DATA, 0b1010).unwrap();

        assert_eq!(
            *log.borrow(),
            vec![
                // D7 on pin 5, D5 on pin 3, RS on pin 6
                Event::WriteMasked { mask: 0b0111_1100, value: 0b0110_1000 },
                Event::WritePin { pin: 7, level: true },
                Event::Delay(5),
                Event::WritePin { pin: 7, level: false },
                Event::Delay(5),
            ]
        );
    }

    #[test]
    fn cycle_ignores_high_bits_of_nibble() {
        let (mut gpio, mut delay, log) = recorder();
        let mut lcd = GpioHD44780Display::new(&mut gpio, &mut delay, pins(), 16, 2).unwrap();
        lcd.send_cycle(COMMAND, 0xF3).unwrap();
        assert_eq!(cycles(&log.borrow(), &pins()), vec![(COMMAND, 0x3)]);
    }

    proptest! {
        #[test]
        fn byte_is_two_cycles_high_first(rs in any::<bool>(), byte in any::<u8>()) {
            let (mut gpio, mut delay, log) = recorder();
            let mut lcd = GpioHD44780Display::new(&mut gpio, &mut delay, pins(), 16, 2).unwrap();
            lcd.send_byte(rs, byte).unwrap();
            prop_assert_eq!(
                cycles(&log.borrow(), &pins()),
                vec![(rs, byte >> 4), (rs, byte & 0x0F)]
            );
        }
    }

    #[test]
    fn initialize_sequence() {
        let (mut gpio, mut delay, log) = recorder();
        let mut lcd = GpioHD44780Display::new(&mut gpio, &mut delay, pins(), 16, 2).unwrap();
        lcd.initialize().unwrap();

        let log = log.borrow();
        assert_eq!(log[0], Event::InitOutputs(0b1111_1100));
        assert_eq!(log.last(), Some(&Event::Delay(10)));

        let cycles = cycles(&log, &pins());
        assert_eq!(
            cycles[..4],
            [(COMMAND, 0b0011), (COMMAND, 0b0011), (COMMAND, 0b0011), (COMMAND, 0b0010)]
        );
        assert_eq!(
            bytes(&cycles[4..]),
            vec![
                (COMMAND, 0b00101000),
                (COMMAND, 0b00000110),
                (COMMAND, 0b00001100),
                (COMMAND, 0b00000001),
            ]
        );
    }

    #[test]
    fn line_mode_follows_rows() {
        for (rows, function_set) in [(1, 0b00100000), (2, 0b00101000), (4, 0b00101000)] {
            let (mut gpio, mut delay, log) = recorder();
            let mut lcd =
                GpioHD44780Display::new(&mut gpio, &mut delay, pins(), 20, rows).unwrap();
            lcd.initialize().unwrap();
            let bytes = bytes(&cycles(&log.borrow(), &pins())[4..]);
            assert_eq!(bytes[0], (COMMAND, function_set), "rows = {}", rows);
        }
    }

    #[test]
    fn clear_twice() {
        let (mut gpio, mut delay, log) = recorder();
        let mut lcd = GpioHD44780Display::new(&mut gpio, &mut delay, pins(), 16, 2).unwrap();
        lcd.clear().unwrap();
        lcd.clear().unwrap();

        let log = log.borrow();
        assert_eq!(
            bytes(&cycles(&log, &pins())),
            vec![(COMMAND, CLEAR_DISPLAY), (COMMAND, CLEAR_DISPLAY)]
        );
        let settles = log.iter().filter(|&&event| event == Event::Delay(10)).count();
        assert_eq!(settles, 2);
    }

    #[test]
    fn cursor_commands() {
        let (mut gpio, mut delay, log) = recorder();
        let mut lcd = GpioHD44780Display::new(&mut gpio, &mut delay, pins(), 16, 2).unwrap();
        lcd.cursor_on().unwrap();
        lcd.cursor_off().unwrap();
        assert_eq!(
            bytes(&cycles(&log.borrow(), &pins())),
            vec![(COMMAND, 0b00001111), (COMMAND, 0b00001100)]
        );
    }

    #[test]
    fn custom_timing() {
        let (mut gpio, mut delay, log) = recorder();
        let timing = Timing {
            enable_hold_ms: 1,
            clear_settle_ms: 3,
        };
        let mut lcd = GpioHD44780Display::new(&mut gpio, &mut delay, pins(), 16, 2)
            .unwrap()
            .with_timing(timing);
        lcd.clear().unwrap();

        let delays: Vec<_> = log
            .borrow()
            .iter()
            .filter_map(|event| match event {
                Event::Delay(ms) => Some(*ms),
                _ => None,
            })
            .collect();
        assert_eq!(delays, vec![1, 1, 1, 1, 3]);
    }

    #[test]
    fn gpio_error_is_propagated() {
        let (mut gpio, mut delay, log) = recorder();
        gpio.fail_after = Some(3);
        let mut lcd = GpioHD44780Display::new(&mut gpio, &mut delay, pins(), 16, 2).unwrap();
        assert_eq!(
            lcd.initialize(),
            Err(GpioError::Io(std::io::ErrorKind::BrokenPipe))
        );
        // init, bus write, E high and its hold; E low fails
        assert_eq!(log.borrow().len(), 4);
    }

    #[test]
    fn create_char_writes_cgram_and_rehomes() {
        let (mut gpio, mut delay, log) = recorder();
        let mut lcd = GpioHD44780Display::new(&mut gpio, &mut delay, pins(), 16, 2).unwrap();
        let heart = [0x00, 0x0A, 0x1F, 0x1F, 0x0E, 0x04, 0x00, 0xE0];
        lcd.create_char(1, heart).unwrap();

        let bytes = bytes(&cycles(&log.borrow(), &pins()));
        assert_eq!(bytes[0], (COMMAND, 0b01001000));
        let glyph: Vec<u8> = bytes[1..9]
            .iter()
            .map(|&(rs, b)| {
                assert_eq!(rs, DATA);
                b
            })
            .collect();
        assert_eq!(glyph, vec![0x00, 0x0A, 0x1F, 0x1F, 0x0E, 0x04, 0x00, 0x00]);
        assert_eq!(bytes[9], (COMMAND, 0b10000000));
    }

    #[test]
    fn create_char_rejects_slot() {
        let (mut gpio, mut delay, log) = recorder();
        let mut lcd = GpioHD44780Display::new(&mut gpio, &mut delay, pins(), 16, 2).unwrap();
        assert_eq!(lcd.create_char(8, [0; 8]), Err(GpioError::InvalidArgument));
        assert!(log.borrow().is_empty());
    }
}
