//! Recording GPIO and delay doubles for unit tests.
use crate::lcd::hd44780::driver::{PinMap, PinRole};
use crate::{Delay, GpioError, GpioResult, MaskedGpio};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Event {
    InitOutputs(u32),
    WriteMasked { mask: u32, value: u32 },
    WritePin { pin: u8, level: bool },
    Delay(u32),
}

pub type EventLog = Rc<RefCell<Vec<Event>>>;

/// Records every GPIO call. Can be told to fail after a number of successful writes.
#[derive(Debug, Default)]
pub struct MockGpio {
    pub log: EventLog,
    pub fail_after: Option<usize>,
}

impl MockGpio {
    fn record(&mut self, event: Event) -> GpioResult<()> {
        if let Some(remaining) = self.fail_after.as_mut() {
            if *remaining == 0 {
                return Err(GpioError::Io(std::io::ErrorKind::BrokenPipe));
            }
            *remaining -= 1;
        }
        self.log.borrow_mut().push(event);
        Ok(())
    }
}

impl MaskedGpio for MockGpio {
    fn init_outputs(&mut self, mask: u32) -> GpioResult<()> {
        self.record(Event::InitOutputs(mask))
    }

    fn write_masked(&mut self, mask: u32, value: u32) -> GpioResult<()> {
        self.record(Event::WriteMasked { mask, value })
    }

    fn write_pin(&mut self, pin: u8, level: bool) -> GpioResult<()> {
        self.record(Event::WritePin { pin, level })
    }
}

#[derive(Debug, Default)]
pub struct MockDelay {
    pub log: EventLog,
}

impl Delay for MockDelay {
    fn delay_ms(&mut self, ms: u32) {
        self.log.borrow_mut().push(Event::Delay(ms));
    }
}

/// A GPIO and a delay sharing one event log, so the relative order of both is kept.
pub fn recorder() -> (MockGpio, MockDelay, EventLog) {
    let log = EventLog::default();
    let gpio = MockGpio {
        log: log.clone(),
        fail_after: None,
    };
    let delay = MockDelay { log: log.clone() };
    (gpio, delay, log)
}

/// Decodes the bus cycles (RS, nibble) from an event log.
///
/// Panics if a bus write isn't followed by a complete enable pulse or touches pins outside the
/// data mask.
pub fn cycles(events: &[Event], pins: &PinMap) -> Vec<(bool, u8)> {
    let e = pins.pin(PinRole::E);
    let mut cycles = Vec::new();
    for (i, event) in events.iter().enumerate() {
        if let Event::WriteMasked { mask, value } = *event {
            assert_eq!(mask, pins.data_mask());
            assert_eq!(value & !mask, 0);
            let pulse = matches!(
                events.get(i + 1..i + 5),
                Some([
                    Event::WritePin { pin: high, level: true },
                    Event::Delay(_),
                    Event::WritePin { pin: low, level: false },
                    Event::Delay(_),
                ]) if *high == e && *low == e
            );
            assert!(pulse, "incomplete enable pulse after cycle {}", cycles.len());
            cycles.push(pins.decode_cycle(value));
        }
    }
    cycles
}

/// Joins bus cycles into (RS, byte) pairs, high nibble first.
pub fn bytes(cycles: &[(bool, u8)]) -> Vec<(bool, u8)> {
    assert_eq!(cycles.len() % 2, 0, "odd number of cycles");
    cycles
        .chunks_exact(2)
        .map(|pair| {
            assert_eq!(pair[0].0, pair[1].0, "RS changed within a byte");
            (pair[0].0, pair[0].1 << 4 | pair[1].1)
        })
        .collect()
}
