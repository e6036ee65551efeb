//! GPIO plumbing and a 4-bit HD44780 character LCD driver.
//!
//! The driver in [lcd::hd44780::driver] only talks to the hardware through two small capabilities:
//! [MaskedGpio], which writes several pins of one 32-bit GPIO bank at once, and [Delay], a blocking
//! millisecond sleep. Backends for the Raspberry Pi are in [raw] (memory-mapped registers) and
//! [gpiod] (Linux GPIO character device).
pub mod gpiod;
pub mod lcd;
pub mod raw;

#[cfg(test)]
pub(crate) mod mock;

use std::fmt::Debug;
use std::thread::sleep;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, Eq, PartialEq, Clone)]
pub enum GpioError {
    #[error("pin already in use")]
    AlreadyInUse,
    #[error("invalid argument")]
    InvalidArgument,
    #[error("IO error: {0}")]
    Io(std::io::ErrorKind),
}

impl From<std::io::Error> for GpioError {
    fn from(err: std::io::Error) -> Self {
        GpioError::Io(err.kind())
    }
}

pub type GpioResult<T> = Result<T, GpioError>;

/// Number of pins addressable by a single mask. Pin `p` is bit `1 << p`.
pub const BANK_WIDTH: u8 = 32;

/// A GPIO bank that can be driven through bit-masks.
///
/// Bit `p` of every mask and value refers to physical pin `p`. Implementations must leave every
/// pin outside of the mask untouched.
pub trait MaskedGpio: Debug {
    /// Claims all the pins in the mask, configures them as outputs and drives them low.
    fn init_outputs(&mut self, mask: u32) -> GpioResult<()>;

    /// Sets the pins in `mask` to the corresponding bits of `value`.
    fn write_masked(&mut self, mask: u32, value: u32) -> GpioResult<()>;

    /// Drives a single pin high or low.
    fn write_pin(&mut self, pin: u8, level: bool) -> GpioResult<()>;
}

/// Blocking delay.
pub trait Delay: Debug {
    /// Blocks the calling thread for at least `ms` milliseconds.
    fn delay_ms(&mut self, ms: u32);
}

/// [Delay] backed by [std::thread::sleep].
#[derive(Copy, Clone, Debug, Default)]
pub struct ThreadSleep;

impl Delay for ThreadSleep {
    fn delay_ms(&mut self, ms: u32) {
        sleep(Duration::from_millis(ms as u64));
    }
}

/// Iterates over the pin numbers set in a mask, lowest first.
pub fn mask_pins(mask: u32) -> impl Iterator<Item = u8> {
    (0..BANK_WIDTH).filter(move |pin| mask & (1 << pin) != 0)
}
