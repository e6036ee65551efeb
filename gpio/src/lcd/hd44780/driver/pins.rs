use crate::{BANK_WIDTH, GpioError, GpioResult};
use log::debug;

/// Logical signal lines of the 4-bit HD44780 bus, in the order they are stored and encoded.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PinRole {
    D7 = 0,
    D6 = 1,
    D5 = 2,
    D4 = 3,
    /// Register select.
    Rs = 4,
    /// Enable (clock).
    E = 5,
}

/// Number of roles taking part in a bus cycle write, ie. everything except [PinRole::E].
pub const CYCLE_ROLES: usize = 5;
/// Number of all roles.
pub const ALL_ROLES: usize = 6;

/// Assignment of the bus signals to physical GPIO pins.
///
/// Fixed at construction. The bank masks are derived from the assignment and can't be set
/// separately.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct PinMap {
    pins: [u8; ALL_ROLES],
    data_mask: u32,
    full_mask: u32,
}

impl PinMap {
    /// Creates a pin map from physical pin numbers.
    ///
    /// # Errors
    /// - `GpioError::InvalidArgument` if two roles share a pin or a pin is outside the 32-pin bank.
    pub fn new(d4: u8, d5: u8, d6: u8, d7: u8, rs: u8, e: u8) -> GpioResult<Self> {
        let pins = [d7, d6, d5, d4, rs, e];

        if pins.iter().any(|&pin| pin >= BANK_WIDTH) {
            return Err(GpioError::InvalidArgument);
        }
        for (i, pin) in pins.iter().enumerate() {
            if pins[i + 1..].contains(pin) {
                return Err(GpioError::InvalidArgument);
            }
        }

        let mut map = PinMap {
            pins,
            data_mask: 0,
            full_mask: 0,
        };
        map.data_mask = map.encode(&[true; CYCLE_ROLES]);
        map.full_mask = map.encode(&[true; ALL_ROLES]);
        debug!(
            "Pin map D7-D4 {:?}, RS {}, E {}: data mask {:#010x}, full mask {:#010x}",
            &pins[..4],
            rs,
            e,
            map.data_mask,
            map.full_mask
        );
        Ok(map)
    }

    /// Physical pin of a role.
    pub fn pin(&self, role: PinRole) -> u8 {
        self.pins[role as usize]
    }

    /// Mask of D7, D6, D5, D4 and RS.
    pub fn data_mask(&self) -> u32 {
        self.data_mask
    }

    /// Mask of all six pins.
    pub fn full_mask(&self) -> u32 {
        self.full_mask
    }

    /// Maps logical values of the first `values.len()` roles (in [PinRole] order) onto a bank value.
    ///
    /// Bit `p` of the result is set iff a role mapped to pin `p` has value `true`. Values past the
    /// sixth are ignored.
    pub fn encode(&self, values: &[bool]) -> u32 {
        self.pins
            .iter()
            .zip(values)
            .filter(|&(_, &value)| value)
            .fold(0, |acc, (&pin, _)| acc | 1 << pin)
    }

    /// Bank value for one bus cycle: `nibble` bits 3..0 on D7..D4 and `rs` on RS. E stays low.
    pub fn encode_cycle(&self, rs: bool, nibble: u8) -> u32 {
        self.encode(&[
            nibble & 0b1000 != 0,
            nibble & 0b0100 != 0,
            nibble & 0b0010 != 0,
            nibble & 0b0001 != 0,
            rs,
        ])
    }

    /// Inverse of [Self::encode_cycle], reading back RS and the nibble from a bank value.
    pub fn decode_cycle(&self, value: u32) -> (bool, u8) {
        let bit = |role: PinRole| value & (1 << self.pin(role)) != 0;
        let nibble = [PinRole::D7, PinRole::D6, PinRole::D5, PinRole::D4]
            .into_iter()
            .fold(0u8, |acc, role| acc << 1 | bit(role) as u8);
        (bit(PinRole::Rs), nibble)
    }
}
