//! Raspberry Pi GPIO through the memory-mapped BCM283x register block.
//!
//! Bank 0 (pins 0-31) has dedicated set and clear registers, so a masked write is two register
//! writes and never disturbs pins outside of the mask.
use crate::{GpioError, GpioResult, MaskedGpio, mask_pins};
use bitvec::vec::BitVec;
use log::debug;
use memmap2::{MmapOptions, MmapRaw};
use std::fmt::{Debug, Formatter};
use std::fs::OpenOptions;

/// GPFSELn function of an output pin.
const FUNCTION_OUTPUT: u8 = 0b001;

/// GPSET0 register offset.
const GPSET0: usize = 0x1c;
/// GPCLR0 register offset.
const GPCLR0: usize = 0x28;
/// GPIO_PUP_PDN_CNTRL_REG0 register offset.
const GPIO_PUP_PDN_CNTRL_REG0: usize = 0xe4;

pub struct RawGpioDriver {
    mmap: MmapRaw,
    used_pins: BitVec,
}

impl RawGpioDriver {
    // #[cfg(target_pointer_width = "64")]
    // const GPIO_BASE: u64 = 0xFE200000;
    const GPIO_BASE: u64 = 0x3F200000;

    const PIN_COUNT: usize = 58;

    fn create(path: &str, offset: u64) -> GpioResult<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;

        let mmap = MmapOptions::new().offset(offset).len(4096).map_raw(&file)?;
        debug!("Mapped GPIO registers from {} at {:#x}", path, offset);

        Ok(RawGpioDriver {
            mmap,
            used_pins: BitVec::repeat(false, Self::PIN_COUNT),
        })
    }

    /// Maps `/dev/gpiomem`, which only exposes the GPIO block and doesn't need root.
    pub fn new_gpiomem() -> GpioResult<Self> {
        Self::create("/dev/gpiomem", 0)
    }

    /// Maps the GPIO block from `/dev/mem`.
    pub fn new_mem() -> GpioResult<Self> {
        Self::create("/dev/mem", Self::GPIO_BASE)
    }

    fn register(&self, offset: usize) -> *mut u32 {
        let mmap = self.mmap.as_mut_ptr() as *mut u32;
        unsafe { mmap.add(offset / 4) }
    }

    pub fn raw_set_pin_function(&self, pin_index: usize, function: u8) -> GpioResult<()> {
        if function > 0b111 {
            return Err(GpioError::InvalidArgument);
        }

        if pin_index >= Self::PIN_COUNT {
            return Err(GpioError::InvalidArgument);
        }

        // GPFSELn register
        let register_ptr = self.register(pin_index / 10 * 4);
        let shift = (pin_index % 10) * 3;

        let mut register_value = unsafe { register_ptr.read_volatile() };
        register_value &= !(0b111 << shift); // Clear the bits for this pin
        register_value |= (function as u32) << shift;
        unsafe { register_ptr.write_volatile(register_value) };

        Ok(())
    }

    /// Writes `bits` to GPSET0 (`high`) or GPCLR0. Zero bits leave their pins as they are.
    fn raw_write_bank0(&self, bits: u32, high: bool) {
        if bits == 0 {
            return;
        }
        let register_ptr = self.register(if high { GPSET0 } else { GPCLR0 });
        unsafe { register_ptr.write_volatile(bits) };
    }

    fn raw_set_pull_none(&self, pin_index: usize) -> GpioResult<()> {
        if pin_index >= Self::PIN_COUNT {
            return Err(GpioError::InvalidArgument);
        }

        // GPIO_PUP_PDN_CNTRL_REGn register (yes that is a long name)
        let register_ptr = self.register(GPIO_PUP_PDN_CNTRL_REG0 + pin_index / 16 * 4);
        let shift = (pin_index % 16) * 2;
        let mut register_value = unsafe { register_ptr.read_volatile() };
        register_value &= !(0b11 << shift);

        unsafe { register_ptr.write_volatile(register_value) };

        Ok(())
    }

    fn check_claimed(&self, mask: u32) -> GpioResult<()> {
        if mask_pins(mask).any(|pin| !self.used_pins[pin as usize]) {
            return Err(GpioError::InvalidArgument);
        }
        Ok(())
    }
}

impl Debug for RawGpioDriver {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "RawGpioDriver({:?})", self.mmap.as_ptr().addr())
    }
}

impl MaskedGpio for RawGpioDriver {
    fn init_outputs(&mut self, mask: u32) -> GpioResult<()> {
        if mask_pins(mask).any(|pin| self.used_pins[pin as usize]) {
            return Err(GpioError::AlreadyInUse);
        }

        for pin in mask_pins(mask) {
            let pin = pin as usize;
            self.used_pins.set(pin, true);
            self.raw_set_pull_none(pin)?;
            self.raw_set_pin_function(pin, FUNCTION_OUTPUT)?;
        }
        self.raw_write_bank0(mask, false);

        debug!("{:?} claimed outputs {:#010x}", self, mask);
        Ok(())
    }

    fn write_masked(&mut self, mask: u32, value: u32) -> GpioResult<()> {
        self.check_claimed(mask)?;
        self.raw_write_bank0(value & mask, true);
        self.raw_write_bank0(!value & mask, false);
        Ok(())
    }

    fn write_pin(&mut self, pin: u8, level: bool) -> GpioResult<()> {
        if pin >= crate::BANK_WIDTH {
            return Err(GpioError::InvalidArgument);
        }
        let bit = 1 << pin;
        self.check_claimed(bit)?;
        self.raw_write_bank0(bit, level);
        Ok(())
    }
}
