use crate::Register;

/// Byte-wide access to the data space that holds the I/O registers.
///
/// Reads take `&mut self` because some registers have read side
/// effects (reading [Spsr][crate::registers::Spsr] arms the SPIF
/// clear, for example).
pub trait Io {
    /// Read a raw register.
    fn read(&mut self, address: u16) -> u8;

    /// Write a raw register.
    fn write(&mut self, address: u16, value: u8);

    /// Modify a raw register.
    #[inline(always)]
    fn modify(&mut self, address: u16, f: impl FnOnce(u8) -> u8) {
        let value = self.read(address);
        self.write(address, f(value));
    }

    /// Set the bits in `mask`, leaving the others alone.
    #[inline(always)]
    fn set_bits(&mut self, address: u16, mask: u8) {
        self.modify(address, |v| v | mask);
    }

    /// Clear the bits in `mask`, leaving the others alone.
    #[inline(always)]
    fn clear_bits(&mut self, address: u16, mask: u8) {
        self.modify(address, |v| v & !mask);
    }

    /// Read a register.
    #[inline(always)]
    fn read_reg<R>(&mut self) -> R
    where
        R: Register,
    {
        self.read(R::ADDRESS).into()
    }

    /// Write a register.
    #[inline(always)]
    fn write_reg<R>(&mut self, value: R)
    where
        R: Register,
    {
        self.write(R::ADDRESS, value.into())
    }

    /// Modify a register.
    #[inline(always)]
    fn modify_reg<R>(&mut self, f: impl FnOnce(R) -> R)
    where
        R: Register,
    {
        let value = self.read_reg();
        self.write_reg(f(value))
    }
}

impl<T> Io for &mut T
where
    T: Io + ?Sized,
{
    #[inline(always)]
    fn read(&mut self, address: u16) -> u8 {
        (**self).read(address)
    }

    #[inline(always)]
    fn write(&mut self, address: u16, value: u8) {
        (**self).write(address, value)
    }
}

/// The real data space, accessed with volatile loads and stores.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Mmio {
    _private: (),
}

impl Mmio {
    /// Get a handle to the data space.
    ///
    /// # Safety
    /// This must run on an ATmega, where every address handed to
    /// [Io::read] and [Io::write] is a valid data-space address. Drivers
    /// sharing the same registers must not run at the same time.
    #[inline(always)]
    pub const unsafe fn steal() -> Self {
        Self { _private: () }
    }
}

impl Io for Mmio {
    #[inline(always)]
    fn read(&mut self, address: u16) -> u8 {
        // safety: steal() requires we are on the device, where this
        // address is a register
        unsafe { core::ptr::read_volatile(address as usize as *const u8) }
    }

    #[inline(always)]
    fn write(&mut self, address: u16, value: u8) {
        // safety: steal() requires we are on the device, where this
        // address is a register
        unsafe { core::ptr::write_volatile(address as usize as *mut u8, value) }
    }
}
