use crate::block::Timeout;
use crate::device::Profile;
use crate::fmt::trace;
use crate::regs::registers::Spcr;
use crate::regs::Io;

use super::{MasterPort, Port, SlavePort};

pub use crate::regs::registers::{BitOrder, Phase, Polarity};

/// Wrap the SPI registers into a configurator.
#[inline(always)]
pub fn new<I>(io: I, profile: Profile) -> Config<I>
where
    I: Io,
{
    Config::new(io, profile)
}

/// An SPI configurator.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config<I> {
    pub(super) io: I,
    pub(super) profile: Profile,
    pub(super) timeout: Timeout,
}

/// An SPI mode describing clock polarity and phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Mode {
    pub polarity: Polarity,
    pub phase: Phase,
}

impl Mode {
    /// SPI mode 0: CPOL = 0, CPHA = 0.
    pub const MODE_0: Self = Self {
        polarity: Polarity::IdleLow,
        phase: Phase::CaptureOnLeading,
    };

    /// SPI mode 1: CPOL = 0, CPHA = 1.
    pub const MODE_1: Self = Self {
        polarity: Polarity::IdleLow,
        phase: Phase::CaptureOnTrailing,
    };

    /// SPI mode 2: CPOL = 1, CPHA = 0.
    pub const MODE_2: Self = Self {
        polarity: Polarity::IdleHigh,
        phase: Phase::CaptureOnLeading,
    };

    /// SPI mode 3: CPOL = 1, CPHA = 1.
    pub const MODE_3: Self = Self {
        polarity: Polarity::IdleHigh,
        phase: Phase::CaptureOnTrailing,
    };
}

impl Default for Mode {
    fn default() -> Self {
        Self::MODE_0
    }
}

/// Everything shared by master and slave setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Settings {
    pub bit_order: BitOrder,
    pub mode: Mode,
}

impl<I> Config<I>
where
    I: Io,
{
    /// Wrap the SPI registers into a configurator.
    ///
    /// This disables SPI and resets its control register.
    #[inline(always)]
    pub fn new(mut io: I, profile: Profile) -> Self {
        io.write_reg(Spcr::new());

        Self {
            io,
            profile,
            timeout: Timeout::default(),
        }
    }

    /// Recover the registers from a configurator.
    #[inline(always)]
    pub fn free(self) -> I {
        self.io
    }

    /// The device profile in use.
    #[inline(always)]
    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    /// Set the clock phase.
    #[inline(always)]
    pub fn phase(mut self, phase: Phase) -> Self {
        self.io.modify_reg(|r: Spcr| r.with_cpha(phase));
        self
    }

    /// Get the clock phase.
    #[inline(always)]
    pub fn get_phase(&mut self) -> Phase {
        self.io.read_reg::<Spcr>().cpha()
    }

    /// Set the clock polarity.
    #[inline(always)]
    pub fn polarity(mut self, polarity: Polarity) -> Self {
        self.io.modify_reg(|r: Spcr| r.with_cpol(polarity));
        self
    }

    /// Get the clock polarity.
    #[inline(always)]
    pub fn get_polarity(&mut self) -> Polarity {
        self.io.read_reg::<Spcr>().cpol()
    }

    /// Set the mode.
    #[inline(always)]
    pub fn mode(self, mode: Mode) -> Self {
        self.phase(mode.phase).polarity(mode.polarity)
    }

    /// Get the mode.
    #[inline(always)]
    pub fn get_mode(&mut self) -> Mode {
        Mode {
            phase: self.get_phase(),
            polarity: self.get_polarity(),
        }
    }

    /// Set the bit order.
    #[inline(always)]
    pub fn bit_order(mut self, bit_order: BitOrder) -> Self {
        self.io.modify_reg(|r: Spcr| r.with_dord(bit_order));
        self
    }

    /// Get the bit order.
    #[inline(always)]
    pub fn get_bit_order(&mut self) -> BitOrder {
        self.io.read_reg::<Spcr>().dord()
    }

    /// Apply bit order and mode together.
    #[inline(always)]
    pub fn settings(self, settings: Settings) -> Self {
        self.bit_order(settings.bit_order).mode(settings.mode)
    }

    /// Get bit order and mode together.
    #[inline(always)]
    pub fn get_settings(&mut self) -> Settings {
        Settings {
            bit_order: self.get_bit_order(),
            mode: self.get_mode(),
        }
    }

    /// Set how long transfers wait for completion.
    ///
    /// The default is [Timeout::Never], which waits like the hardware
    /// does: forever.
    #[inline(always)]
    pub fn timeout(mut self, timeout: Timeout) -> Self {
        self.timeout = timeout;
        self
    }

    /// Get how long transfers wait for completion.
    #[inline(always)]
    pub fn get_timeout(&self) -> Timeout {
        self.timeout
    }

    /// Get a [MasterPort].
    ///
    /// MOSI, SCK and SS become outputs with SS driven high, MISO
    /// becomes an input.
    #[inline]
    pub fn master(mut self) -> MasterPort<I> {
        let pins = self.profile.spi;
        let io = &mut self.io;
        critical_section::with(|_cs| {
            // SS must be a high output before MSTR, or a low SS input
            // knocks us back into slave mode
            io.set_bits(pins.port.port, pins.ss_mask());
            io.set_bits(
                pins.port.ddr,
                pins.mosi_mask() | pins.sck_mask() | pins.ss_mask(),
            );
            io.clear_bits(pins.port.ddr, pins.miso_mask());
        });
        self.io.modify_reg(|r: Spcr| r.with_mstr(true));

        trace!("{=str} spi master", self.profile.name);
        Port::new(self)
    }

    /// Get a [SlavePort].
    ///
    /// MISO becomes an output, MOSI, SCK and SS become inputs.
    #[inline]
    pub fn slave(mut self) -> SlavePort<I> {
        let pins = self.profile.spi;
        let io = &mut self.io;
        critical_section::with(|_cs| {
            io.set_bits(pins.port.ddr, pins.miso_mask());
            io.clear_bits(
                pins.port.ddr,
                pins.mosi_mask() | pins.sck_mask() | pins.ss_mask(),
            );
        });
        self.io.modify_reg(|r: Spcr| r.with_mstr(false));

        trace!("{=str} spi slave", self.profile.name);
        Port::new(self)
    }
}
