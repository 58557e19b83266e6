//! Interfaces for the I/O registers of the ATmega8 and ATmega128.
//!
//! Addresses are data-space addresses, that is, the I/O address plus
//! `0x20`. Extended I/O registers (like [Eicra]) only exist in data
//! space, so this is the one address that works for everything.

use bitfield_struct::bitfield;

/// A trait describing a register generically.
pub trait Register: Copy + From<u8> + Into<u8> {
    /// The data-space address of this register.
    const ADDRESS: u16;
}

/// The three registers that control one GPIO port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GpioPort {
    /// Port letter, for display.
    pub name: char,
    /// Input pins address (PINx).
    pub pin: u16,
    /// Data direction register (DDRx), 1 is output.
    pub ddr: u16,
    /// Data register (PORTx). On inputs, 1 enables the pull-up.
    pub port: u16,
}

/// Port B, home of the SPI pins on both devices.
pub const PORT_B: GpioPort = GpioPort {
    name: 'B',
    pin: 0x36,
    ddr: 0x37,
    port: 0x38,
};

/// Port D, home of INT0..INT1 (ATmega8) and INT0..INT3 (ATmega128).
pub const PORT_D: GpioPort = GpioPort {
    name: 'D',
    pin: 0x30,
    ddr: 0x31,
    port: 0x32,
};

/// Port E, home of INT4..INT7 (ATmega128 only).
pub const PORT_E: GpioPort = GpioPort {
    name: 'E',
    pin: 0x21,
    ddr: 0x22,
    port: 0x23,
};

/// External interrupt sense control, the two ISCn1:ISCn0 bits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Sense {
    /// The low level of INTn generates an interrupt request.
    LowLevel = 0,
    /// Any logical change on INTn generates an interrupt request.
    LogicalChange = 1,
    /// The falling edge of INTn generates an interrupt request.
    FallingEdge = 2,
    /// The rising edge of INTn generates an interrupt request.
    RisingEdge = 3,
}

impl Sense {
    pub const fn into_bits(self) -> u8 {
        self as u8
    }

    pub const fn from_bits(v: u8) -> Self {
        match v & 0b11 {
            0 => Self::LowLevel,
            1 => Self::LogicalChange,
            2 => Self::FallingEdge,
            _ => Self::RisingEdge,
        }
    }
}

/// 0x55 MCU control register, ATmega8 layout.
///
/// Holds the sense control for INT0 and INT1. The sleep bits share
/// this register, so always modify it, never write it outright.
#[cfg_attr(not(feature = "defmt"), bitfield(u8))]
#[cfg_attr(feature = "defmt", bitfield(u8, defmt = true))]
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Mcucr {
    /// Interrupt sense control 0.
    #[bits(2)]
    pub isc0: Sense,
    /// Interrupt sense control 1.
    #[bits(2)]
    pub isc1: Sense,
    /// Sleep mode select.
    #[bits(3)]
    pub sm: u8,
    /// Sleep enable.
    pub se: bool,
}

impl Register for Mcucr {
    const ADDRESS: u16 = 0x55;
}

/// 0x5B General interrupt control register, ATmega8 only.
#[cfg_attr(not(feature = "defmt"), bitfield(u8))]
#[cfg_attr(feature = "defmt", bitfield(u8, defmt = true))]
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Gicr {
    /// Interrupt vector change enable.
    pub ivce: bool,
    /// Interrupt vector select.
    pub ivsel: bool,
    #[bits(4)]
    __: u8,
    /// External interrupt request 0 enable.
    pub int0: bool,
    /// External interrupt request 1 enable.
    pub int1: bool,
}

impl Register for Gicr {
    const ADDRESS: u16 = 0x5B;
}

/// 0x5A General interrupt flag register, ATmega8 only.
///
/// Flags are cleared by writing a one to them.
#[cfg_attr(not(feature = "defmt"), bitfield(u8))]
#[cfg_attr(feature = "defmt", bitfield(u8, defmt = true))]
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Gifr {
    #[bits(6)]
    __: u8,
    /// External interrupt flag 0.
    pub intf0: bool,
    /// External interrupt flag 1.
    pub intf1: bool,
}

impl Register for Gifr {
    const ADDRESS: u16 = 0x5A;
}

/// 0x6A External interrupt control register A, ATmega128 only.
///
/// On this register, [Sense::LogicalChange] is reserved.
#[cfg_attr(not(feature = "defmt"), bitfield(u8))]
#[cfg_attr(feature = "defmt", bitfield(u8, defmt = true))]
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Eicra {
    #[bits(2)]
    pub isc0: Sense,
    #[bits(2)]
    pub isc1: Sense,
    #[bits(2)]
    pub isc2: Sense,
    #[bits(2)]
    pub isc3: Sense,
}

impl Register for Eicra {
    const ADDRESS: u16 = 0x6A;
}

/// 0x5A External interrupt control register B, ATmega128 only.
#[cfg_attr(not(feature = "defmt"), bitfield(u8))]
#[cfg_attr(feature = "defmt", bitfield(u8, defmt = true))]
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Eicrb {
    #[bits(2)]
    pub isc4: Sense,
    #[bits(2)]
    pub isc5: Sense,
    #[bits(2)]
    pub isc6: Sense,
    #[bits(2)]
    pub isc7: Sense,
}

impl Register for Eicrb {
    const ADDRESS: u16 = 0x5A;
}

/// 0x59 External interrupt mask register, ATmega128 only.
#[cfg_attr(not(feature = "defmt"), bitfield(u8))]
#[cfg_attr(feature = "defmt", bitfield(u8, defmt = true))]
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Eimsk {
    pub int0: bool,
    pub int1: bool,
    pub int2: bool,
    pub int3: bool,
    pub int4: bool,
    pub int5: bool,
    pub int6: bool,
    pub int7: bool,
}

impl Register for Eimsk {
    const ADDRESS: u16 = 0x59;
}

/// 0x58 External interrupt flag register, ATmega128 only.
///
/// Flags are cleared by writing a one to them.
#[cfg_attr(not(feature = "defmt"), bitfield(u8))]
#[cfg_attr(feature = "defmt", bitfield(u8, defmt = true))]
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Eifr {
    pub intf0: bool,
    pub intf1: bool,
    pub intf2: bool,
    pub intf3: bool,
    pub intf4: bool,
    pub intf5: bool,
    pub intf6: bool,
    pub intf7: bool,
}

impl Register for Eifr {
    const ADDRESS: u16 = 0x58;
}

/// SPI data order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BitOrder {
    /// Most significant bit first.
    #[default]
    MsbFirst = 0,
    /// Least significant bit first.
    LsbFirst = 1,
}

impl BitOrder {
    pub const fn into_bits(self) -> u8 {
        self as u8
    }

    pub const fn from_bits(v: u8) -> Self {
        if v & 1 > 0 {
            Self::LsbFirst
        } else {
            Self::MsbFirst
        }
    }
}

/// SPI clock polarity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Polarity {
    /// SCK is low when idle.
    #[default]
    IdleLow = 0,
    /// SCK is high when idle.
    IdleHigh = 1,
}

impl Polarity {
    pub const fn into_bits(self) -> u8 {
        self as u8
    }

    pub const fn from_bits(v: u8) -> Self {
        if v & 1 > 0 {
            Self::IdleHigh
        } else {
            Self::IdleLow
        }
    }
}

/// SPI clock phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    /// Sample on the leading edge of SCK.
    #[default]
    CaptureOnLeading = 0,
    /// Sample on the trailing edge of SCK.
    CaptureOnTrailing = 1,
}

impl Phase {
    pub const fn into_bits(self) -> u8 {
        self as u8
    }

    pub const fn from_bits(v: u8) -> Self {
        if v & 1 > 0 {
            Self::CaptureOnTrailing
        } else {
            Self::CaptureOnLeading
        }
    }
}

/// 0x2D SPI control register.
#[cfg_attr(not(feature = "defmt"), bitfield(u8))]
#[cfg_attr(feature = "defmt", bitfield(u8, defmt = true))]
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Spcr {
    /// SPI clock rate select, SPR1:SPR0.
    #[bits(2)]
    pub spr: u8,
    /// Clock phase.
    #[bits(1)]
    pub cpha: Phase,
    /// Clock polarity.
    #[bits(1)]
    pub cpol: Polarity,
    /// Master/slave select, set for master.
    pub mstr: bool,
    /// Data order.
    #[bits(1)]
    pub dord: BitOrder,
    /// SPI enable.
    pub spe: bool,
    /// SPI interrupt enable.
    pub spie: bool,
}

impl Register for Spcr {
    const ADDRESS: u16 = 0x2D;
}

/// 0x2E SPI status register.
///
/// SPIF is cleared by reading this register with SPIF set, then
/// accessing [Spdr].
#[cfg_attr(not(feature = "defmt"), bitfield(u8))]
#[cfg_attr(feature = "defmt", bitfield(u8, defmt = true))]
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Spsr {
    /// Double SPI speed.
    pub spi2x: bool,
    #[bits(5)]
    __: u8,
    /// Write collision flag.
    #[bits(1, access = RO)]
    pub wcol: bool,
    /// SPI transfer complete flag.
    #[bits(1, access = RO)]
    pub spif: bool,
}

impl Register for Spsr {
    const ADDRESS: u16 = 0x2E;
}

/// 0x2F SPI data register.
///
/// Writing starts a transfer. Reading returns the last byte received.
#[cfg_attr(not(feature = "defmt"), bitfield(u8))]
#[cfg_attr(feature = "defmt", bitfield(u8, defmt = true))]
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Spdr {
    #[bits(8)]
    pub data: u8,
}

impl Register for Spdr {
    const ADDRESS: u16 = 0x2F;
}
