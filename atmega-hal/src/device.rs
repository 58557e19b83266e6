//! Per-device pin and register assignments.
//!
//! A [Profile] is chosen when a driver is created. The default is the
//! ATmega8.

use crate::exint::Line;
use crate::regs::registers::{
    Eicra, Eicrb, Eifr, Eimsk, GpioPort, Gicr, Gifr, Mcucr, PORT_B, PORT_D, PORT_E,
};
use crate::regs::Register;

/// The port and pin numbers used by the SPI peripheral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SpiPins {
    /// The port all four pins live on.
    pub port: GpioPort,
    /// Slave select.
    pub ss: u8,
    /// Master out, slave in.
    pub mosi: u8,
    /// Master in, slave out.
    pub miso: u8,
    /// Serial clock.
    pub sck: u8,
}

impl SpiPins {
    #[inline(always)]
    pub(crate) const fn ss_mask(&self) -> u8 {
        1 << self.ss
    }

    #[inline(always)]
    pub(crate) const fn mosi_mask(&self) -> u8 {
        1 << self.mosi
    }

    #[inline(always)]
    pub(crate) const fn miso_mask(&self) -> u8 {
        1 << self.miso
    }

    #[inline(always)]
    pub(crate) const fn sck_mask(&self) -> u8 {
        1 << self.sck
    }
}

/// Where the pin and control bits for one external interrupt live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LineInfo {
    /// The line described.
    pub line: Line,
    /// The port the INTn pin lives on.
    pub port: GpioPort,
    /// The pin number of INTn on that port.
    pub pin: u8,
    /// Register holding ISCn1:ISCn0.
    pub sense_address: u16,
    /// Bit position of ISCn0.
    pub sense_shift: u8,
    /// Register holding the INTn enable bit.
    pub mask_address: u16,
    /// Bit position of the INTn enable bit.
    pub mask_bit: u8,
    /// Register holding the write-one-to-clear INTFn flag.
    pub flag_address: u16,
    /// Bit position of the INTFn flag.
    pub flag_bit: u8,
    /// Whether sense `01` (any logical change) is available.
    pub logical_change: bool,
}

impl LineInfo {
    #[inline(always)]
    pub(crate) const fn pin_mask(&self) -> u8 {
        1 << self.pin
    }

    #[inline(always)]
    pub(crate) const fn sense_mask(&self) -> u8 {
        0b11 << self.sense_shift
    }

    #[inline(always)]
    pub(crate) const fn enable_mask(&self) -> u8 {
        1 << self.mask_bit
    }

    #[inline(always)]
    pub(crate) const fn flag_mask(&self) -> u8 {
        1 << self.flag_bit
    }
}

/// A description of one device's pin assignments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Profile {
    /// Device name, for display.
    pub name: &'static str,
    /// SPI pins.
    pub spi: SpiPins,
    /// External interrupt lines, in order.
    pub lines: &'static [LineInfo],
}

const ATMEGA8_LINES: [LineInfo; 2] = [
    LineInfo {
        line: Line::Int0,
        port: PORT_D,
        pin: 2,
        sense_address: Mcucr::ADDRESS,
        sense_shift: 0,
        mask_address: Gicr::ADDRESS,
        mask_bit: 6,
        flag_address: Gifr::ADDRESS,
        flag_bit: 6,
        logical_change: true,
    },
    LineInfo {
        line: Line::Int1,
        port: PORT_D,
        pin: 3,
        sense_address: Mcucr::ADDRESS,
        sense_shift: 2,
        mask_address: Gicr::ADDRESS,
        mask_bit: 7,
        flag_address: Gifr::ADDRESS,
        flag_bit: 7,
        logical_change: true,
    },
];

// INT0..INT3 sit in EICRA, where sense 01 is reserved
macro_rules! atmega128_line {
    ($line:ident, $n:literal, low) => {
        LineInfo {
            line: Line::$line,
            port: PORT_D,
            pin: $n,
            sense_address: Eicra::ADDRESS,
            sense_shift: 2 * $n,
            mask_address: Eimsk::ADDRESS,
            mask_bit: $n,
            flag_address: Eifr::ADDRESS,
            flag_bit: $n,
            logical_change: false,
        }
    };
    ($line:ident, $n:literal, high) => {
        LineInfo {
            line: Line::$line,
            port: PORT_E,
            pin: $n,
            sense_address: Eicrb::ADDRESS,
            sense_shift: 2 * ($n - 4),
            mask_address: Eimsk::ADDRESS,
            mask_bit: $n,
            flag_address: Eifr::ADDRESS,
            flag_bit: $n,
            logical_change: true,
        }
    };
}

const ATMEGA128_LINES: [LineInfo; 8] = [
    atmega128_line!(Int0, 0, low),
    atmega128_line!(Int1, 1, low),
    atmega128_line!(Int2, 2, low),
    atmega128_line!(Int3, 3, low),
    atmega128_line!(Int4, 4, high),
    atmega128_line!(Int5, 5, high),
    atmega128_line!(Int6, 6, high),
    atmega128_line!(Int7, 7, high),
];

impl Profile {
    /// The ATmega8.
    ///
    /// SPI: SS on PB2, MOSI on PB3, MISO on PB4, SCK on PB5.
    /// Interrupts: INT0 on PD2, INT1 on PD3.
    pub const ATMEGA8: Self = Self {
        name: "ATmega8",
        spi: SpiPins {
            port: PORT_B,
            ss: 2,
            mosi: 3,
            miso: 4,
            sck: 5,
        },
        lines: &ATMEGA8_LINES,
    };

    /// The ATmega128.
    ///
    /// SPI: SS on PB0, SCK on PB1, MOSI on PB2, MISO on PB3.
    /// Interrupts: INT0..INT3 on PD0..PD3, INT4..INT7 on PE4..PE7.
    pub const ATMEGA128: Self = Self {
        name: "ATmega128",
        spi: SpiPins {
            port: PORT_B,
            ss: 0,
            mosi: 2,
            miso: 3,
            sck: 1,
        },
        lines: &ATMEGA128_LINES,
    };

    /// Look up an external interrupt line, if this device has it.
    pub fn line(&self, line: Line) -> Option<&'static LineInfo> {
        self.lines.iter().find(|info| info.line == line)
    }
}

impl Default for Profile {
    fn default() -> Self {
        Self::ATMEGA8
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn default_is_atmega8() {
        assert_eq!(Profile::default(), Profile::ATMEGA8);
    }

    #[test]
    fn spi_pins() {
        let p = Profile::ATMEGA8.spi;
        assert_eq!((p.ss, p.mosi, p.miso, p.sck), (2, 3, 4, 5));
        let p = Profile::ATMEGA128.spi;
        assert_eq!((p.ss, p.mosi, p.miso, p.sck), (0, 2, 3, 1));
    }

    #[test]
    fn spi_pins_distinct() {
        for p in [Profile::ATMEGA8, Profile::ATMEGA128] {
            let s = p.spi;
            let all = s.ss_mask() | s.mosi_mask() | s.miso_mask() | s.sck_mask();
            assert_eq!(4, all.count_ones(), "{}", p.name);
        }
    }

    #[test]
    fn atmega8_lines() {
        let p = Profile::ATMEGA8;
        assert_eq!(2, p.lines.len());
        assert!(p.line(Line::Int2).is_none());

        let int1 = p.line(Line::Int1).unwrap();
        assert_eq!(int1.port, PORT_D);
        assert_eq!(int1.pin, 3);
        assert_eq!(int1.sense_mask(), 0b0000_1100);
        assert_eq!(int1.enable_mask(), 0b1000_0000);
    }

    #[test]
    fn atmega128_lines() {
        let p = Profile::ATMEGA128;
        assert_eq!(8, p.lines.len());

        let int3 = p.line(Line::Int3).unwrap();
        assert_eq!(int3.port, PORT_D);
        assert_eq!(int3.sense_address, Eicra::ADDRESS);
        assert_eq!(int3.sense_mask(), 0b1100_0000);
        assert!(!int3.logical_change);

        let int5 = p.line(Line::Int5).unwrap();
        assert_eq!(int5.port, PORT_E);
        assert_eq!(int5.pin_mask(), 0b0010_0000);
        assert_eq!(int5.sense_address, Eicrb::ADDRESS);
        assert_eq!(int5.sense_mask(), 0b0000_1100);
        assert_eq!(int5.enable_mask(), 0b0010_0000);
        assert!(int5.logical_change);
    }

    #[test]
    fn lines_in_order() {
        for p in [Profile::ATMEGA8, Profile::ATMEGA128] {
            for (i, info) in p.lines.iter().enumerate() {
                assert_eq!(info.line as usize, i);
            }
        }
    }
}
