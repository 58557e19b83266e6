//! Interfaces for the external interrupt pins, INT0 and up.
//!
//! This only sets up the pins and unmasks the interrupts. Installing a
//! handler for the vector is up to the program.

use crate::device::{LineInfo, Profile};
use crate::fmt::trace;
use crate::regs::Io;

pub use crate::regs::registers::Sense;

/// Wrap the registers into an external interrupt configurator.
#[inline(always)]
pub fn new<I>(io: I, profile: Profile) -> ExtInt<I>
where
    I: Io,
{
    ExtInt::new(io, profile)
}

/// An external interrupt line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Line {
    Int0,
    Int1,
    Int2,
    Int3,
    Int4,
    Int5,
    Int6,
    Int7,
}

/// An error produced while configuring an external interrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// This device does not have this line.
    NoSuchLine(Line),
    /// This line cannot use this sense on this device.
    Unsupported { line: Line, sense: Sense },
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self {
            Error::NoSuchLine(line) => write!(f, "no external interrupt {:?}", line),
            Error::Unsupported { line, sense } => {
                write!(f, "{:?} cannot trigger on {:?}", line, sense)
            }
        }
    }
}

impl core::error::Error for Error {}

/// An external interrupt configurator.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ExtInt<I> {
    io: I,
    profile: Profile,
}

// one setup function per line and sense
macro_rules! setup_fns {
    ($($line:ident => $name:ident,)*) => {
        paste::paste! {
            $(
                #[doc = concat!("Trigger ", stringify!($line), " while the pin is low.")]
                #[inline(always)]
                pub fn [<setup_ $name _low_level>](&mut self) -> Result<(), Error> {
                    self.configure(Line::$line, Sense::LowLevel)
                }

                #[doc = concat!("Trigger ", stringify!($line), " on any logical change.")]
                #[inline(always)]
                pub fn [<setup_ $name _logical_change>](&mut self) -> Result<(), Error> {
                    self.configure(Line::$line, Sense::LogicalChange)
                }

                #[doc = concat!("Trigger ", stringify!($line), " on a falling edge.")]
                #[inline(always)]
                pub fn [<setup_ $name _falling_edge>](&mut self) -> Result<(), Error> {
                    self.configure(Line::$line, Sense::FallingEdge)
                }

                #[doc = concat!("Trigger ", stringify!($line), " on a rising edge.")]
                #[inline(always)]
                pub fn [<setup_ $name _rising_edge>](&mut self) -> Result<(), Error> {
                    self.configure(Line::$line, Sense::RisingEdge)
                }
            )*
        }
    };
}

impl<I> ExtInt<I>
where
    I: Io,
{
    /// Wrap the registers into an external interrupt configurator.
    #[inline(always)]
    pub fn new(io: I, profile: Profile) -> Self {
        Self { io, profile }
    }

    /// Recover the registers.
    #[inline(always)]
    pub fn free(self) -> I {
        self.io
    }

    /// The device profile in use.
    #[inline(always)]
    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    fn info(&self, line: Line) -> Result<&'static LineInfo, Error> {
        self.profile.line(line).ok_or(Error::NoSuchLine(line))
    }

    /// Set up a line to trigger on `sense`, and unmask it.
    ///
    /// The pin becomes an input. The pull-up is enabled for
    /// [Sense::LowLevel] and [Sense::FallingEdge], where the pin idles
    /// high, and disabled otherwise. Any previous sense on this line is
    /// replaced, and no other bits are touched.
    pub fn configure(&mut self, line: Line, sense: Sense) -> Result<(), Error> {
        let info = self.info(line)?;
        if sense == Sense::LogicalChange && !info.logical_change {
            return Err(Error::Unsupported { line, sense });
        }

        let pull_up = matches!(sense, Sense::LowLevel | Sense::FallingEdge);
        let io = &mut self.io;
        critical_section::with(|_cs| {
            // changing the sense can fire the interrupt, so mask it first
            io.clear_bits(info.mask_address, info.enable_mask());

            io.clear_bits(info.port.ddr, info.pin_mask());
            if pull_up {
                io.set_bits(info.port.port, info.pin_mask());
            } else {
                io.clear_bits(info.port.port, info.pin_mask());
            }

            io.modify(info.sense_address, |v| {
                (v & !info.sense_mask()) | (sense.into_bits() << info.sense_shift)
            });

            // flags are write-one-to-clear, so write only ours
            io.write(info.flag_address, info.flag_mask());

            io.set_bits(info.mask_address, info.enable_mask());
        });

        trace!(
            "{=str} P{}{} INT{} on sense {}",
            self.profile.name,
            info.port.name,
            info.pin,
            line as u8,
            sense as u8
        );

        Ok(())
    }

    /// Mask a line, leaving its sense alone.
    pub fn disable(&mut self, line: Line) -> Result<(), Error> {
        let info = self.info(line)?;
        let io = &mut self.io;
        critical_section::with(|_cs| {
            io.clear_bits(info.mask_address, info.enable_mask());
        });
        Ok(())
    }

    /// Get the sense of a line.
    pub fn sense(&mut self, line: Line) -> Result<Sense, Error> {
        let info = self.info(line)?;
        let v = self.io.read(info.sense_address);
        Ok(Sense::from_bits(v >> info.sense_shift))
    }

    /// Is a line unmasked?
    pub fn is_enabled(&mut self, line: Line) -> Result<bool, Error> {
        let info = self.info(line)?;
        Ok(self.io.read(info.mask_address) & info.enable_mask() > 0)
    }

    setup_fns! {
        Int0 => int0,
        Int1 => int1,
        Int2 => int2,
        Int3 => int3,
        Int4 => int4,
        Int5 => int5,
        Int6 => int6,
        Int7 => int7,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::regs::registers::{
        Eicra, Eicrb, Eifr, Eimsk, Gicr, Gifr, Mcucr, PORT_D, PORT_E,
    };
    use crate::regs::sim::{Loopback, Sim};
    use crate::regs::Register;

    const ALL: [Sense; 4] = [
        Sense::LowLevel,
        Sense::LogicalChange,
        Sense::FallingEdge,
        Sense::RisingEdge,
    ];

    fn atmega8() -> ExtInt<Sim<Loopback>> {
        new(Sim::new(Loopback), Profile::ATMEGA8)
    }

    fn atmega128() -> ExtInt<Sim<Loopback>> {
        new(Sim::new(Loopback), Profile::ATMEGA128)
    }

    #[test]
    fn atmega8_truth_table() {
        for (line, isc_shift, int_bit) in [(Line::Int0, 0, 6), (Line::Int1, 2, 7)] {
            for sense in ALL {
                let mut ext = atmega8();
                ext.configure(line, sense).unwrap();
                let sim = ext.free();

                let isc = (sim.peek(Mcucr::ADDRESS) >> isc_shift) & 0b11;
                assert_eq!(isc, sense as u8, "{:?} {:?}", line, sense);
                assert_eq!(sim.peek(Gicr::ADDRESS), 1 << int_bit);
            }
        }
    }

    #[test]
    fn atmega8_truth_table_exact() {
        let cases = [
            (Sense::LowLevel, 0b00),
            (Sense::LogicalChange, 0b01),
            (Sense::FallingEdge, 0b10),
            (Sense::RisingEdge, 0b11),
        ];
        for (sense, bits) in cases {
            let mut ext = atmega8();
            ext.configure(Line::Int0, sense).unwrap();
            ext.configure(Line::Int1, sense).unwrap();
            let sim = ext.free();
            assert_eq!(sim.peek(Mcucr::ADDRESS), bits | (bits << 2));
            assert_eq!(sim.peek(Gicr::ADDRESS), 0b1100_0000);
        }
    }

    #[test]
    fn unrelated_bits_preserved() {
        for sense in ALL {
            let mut sim = Sim::new(Loopback);
            // sleep bits and int1 sense, vector bits, other pins
            sim.poke(Mcucr::ADDRESS, 0b1111_1100);
            sim.poke(Gicr::ADDRESS, 0b0000_0011);
            sim.poke(PORT_D.ddr, 0b1111_1011);
            sim.poke(PORT_D.port, 0b1010_1010);

            let mut ext = new(sim, Profile::ATMEGA8);
            ext.configure(Line::Int0, sense).unwrap();
            let sim = ext.free();

            let mcucr = Mcucr::from_bits(sim.peek(Mcucr::ADDRESS));
            assert_eq!(mcucr.isc0(), sense);
            assert_eq!(mcucr.isc1(), Sense::RisingEdge);
            assert_eq!(mcucr.sm(), 0b111);
            assert!(mcucr.se());

            let gicr = Gicr::from_bits(sim.peek(Gicr::ADDRESS));
            assert!(gicr.int0());
            assert!(!gicr.int1());
            assert!(gicr.ivce());
            assert!(gicr.ivsel());

            assert_eq!(sim.peek(PORT_D.ddr), 0b1111_1011);
            assert_eq!(sim.peek(PORT_D.port) & !0b100, 0b1010_1010);
        }
    }

    #[test]
    fn pin_is_input() {
        let mut sim = Sim::new(Loopback);
        sim.poke(PORT_D.ddr, 0xff);
        let mut ext = new(sim, Profile::ATMEGA8);
        ext.setup_int1_rising_edge().unwrap();
        assert_eq!(ext.free().peek(PORT_D.ddr), 0b1111_0111);
    }

    #[test]
    fn pull_up_follows_sense() {
        let expected = [
            (Sense::LowLevel, true),
            (Sense::LogicalChange, false),
            (Sense::FallingEdge, true),
            (Sense::RisingEdge, false),
        ];
        for (sense, pull_up) in expected {
            let mut sim = Sim::new(Loopback);
            sim.poke(PORT_D.port, if pull_up { 0 } else { 0xff });
            let mut ext = new(sim, Profile::ATMEGA8);
            ext.configure(Line::Int0, sense).unwrap();
            let port = ext.free().peek(PORT_D.port);
            assert_eq!(port & 0b100 > 0, pull_up, "{:?}", sense);
        }
    }

    #[test]
    fn last_call_wins() {
        let mut ext = atmega8();
        ext.setup_int0_rising_edge().unwrap();
        ext.setup_int0_low_level().unwrap();
        assert_eq!(ext.sense(Line::Int0), Ok(Sense::LowLevel));

        ext.setup_int0_falling_edge().unwrap();
        ext.setup_int0_logical_change().unwrap();
        assert_eq!(ext.sense(Line::Int0), Ok(Sense::LogicalChange));
        assert_eq!(ext.free().peek(Mcucr::ADDRESS), 0b01);
    }

    #[test]
    fn setup_fns_match_configure() {
        type Setup = fn(&mut ExtInt<Sim<Loopback>>) -> Result<(), Error>;
        let fns: [(Line, Sense, Setup); 8] = [
            (Line::Int0, Sense::LowLevel, ExtInt::setup_int0_low_level),
            (Line::Int0, Sense::LogicalChange, ExtInt::setup_int0_logical_change),
            (Line::Int0, Sense::FallingEdge, ExtInt::setup_int0_falling_edge),
            (Line::Int0, Sense::RisingEdge, ExtInt::setup_int0_rising_edge),
            (Line::Int1, Sense::LowLevel, ExtInt::setup_int1_low_level),
            (Line::Int1, Sense::LogicalChange, ExtInt::setup_int1_logical_change),
            (Line::Int1, Sense::FallingEdge, ExtInt::setup_int1_falling_edge),
            (Line::Int1, Sense::RisingEdge, ExtInt::setup_int1_rising_edge),
        ];

        for (line, sense, setup) in fns {
            let mut a = atmega8();
            setup(&mut a).unwrap();
            let mut b = atmega8();
            b.configure(line, sense).unwrap();

            let (a, b) = (a.free(), b.free());
            for addr in [Mcucr::ADDRESS, Gicr::ADDRESS, PORT_D.ddr, PORT_D.port] {
                assert_eq!(a.peek(addr), b.peek(addr));
            }
        }
    }

    #[test]
    fn atmega8_has_two_lines() {
        let mut ext = atmega8();
        assert_eq!(
            ext.setup_int2_falling_edge(),
            Err(Error::NoSuchLine(Line::Int2))
        );
        assert_eq!(ext.sense(Line::Int7), Err(Error::NoSuchLine(Line::Int7)));
        assert_eq!(ext.free().peek(Mcucr::ADDRESS), 0);
    }

    #[test]
    fn atmega128_low_lines() {
        let lines = [Line::Int0, Line::Int1, Line::Int2, Line::Int3];
        for (n, line) in lines.into_iter().enumerate() {
            for sense in [Sense::LowLevel, Sense::FallingEdge, Sense::RisingEdge] {
                let mut ext = atmega128();
                ext.configure(line, sense).unwrap();
                let sim = ext.free();

                assert_eq!(sim.peek(Eicra::ADDRESS), (sense as u8) << (2 * n));
                assert_eq!(sim.peek(Eimsk::ADDRESS), 1 << n);
                assert_eq!(sim.peek(PORT_D.port), if sense == Sense::RisingEdge { 0 } else { 1 << n });
                assert_eq!(sim.peek(Eicrb::ADDRESS), 0);
            }
        }
    }

    #[test]
    fn atmega128_high_lines() {
        let mut ext = atmega128();
        ext.setup_int4_logical_change().unwrap();
        ext.setup_int5_falling_edge().unwrap();
        ext.setup_int6_rising_edge().unwrap();
        ext.setup_int7_low_level().unwrap();
        let sim = ext.free();

        let eicrb = Eicrb::from_bits(sim.peek(Eicrb::ADDRESS));
        assert_eq!(eicrb.isc4(), Sense::LogicalChange);
        assert_eq!(eicrb.isc5(), Sense::FallingEdge);
        assert_eq!(eicrb.isc6(), Sense::RisingEdge);
        assert_eq!(eicrb.isc7(), Sense::LowLevel);
        assert_eq!(sim.peek(Eimsk::ADDRESS), 0xf0);
        assert_eq!(sim.peek(Eicra::ADDRESS), 0);
        assert_eq!(sim.peek(PORT_E.port), 0b1010_0000);
    }

    #[test]
    fn atmega128_no_logical_change_on_low_lines() {
        let mut ext = atmega128();
        ext.setup_int2_falling_edge().unwrap();
        assert_eq!(
            ext.setup_int2_logical_change(),
            Err(Error::Unsupported {
                line: Line::Int2,
                sense: Sense::LogicalChange
            })
        );

        // nothing changed
        assert_eq!(ext.sense(Line::Int2), Ok(Sense::FallingEdge));
        assert_eq!(ext.is_enabled(Line::Int2), Ok(true));
    }

    #[test]
    fn configure_clears_only_its_flag() {
        let mut sim = Sim::new(Loopback).flag_register(Gifr::ADDRESS);
        sim.poke(Gifr::ADDRESS, 0b1100_0000);
        let mut ext = new(sim, Profile::ATMEGA8);
        ext.setup_int1_falling_edge().unwrap();
        assert_eq!(ext.free().peek(Gifr::ADDRESS), 0b0100_0000);

        let mut sim = Sim::new(Loopback).flag_register(Eifr::ADDRESS);
        sim.poke(Eifr::ADDRESS, 0xff);
        let mut ext = new(sim, Profile::ATMEGA128);
        ext.setup_int2_rising_edge().unwrap();
        ext.setup_int6_low_level().unwrap();
        assert_eq!(ext.free().peek(Eifr::ADDRESS), 0b1011_1011);
    }

    #[test]
    fn unsupported_leaves_flag_pending() {
        let mut sim = Sim::new(Loopback).flag_register(Eifr::ADDRESS);
        sim.poke(Eifr::ADDRESS, 0b0000_0001);
        let mut ext = new(sim, Profile::ATMEGA128);
        assert!(ext.setup_int0_logical_change().is_err());
        assert_eq!(ext.free().peek(Eifr::ADDRESS), 0b0000_0001);
    }

    #[test]
    fn disable_only_masks() {
        let mut ext = atmega128();
        ext.setup_int0_rising_edge().unwrap();
        ext.setup_int1_rising_edge().unwrap();
        ext.disable(Line::Int0).unwrap();

        assert_eq!(ext.is_enabled(Line::Int0), Ok(false));
        assert_eq!(ext.is_enabled(Line::Int1), Ok(true));
        assert_eq!(ext.sense(Line::Int0), Ok(Sense::RisingEdge));
        assert_eq!(ext.free().peek(Eimsk::ADDRESS), 0b10);
    }

    #[test]
    fn error_display() {
        assert_eq!(
            Error::NoSuchLine(Line::Int3).to_string(),
            "no external interrupt Int3"
        );
        assert_eq!(
            Error::Unsupported {
                line: Line::Int0,
                sense: Sense::LogicalChange
            }
            .to_string(),
            "Int0 cannot trigger on LogicalChange"
        );
    }
}
