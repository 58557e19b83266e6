//! A simulated register file, for exercising drivers off hardware.
//!
//! Every address is plain memory except for the SPI registers:
//!
//!  * writing [Spdr] while SPE is set exchanges the byte with the
//!    attached [Peer], leaves the reply in [Spdr], and sets SPIF,
//!  * reading [Spsr] with SPIF set, then accessing [Spdr], clears SPIF,
//!  * only SPI2X in [Spsr] is writable,
//!  * registers declared with [Sim::flag_register] are write-one-to-clear.
//!
//! Flag registers are opt-in because their addresses are reused across
//! devices: 0x5A is GIFR on the ATmega8 but EICRB on the ATmega128.
//!
//! The peer is the other end of the bus, whichever role the port
//! takes. Transfers complete instantly, or never.

use crate::registers::{Spcr, Spdr, Spsr};
use crate::{Io, Register};

/// Size of the simulated data space, covering all I/O and extended
/// I/O registers.
pub const DATA_SPACE: usize = 0x100;

/// The device on the other end of a simulated SPI bus.
pub trait Peer {
    /// Exchange one byte. `None` means the transfer never completes.
    fn exchange(&mut self, out: u8) -> Option<u8>;
}

impl<P> Peer for &mut P
where
    P: Peer + ?Sized,
{
    fn exchange(&mut self, out: u8) -> Option<u8> {
        (**self).exchange(out)
    }
}

/// MISO wired straight to MOSI: every byte comes back in the same
/// transfer.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Loopback;

impl Peer for Loopback {
    fn exchange(&mut self, out: u8) -> Option<u8> {
        Some(out)
    }
}

/// A peer that never finishes a transfer, like a disconnected bus
/// with a stuck clock.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Stalled;

impl Peer for Stalled {
    fn exchange(&mut self, _out: u8) -> Option<u8> {
        None
    }
}

/// How many bytes an [Echo] remembers.
pub const ECHO_CAPACITY: usize = 0x400;

/// A peer that records every byte it receives, and after
/// [replay()][Echo::replay] plays them back in order, one per transfer.
/// It answers `0x00` when it has nothing to play.
///
/// Bytes received past [ECHO_CAPACITY] are dropped.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Echo {
    received: [u8; ECHO_CAPACITY],
    received_len: usize,
    playback: [u8; ECHO_CAPACITY],
    playback_len: usize,
    playback_pos: usize,
}

impl Default for Echo {
    fn default() -> Self {
        Self::new()
    }
}

impl Echo {
    /// An empty echo.
    pub const fn new() -> Self {
        Self {
            received: [0; ECHO_CAPACITY],
            received_len: 0,
            playback: [0; ECHO_CAPACITY],
            playback_len: 0,
            playback_pos: 0,
        }
    }

    /// Everything received since the last [replay()][Echo::replay].
    pub fn received(&self) -> &[u8] {
        &self.received[..self.received_len]
    }

    /// Start playing back everything received so far.
    ///
    /// Anything still waiting from an earlier replay is dropped.
    pub fn replay(&mut self) {
        let len = self.received_len;
        self.playback[..len].copy_from_slice(&self.received[..len]);
        self.playback_len = len;
        self.playback_pos = 0;
        self.received_len = 0;
    }

    /// How many bytes are waiting to be played back.
    pub fn pending(&self) -> usize {
        self.playback_len - self.playback_pos
    }

    /// Forget everything, received and waiting.
    pub fn clear(&mut self) {
        self.received_len = 0;
        self.playback_len = 0;
        self.playback_pos = 0;
    }
}

impl Peer for Echo {
    fn exchange(&mut self, out: u8) -> Option<u8> {
        let reply = if self.playback_pos < self.playback_len {
            self.playback_pos += 1;
            self.playback[self.playback_pos - 1]
        } else {
            0x00
        };

        if self.received_len < ECHO_CAPACITY {
            self.received[self.received_len] = out;
            self.received_len += 1;
        }

        Some(reply)
    }
}

/// A simulated register file with an SPI peer attached.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Sim<P> {
    memory: [u8; DATA_SPACE],
    peer: P,
    // SPSR was read with SPIF set, the next SPDR access clears it
    spif_armed: bool,
    transfers: usize,
    write_one_to_clear: [bool; DATA_SPACE],
}

impl<P> Sim<P> {
    /// Create a register file with everything zeroed, like after reset.
    pub const fn new(peer: P) -> Self {
        Self {
            memory: [0; DATA_SPACE],
            peer,
            spif_armed: false,
            transfers: 0,
            write_one_to_clear: [false; DATA_SPACE],
        }
    }

    /// Treat `address` as a flag register, where writing a one clears
    /// that bit and writing a zero leaves it alone.
    ///
    /// Addresses outside the data space are ignored.
    pub fn flag_register(mut self, address: u16) -> Self {
        if let Some(slot) = self.write_one_to_clear.get_mut(address as usize) {
            *slot = true;
        }
        self
    }

    /// Look at a register without any read side effects.
    ///
    /// Addresses outside the data space read as zero.
    pub fn peek(&self, address: u16) -> u8 {
        self.memory.get(address as usize).copied().unwrap_or(0)
    }

    /// Set a register without any write side effects.
    ///
    /// Addresses outside the data space are ignored.
    pub fn poke(&mut self, address: u16, value: u8) {
        if let Some(slot) = self.memory.get_mut(address as usize) {
            *slot = value;
        }
    }

    /// Look at a typed register without any read side effects.
    pub fn peek_reg<R>(&self) -> R
    where
        R: Register,
    {
        self.peek(R::ADDRESS).into()
    }

    /// Number of SPI transfers started so far.
    pub fn transfers(&self) -> usize {
        self.transfers
    }

    /// The attached peer.
    pub fn peer(&self) -> &P {
        &self.peer
    }

    /// The attached peer, mutably.
    pub fn peer_mut(&mut self) -> &mut P {
        &mut self.peer
    }

    /// Recover the attached peer.
    pub fn into_peer(self) -> P {
        self.peer
    }

    fn is_flag_register(&self, address: u16) -> bool {
        self.write_one_to_clear
            .get(address as usize)
            .copied()
            .unwrap_or(false)
    }

    fn touch_spdr(&mut self) {
        if self.spif_armed {
            self.spif_armed = false;
            let spsr = self.peek(SPSR);
            self.poke(SPSR, spsr & !SPIF);
        }
    }
}

const SPDR: u16 = Spdr::ADDRESS;
const SPSR: u16 = Spsr::ADDRESS;
const SPIF: u8 = 1 << 7;
const SPSR_WRITABLE: u8 = 1 << 0;

impl<P> Io for Sim<P>
where
    P: Peer,
{
    fn read(&mut self, address: u16) -> u8 {
        let value = self.peek(address);
        match address {
            SPSR => {
                if value & SPIF > 0 {
                    self.spif_armed = true;
                }
            }
            SPDR => self.touch_spdr(),
            _ => {}
        }
        value
    }

    fn write(&mut self, address: u16, value: u8) {
        match address {
            SPDR => {
                self.touch_spdr();
                self.poke(SPDR, value);

                let spcr = Spcr::from_bits(self.peek(Spcr::ADDRESS));
                if spcr.spe() {
                    self.transfers += 1;
                    if let Some(reply) = self.peer.exchange(value) {
                        self.poke(SPDR, reply);
                        let spsr = self.peek(SPSR);
                        self.poke(SPSR, spsr | SPIF);
                    }
                }
            }
            SPSR => {
                let spsr = self.peek(SPSR);
                self.poke(
                    Spsr::ADDRESS,
                    (spsr & !SPSR_WRITABLE) | (value & SPSR_WRITABLE),
                );
            }
            _ if self.is_flag_register(address) => {
                let flags = self.peek(address);
                self.poke(address, flags & !value);
            }
            _ => self.poke(address, value),
        }
    }
}
