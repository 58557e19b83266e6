use crate::block::{self, PollError, Timeout};
use crate::device::Profile;
use crate::fmt::{trace, warning};
use crate::regs::registers::{Spcr, Spdr, Spsr};
use crate::regs::{Io, Register};

use super::{Config, Error};

/// The longest string, including its `NUL`, the string helpers are
/// meant to carry.
pub const MAX_STRING_LENGTH: usize = 255;

/// Room for any [i16] in decimal, plus `NUL`.
const INT_LENGTH: usize = 7;

/// The byte clocked out when we only want to read.
pub const DUMMY: u8 = 0x00;

/// Type state for a port driving SCK.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Master;

/// Type state for a port clocked by someone else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Slave;

/// An enabled SPI port.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Port<I, Mode> {
    io: I,
    profile: Profile,
    timeout: Timeout,
    _mode: Mode,
}

/// A port in master mode.
pub type MasterPort<I> = Port<I, Master>;

/// A port in slave mode.
pub type SlavePort<I> = Port<I, Slave>;

impl<I, Mode> Port<I, Mode>
where
    I: Io,
    Mode: Default,
{
    #[inline(always)]
    pub(super) fn new(config: Config<I>) -> Self {
        let Config {
            mut io,
            profile,
            timeout,
        } = config;
        io.modify_reg(|r: Spcr| r.with_spe(true));

        Self {
            io,
            profile,
            timeout,
            _mode: Mode::default(),
        }
    }
}

impl<I, Mode> Port<I, Mode>
where
    I: Io,
{
    /// Disable the port and recover the configurator.
    ///
    /// Pin directions are left as they are.
    #[inline(always)]
    pub fn free(mut self) -> Config<I> {
        self.io.modify_reg(|r: Spcr| r.with_spe(false));

        Config {
            io: self.io,
            profile: self.profile,
            timeout: self.timeout,
        }
    }

    /// Access the underlying registers.
    #[inline(always)]
    pub fn io_mut(&mut self) -> &mut I {
        &mut self.io
    }

    /// The device profile in use.
    #[inline(always)]
    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    /// How long transfers wait for completion.
    #[inline(always)]
    pub fn timeout(&self) -> Timeout {
        self.timeout
    }

    /// Change how long transfers wait for completion.
    #[inline(always)]
    pub fn set_timeout(&mut self, timeout: Timeout) {
        self.timeout = timeout;
    }

    /// Whether the last transfer has finished.
    #[inline(always)]
    pub fn is_complete(&mut self) -> bool {
        self.io.read_reg::<Spsr>().spif()
    }

    /// Start a transfer.
    ///
    /// There is no transmit buffer, so this never blocks. Every write
    /// must be followed by [read_one()][Self::read_one] to collect what
    /// came back.
    #[inline(always)]
    pub fn write_one(&mut self, value: u8) -> block::Result<(), Error> {
        self.io.write(Spdr::ADDRESS, value);
        Ok(())
    }

    /// Collect the byte from a finished transfer.
    ///
    /// Returns [block::Error::WouldBlock] until the transfer started by
    /// [write_one()][Self::write_one] completes.
    #[inline(always)]
    pub fn read_one(&mut self) -> block::Result<u8, Error> {
        // SPSR then SPDR, which clears SPIF
        if self.io.read_reg::<Spsr>().spif() {
            Ok(self.io.read(Spdr::ADDRESS))
        } else {
            Err(block::Error::WouldBlock)
        }
    }

    /// Clock out one byte and return the byte clocked in.
    ///
    /// Waits for the transfer up to the port's [Timeout].
    #[inline]
    pub fn read_write(&mut self, value: u8) -> Result<u8, Error> {
        let timeout = self.timeout;
        block::poll(timeout, || self.write_one(value)).map_err(timed_out)?;
        block::poll(timeout, || self.read_one()).map_err(timed_out)
    }

    /// Send one byte, ignoring what comes back.
    #[inline]
    pub fn write_byte(&mut self, value: u8) -> Result<(), Error> {
        self.read_write(value).map(|_| ())
    }

    /// Read one byte, sending [DUMMY].
    #[inline]
    pub fn read_byte(&mut self) -> Result<u8, Error> {
        self.read_write(DUMMY)
    }

    /// Read one byte into `dest`, sending [DUMMY].
    #[inline]
    pub fn read_byte_into(&mut self, dest: &mut u8) -> Result<(), Error> {
        *dest = self.read_byte()?;
        Ok(())
    }

    /// Send every byte in `data`, ignoring what comes back.
    pub fn write(&mut self, data: &[u8]) -> Result<(), Error> {
        for b in data {
            self.write_byte(*b)?;
        }
        Ok(())
    }

    /// Fill `buffer`, sending [DUMMY] for each byte.
    pub fn read(&mut self, buffer: &mut [u8]) -> Result<(), Error> {
        for b in buffer.iter_mut() {
            *b = self.read_byte()?;
        }
        Ok(())
    }

    /// Send `write` while filling `read`.
    ///
    /// If `read` is longer, [DUMMY] is sent for the rest. If `write` is
    /// longer, the extra incoming bytes are dropped.
    pub fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), Error> {
        let len = read.len().max(write.len());
        for i in 0..len {
            let incoming = self.read_write(write.get(i).copied().unwrap_or(DUMMY))?;
            if let Some(r) = read.get_mut(i) {
                *r = incoming;
            }
        }
        Ok(())
    }

    /// Send `buffer`, replacing each byte with the one that came back.
    pub fn transfer_in_place(&mut self, buffer: &mut [u8]) -> Result<(), Error> {
        for b in buffer.iter_mut() {
            *b = self.read_write(*b)?;
        }
        Ok(())
    }

    /// Send `data` as a `NUL` terminated string.
    ///
    /// Sending stops at the first `NUL` inside `data`, and a single
    /// `NUL` goes out at the end.
    pub fn write_bytes(&mut self, data: &[u8]) -> Result<(), Error> {
        let end = data.iter().position(|b| *b == 0).unwrap_or(data.len());
        trace!("spi string out, {=usize} bytes", end);
        self.write(&data[..end])?;
        self.write_byte(0)
    }

    /// Send `s` as a `NUL` terminated string.
    #[inline]
    pub fn write_string(&mut self, s: &str) -> Result<(), Error> {
        self.write_bytes(s.as_bytes())
    }

    /// Read a `NUL` terminated string into `buffer`.
    ///
    /// The `NUL` is stored too. Returns the bytes before it. If
    /// `buffer` fills before the `NUL` arrives, this stops reading and
    /// returns [Error::Overflow]. The rest of the string is left on the
    /// bus.
    pub fn read_bytes<'b>(&mut self, buffer: &'b mut [u8]) -> Result<&'b [u8], Error> {
        let mut len = 0;
        loop {
            if len == buffer.len() {
                warning!("spi string in overflowed {=usize} bytes", len);
                return Err(Error::Overflow);
            }

            let b = self.read_byte()?;
            buffer[len] = b;
            if b == 0 {
                trace!("spi string in, {=usize} bytes", len);
                return Ok(&buffer[..len]);
            }
            len += 1;
        }
    }

    /// Read a `NUL` terminated UTF-8 string into `buffer`.
    ///
    /// See [read_bytes()][Self::read_bytes].
    pub fn read_string<'b>(&mut self, buffer: &'b mut [u8]) -> Result<&'b str, Error> {
        let bytes = self.read_bytes(buffer)?;
        core::str::from_utf8(bytes).map_err(|_| Error::Utf8)
    }

    /// Send `value` as a decimal string.
    pub fn write_int(&mut self, value: i16) -> Result<(), Error> {
        use core::fmt::Write;

        let mut text = IntBuffer::default();
        write!(text, "{}", value).map_err(|_| Error::Overflow)?;
        self.write_bytes(text.as_bytes())
    }

    /// Read a decimal string and parse it.
    ///
    /// The whole frame is consumed even when it is too long to hold, so
    /// the next read starts on the next frame.
    pub fn read_int(&mut self) -> Result<i16, Error> {
        let mut buffer = [0; MAX_STRING_LENGTH];
        let text = match self.read_string(&mut buffer) {
            Err(Error::Overflow) => {
                self.skip_string()?;
                return Err(Error::Overflow);
            }
            r => r?,
        };
        text.trim().parse().map_err(|_| Error::InvalidInt)
    }

    /// Read and discard bytes up to and including the next `NUL`.
    pub fn skip_string(&mut self) -> Result<(), Error> {
        while self.read_byte()? != 0 {}
        Ok(())
    }
}

impl<I> Port<I, Master>
where
    I: Io,
{
    /// Drive SS low.
    #[inline]
    pub fn slave_select_active(&mut self) {
        let pins = self.profile.spi;
        let io = &mut self.io;
        critical_section::with(|_cs| io.clear_bits(pins.port.port, pins.ss_mask()));
    }

    /// Drive SS high.
    #[inline]
    pub fn slave_select_inactive(&mut self) {
        let pins = self.profile.spi;
        let io = &mut self.io;
        critical_section::with(|_cs| io.set_bits(pins.port.port, pins.ss_mask()));
    }
}

/// A master port that owns its slave select line.
///
/// Each [SpiDevice][embedded_hal_1::spi::SpiDevice] transaction drives
/// SS low for its duration.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Device<I> {
    port: Port<I, Master>,
}

impl<I> Port<I, Master>
where
    I: Io,
{
    /// Hand slave select over to transactions.
    #[inline(always)]
    pub fn into_device(mut self) -> Device<I> {
        self.slave_select_inactive();
        Device { port: self }
    }
}

impl<I> Device<I>
where
    I: Io,
{
    /// Recover the port.
    #[inline(always)]
    pub fn free(self) -> Port<I, Master> {
        self.port
    }

    #[inline(always)]
    pub(super) fn port_mut(&mut self) -> &mut Port<I, Master> {
        &mut self.port
    }
}

fn timed_out(e: PollError<Error>) -> Error {
    match e {
        PollError::TimedOut => {
            warning!("spi transfer timed out");
            Error::Timeout
        }
        PollError::Other(e) => e,
    }
}

#[derive(Default)]
struct IntBuffer {
    data: [u8; INT_LENGTH],
    len: usize,
}

impl IntBuffer {
    fn as_bytes(&self) -> &[u8] {
        &self.data[..self.len]
    }
}

impl core::fmt::Write for IntBuffer {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        let end = self.len + s.len();
        // keep room for the NUL
        if end >= INT_LENGTH {
            return Err(core::fmt::Error);
        }
        self.data[self.len..end].copy_from_slice(s.as_bytes());
        self.len = end;
        Ok(())
    }
}
