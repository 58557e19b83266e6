//! Interfaces for SPI.

mod config;
pub use config::*;

mod hal02;
mod hal1;

mod port;
pub use port::*;

/// An error produced by an SPI port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// The transfer did not complete before the [Timeout][crate::block::Timeout] ran out.
    Timeout,
    /// The buffer filled up before the terminating `NUL` arrived.
    Overflow,
    /// A string read was not valid UTF-8.
    Utf8,
    /// An integer read was not a decimal number that fits.
    InvalidInt,
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self {
            Error::Timeout => write!(f, "SPI transfer timed out"),
            Error::Overflow => write!(f, "string does not fit in buffer"),
            Error::Utf8 => write!(f, "string is not valid UTF-8"),
            Error::InvalidInt => write!(f, "not a decimal integer"),
        }
    }
}

impl core::error::Error for Error {}

impl embedded_hal_1::spi::Error for Error {
    fn kind(&self) -> embedded_hal_1::spi::ErrorKind {
        embedded_hal_1::spi::ErrorKind::Other
    }
}
