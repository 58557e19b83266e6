#![cfg_attr(not(test), no_std)]

//! Drivers for the external interrupt pins and SPI peripheral of the
//! ATmega8 and ATmega128.
//!
//! Drivers own an [Io][regs::Io] value for their registers, which is
//! either the real data space or a [simulated register file][regs::sim].

// logging macros
mod fmt;

/// Register access crate, providing raw access to the I/O registers.
pub use atmega_regs as regs;

pub mod block;
pub mod device;
pub mod exint;
pub mod spi;
