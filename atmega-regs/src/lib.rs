#![cfg_attr(not(test), no_std)]

//! Register-level access to the ATmega8 and ATmega128.
//!
//! Every register is reached through an [Io] implementation, either
//! the real data space ([Mmio]) or a [sim::Sim] running on the host.

mod io;
pub use io::*;

pub mod registers;
pub use registers::Register;

pub mod sim;
