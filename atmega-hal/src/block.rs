//! Tools for working with operations that may block.
//!
//! This is a re-export of parts of the [nb] crate, plus [poll()],
//! which blocks like [block!] but can give up.

pub use nb::{block, Error, Result};

/// How long to poll a peripheral before giving up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Timeout {
    /// Poll forever, like the hardware does.
    #[default]
    Never,
    /// After the first poll comes back [Error::WouldBlock], retry at
    /// most this many times.
    Polls(u32),
}

/// The result of [poll()] failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PollError<E> {
    /// The operation was still blocking when the timeout ran out.
    TimedOut,
    /// The operation failed.
    Other(E),
}

/// Call `f` until it stops returning [Error::WouldBlock], or until
/// `timeout` runs out.
#[inline]
pub fn poll<T, E>(
    timeout: Timeout,
    mut f: impl FnMut() -> Result<T, E>,
) -> core::result::Result<T, PollError<E>> {
    let mut remaining = match timeout {
        Timeout::Never => None,
        Timeout::Polls(n) => Some(n),
    };

    loop {
        match f() {
            Ok(v) => return Ok(v),
            Err(Error::Other(e)) => return Err(PollError::Other(e)),
            Err(Error::WouldBlock) => {}
        }

        if let Some(n) = remaining.as_mut() {
            if *n == 0 {
                return Err(PollError::TimedOut);
            }
            *n -= 1;
        }
    }
}
