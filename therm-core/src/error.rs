//! Error types for DS1621 operations.

use core::fmt::{Debug, Formatter};
use embedded_hal_async::i2c::I2c;

/// Error that occurs while bringing up the DS1621.
/// Hands the I2C interface back so the caller keeps ownership of the bus.
pub struct InitError<I>
where
    I: I2c,
{
    pub i2c: I,
    pub error: Error<I::Error>,
}

impl<I> Debug for InitError<I>
where
    I: I2c,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        self.error.fmt(f)
    }
}

/// Errors of a single conversion cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error<E> {
    /// An I2C transfer was not acknowledged or failed on the bus
    Bus(E),

    /// The DONE flag was never observed within the poll budget
    Timeout,

    /// The slope register read zero, so the high resolution interpolation is undefined
    ZeroSlope,
}

impl<E> Error<E> {
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Error::Bus(_) => ErrorKind::Bus,
            Error::Timeout => ErrorKind::Timeout,
            Error::ZeroSlope => ErrorKind::ZeroSlope,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        self.kind().as_str()
    }
}

impl<E> From<E> for Error<E> {
    fn from(value: E) -> Self {
        Self::Bus(value)
    }
}

/// [`Error`] without the bus error payload, as reported to clients
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Bus,
    Timeout,
    ZeroSlope,
}

impl ErrorKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Bus => "Bus transfer failed.",
            ErrorKind::Timeout => "Conversion timed out.",
            ErrorKind::ZeroSlope => "Slope register read zero.",
        }
    }
}
