//! Hardware-independent core of the DS1621 UDP thermometer.
//!
//! Everything here is generic over `embedded-hal-async` so the firmware and
//! the host tests drive the same code:
//!
//! - [`ds1621`]: register protocol of the sensor
//! - [`reading`]: raw register contents to Celsius/Fahrenheit
//! - [`sensor`]: ready device or permanent simulation fallback
//! - [`shared`]: mutex-guarded sensor handed to request handlers
//! - [`protocol`] and [`server`]: reply encoding and request handling
//! - [`config`], [`clock`], [`sntp`]: startup options and wall-clock time
//! - [`datalog`]: append-only reading log on NOR flash

#![no_std]

#[cfg(test)]
extern crate std;

pub mod clock;
pub mod config;
pub mod datalog;
pub mod ds1621;
pub mod error;
pub mod protocol;
pub mod reading;
pub mod sensor;
pub mod server;
pub mod shared;
pub mod sntp;
pub mod traits;

#[cfg(test)]
mod test_support;
