//! Conversion of DS1621 register contents into temperatures.

use crate::clock::Timestamp;

/// Register contents captured within one conversion cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawReading {
    /// Temperature word as returned by an SMBus word read: the integer degrees
    /// in the low byte, the half-degree flag in bit 15
    pub word: u16,
    /// Counts remaining when the conversion stopped
    pub count: u8,
    /// Counts per degree at the current temperature
    pub slope: u8,
}

impl RawReading {
    /// Temperature in Celsius with half-degree resolution.
    ///
    /// The device value is a 9-bit two's complement number: the low byte of
    /// the word shifted up one place, with bit 15 as the half-degree bit.
    pub fn lo_res_c(&self) -> f32 {
        let word = i32::from(self.word);
        let mut half_degrees = (word << 1) & 0x1FE;
        half_degrees |= (word >> 15) & 0x01;
        if half_degrees > 255 {
            half_degrees -= 512;
        }
        half_degrees as f32 / 2.0
    }

    /// Temperature in Celsius interpolated from the count and slope registers.
    ///
    /// Returns `None` if the slope register is zero.
    pub fn hi_res_c(&self) -> Option<f32> {
        if self.slope == 0 {
            return None;
        }

        let degrees = f32::from(self.word.to_le_bytes()[0] as i8);
        let slope = f32::from(self.slope);
        let count = f32::from(self.count);
        Some(degrees - 0.25 + (slope - count) / slope)
    }
}

pub fn fahrenheit(celsius: f32) -> f32 {
    32.0 + celsius * 9.0 / 5.0
}

/// A finished temperature reading, built fresh for every request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemperaturePoint {
    pub lo_res_c: f32,
    pub hi_res_c: f32,
    pub hi_res_f: f32,
    pub timestamp: Timestamp,
}

impl TemperaturePoint {
    /// Returns `None` if the slope register is zero
    pub fn from_raw(raw: RawReading, timestamp: Timestamp) -> Option<Self> {
        let hi_res_c = raw.hi_res_c()?;
        Some(Self {
            lo_res_c: raw.lo_res_c(),
            hi_res_c,
            hi_res_f: fahrenheit(hi_res_c),
            timestamp,
        })
    }
}

/// Outcome of a successful read request
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reading {
    Measured(TemperaturePoint),
    /// The sensor is in simulation mode, no hardware was touched
    Simulated,
}
