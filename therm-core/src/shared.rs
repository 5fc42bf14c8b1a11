//! The single sensor, shared between request handlers.

use embassy_sync::{blocking_mutex::raw::RawMutex, mutex::Mutex};
use embedded_hal_async::{delay::DelayNs, i2c::I2c};
use log::warn;

use crate::{
    clock::Clock,
    error::ErrorKind,
    reading::Reading,
    sensor::Sensor,
    traits::Thermometer,
};

/// Owns the sensor behind a mutex held for a whole conversion cycle, so
/// one caller's poll loop never interleaves with another caller's start
/// command.
pub struct SharedSensor<M, I, D, C>
where
    M: RawMutex,
{
    sensor: Mutex<M, Sensor<I, D>>,
    clock: C,
}

impl<M, I, D, C> SharedSensor<M, I, D, C>
where
    M: RawMutex,
{
    pub const fn new(sensor: Sensor<I, D>, clock: C) -> Self {
        Self {
            sensor: Mutex::new(sensor),
            clock,
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}

impl<M, I, D, C> Thermometer for SharedSensor<M, I, D, C>
where
    M: RawMutex,
    I: I2c,
    D: DelayNs,
    C: Clock,
{
    async fn read(&self) -> Result<Reading, ErrorKind> {
        let mut sensor = self.sensor.lock().await;
        sensor.read_temperature(&self.clock).await.map_err(|e| {
            warn!("[DS1621] Read failed: {:?}", e);
            e.kind()
        })
    }
}
