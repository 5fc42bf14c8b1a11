//! Sensor lifecycle: a ready DS1621 or the permanent simulation fallback.

use embedded_hal_async::{delay::DelayNs, i2c::I2c};
use log::{debug, info, warn};

use crate::{
    clock::Clock,
    ds1621::{Ds1621, PollConfig},
    error::Error,
    reading::{Reading, TemperaturePoint},
};

/// Decided once at startup and never changed afterwards
pub enum Sensor<I, D> {
    Ready(Ds1621<I, D>),
    /// Hardware was unavailable at startup, reads never touch the bus
    Simulation,
}

impl<I, D> Sensor<I, D>
where
    I: I2c,
    D: DelayNs,
{
    /// Bring up the DS1621, falling back to simulation on any bus error
    pub async fn initialize(i2c: I, delay: D, address: u8, poll: PollConfig) -> Self {
        match Ds1621::new(i2c, delay, address, poll).await {
            Ok(device) => Sensor::Ready(device),
            Err(e) => {
                warn!("[DS1621] Failed to initialize hardware: {:?}", e);
                warn!("[DS1621] Running in simulation mode.");
                Sensor::Simulation
            }
        }
    }

    pub fn is_simulated(&self) -> bool {
        matches!(self, Sensor::Simulation)
    }

    /// Run one conversion cycle and stamp the result with `clock`
    pub async fn read_temperature(
        &mut self,
        clock: &impl Clock,
    ) -> Result<Reading, Error<I::Error>> {
        let Sensor::Ready(device) = self else {
            debug!("[DS1621] Simulation mode enabled.");
            return Ok(Reading::Simulated);
        };

        let raw = device.measure().await?;
        let point = TemperaturePoint::from_raw(raw, clock.now()).ok_or(Error::ZeroSlope)?;
        info!(
            "[DS1621] loResC: {}, hiResC: {}, hiResF: {}",
            point.lo_res_c, point.hi_res_c, point.hi_res_f
        );

        Ok(Reading::Measured(point))
    }
}
