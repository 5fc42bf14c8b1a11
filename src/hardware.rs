use embassy_time::Delay;
use esp_hal::{
    Async,
    gpio::AnyPin,
    i2c::master::{Config as I2cConfig, I2c},
    peripherals::I2C0,
    time::Rate,
};
use log::warn;
use therm_core::{ds1621::PollConfig, sensor::Sensor};

/// DS1621 supports standard and fast mode, stay at standard for long wires
const I2C_FREQ_KHZ: u32 = 100;

pub type SensorBus = I2c<'static, Async>;

pub type Ds1621Sensor = Sensor<SensorBus, Delay>;

/// Open the I2C bus and bring up the DS1621 at `address`.
///
/// Any failure leaves the sensor in simulation mode for the rest of the run.
pub async fn open_sensor<SDA, SCL>(
    i2c_periph: I2C0<'static>,
    sda: SDA,
    scl: SCL,
    address: u8,
) -> Ds1621Sensor
where
    SDA: Into<AnyPin<'static>>,
    SCL: Into<AnyPin<'static>>,
{
    let i2c = match I2c::new(
        i2c_periph,
        I2cConfig::default().with_frequency(Rate::from_khz(I2C_FREQ_KHZ)),
    ) {
        Ok(i2c) => i2c
            .with_sda(sda.into())
            .with_scl(scl.into())
            .into_async(),
        Err(e) => {
            warn!("[I2C] Failed to open bus: {:?}", e);
            warn!("[DS1621] Running in simulation mode.");
            return Sensor::Simulation;
        }
    };

    Sensor::initialize(i2c, Delay, address, PollConfig::default()).await
}
