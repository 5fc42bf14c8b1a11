//! Maxim/Dallas DS1621 digital thermometer driver
//!
//! The device is kept in one-shot mode. A measurement starts a conversion,
//! polls the DONE flag of the config register within a bounded budget, then
//! reads the temperature word followed by the count and slope registers.

mod registers;

pub use registers::*;

use embedded_hal_async::{delay::DelayNs, i2c::I2c};
use log::info;

use crate::{
    error::{Error, InitError},
    reading::RawReading,
};

/// Timing of the one-shot conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Sleep before each status read
    pub interval_ms: u32,
    /// Status reads before giving up
    pub attempts: u8,
    /// Wait after writing the config register
    pub settle_ms: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: 100,
            attempts: 15,
            settle_ms: 10,
        }
    }
}

pub struct Ds1621<I, D> {
    i2c: I,
    delay: D,
    address: u8,
    poll: PollConfig,
}

impl<I, D> Ds1621<I, D>
where
    I: I2c,
    D: DelayNs,
{
    /// Connect to the device and switch it to one-shot mode if needed
    pub async fn new(
        i2c: I,
        delay: D,
        address: u8,
        poll: PollConfig,
    ) -> Result<Self, InitError<I>> {
        let mut sensor = Self {
            i2c,
            delay,
            address,
            poll,
        };

        if let Err(error) = sensor.enable_one_shot().await {
            Err(InitError {
                error,
                i2c: sensor.i2c,
            })
        } else {
            Ok(sensor)
        }
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    async fn read_register(&mut self, cmd: Command) -> Result<u8, Error<I::Error>> {
        let mut buf = [0; 1];
        self.i2c
            .write_read(self.address, &[cmd as u8], &mut buf)
            .await?;
        Ok(buf[0])
    }

    async fn write(&mut self, bytes: &[u8]) -> Result<(), Error<I::Error>> {
        self.i2c.write(self.address, bytes).await?;
        Ok(())
    }

    /// Read the configuration/status register
    pub async fn config(&mut self) -> Result<u8, Error<I::Error>> {
        self.read_register(Command::AccessConfig).await
    }

    async fn enable_one_shot(&mut self) -> Result<(), Error<I::Error>> {
        let mut cfg = self.config().await?;
        if cfg & CONFIG_ONE_SHOT == 0 {
            cfg |= CONFIG_ONE_SHOT;
            info!("[DS1621] Writing config register: 0x{:02X}", cfg);
            self.write(&[Command::AccessConfig as u8, cfg]).await?;
            self.delay.delay_ms(self.poll.settle_ms).await;
        }
        info!("[DS1621] Initialized at addr: 0x{:02X}", self.address);
        Ok(())
    }

    pub async fn start_conversion(&mut self) -> Result<(), Error<I::Error>> {
        self.write(&[Command::StartConvert as u8]).await
    }

    /// Poll the DONE flag, sleeping before every read
    pub async fn wait_for_conversion(&mut self) -> Result<(), Error<I::Error>> {
        for _ in 0..self.poll.attempts {
            self.delay.delay_ms(self.poll.interval_ms).await;
            if self.config().await? & CONFIG_DONE != 0 {
                return Ok(());
            }
        }
        Err(Error::Timeout)
    }

    /// Read the registers of the last completed conversion
    pub async fn read_raw(&mut self) -> Result<RawReading, Error<I::Error>> {
        let mut word = [0; 2];
        self.i2c
            .write_read(self.address, &[Command::ReadTemperature as u8], &mut word)
            .await?;
        let count = self.read_register(Command::ReadCount).await?;
        let slope = self.read_register(Command::ReadSlope).await?;

        Ok(RawReading {
            word: u16::from_le_bytes(word),
            count,
            slope,
        })
    }

    /// Run one full conversion cycle.
    ///
    /// Nothing is read back if the conversion times out.
    pub async fn measure(&mut self) -> Result<RawReading, Error<I::Error>> {
        self.start_conversion().await?;
        self.wait_for_conversion().await?;
        self.read_raw().await
    }
}
