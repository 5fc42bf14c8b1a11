//! Simulated DS1621 and timing doubles for host tests.

use std::{
    cell::RefCell,
    rc::Rc,
    string::String,
    sync::{Mutex, Once},
    vec::Vec,
};

use core::cell::Cell;

use chrono::NaiveDate;
use embassy_futures::yield_now;
use embedded_hal::i2c::{ErrorKind, ErrorType, NoAcknowledgeSource, Operation};
use embedded_hal_async::{delay::DelayNs, i2c::I2c};
use embedded_storage::nor_flash::{
    self, ErrorType as FlashErrorType, NorFlash, NorFlashErrorKind, ReadNorFlash,
};

use crate::{
    clock::{Clock, Timestamp},
    ds1621::{CONFIG_DONE, Command, DEFAULT_ADDRESS},
    reading::RawReading,
};

/// A bus transfer seen by the simulated device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transfer {
    ReadConfig,
    WriteConfig(u8),
    StartConvert,
    ReadTemperature,
    ReadCount,
    ReadSlope,
}

pub struct DeviceState {
    pub config: u8,
    /// Config reads after a start command until DONE is reported, `None` never completes
    pub polls_until_done: Option<u8>,
    pub raw: RawReading,
    /// Device does not acknowledge its address
    pub absent: bool,
    /// Command byte whose transfer fails
    pub fail_on: Option<u8>,
    pub log: Vec<Transfer>,
    remaining_polls: Option<u8>,
}

impl DeviceState {
    fn write(&mut self, bytes: &[u8]) -> Result<(), ErrorKind> {
        match bytes {
            [cmd] if *cmd == Command::StartConvert as u8 => {
                self.log.push(Transfer::StartConvert);
                self.config &= !CONFIG_DONE;
                self.remaining_polls = self.polls_until_done;
                Ok(())
            }
            [cmd, value] if *cmd == Command::AccessConfig as u8 => {
                self.log.push(Transfer::WriteConfig(*value));
                self.config = (self.config & CONFIG_DONE) | (value & !CONFIG_DONE);
                Ok(())
            }
            _ => Err(ErrorKind::Other),
        }
    }

    fn read(&mut self, cmd: u8, buf: &mut [u8]) -> Result<(), ErrorKind> {
        match (cmd, buf.len()) {
            (c, 1) if c == Command::AccessConfig as u8 => {
                self.log.push(Transfer::ReadConfig);
                if let Some(remaining) = self.remaining_polls {
                    if remaining <= 1 {
                        self.config |= CONFIG_DONE;
                        self.remaining_polls = None;
                    } else {
                        self.remaining_polls = Some(remaining - 1);
                    }
                }
                buf[0] = self.config;
            }
            (c, 2) if c == Command::ReadTemperature as u8 => {
                self.log.push(Transfer::ReadTemperature);
                buf.copy_from_slice(&self.raw.word.to_le_bytes());
            }
            (c, 1) if c == Command::ReadCount as u8 => {
                self.log.push(Transfer::ReadCount);
                buf[0] = self.raw.count;
            }
            (c, 1) if c == Command::ReadSlope as u8 => {
                self.log.push(Transfer::ReadSlope);
                buf[0] = self.raw.slope;
            }
            _ => return Err(ErrorKind::Other),
        }
        Ok(())
    }
}

/// Register-level model of a DS1621 in one-shot mode.
///
/// Clones share the device state, so a test can keep a handle for
/// inspection while the driver owns another.
#[derive(Clone)]
pub struct FakeDs1621 {
    address: u8,
    state: Rc<RefCell<DeviceState>>,
}

impl FakeDs1621 {
    pub fn new(config: u8, raw: RawReading) -> Self {
        Self {
            address: DEFAULT_ADDRESS,
            state: Rc::new(RefCell::new(DeviceState {
                config,
                polls_until_done: Some(1),
                raw,
                absent: false,
                fail_on: None,
                log: Vec::new(),
                remaining_polls: None,
            })),
        }
    }

    pub fn state(&self) -> std::cell::RefMut<'_, DeviceState> {
        self.state.borrow_mut()
    }

    pub fn log(&self) -> Vec<Transfer> {
        self.state.borrow().log.clone()
    }

    pub fn clear_log(&self) {
        self.state.borrow_mut().log.clear();
    }
}

impl ErrorType for FakeDs1621 {
    type Error = ErrorKind;
}

impl I2c for FakeDs1621 {
    async fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        // Every transfer is a suspension point, as on real hardware
        yield_now().await;

        let mut state = self.state.borrow_mut();
        if state.absent || address != self.address {
            return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
        }

        match operations {
            [Operation::Write(bytes)] => {
                if bytes.first().is_some_and(|cmd| state.fail_on == Some(*cmd)) {
                    return Err(ErrorKind::Bus);
                }
                state.write(bytes)
            }
            [Operation::Write(cmd), Operation::Read(buf)] if cmd.len() == 1 => {
                if state.fail_on == Some(cmd[0]) {
                    return Err(ErrorKind::Bus);
                }
                state.read(cmd[0], buf)
            }
            _ => Err(ErrorKind::Other),
        }
    }
}

/// Delay that returns immediately after recording the requested time
#[derive(Clone, Default)]
pub struct RecordingDelay {
    total_ns: Rc<Cell<u64>>,
}

impl RecordingDelay {
    pub fn total_ms(&self) -> u64 {
        self.total_ns.get() / 1_000_000
    }
}

impl DelayNs for RecordingDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.total_ns.set(self.total_ns.get() + u64::from(ns));
        yield_now().await;
    }
}

pub struct FixedClock(pub Timestamp);

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        self.0
    }
}

/// Local time built from calendar fields
pub fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> Timestamp {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(hour, minute, second))
        .unwrap()
}

pub fn noon() -> Timestamp {
    at(2026, 10, 14, 12, 0, 5)
}

static CAPTURED: Mutex<Vec<String>> = Mutex::new(Vec::new());

/// `log` backend keeping every formatted message for later inspection
struct CaptureLogger;

impl log::Log for CaptureLogger {
    fn enabled(&self, _: &log::Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &log::Record<'_>) {
        if let Ok(mut lines) = CAPTURED.lock() {
            lines.push(std::format!("{}", record.args()));
        }
    }

    fn flush(&self) {}
}

/// Install the capturing logger; safe to call from every test
pub fn capture_logs() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        static LOGGER: CaptureLogger = CaptureLogger;
        if log::set_logger(&LOGGER).is_ok() {
            log::set_max_level(log::LevelFilter::Info);
        }
    });
}

/// Messages logged so far by any test
pub fn captured_logs() -> Vec<String> {
    CAPTURED.lock().map(|lines| lines.clone()).unwrap_or_default()
}

/// NOR flash in RAM: erase sets bytes to 0xFF, writes can only clear bits
pub struct MemFlash<const N: usize> {
    pub bytes: [u8; N],
}

impl<const N: usize> MemFlash<N> {
    pub fn new() -> Self {
        Self { bytes: [0xFF; N] }
    }
}

impl<const N: usize> FlashErrorType for MemFlash<N> {
    type Error = NorFlashErrorKind;
}

impl<const N: usize> ReadNorFlash for MemFlash<N> {
    const READ_SIZE: usize = 4;

    fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
        nor_flash::check_read(self, offset, bytes.len())?;
        let start = offset as usize;
        bytes.copy_from_slice(&self.bytes[start..start + bytes.len()]);
        Ok(())
    }

    fn capacity(&self) -> usize {
        N
    }
}

impl<const N: usize> NorFlash for MemFlash<N> {
    const WRITE_SIZE: usize = 4;
    const ERASE_SIZE: usize = 256;

    fn erase(&mut self, from: u32, to: u32) -> Result<(), Self::Error> {
        nor_flash::check_erase(self, from, to)?;
        self.bytes[from as usize..to as usize].fill(0xFF);
        Ok(())
    }

    fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
        nor_flash::check_write(self, offset, bytes.len())?;
        let start = offset as usize;
        for (cell, byte) in self.bytes[start..start + bytes.len()].iter_mut().zip(bytes) {
            *cell &= *byte;
        }
        Ok(())
    }
}
