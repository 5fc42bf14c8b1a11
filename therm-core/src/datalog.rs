//! Append-only line log on NOR flash.
//!
//! The region is cut into fixed slots of [`SLOT_LEN`] bytes: a length byte
//! followed by the line text, the rest left erased. Slots fill from the start
//! of the region, so the first erased slot marks the end of the log and a
//! remount after reset picks up where the last append stopped.

use core::{fmt::Write, ops::Range};

use embedded_storage::nor_flash::NorFlash;
use heapless::String;
use log::warn;

pub const SLOT_LEN: usize = 16;

/// Longest line a slot holds
pub const MAX_LINE_LEN: usize = SLOT_LEN - 1;

const ERASED: u8 = 0xFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogError<E> {
    /// The flash driver reported an error
    Flash(E),
    /// The region is empty, out of range or not aligned to the flash geometry
    Misaligned,
    /// A used slot does not hold a valid line
    Corrupt,
    /// Every slot of the region is used
    Full,
    /// The line is empty or longer than [`MAX_LINE_LEN`]
    BadLength,
}

impl<E> LogError<E> {
    pub const fn as_str(&self) -> &'static str {
        match self {
            LogError::Flash(_) => "flash access failed",
            LogError::Misaligned => "region does not fit the flash",
            LogError::Corrupt => "log contains an invalid entry",
            LogError::Full => "log is full",
            LogError::BadLength => "line does not fit a slot",
        }
    }
}

impl<E> From<E> for LogError<E> {
    fn from(value: E) -> Self {
        Self::Flash(value)
    }
}

pub struct FlashLog<F> {
    flash: F,
    region: Range<u32>,
    slots: u32,
    len: u32,
}

impl<F> FlashLog<F>
where
    F: NorFlash,
{
    /// Open the log stored in `region` and find its end
    pub fn mount(flash: F, region: Range<u32>) -> Result<Self, LogError<F::Error>> {
        let mut log = Self::new(flash, region)?;
        log.len = log.find_end()?;
        Ok(log)
    }

    /// Like [`mount`](Self::mount), but erase a region that does not hold a log
    pub fn mount_or_format(flash: F, region: Range<u32>) -> Result<Self, LogError<F::Error>> {
        let mut log = Self::new(flash, region)?;
        match log.find_end() {
            Ok(len) => log.len = len,
            Err(LogError::Corrupt) => {
                warn!("[DATALOG] Region holds no valid log, erasing");
                log.erase()?;
            }
            Err(e) => return Err(e),
        }
        Ok(log)
    }

    fn new(flash: F, region: Range<u32>) -> Result<Self, LogError<F::Error>> {
        let aligned = |at: u32| at as usize % F::ERASE_SIZE == 0;
        if region.is_empty()
            || !aligned(region.start)
            || !aligned(region.end)
            || region.end as usize > flash.capacity()
            || SLOT_LEN % F::WRITE_SIZE != 0
            || SLOT_LEN % F::READ_SIZE != 0
        {
            return Err(LogError::Misaligned);
        }

        let slots = (region.end - region.start) / SLOT_LEN as u32;
        Ok(Self {
            flash,
            region,
            slots,
            len: 0,
        })
    }

    /// Used slots form a prefix of the region
    fn find_end(&mut self) -> Result<u32, LogError<F::Error>> {
        let (mut lo, mut hi) = (0, self.slots);
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if self.is_used(mid)? {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        Ok(lo)
    }

    /// Number of lines in the log
    pub fn len(&self) -> u32 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of lines the region holds
    pub fn capacity(&self) -> u32 {
        self.slots
    }

    pub fn append(&mut self, line: &str) -> Result<(), LogError<F::Error>> {
        if line.is_empty() || line.len() > MAX_LINE_LEN {
            return Err(LogError::BadLength);
        }
        if self.len == self.slots {
            return Err(LogError::Full);
        }

        let mut slot = [ERASED; SLOT_LEN];
        slot[0] = line.len() as u8;
        slot[1..=line.len()].copy_from_slice(line.as_bytes());
        self.flash.write(self.offset(self.len), &slot)?;
        self.len += 1;
        Ok(())
    }

    /// Append a temperature in the shortest form that reads back exactly
    pub fn append_value(&mut self, value: f32) -> Result<(), LogError<F::Error>> {
        let mut line = String::<MAX_LINE_LEN>::new();
        write!(line, "{:?}", value).map_err(|_| LogError::BadLength)?;
        self.append(&line)
    }

    /// Line number `index`, read into `buf`
    pub fn read<'b>(
        &mut self,
        index: u32,
        buf: &'b mut [u8; SLOT_LEN],
    ) -> Result<Option<&'b str>, LogError<F::Error>> {
        if index >= self.len {
            return Ok(None);
        }

        self.flash.read(self.offset(index), buf)?;
        let len = usize::from(buf[0]);
        if !(1..=MAX_LINE_LEN).contains(&len) {
            return Err(LogError::Corrupt);
        }
        core::str::from_utf8(&buf[1..=len])
            .map(Some)
            .map_err(|_| LogError::Corrupt)
    }

    /// Drop every line
    pub fn erase(&mut self) -> Result<(), LogError<F::Error>> {
        self.flash.erase(self.region.start, self.region.end)?;
        self.len = 0;
        Ok(())
    }

    fn offset(&self, index: u32) -> u32 {
        self.region.start + index * SLOT_LEN as u32
    }

    fn is_used(&mut self, index: u32) -> Result<bool, LogError<F::Error>> {
        let mut slot = [0; SLOT_LEN];
        self.flash.read(self.offset(index), &mut slot)?;
        match usize::from(slot[0]) {
            0xFF => Ok(false),
            1..=MAX_LINE_LEN => Ok(true),
            _ => Err(LogError::Corrupt),
        }
    }
}
