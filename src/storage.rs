//! Data log partition on the internal SPI flash

use core::ops::Range;

use esp_hal::peripherals::FLASH;
use esp_storage::FlashStorage;
use log::{info, warn};
use therm_core::datalog::FlashLog;

/// `datalog` entry of `partitions.csv`
const DATA_LOG: Range<u32> = 0x21_0000..0x31_0000;

pub type DataLog = FlashLog<FlashStorage<'static>>;

/// Mount the data log partition, `None` when it cannot be used
pub fn open_data_log(flash: FLASH<'static>) -> Option<DataLog> {
    match FlashLog::mount_or_format(FlashStorage::new(flash), DATA_LOG) {
        Ok(log) => {
            info!(
                "[FLASH] Data log holds {} of {} lines",
                log.len(),
                log.capacity()
            );
            Some(log)
        }
        Err(e) => {
            warn!("[FLASH] Data log unusable: {}", e.as_str());
            None
        }
    }
}
