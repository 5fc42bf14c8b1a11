/// DS1621 command bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Command {
    /// Counts remaining: 8-bit
    ReadCount = 0xA8,
    /// Counts per degree: 8-bit
    ReadSlope = 0xA9,
    /// Last converted temperature: 16-bit
    ReadTemperature = 0xAA,
    /// Configuration/status register: 8-bit
    AccessConfig = 0xAC,
    /// Begin a conversion, no data
    StartConvert = 0xEE,
}

/// One-shot mode: one conversion per [`Command::StartConvert`]
pub const CONFIG_ONE_SHOT: u8 = 0x01;

/// Set by the device when a conversion has completed
pub const CONFIG_DONE: u8 = 0x80;

/// Address with A2..A0 tied low
pub const DEFAULT_ADDRESS: u8 = 0x48;
