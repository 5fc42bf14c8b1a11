//! SNTP packet format (RFC 4330), client side only.

pub const NTP_PORT: u16 = 123;

pub const PACKET_LEN: usize = 48;

/// Seconds from 1900-01-01 (NTP era 0) to 1970-01-01
const UNIX_OFFSET: i64 = 2_208_988_800;

/// Length of one NTP era, the seconds field wraps on 2036-02-07
const ERA_SECS: i64 = 1 << 32;

const MODE_CLIENT: u8 = 3;
const MODE_SERVER: u8 = 4;
const VERSION: u8 = 3;

/// A client request: version 3, mode 3, every other field zero
pub fn request() -> [u8; PACKET_LEN] {
    let mut packet = [0; PACKET_LEN];
    packet[0] = (VERSION << 3) | MODE_CLIENT;
    packet
}

/// Transmit timestamp of a server reply as Unix seconds.
///
/// Seconds with the top bit clear belong to era 1 (RFC 4330 section 3),
/// which covers 1968-01-20 to 2104-02-26.
///
/// Returns `None` for short packets, non-server modes, kiss-o'-death
/// replies (stratum 0) and unset timestamps.
pub fn parse_response(packet: &[u8]) -> Option<i64> {
    if packet.len() < PACKET_LEN {
        return None;
    }
    if packet[0] & 0x07 != MODE_SERVER || packet[1] == 0 {
        return None;
    }

    let secs = u32::from_be_bytes([packet[40], packet[41], packet[42], packet[43]]);
    if secs == 0 {
        return None;
    }
    let era = if secs & 0x8000_0000 == 0 { ERA_SECS } else { 0 };
    Some(i64::from(secs) + era - UNIX_OFFSET)
}
