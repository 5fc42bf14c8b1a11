//! Startup options.
//!
//! The firmware has no command line, so options are baked in at build time
//! as a `-name value` string (`THERM_ARGS`, `UDPLOG_ARGS`). Parsing never
//! fails: unknown names and bad values are logged and the defaults kept.

use core::net::Ipv4Addr;

use log::warn;

use crate::ds1621::DEFAULT_ADDRESS;

pub const DEFAULT_PORT: u16 = 43210;

const MINUTES_PER_DAY: u16 = 24 * 60;

/// Options of the request server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerConfig<'a> {
    /// UDP listen port
    pub port: u16,
    /// Bind address, unspecified for all interfaces
    pub host: Ipv4Addr,
    /// I2C address of the DS1621
    pub device_address: u8,
    /// Offset of local time from UTC, applied to reply timestamps
    pub utc_offset_minutes: i16,
    /// SNTP server, IPv4 literal or DNS name
    pub ntp_server: &'a str,
}

impl Default for ServerConfig<'_> {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            host: Ipv4Addr::UNSPECIFIED,
            device_address: DEFAULT_ADDRESS,
            utc_offset_minutes: 0,
            ntp_server: "pool.ntp.org",
        }
    }
}

impl<'a> ServerConfig<'a> {
    pub fn parse(args: &'a str) -> Self {
        let mut config = Self::default();
        parse_options(
            args,
            &["-port", "-host", "-addr", "-utc-offset", "-ntp"],
            |name, value| match name {
                "-port" => set(&mut config.port, name, value, parse_int),
                "-host" => set(&mut config.host, name, value, |v| v.parse().ok()),
                "-addr" => set(&mut config.device_address, name, value, parse_int),
                "-utc-offset" => set(&mut config.utc_offset_minutes, name, value, |v| {
                    parse_int(v).filter(|minutes: &i16| minutes.unsigned_abs() < MINUTES_PER_DAY)
                }),
                _ => config.ntp_server = value,
            },
        );
        config
    }
}

/// Options of the logging client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoggerConfig {
    /// Address of the request server
    pub server: Ipv4Addr,
    pub port: u16,
    /// Pause between requests
    pub interval_ms: u64,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            server: Ipv4Addr::new(192, 168, 178, 38),
            port: DEFAULT_PORT,
            interval_ms: 6_000,
        }
    }
}

impl LoggerConfig {
    pub fn parse(args: &str) -> Self {
        let mut config = Self::default();
        parse_options(args, &["-host", "-port", "-interval"], |name, value| match name {
            "-host" => set(&mut config.server, name, value, |v| v.parse().ok()),
            "-port" => set(&mut config.port, name, value, parse_int),
            _ => set(&mut config.interval_ms, name, value, parse_secs),
        });
        config
    }
}

/// Walk `-name value` pairs, calling `apply` for each name in `known`
fn parse_options<'a>(args: &'a str, known: &[&str], mut apply: impl FnMut(&str, &'a str)) {
    let mut tokens = args.split_ascii_whitespace();
    while let Some(name) = tokens.next() {
        if !known.contains(&name) {
            warn!("Unexpected argument: {}", name);
            continue;
        }
        match tokens.next() {
            Some(value) => apply(name, value),
            None => warn!("Missing value for {}, keeping default", name),
        }
    }
}

fn set<T>(field: &mut T, name: &str, value: &str, parse: impl Fn(&str) -> Option<T>) {
    match parse(value) {
        Some(parsed) => *field = parsed,
        None => warn!("Invalid value for {}: {}, keeping default", name, value),
    }
}

/// Integer with an optional `0x`, `0o` or `0b` radix prefix
pub fn parse_int<T: TryFrom<i64>>(text: &str) -> Option<T> {
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };

    let prefixed = |lower: &str, upper: &str| {
        digits
            .strip_prefix(lower)
            .or_else(|| digits.strip_prefix(upper))
    };
    let (radix, digits) = if let Some(rest) = prefixed("0x", "0X") {
        (16, rest)
    } else if let Some(rest) = prefixed("0o", "0O") {
        (8, rest)
    } else if let Some(rest) = prefixed("0b", "0B") {
        (2, rest)
    } else {
        (10, digits)
    };

    // Leading zeros on a plain decimal are ambiguous, unless it is all zeros
    if radix == 10 && digits.starts_with('0') && digits.bytes().any(|b| b != b'0') {
        return None;
    }
    if digits.starts_with(['+', '-']) {
        return None;
    }

    let value = i64::from_str_radix(digits, radix).ok()?;
    T::try_from(if negative { -value } else { value }).ok()
}

/// Seconds, possibly fractional, as milliseconds
fn parse_secs(text: &str) -> Option<u64> {
    let secs: f32 = text.parse().ok()?;
    (secs.is_finite() && secs >= 0.0).then(|| (secs * 1_000.0) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_defaults() {
        let config = ServerConfig::parse("");
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.port, 43210);
        assert_eq!(config.host, Ipv4Addr::UNSPECIFIED);
        assert_eq!(config.device_address, 0x48);
    }

    #[test]
    fn server_options() {
        let config = ServerConfig::parse(
            "-port 5000 -host 192.168.1.20 -addr 0x4A -utc-offset -60 -ntp 10.0.0.1",
        );
        assert_eq!(
            config,
            ServerConfig {
                port: 5000,
                host: Ipv4Addr::new(192, 168, 1, 20),
                device_address: 0x4A,
                utc_offset_minutes: -60,
                ntp_server: "10.0.0.1",
            }
        );
    }

    #[test]
    fn unknown_options_are_skipped() {
        // The value of an unknown option is itself reported and skipped
        let config = ServerConfig::parse("-verbose -foo 12 -port 4000");
        assert_eq!(config.port, 4000);
        assert_eq!(config.device_address, DEFAULT_ADDRESS);
    }

    #[test]
    fn bad_values_keep_defaults() {
        let config = ServerConfig::parse("-port 70000 -addr 0x1FF -host localhost -utc-offset x");
        assert_eq!(config, ServerConfig::default());

        assert_eq!(ServerConfig::parse("-utc-offset 1440").utc_offset_minutes, 0);
        assert_eq!(ServerConfig::parse("-utc-offset -1440").utc_offset_minutes, 0);
        assert_eq!(ServerConfig::parse("-utc-offset -1439").utc_offset_minutes, -1439);
    }

    #[test]
    fn missing_value_keeps_default() {
        assert_eq!(ServerConfig::parse("-addr 0x49 -port").port, DEFAULT_PORT);
        assert_eq!(ServerConfig::parse("-addr 0x49 -port").device_address, 0x49);
    }

    #[test]
    fn integer_prefixes() {
        assert_eq!(parse_int::<u8>("0x48"), Some(0x48));
        assert_eq!(parse_int::<u8>("0X48"), Some(0x48));
        assert_eq!(parse_int::<u8>("72"), Some(72));
        assert_eq!(parse_int::<u8>("0o110"), Some(72));
        assert_eq!(parse_int::<u8>("0b1001000"), Some(72));
        assert_eq!(parse_int::<u8>("0"), Some(0));
        assert_eq!(parse_int::<i16>("-0x10"), Some(-16));
        assert_eq!(parse_int::<u8>("00"), Some(0));
        assert_eq!(parse_int::<u8>("000"), Some(0));
        assert_eq!(parse_int::<i16>("-00"), Some(0));
        assert_eq!(parse_int::<u8>("072"), None);
        assert_eq!(parse_int::<u8>("007"), None);
        assert_eq!(parse_int::<u8>("0x"), None);
        assert_eq!(parse_int::<u8>("0x-5"), None);
        assert_eq!(parse_int::<u8>("-1"), None);
        assert_eq!(parse_int::<u16>("65536"), None);
    }

    #[test]
    fn logger_options() {
        assert_eq!(LoggerConfig::parse(""), LoggerConfig::default());
        assert_eq!(
            LoggerConfig::parse("-host 10.1.2.3 -port 0x4000 -interval 2.5"),
            LoggerConfig {
                server: Ipv4Addr::new(10, 1, 2, 3),
                port: 0x4000,
                interval_ms: 2_500,
            }
        );
        assert_eq!(LoggerConfig::parse("-interval -1").interval_ms, 6_000);
    }
}
