//! Request handling, independent of the socket.

use log::info;

use crate::{
    protocol::{self, Reply},
    traits::Thermometer,
};

/// Answer one request.
///
/// The payload is only logged; every request, whatever it contains, runs
/// exactly one read and yields exactly one reply.
pub async fn respond<T: Thermometer>(payload: &[u8], thermometer: &T) -> Reply {
    match core::str::from_utf8(payload) {
        Ok(msg) => {
            let msg = msg.trim();
            if !msg.is_empty() {
                info!("[UDP] msg: {}", msg);
            }
        }
        Err(_) => info!("[UDP] msg: <{} bytes, not UTF-8>", payload.len()),
    }

    protocol::encode(&thermometer.read().await)
}

#[cfg(test)]
mod tests {
    use core::cell::Cell;

    use embassy_futures::block_on;

    use super::*;
    use crate::{
        error::ErrorKind,
        reading::{Reading, TemperaturePoint},
        test_support::{capture_logs, captured_logs, noon},
    };

    struct CannedThermometer {
        outcome: Result<Reading, ErrorKind>,
        reads: Cell<usize>,
    }

    impl CannedThermometer {
        fn new(outcome: Result<Reading, ErrorKind>) -> Self {
            Self {
                outcome,
                reads: Cell::new(0),
            }
        }
    }

    impl Thermometer for CannedThermometer {
        async fn read(&self) -> Result<Reading, ErrorKind> {
            self.reads.set(self.reads.get() + 1);
            self.outcome
        }
    }

    #[test]
    fn one_read_per_request() {
        let thermometer = CannedThermometer::new(Ok(Reading::Simulated));

        let payloads: [&[u8]; 4] = [b"measure", b"", b"  \n", &[0xFF, 0xFE, 0x00]];
        for payload in payloads {
            let reply = block_on(respond(payload, &thermometer));
            assert_eq!(reply.as_str(), "{\"message\":\"Simulation mode enabled.\"}\n");
        }
        assert_eq!(thermometer.reads.get(), 4);
    }

    #[test]
    fn timeout_reply_has_no_temperature() {
        let thermometer = CannedThermometer::new(Err(ErrorKind::Timeout));
        let reply = block_on(respond(b"measure", &thermometer));

        assert_eq!(reply.as_str(), "{\"error\":\"Conversion timed out.\"}\n");
        assert!(!reply.contains("ResC"));
    }

    #[test]
    fn measurement_reply() {
        let thermometer = CannedThermometer::new(Ok(Reading::Measured(TemperaturePoint {
            lo_res_c: -0.5,
            hi_res_c: -0.3125,
            hi_res_f: 31.4375,
            timestamp: noon(),
        })));
        let reply = block_on(respond(b"temp please", &thermometer));

        assert_eq!(
            reply.as_str(),
            "{\"loResC\":-0.5,\"hiResC\":-0.3125,\"hiResF\":31.4375,\
             \"date\":\"10/14/2026\",\"time\":\"12:00:05\"}\n"
        );
    }

    #[test]
    fn payload_is_logged_with_tag() {
        capture_logs();
        let thermometer = CannedThermometer::new(Ok(Reading::Simulated));

        block_on(respond(b"  log me please\n", &thermometer));
        block_on(respond(&[0xC3, 0x28], &thermometer));

        let logs = captured_logs();
        assert!(logs.iter().any(|line| line == "[UDP] msg: log me please"));
        assert!(logs.iter().any(|line| line == "[UDP] msg: <2 bytes, not UTF-8>"));
    }
}
