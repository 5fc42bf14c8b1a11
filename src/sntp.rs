//! Wall clock anchored to one SNTP query at startup

use core::net::Ipv4Addr;

use embassy_net::{
    IpAddress, IpEndpoint, Stack,
    dns::DnsQueryType,
    udp::{PacketMetadata, UdpSocket},
};
use embassy_time::{Duration, Instant, with_timeout};
use log::{info, warn};
use chrono::FixedOffset;
use therm_core::{
    clock::{self, Clock, Timestamp},
    sntp,
};

const REPLY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy)]
enum SyncError {
    Resolve,
    Bind,
    Send,
    Timeout,
    Receive,
    BadReply,
}

impl SyncError {
    fn as_str(self) -> &'static str {
        match self {
            SyncError::Resolve => "server name did not resolve",
            SyncError::Bind => "no local port",
            SyncError::Send => "request not sent",
            SyncError::Timeout => "no reply",
            SyncError::Receive => "receive failed",
            SyncError::BadReply => "unusable reply",
        }
    }
}

/// Local time derived from Unix seconds captured at an `Instant`
pub struct WallClock {
    anchor: Option<(i64, Instant)>,
    offset: FixedOffset,
}

impl WallClock {
    /// Clock counting from the Unix epoch at boot
    pub fn unsynchronized(utc_offset_minutes: i16) -> Self {
        Self {
            anchor: None,
            offset: clock::utc_offset(utc_offset_minutes),
        }
    }

    pub fn is_synchronized(&self) -> bool {
        self.anchor.is_some()
    }
}

impl Clock for WallClock {
    fn now(&self) -> Timestamp {
        let unix = match self.anchor {
            Some((secs, at)) => secs + Instant::now().duration_since(at).as_secs() as i64,
            None => Instant::now().as_secs() as i64,
        };
        clock::local_time(unix, self.offset)
    }
}

/// Query `server` once; on failure the clock stays unsynchronized
pub async fn synchronize(stack: Stack<'_>, server: &str, utc_offset_minutes: i16) -> WallClock {
    let mut clock = WallClock::unsynchronized(utc_offset_minutes);
    match query(stack, server).await {
        Ok(secs) => {
            clock.anchor = Some((secs, Instant::now()));
            info!("[SNTP] Synchronized with {}: {}", server, secs);
        }
        Err(e) => {
            warn!("[SNTP] {}: {}, timestamps count from 1970-01-01", server, e.as_str());
        }
    }
    clock
}

async fn query(stack: Stack<'_>, server: &str) -> Result<i64, SyncError> {
    let address = resolve(stack, server).await?;

    let mut rx_meta = [PacketMetadata::EMPTY; 1];
    let mut rx_buffer = [0; 2 * sntp::PACKET_LEN];
    let mut tx_meta = [PacketMetadata::EMPTY; 1];
    let mut tx_buffer = [0; 2 * sntp::PACKET_LEN];
    let mut socket = UdpSocket::new(
        stack,
        &mut rx_meta,
        &mut rx_buffer,
        &mut tx_meta,
        &mut tx_buffer,
    );
    socket.bind(0).map_err(|_| SyncError::Bind)?;

    socket
        .send_to(&sntp::request(), IpEndpoint::new(address, sntp::NTP_PORT))
        .await
        .map_err(|_| SyncError::Send)?;

    let mut reply = [0; sntp::PACKET_LEN];
    let (len, _) = with_timeout(REPLY_TIMEOUT, socket.recv_from(&mut reply))
        .await
        .map_err(|_| SyncError::Timeout)?
        .map_err(|_| SyncError::Receive)?;

    sntp::parse_response(&reply[..len]).ok_or(SyncError::BadReply)
}

async fn resolve(stack: Stack<'_>, server: &str) -> Result<IpAddress, SyncError> {
    if let Ok(address) = server.parse::<Ipv4Addr>() {
        return Ok(IpAddress::Ipv4(address));
    }

    let addresses = stack
        .dns_query(server, DnsQueryType::A)
        .await
        .map_err(|_| SyncError::Resolve)?;
    addresses.first().copied().ok_or(SyncError::Resolve)
}
