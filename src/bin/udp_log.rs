#![no_std]
#![no_main]

use embassy_executor::Spawner;
use embassy_net::{
    IpAddress, IpEndpoint,
    udp::{PacketMetadata, UdpSocket},
};
use embassy_time::{Duration, Timer, with_timeout};
use esp_backtrace as _;
use esp_hal::timer::timg::TimerGroup;
use log::{info, warn};

use therm_core::{
    config::LoggerConfig,
    protocol::{self, ParsedReply},
};
use thermudp::{
    network,
    storage::{self, DataLog},
};

const REQUEST: &[u8] = b"measure";

const REPLY_TIMEOUT: Duration = Duration::from_secs(5);

esp_bootloader_esp_idf::esp_app_desc!();

#[esp_rtos::main]
async fn main(spawner: Spawner) {
    esp_println::logger::init_logger_from_env();
    let peripherals = esp_hal::init(esp_hal::Config::default());
    esp_alloc::heap_allocator!(size: 72 * 1024);

    esp_println::println!("=== DS1621 UDP Logger ===");

    let config = LoggerConfig::parse(option_env!("UDPLOG_ARGS").unwrap_or(""));

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    let mut data_log = storage::open_data_log(peripherals.FLASH);

    let stack = network::start(&spawner, peripherals.WIFI).await;

    let mut rx_meta = [PacketMetadata::EMPTY; 4];
    let mut rx_buffer = [0; 1024];
    let mut tx_meta = [PacketMetadata::EMPTY; 4];
    let mut tx_buffer = [0; 1024];
    let mut socket = UdpSocket::new(
        stack,
        &mut rx_meta,
        &mut rx_buffer,
        &mut tx_meta,
        &mut tx_buffer,
    );
    if let Err(e) = socket.bind(0) {
        panic!("[UDP] Cannot bind a local port: {:?}", e);
    }

    let server = IpEndpoint::new(IpAddress::Ipv4(config.server), config.port);
    info!("[LOG] Polling {} every {} ms", server, config.interval_ms);

    let mut reply = [0; protocol::REPLY_CAPACITY];
    loop {
        if let Err(e) = socket.send_to(REQUEST, server).await {
            warn!("[LOG] Request failed: {:?}", e);
        } else {
            match with_timeout(REPLY_TIMEOUT, socket.recv_from(&mut reply)).await {
                Ok(Ok((len, _))) => log_reply(&reply[..len], data_log.as_mut()),
                Ok(Err(e)) => warn!("[LOG] Receive failed: {:?}", e),
                Err(_) => warn!("[LOG] No reply from {}", server),
            }
        }

        Timer::after(Duration::from_millis(config.interval_ms)).await;
    }
}

/// Append the high resolution value to the data log, report anything else
fn log_reply(reply: &[u8], data_log: Option<&mut DataLog>) {
    let Ok(text) = core::str::from_utf8(reply) else {
        warn!("[LOG] Reply is not UTF-8 ({} bytes)", reply.len());
        return;
    };

    match protocol::parse_reply(text) {
        ParsedReply::HiResC(value) => {
            esp_println::println!("{:?}", value);
            if let Some(log) = data_log
                && let Err(e) = log.append_value(value)
            {
                warn!("[FLASH] Append failed: {}", e.as_str());
            }
        }
        ParsedReply::Error(message) => warn!("[LOG] Server error: {}", message),
        ParsedReply::Message(message) => warn!("[LOG] Server: {}", message),
        ParsedReply::Malformed => warn!("[LOG] Malformed reply: {}", text.trim_end()),
    }
}
