#![no_std]
#![no_main]

use embassy_executor::Spawner;
use embassy_net::{
    IpAddress, IpListenEndpoint, Stack,
    udp::{PacketMetadata, UdpSocket},
};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_time::{Delay, Duration, Timer};
use esp_backtrace as _;
use esp_hal::timer::timg::TimerGroup;
use log::{info, warn};
use static_cell::StaticCell;

use therm_core::{config::ServerConfig, server, shared::SharedSensor};
use thermudp::{
    hardware::{self, SensorBus},
    network,
    sntp::{self, WallClock},
};

const HEART_BEAT_INTERVAL_MS: u64 = 5_000;

/// Largest request we bother reading; anything longer is truncated
const REQUEST_BUFFER_LEN: usize = 256;

type Thermometer = SharedSensor<CriticalSectionRawMutex, SensorBus, Delay, WallClock>;

static THERMOMETER: StaticCell<Thermometer> = StaticCell::new();

esp_bootloader_esp_idf::esp_app_desc!();

#[embassy_executor::task]
async fn run_heartbeat() {
    loop {
        esp_println::println!("[HEARTBEAT] System is alive");
        Timer::after(Duration::from_millis(HEART_BEAT_INTERVAL_MS)).await;
    }
}

#[embassy_executor::task]
async fn serve(stack: Stack<'static>, endpoint: IpListenEndpoint, thermometer: &'static Thermometer) {
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

    if let Err(e) = socket.bind(endpoint) {
        panic!("[UDP] Cannot bind port {}: {:?}", endpoint.port, e);
    }
    info!("[UDP] Listening on port {}", endpoint.port);

    let mut request = [0; REQUEST_BUFFER_LEN];
    loop {
        let (len, meta) = match socket.recv_from(&mut request).await {
            Ok(received) => received,
            Err(e) => {
                warn!("[UDP] Receive failed: {:?}", e);
                continue;
            }
        };
        info!("[UDP] Request from {}", meta.endpoint);

        let reply = server::respond(&request[..len], thermometer).await;
        if let Err(e) = socket.send_to(reply.as_bytes(), meta).await {
            warn!("[UDP] Reply to {} failed: {:?}", meta.endpoint, e);
        }
    }
}

#[esp_rtos::main]
async fn main(spawner: Spawner) {
    esp_println::logger::init_logger_from_env();
    let peripherals = esp_hal::init(esp_hal::Config::default());
    esp_alloc::heap_allocator!(size: 72 * 1024);

    esp_println::println!("=== DS1621 UDP Thermometer ===");

    let config = ServerConfig::parse(option_env!("THERM_ARGS").unwrap_or(""));

    // Initialize RTOS timer for embassy
    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    if let Err(e) = spawner.spawn(run_heartbeat()) {
        esp_println::println!("[ERROR] Failed to spawn task: {:?}", e);
    }

    let sensor = hardware::open_sensor(
        peripherals.I2C0,
        peripherals.GPIO8,
        peripherals.GPIO9,
        config.device_address,
    )
    .await;

    let stack = network::start(&spawner, peripherals.WIFI).await;
    let clock = sntp::synchronize(stack, config.ntp_server, config.utc_offset_minutes).await;
    if !clock.is_synchronized() {
        esp_println::println!("[CLOCK] Running on uptime");
    }

    let thermometer = THERMOMETER.init(SharedSensor::new(sensor, clock));

    // 0.0.0.0 means every interface
    let endpoint = IpListenEndpoint {
        addr: (!config.host.is_unspecified()).then_some(IpAddress::Ipv4(config.host)),
        port: config.port,
    };
    if let Err(e) = spawner.spawn(serve(stack, endpoint, thermometer)) {
        esp_println::println!("[ERROR] Failed to spawn task: {:?}", e);
    }
}
