//! WiFi station and the embassy-net stack

use embassy_executor::Spawner;
use embassy_net::{Runner, Stack, StackResources};
use embassy_time::{Duration, Timer};
use esp_hal::{peripherals::WIFI, rng::Rng};
use esp_radio::{
    Controller,
    wifi::{ClientConfig, ModeConfig, WifiController, WifiDevice, WifiEvent, WifiStaState},
};
use log::{info, warn};
use static_cell::StaticCell;

const SSID: &str = match option_env!("SSID") {
    Some(ssid) => ssid,
    None => "",
};
const PASSWORD: &str = match option_env!("PASSWORD") {
    Some(password) => password,
    None => "",
};

const RECONNECT_DELAY_MS: u64 = 5_000;

/// DHCP, DNS and one application socket, with room to spare
const SOCKETS: usize = 4;

static RADIO: StaticCell<Controller<'static>> = StaticCell::new();
static RESOURCES: StaticCell<StackResources<SOCKETS>> = StaticCell::new();

/// Start WiFi and wait until DHCP has handed out an address.
///
/// Radio bring-up failures are fatal.
pub async fn start(spawner: &Spawner, wifi: WIFI<'static>) -> Stack<'static> {
    let radio = RADIO.init(esp_radio::init().unwrap());
    let (controller, interfaces) =
        esp_radio::wifi::new(radio, wifi, Default::default()).unwrap();

    let rng = Rng::new();
    let seed = (u64::from(rng.random()) << 32) | u64::from(rng.random());

    let (stack, runner) = embassy_net::new(
        interfaces.sta,
        embassy_net::Config::dhcpv4(Default::default()),
        RESOURCES.init(StackResources::new()),
        seed,
    );

    if let Err(e) = spawner.spawn(connection(controller)) {
        esp_println::println!("[ERROR] Failed to spawn task: {:?}", e);
    }
    if let Err(e) = spawner.spawn(net_task(runner)) {
        esp_println::println!("[ERROR] Failed to spawn task: {:?}", e);
    }

    info!("[NET] Waiting for DHCP...");
    stack.wait_config_up().await;
    if let Some(config) = stack.config_v4() {
        info!("[NET] Got IP: {}", config.address);
    }

    stack
}

#[embassy_executor::task]
async fn connection(mut controller: WifiController<'static>) {
    info!("[WIFI] Connecting to '{}'", SSID);
    loop {
        if esp_radio::wifi::sta_state() == WifiStaState::Connected {
            controller.wait_for_event(WifiEvent::StaDisconnected).await;
            warn!("[WIFI] Disconnected");
            Timer::after(Duration::from_millis(RECONNECT_DELAY_MS)).await;
        }

        if !matches!(controller.is_started(), Ok(true)) {
            let config = ModeConfig::Client(
                ClientConfig::default()
                    .with_ssid(SSID.into())
                    .with_password(PASSWORD.into()),
            );
            if let Err(e) = controller.set_config(&config) {
                warn!("[WIFI] Invalid configuration: {:?}", e);
            }
            if let Err(e) = controller.start_async().await {
                warn!("[WIFI] Failed to start: {:?}", e);
            }
        }

        match controller.connect_async().await {
            Ok(()) => info!("[WIFI] Connected"),
            Err(e) => {
                warn!("[WIFI] Failed to connect: {:?}", e);
                Timer::after(Duration::from_millis(RECONNECT_DELAY_MS)).await;
            }
        }
    }
}

#[embassy_executor::task]
async fn net_task(mut runner: Runner<'static, WifiDevice<'static>>) {
    runner.run().await
}
