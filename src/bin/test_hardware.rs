#![no_std]
#![no_main]

use embassy_executor::Spawner;
use embassy_time::{Duration, Instant, Timer};
use esp_backtrace as _;
use chrono::NaiveDate;
use esp_hal::timer::timg::TimerGroup;

use therm_core::{
    config::ServerConfig,
    ds1621::{CONFIG_DONE, CONFIG_ONE_SHOT, DEFAULT_ADDRESS},
    error::ErrorKind,
    protocol::{self, ParsedReply},
    reading::{RawReading, Reading, TemperaturePoint, fahrenheit},
    sensor::Sensor,
};
use thermudp::{hardware, sntp::WallClock};

esp_bootloader_esp_idf::esp_app_desc!();

// Test result tracking
struct TestResults {
    passed: u32,
    failed: u32,
    total: u32,
}

impl TestResults {
    fn new() -> Self {
        Self {
            passed: 0,
            failed: 0,
            total: 0,
        }
    }

    fn assert(&mut self, condition: bool, test_name: &str) {
        self.total += 1;
        if condition {
            self.passed += 1;
            esp_println::println!("  ✓ {}", test_name);
        } else {
            self.failed += 1;
            esp_println::println!("  ✗ {} FAILED", test_name);
        }
    }

    fn assert_eq<T: PartialEq + core::fmt::Debug>(&mut self, left: T, right: T, test_name: &str) {
        self.total += 1;
        if left == right {
            self.passed += 1;
            esp_println::println!("  ✓ {}", test_name);
        } else {
            self.failed += 1;
            esp_println::println!("  ✗ {} FAILED: {:?} != {:?}", test_name, left, right);
        }
    }

    fn assert_close(&mut self, value: f32, expected: f32, tolerance: f32, test_name: &str) {
        self.total += 1;
        if (value - expected).abs() < tolerance {
            self.passed += 1;
            esp_println::println!("  ✓ {}", test_name);
        } else {
            self.failed += 1;
            esp_println::println!(
                "  ✗ {} FAILED: {:.4} not close to {:.4} (tolerance: {:.4})",
                test_name,
                value,
                expected,
                tolerance
            );
        }
    }

    fn print_summary(&self) {
        esp_println::println!("\n==========================================");
        esp_println::println!("Test Summary:");
        esp_println::println!("  Total:  {}", self.total);
        esp_println::println!("  Passed: {}", self.passed);
        esp_println::println!("  Failed: {}", self.failed);
        if self.failed == 0 {
            esp_println::println!("\n✓ ALL TESTS PASSED!");
        } else {
            esp_println::println!("\n✗ SOME TESTS FAILED");
        }
        esp_println::println!("==========================================");
    }
}

fn test_numerics(results: &mut TestResults) {
    esp_println::println!("\n[TEST] Conversion Formula Tests");

    let raw = |word, count, slope| RawReading { word, count, slope };

    results.assert_eq(raw(0x007D, 0, 1).lo_res_c(), 125.0, "lowRes +125.0");
    results.assert_eq(raw(0x8019, 0, 1).lo_res_c(), 25.5, "lowRes +25.5");
    results.assert_eq(raw(0x0000, 0, 1).lo_res_c(), 0.0, "lowRes 0.0");
    results.assert_eq(raw(0x80FF, 0, 1).lo_res_c(), -0.5, "lowRes -0.5");
    results.assert_eq(raw(0x00C9, 0, 1).lo_res_c(), -55.0, "lowRes -55.0");

    let scenario = raw(0x0C80, 10, 16);
    results.assert_eq(scenario.lo_res_c(), -128.0, "scenario lowRes");
    match scenario.hi_res_c() {
        Some(hi) => {
            results.assert_close(hi, -127.875, 0.0001, "scenario highRes");
            results.assert_close(fahrenheit(hi), -198.175, 0.001, "scenario highRes F");
        }
        None => results.assert(false, "scenario highRes (None returned)"),
    }

    results.assert_eq(raw(0x1900, 3, 0).hi_res_c(), None, "zero slope has no highRes");
    results.assert_close(fahrenheit(100.0), 212.0, 0.0001, "boiling point in F");
}

fn test_protocol(results: &mut TestResults) {
    esp_println::println!("\n[TEST] Wire Protocol Tests");

    let timestamp = NaiveDate::from_ymd_opt(2026, 10, 14)
        .and_then(|date| date.and_hms_opt(12, 0, 5))
        .unwrap_or_default();
    let point = TemperaturePoint {
        lo_res_c: 25.0,
        hi_res_c: 25.125,
        hi_res_f: 77.225,
        timestamp,
    };
    let reply = protocol::encode(&Ok(Reading::Measured(point)));
    results.assert(reply.contains("\"loResC\":25.0"), "whole degrees keep fraction");
    results.assert(reply.contains("\"date\":\"10/14/2026\""), "date is MM/DD/YYYY");
    results.assert(reply.ends_with('\n'), "reply is newline terminated");
    results.assert_eq(
        protocol::parse_reply(&reply),
        ParsedReply::HiResC(25.125),
        "client reads hiResC",
    );

    let reply = protocol::encode(&Err(ErrorKind::Timeout));
    results.assert_eq(
        reply.as_str(),
        "{\"error\":\"Conversion timed out.\"}\n",
        "timeout reply",
    );

    let reply = protocol::encode(&Ok(Reading::Simulated));
    results.assert_eq(
        protocol::parse_reply(&reply),
        ParsedReply::Message(protocol::SIMULATION_MESSAGE),
        "simulation reply",
    );

    let config = ServerConfig::parse("-port 5000 -addr 0x4F -bogus");
    results.assert_eq(config.port, 5000, "config port");
    results.assert_eq(config.device_address, 0x4F, "config hex address");
}

async fn test_ds1621_sensor<SDA, SCL>(
    results: &mut TestResults,
    i2c0: esp_hal::peripherals::I2C0<'static>,
    sda: SDA,
    scl: SCL,
) where
    SDA: Into<esp_hal::gpio::AnyPin<'static>>,
    SCL: Into<esp_hal::gpio::AnyPin<'static>>,
{
    esp_println::println!("\n[TEST] DS1621 Sensor Tests");

    let mut sensor = hardware::open_sensor(i2c0, sda, scl, DEFAULT_ADDRESS).await;
    results.assert(!sensor.is_simulated(), "DS1621 initialization");

    let Sensor::Ready(device) = &mut sensor else {
        esp_println::println!("  Skipping live tests, no device at 0x{:02X}", DEFAULT_ADDRESS);
        return;
    };

    match device.config().await {
        Ok(config) => {
            esp_println::println!("    Config: 0x{:02X}", config);
            results.assert(config & CONFIG_ONE_SHOT != 0, "one-shot mode set");
        }
        Err(e) => {
            esp_println::println!("    Failed to read config: {}", e.as_str());
            results.assert(false, "read config register");
        }
    }

    let started = Instant::now();
    let conversion = match device.start_conversion().await {
        Ok(()) => device.wait_for_conversion().await,
        Err(e) => Err(e),
    };
    let elapsed_ms = started.elapsed().as_millis();
    esp_println::println!("    Conversion took {} ms", elapsed_ms);
    results.assert(conversion.is_ok(), "conversion completes");
    results.assert(elapsed_ms <= 1_600, "conversion within poll budget");

    match device.config().await {
        Ok(config) => results.assert(config & CONFIG_DONE != 0, "DONE flag after conversion"),
        Err(_) => results.assert(false, "DONE flag after conversion"),
    }

    // Test temperature reading (5 samples)
    esp_println::println!("  Reading temperatures (5 samples)...");
    let clock = WallClock::unsynchronized(0);
    let mut temps = heapless::Vec::<f32, 5>::new();
    for i in 0..5 {
        Timer::after(Duration::from_millis(100)).await;
        match sensor.read_temperature(&clock).await {
            Ok(Reading::Measured(point)) => {
                esp_println::println!(
                    "    Sample {}: {:?}°C (low res {:?}°C)",
                    i + 1,
                    point.hi_res_c,
                    point.lo_res_c
                );
                results.assert(
                    (point.hi_res_c - point.lo_res_c).abs() <= 1.0,
                    "high and low resolution agree",
                );
                let _ = temps.push(point.hi_res_c);
            }
            Ok(Reading::Simulated) => esp_println::println!("    Sensor fell back to simulation"),
            Err(e) => esp_println::println!("    Failed to read temperature: {:?}", e),
        }
    }

    results.assert_eq(temps.len(), 5, "collected 5 temperature samples");

    if temps.len() == 5 {
        for temp in temps.iter() {
            results.assert(*temp >= -55.0 && *temp <= 125.0, "temperature in valid range");
        }

        // Check that readings are relatively stable (within 2°C)
        let min_temp = temps.iter().fold(f32::INFINITY, |a, &b| a.min(b));
        let max_temp = temps.iter().fold(f32::NEG_INFINITY, |a, &b| a.max(b));
        let range = max_temp - min_temp;
        results.assert(range < 2.0, "temperature readings stable (within 2°C)");
    }
}

#[esp_rtos::main]
async fn main(_spawner: Spawner) {
    esp_println::logger::init_logger_from_env();
    let peripherals = esp_hal::init(esp_hal::Config::default());

    esp_println::println!("\n==========================================");
    esp_println::println!("=== Hardware Unit Test Runner ===");
    esp_println::println!("==========================================");

    let mut results = TestResults::new();

    // Run tests that don't need hardware
    test_numerics(&mut results);
    test_protocol(&mut results);

    let i2c0 = peripherals.I2C0;
    let gpio8 = peripherals.GPIO8;
    let gpio9 = peripherals.GPIO9;

    // Initialize RTOS timer for embassy (this consumes TIMG0)
    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    test_ds1621_sensor(&mut results, i2c0, gpio8, gpio9).await;

    results.print_summary();

    esp_println::println!("\nTest run complete. Looping...");
    loop {
        if results.failed == 0 {
            Timer::after(Duration::from_millis(200)).await;
        } else {
            Timer::after(Duration::from_millis(1000)).await;
        }
    }
}
