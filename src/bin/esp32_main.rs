//! ESP32 DevKit RFID door lock controller.
//!
//! This is the main entry point for the physical hardware controller.
//! It brings up WiFi, SNTP and MQTT, then runs the door controller loop:
//! - Polls the RC522 reader for cards
//! - Executes remote unlock commands from MQTT
//! - Drives the relay, buzzer and OLED feedback sequences
//! - Shows the clock and temperature while idle
//! - Publishes temperature and humidity every few seconds
//!
//! # Hardware Setup
//!
//! See [`rs_doorlock::hal::esp32::pins`] for the wiring.
//!
//! # Build
//!
//! ```bash
//! WIFI_SSID=... WIFI_PASSWORD=... MQTT_HOST=192.168.1.10 \
//!     cargo build --release --bin esp32_main --features esp32-full
//!
//! # Flash and monitor
//! espflash flash --monitor target/xtensa-esp32-espidf/release/esp32_main
//! ```

use esp_idf_hal::gpio::PinDriver;
use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::prelude::*;
use esp_idf_hal::spi::{config::Config as SpiConfig, SpiDeviceDriver, SpiDriver, SpiDriverConfig};
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::log::EspLogger;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use log::{info, warn};
use rs_doorlock::hal::esp32::{
    Esp32Board, Esp32Buzzer, Esp32Delay, Esp32Dht, Esp32Display, Esp32Mqtt, Esp32Reader,
    Esp32Relay, Esp32WallClock, Esp32Wifi,
};
use rs_doorlock::{Config, Devices, DoorController, TickOutcome};
use std::thread;
use std::time::Duration;

/// Pause between controller ticks
const LOOP_INTERVAL_MS: u64 = 50;

fn main() -> anyhow::Result<()> {
    // Initialize ESP-IDF
    esp_idf_hal::sys::link_patches();
    EspLogger::initialize_default();

    info!("================================");
    info!("  rs-doorlock DevKit Controller");
    info!("================================");

    // =========================================================================
    // Configuration
    // =========================================================================
    let config = Config::default()
        .with_wifi(
            rs_doorlock::WifiConfig::default()
                .with_ssid(option_env!("WIFI_SSID").unwrap_or(""))
                .with_password(option_env!("WIFI_PASSWORD").unwrap_or("")),
        )
        .with_mqtt(
            rs_doorlock::MqttConfig::default()
                .with_host(option_env!("MQTT_HOST").unwrap_or("localhost"))
                .with_client_id(option_env!("MQTT_CLIENT_ID").unwrap_or("rs-doorlock")),
        )
        .with_debug(
            rs_doorlock::DebugConfig::default()
                .with_reveal_credential(option_env!("REVEAL_CARD").is_some())
                .with_force_network_reset(option_env!("RESET_NETWORK").is_some()),
        );
    config.validate()?;

    let peripherals = Peripherals::take()?;

    // =========================================================================
    // Card Reader (RC522 on VSPI)
    // =========================================================================
    let spi = SpiDriver::new(
        peripherals.spi2,
        peripherals.pins.gpio18, // SCK
        peripherals.pins.gpio23, // MOSI
        Some(peripherals.pins.gpio19), // MISO
        &SpiDriverConfig::new(),
    )?;
    let spi = SpiDeviceDriver::new(
        spi,
        Some(peripherals.pins.gpio5), // SDA / CS
        &SpiConfig::new().baudrate(1.MHz().into()),
    )?;
    let reader = Esp32Reader::new(spi, PinDriver::output(peripherals.pins.gpio4)?)?;
    info!("[OK] Card reader initialized (VSPI, RST GPIO4)");

    // =========================================================================
    // Display (SSD1306 on GPIO21/22)
    // =========================================================================
    let i2c = I2cDriver::new(
        peripherals.i2c0,
        peripherals.pins.gpio21, // SDA
        peripherals.pins.gpio22, // SCL
        &I2cConfig::new().baudrate(400.kHz().into()),
    )?;
    let display = Esp32Display::new(i2c, config.display.width, config.display.height);
    info!("[OK] Display initialized (GPIO21/22 I2C)");

    // =========================================================================
    // Relay, Buzzer and Sensor
    // =========================================================================
    let relay = Esp32Relay::new(peripherals.pins.gpio27)?;
    let buzzer = Esp32Buzzer::new(
        peripherals.ledc.timer0,
        peripherals.ledc.channel0,
        peripherals.pins.gpio32,
    )?;
    let sensor = Esp32Dht::new(peripherals.pins.gpio33)?;
    info!("[OK] Relay GPIO27, buzzer GPIO32, DHT11 GPIO33");

    // =========================================================================
    // WiFi (required for SNTP and MQTT)
    // =========================================================================
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;
    if !config.wifi.is_configured() {
        warn!("[WARN] WiFi not configured (set WIFI_SSID/WIFI_PASSWORD)");
    }
    let wifi = Esp32Wifi::new(
        peripherals.modem,
        sysloop,
        Some(nvs),
        &config.wifi,
        config.debug.force_network_reset,
    )?;
    info!("[OK] WiFi connected: {:?}", wifi.ip_addr());

    // =========================================================================
    // Time and MQTT
    // =========================================================================
    let clock = Esp32WallClock::new(&config.ntp)?;
    let mqtt = Esp32Mqtt::new(&config.mqtt)?;
    info!(
        "[OK] MQTT client for {}:{}",
        config.mqtt.host, config.mqtt.port
    );

    let devices: Devices<Esp32Board> = Devices {
        reader,
        display,
        relay,
        buzzer,
        sensor,
        clock,
        delay: Esp32Delay,
    };

    // =========================================================================
    // Controller
    // =========================================================================
    let mut door = DoorController::new(config, devices, mqtt)?;
    if let Err(e) = door.boot() {
        warn!("[WARN] Starting offline: {}", e);
    }

    info!("Starting control loop...");

    let mut wifi_up = true;
    loop {
        match door.tick() {
            TickOutcome::Card { valid } => info!("Card handled (valid: {})", valid),
            TickOutcome::Remote(origin) => info!("Remote unlock from {:?}", origin),
            TickOutcome::Standby { .. } | TickOutcome::Offline => {}
        }

        let up = wifi.is_connected();
        if up != wifi_up {
            if up {
                info!("WiFi link restored: {:?}", wifi.ip_addr());
            } else {
                warn!("WiFi link down");
            }
            wifi_up = up;
        }

        thread::sleep(Duration::from_millis(LOOP_INTERVAL_MS));
    }
}
