//! Desktop door lock simulator.
//!
//! Runs the real controller against terminal devices and a real MQTT
//! broker, so the whole flow can be exercised without hardware:
//! - Type a card UID as hex on stdin (`AB CD EF 00`) to present a card
//! - Publish `telegram>>unlock` or `web>>unlock` to `doorlock/unlock-remote`
//! - Watch `doorlock/#` for status, power-on and telemetry messages
//!
//! # Usage
//!
//! ```sh
//! cargo run --bin desktop_sim --features mqtt
//!
//! # Custom configuration (JSON, every field optional)
//! cargo run --bin desktop_sim --features mqtt -- door.json
//!
//! # More logging
//! RUST_LOG=rs_doorlock=debug cargo run --bin desktop_sim --features mqtt
//! ```
//!
//! # Configuration
//!
//! `MQTT_HOST` and `MQTT_PORT` override the broker address from the file.

use std::thread;
use std::time::Duration;

use anyhow::Context;
use log::{info, warn};
use rs_doorlock::hal::desktop::{
    DesktopBoard, LoggingBuzzer, LoggingRelay, SimulatedSensor, StdDelay, StdinReader,
    SystemClock, TerminalDisplay,
};
use rs_doorlock::services::RumqttClient;
use rs_doorlock::{Config, Devices, DoorController, TickOutcome};
use tracing_subscriber::EnvFilter;

/// Pause between controller ticks
const LOOP_INTERVAL_MS: u64 = 100;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    println!("=================================");
    println!("  rs-doorlock Desktop Simulator");
    println!("=================================");
    println!();

    let config = load_config()?;
    info!(
        "Broker {}:{}, topics under {}/",
        config.mqtt.host, config.mqtt.port, config.mqtt.topic_prefix
    );

    let devices: Devices<DesktopBoard> = Devices {
        reader: StdinReader::spawn(),
        display: TerminalDisplay::new(config.display.width, config.display.height),
        relay: LoggingRelay::default(),
        buzzer: LoggingBuzzer,
        sensor: SimulatedSensor::new(),
        clock: SystemClock::new(),
        delay: StdDelay,
    };
    let mqtt = RumqttClient::connect(&config.mqtt);

    // Give the connection thread a moment before the first supervision pass
    thread::sleep(Duration::from_millis(500));

    let mut door = DoorController::new(config, devices, mqtt).context("invalid configuration")?;
    if let Err(e) = door.boot() {
        warn!("Starting offline: {}", e);
    }

    println!();
    println!("Type a card UID (e.g. AB CD EF 00) and press Enter to present it.");
    println!("Press Ctrl+C to stop.");
    println!();

    loop {
        match door.tick() {
            TickOutcome::Card { valid } => info!("Card handled (valid: {})", valid),
            TickOutcome::Remote(origin) => info!("Remote unlock from {:?}", origin),
            TickOutcome::Standby { .. } | TickOutcome::Offline => {}
        }
        thread::sleep(Duration::from_millis(LOOP_INTERVAL_MS));
    }
}

fn load_config() -> anyhow::Result<Config> {
    let mut config = match std::env::args().nth(1) {
        Some(path) => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("reading config file {}", path))?;
            serde_json::from_str::<Config>(&text)
                .with_context(|| format!("parsing config file {}", path))?
        }
        None => Config::default(),
    };

    if let Ok(host) = std::env::var("MQTT_HOST") {
        config.mqtt = config.mqtt.with_host(&host);
    }
    if let Ok(port) = std::env::var("MQTT_PORT") {
        let port = port.parse().context("MQTT_PORT is not a port number")?;
        config.mqtt = config.mqtt.with_port(port);
    }

    config.validate()?;
    Ok(config)
}
