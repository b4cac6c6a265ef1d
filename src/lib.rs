//! # rs-doorlock
//!
//! An RFID door lock controller: a card reader and remote MQTT commands
//! unlock a relay-driven strike, with buzzer and character display feedback
//! and periodic temperature/humidity reporting.
//!
//! ## Features
//!
//! - **Hardware abstraction**: Traits for the reader, relay, buzzer, display, sensor and clock
//! - **Two unlock sources**: Allow-listed cards and remote commands over MQTT
//! - **Feedback sequences**: Status screen, tone pattern and relay countdown per event
//! - **Standby screen**: Live clock and temperature, redrawn only when needed
//! - **Telemetry**: Temperature and humidity published once per configured interval
//! - **Bounded reconnects**: The door keeps working on cards while the broker is away
//!
//! ## Architecture
//!
//! The crate is structured to allow testing on desktop without hardware:
//!
//! - `traits` - Hardware and network abstractions
//! - `credential` - Card UIDs and the allow-list
//! - `events` - Events, their MQTT payloads and the controller mode
//! - `dispatch` - Remote command decoding
//! - `feedback` - The per-event display, buzzer and relay sequence
//! - `screen` - Character display layout and custom glyphs
//! - `telemetry` - Climate samples and the publish throttle
//! - `connection` - Broker reconnect and subscription supervision
//! - `controller` - Main loop that ties everything together
//! - `hal` - Concrete implementations (mock for testing, esp32 for hardware)
//!
//! ## Example
//!
//! ```rust
//! use rs_doorlock::{
//!     Config, DoorController, TickOutcome,
//!     hal::{mock_devices, MockMqtt},
//!     traits::LockState,
//! };
//!
//! // Controller over mock hardware
//! let config = Config::default();
//! let devices = mock_devices(&config);
//! let mut door = DoorController::new(config, devices, MockMqtt::new()).unwrap();
//! door.boot().unwrap();
//!
//! // Present the demo card
//! door.devices_mut().reader.present(&[0xAB, 0xCD, 0xEF, 0x00]);
//! assert_eq!(door.tick(), TickOutcome::Card { valid: true });
//!
//! // The strike was released, then locked again after the countdown
//! let relay = &door.devices().relay;
//! assert_eq!(relay.history(), &[LockState::Unlocked, LockState::Locked]);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

extern crate alloc;

/// Card UIDs and allow-list matching.
pub mod credential;
/// Hardware abstraction layer with mock implementations for testing.
pub mod hal;
/// Core traits for hardware and network abstraction.
pub mod traits;

/// Shared configuration system for desktop and ESP32.
pub mod config;

/// Broker reconnect and subscription supervision.
pub mod connection;
/// Main door controller that coordinates input, feedback and telemetry.
pub mod controller;
/// Remote unlock command decoding.
pub mod dispatch;
/// Events, unlock origins and their MQTT payloads.
pub mod events;
/// Per-event display, buzzer and relay sequences.
pub mod feedback;
/// Character display layout and custom glyphs.
pub mod screen;
/// Climate samples and the telemetry publish throttle.
pub mod telemetry;

/// Network services for the desktop build (feature-gated).
#[cfg(feature = "mqtt")]
pub mod services;

// Re-exports for convenience
pub use connection::{ConnectError, ConnectionSupervisor, Link};
pub use controller::{Devices, DoorController, TickOutcome};
pub use credential::{is_valid, AllowList, Credential};
pub use dispatch::RemoteDispatcher;
pub use events::{Event, Mode, UnlockOrigin};
pub use feedback::FeedbackCoordinator;
pub use screen::Screen;
pub use telemetry::{TelemetrySample, TelemetryThrottler, ThrottleState};
pub use traits::{
    // Hardware
    Buzzer,
    CardReader,
    // Display
    CharDisplay,
    ClimateSensor,
    Delay,
    DoorHardware,
    LockRelay,
    LockState,
    // Network
    MqttClient,
    MqttMessage,
    WallClock,
};

// Config re-exports
pub use config::{
    BuzzerConfig, Config, ConfigError, DebugConfig, DisplayConfig, LockConfig, MqttConfig,
    NtpConfig, RetryPolicy, TelemetryConfig, WifiConfig,
};
