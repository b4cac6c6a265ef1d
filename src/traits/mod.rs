//! Trait definitions for hardware abstraction and networking.
//!
//! This module defines the core abstractions that allow rs-doorlock to:
//! - Run on different hardware (ESP32, desktop simulator, test mocks)
//! - Use different MQTT client implementations
//!
//! # Submodules
//!
//! - `hardware`: Card reader, lock relay, buzzer, climate sensor, clocks
//! - `display`: Character display trait
//! - `network`: MQTT client trait
//!
//! # Hardware Abstraction
//!
//! A board is described by a [`DoorHardware`] implementation whose
//! associated types name one driver for each device:
//!
//! - [`CardReader`]: Contactless tag reader
//! - [`CharDisplay`]: 16x2 character display
//! - [`LockRelay`]: Door strike relay
//! - [`Buzzer`]: Piezo buzzer
//! - [`ClimateSensor`]: Temperature/humidity sensor
//! - [`WallClock`]: Synchronized wall time
//! - [`Delay`]: Blocking delay

pub mod display;
pub mod hardware;
pub mod network;

pub use display::*;
pub use hardware::*;
pub use network::*;
