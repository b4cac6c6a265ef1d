//! Network services for the desktop build.
//!
//! - `mqtt` feature: [`mqtt::RumqttClient`], an [`MqttClient`](crate::traits::MqttClient)
//!   backed by `rumqttc` with a background connection thread
//!
//! The ESP32 build gets the same trait from
//! `hal::esp32::Esp32Mqtt` instead.

#[cfg(feature = "mqtt")]
pub mod mqtt;

#[cfg(feature = "mqtt")]
pub use mqtt::{MqttError, RumqttClient};
