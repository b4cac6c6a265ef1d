//! Network abstraction trait for MQTT.
//!
//! The door talks to the outside world exclusively through a broker:
//!
//! ```text
//! doorlock/unlock-remote  - Inbound unlock commands ("telegram>>unlock", "web>>unlock")
//! doorlock/unlock-status  - Outcome of every unlock attempt
//! doorlock/poweron        - Published once after each boot
//! doorlock/temp           - Temperature in whole degrees
//! doorlock/humid          - Relative humidity in whole percent
//! ```

extern crate alloc;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt::Debug;

// ============================================================================
// MQTT Client Trait (Sync-First Design)
// ============================================================================

/// MQTT client trait for pub/sub messaging.
///
/// This trait uses a **sync-first design** that works on both ESP32 (blocking I/O)
/// and desktop, where a background thread drives the network event loop.
///
/// # Implementation Notes
///
/// - `publish` and `subscribe` are synchronous (blocking on ESP32)
/// - `try_recv` is non-blocking for polling patterns
/// - Reconnection is driven by the caller through [`reconnect`](Self::reconnect),
///   so that the door can show a waiting screen while it happens
///
/// # Example
///
/// ```rust,ignore
/// use rs_doorlock::traits::MqttClient;
///
/// fn report<M: MqttClient>(client: &mut M) {
///     client.publish("doorlock/unlock-status", b"unlocked:card", false).unwrap();
/// }
/// ```
pub trait MqttClient {
    /// Error type for MQTT operations.
    type Error: Debug;

    /// Publish a message to a topic (blocking).
    ///
    /// # Arguments
    /// - `topic`: MQTT topic path
    /// - `payload`: Message bytes
    /// - `retain`: If true, broker keeps message for new subscribers
    fn publish(&mut self, topic: &str, payload: &[u8], retain: bool) -> Result<(), Self::Error>;

    /// Subscribe to a topic (blocking).
    fn subscribe(&mut self, topic: &str) -> Result<(), Self::Error>;

    /// Try to receive the next message (non-blocking).
    ///
    /// Returns `None` if no message is available. This should never block.
    fn try_recv(&mut self) -> Option<MqttMessage>;

    /// Check if connected to broker.
    fn is_connected(&self) -> bool;

    /// Make one attempt to (re)establish the broker session.
    ///
    /// Subscriptions do not survive a reconnect; callers subscribe again
    /// after this succeeds.
    fn reconnect(&mut self) -> Result<(), Self::Error>;
}

/// An MQTT message received from a subscription.
///
/// Contains the topic and payload of a published message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MqttMessage {
    /// Topic the message was published to.
    pub topic: String,
    /// Message payload as raw bytes.
    pub payload: Vec<u8>,
}

impl MqttMessage {
    /// Create a new MQTT message.
    pub fn new(topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }

    /// Returns the payload as a UTF-8 string, if valid.
    pub fn payload_str(&self) -> Option<&str> {
        core::str::from_utf8(&self.payload).ok()
    }
}
