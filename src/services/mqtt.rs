//! Desktop MQTT client built on `rumqttc`.
//!
//! A background thread drives the `rumqttc` connection. It forwards every
//! incoming publish into a channel and mirrors the session state into an
//! atomic flag, so the controller can use the client through the blocking,
//! poll-style [`MqttClient`] trait exactly like the ESP32 client.
//!
//! `rumqttc` re-dials the broker on the next poll after a failure. The
//! thread waits [`RetryPolicy::delay_ms`](crate::config::RetryPolicy) between
//! polls after an error, and [`MqttClient::reconnect`] reports whether the
//! session is back.
//!
//! # Example
//!
//! ```ignore
//! use rs_doorlock::config::MqttConfig;
//! use rs_doorlock::services::mqtt::RumqttClient;
//! use rs_doorlock::traits::MqttClient;
//!
//! let config = MqttConfig::default().with_host("localhost");
//! let mut mqtt = RumqttClient::connect(&config);
//! if mqtt.is_connected() {
//!     mqtt.publish("doorlock/poweron", b"poweron", false)?;
//! }
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::{debug, info, warn};
use rumqttc::{Client, ConnectReturnCode, Connection, Event, MqttOptions, Packet, QoS};

use crate::config::MqttConfig;
use crate::traits::{MqttClient, MqttMessage};

/// Capacity of the request channel between the client and its connection.
const REQUEST_CAPACITY: usize = 10;

// ============================================================================
// Options
// ============================================================================

/// Build `rumqttc` options from the shared configuration.
pub fn options(config: &MqttConfig) -> MqttOptions {
    let mut options = MqttOptions::new(
        config.client_id.as_str(),
        config.host.as_str(),
        config.port,
    );
    options.set_keep_alive(Duration::from_secs(config.keep_alive_secs.max(5) as u64));
    if config.has_auth() {
        options.set_credentials(config.username.as_str(), config.password.as_str());
    }
    options
}

// ============================================================================
// Client
// ============================================================================

/// [`MqttClient`] backed by a `rumqttc` blocking client.
pub struct RumqttClient {
    client: Client,
    messages: Receiver<MqttMessage>,
    connected: Arc<AtomicBool>,
}

impl RumqttClient {
    /// Create the client and start its connection thread.
    ///
    /// Does not wait for the broker; [`is_connected`](MqttClient::is_connected)
    /// turns true once the broker acknowledges the session.
    pub fn connect(config: &MqttConfig) -> Self {
        let (client, connection) = Client::new(options(config), REQUEST_CAPACITY);
        let (tx, messages) = mpsc::channel();
        let connected = Arc::new(AtomicBool::new(false));

        let flag = Arc::clone(&connected);
        let pause = Duration::from_millis(config.retry.delay_ms as u64);
        let broker = format!("{}:{}", config.host, config.port);
        thread::spawn(move || drive(connection, tx, &flag, pause, &broker));

        Self {
            client,
            messages,
            connected,
        }
    }
}

fn drive(
    mut connection: Connection,
    tx: Sender<MqttMessage>,
    connected: &AtomicBool,
    pause: Duration,
    broker: &str,
) {
    for event in connection.iter() {
        match event {
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                let up = ack.code == ConnectReturnCode::Success;
                if up {
                    info!("MQTT connected to {}", broker);
                } else {
                    warn!("MQTT broker {} refused the session: {:?}", broker, ack.code);
                }
                connected.store(up, Ordering::Relaxed);
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                debug!("MQTT {} <- {} bytes", publish.topic, publish.payload.len());
                let msg = MqttMessage::new(publish.topic, publish.payload.to_vec());
                if tx.send(msg).is_err() {
                    // Client dropped
                    return;
                }
            }
            Ok(Event::Incoming(Packet::Disconnect)) => {
                connected.store(false, Ordering::Relaxed);
            }
            Ok(_) => {}
            Err(e) => {
                if connected.swap(false, Ordering::Relaxed) {
                    warn!("MQTT connection to {} lost: {}", broker, e);
                } else {
                    debug!("MQTT connect to {} failed: {}", broker, e);
                }
                thread::sleep(pause);
            }
        }
    }
}

impl MqttClient for RumqttClient {
    type Error = MqttError;

    fn publish(&mut self, topic: &str, payload: &[u8], retain: bool) -> Result<(), MqttError> {
        if !self.is_connected() {
            return Err(MqttError::Publish("not connected".to_string()));
        }
        self.client
            .publish(topic, QoS::AtLeastOnce, retain, payload.to_vec())
            .map_err(|e| MqttError::Publish(e.to_string()))
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), MqttError> {
        if !self.is_connected() {
            return Err(MqttError::Subscribe("not connected".to_string()));
        }
        self.client
            .subscribe(topic, QoS::AtLeastOnce)
            .map_err(|e| MqttError::Subscribe(e.to_string()))?;
        info!("MQTT subscribed to {}", topic);
        Ok(())
    }

    fn try_recv(&mut self) -> Option<MqttMessage> {
        match self.messages.try_recv() {
            Ok(msg) => Some(msg),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.connected.store(false, Ordering::Relaxed);
                None
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    fn reconnect(&mut self) -> Result<(), MqttError> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(MqttError::Connect("broker session not up".to_string()))
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

/// MQTT client error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MqttError {
    /// No broker session.
    Connect(String),
    /// Subscription request could not be queued.
    Subscribe(String),
    /// Publish request could not be queued.
    Publish(String),
}

impl std::fmt::Display for MqttError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connect(e) => write!(f, "MQTT connect error: {}", e),
            Self::Subscribe(e) => write!(f, "MQTT subscribe error: {}", e),
            Self::Publish(e) => write!(f, "MQTT publish error: {}", e),
        }
    }
}

impl std::error::Error for MqttError {}
