//! MQTT client for ESP32.
//!
//! Provides MQTT pub/sub functionality using esp-idf-svc. Implements the
//! [`MqttClient`] trait so the door controller can drive it like any other
//! client.
//!
//! The ESP-IDF client reconnects to the broker on its own. The event thread
//! tracks the session state in an atomic flag, and [`MqttClient::reconnect`]
//! only reports whether the session is back; the controller's retry policy
//! sets the pace of that polling.
//!
//! # Example
//!
//! ```ignore
//! use rs_doorlock::hal::esp32::Esp32Mqtt;
//! use rs_doorlock::config::MqttConfig;
//! use rs_doorlock::traits::MqttClient;
//!
//! let config = MqttConfig::default()
//!     .with_host("192.168.1.100")
//!     .with_topic_prefix("door/front");
//!
//! let mut mqtt = Esp32Mqtt::new(&config)?;
//! mqtt.publish("door/front/poweron", b"poweron", false)?;
//! ```

use crate::config::MqttConfig;
use crate::traits::{MqttClient, MqttMessage};
use esp_idf_svc::mqtt::client::{
    EspMqttClient, EspMqttConnection, EventPayload, MqttClientConfiguration, QoS,
};
use log::{debug, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// MQTT client for the door controller.
///
/// Incoming messages are queued by a background thread and polled via
/// [`try_recv()`](MqttClient::try_recv).
pub struct Esp32Mqtt {
    client: EspMqttClient<'static>,
    message_rx: Receiver<MqttMessage>,
    connected: Arc<AtomicBool>,
}

impl Esp32Mqtt {
    /// Create the client and start connecting to the broker.
    ///
    /// Returns as soon as the client is created; the session comes up in the
    /// background.
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be created.
    pub fn new(config: &MqttConfig) -> anyhow::Result<Self> {
        let broker_url = format!("mqtt://{}:{}", config.host.as_str(), config.port);

        let mqtt_config = MqttClientConfiguration {
            client_id: Some(config.client_id.as_str()),
            keep_alive_interval: Some(Duration::from_secs(config.keep_alive_secs as u64)),
            username: config.has_auth().then(|| config.username.as_str()),
            password: config.has_auth().then(|| config.password.as_str()),
            reconnect_timeout: Some(Duration::from_millis(config.retry.delay_ms as u64)),
            ..Default::default()
        };

        let (message_tx, message_rx) = channel::<MqttMessage>();
        let connected = Arc::new(AtomicBool::new(false));

        let (client, mut connection) = EspMqttClient::new(&broker_url, &mqtt_config)?;

        let flag = Arc::clone(&connected);
        thread::Builder::new()
            .stack_size(6 * 1024)
            .spawn(move || handle_mqtt_events(&mut connection, message_tx, &flag))?;

        info!("[MQTT] Client created for {}", broker_url);

        Ok(Self {
            client,
            message_rx,
            connected,
        })
    }
}

// ============================================================================
// MqttClient Trait Implementation
// ============================================================================

/// Error type for ESP32 MQTT operations.
#[derive(Debug)]
pub struct Esp32MqttError(pub String);

impl core::fmt::Display for Esp32MqttError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "MQTT error: {}", self.0)
    }
}

impl std::error::Error for Esp32MqttError {}

impl MqttClient for Esp32Mqtt {
    type Error = Esp32MqttError;

    fn publish(&mut self, topic: &str, payload: &[u8], retain: bool) -> Result<(), Self::Error> {
        if !self.is_connected() {
            return Err(Esp32MqttError("not connected".into()));
        }
        let qos = if retain {
            QoS::AtLeastOnce
        } else {
            QoS::AtMostOnce
        };
        self.client
            .publish(topic, qos, retain, payload)
            .map_err(|e| Esp32MqttError(format!("{:?}", e)))?;
        Ok(())
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), Self::Error> {
        self.client
            .subscribe(topic, QoS::AtLeastOnce)
            .map_err(|e| Esp32MqttError(format!("{:?}", e)))?;
        info!("[MQTT] Subscribed to {}", topic);
        Ok(())
    }

    fn try_recv(&mut self) -> Option<MqttMessage> {
        match self.message_rx.try_recv() {
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

    fn reconnect(&mut self) -> Result<(), Self::Error> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(Esp32MqttError("broker session not up yet".into()))
        }
    }
}

// ============================================================================
// Event Thread
// ============================================================================

fn handle_mqtt_events(
    connection: &mut EspMqttConnection,
    message_tx: Sender<MqttMessage>,
    connected: &AtomicBool,
) {
    loop {
        match connection.next() {
            Err(e) => {
                warn!("[MQTT] Error: {:?}", e);
                connected.store(false, Ordering::Relaxed);
                thread::sleep(Duration::from_secs(1));
            }
            Ok(event) => match event.payload() {
                EventPayload::Connected(_) => {
                    info!("[MQTT] Connected");
                    connected.store(true, Ordering::Relaxed);
                }
                EventPayload::Disconnected => {
                    warn!("[MQTT] Disconnected");
                    connected.store(false, Ordering::Relaxed);
                }
                EventPayload::Received {
                    topic: Some(topic),
                    data,
                    ..
                } => {
                    debug!("[MQTT] {} <- {} bytes", topic, data.len());
                    let msg = MqttMessage::new(topic, data.to_vec());
                    if message_tx.send(msg).is_err() {
                        // Client dropped
                        return;
                    }
                }
                _ => {}
            },
        }
    }
}
