//! Broker connection supervision.
//!
//! Before each tick the controller asks the [`ConnectionSupervisor`] to
//! make sure the client is connected and subscribed to the remote unlock
//! topic. While the link is down the door shows a waiting screen and
//! retries according to the configured [`RetryPolicy`]. A bounded policy
//! gives control back to the controller, so cards still work offline.

use log::{info, warn};

use crate::config::{LongString, MqttConfig, RetryPolicy, TOPIC_UNLOCK_REMOTE};
use crate::controller::Devices;
use crate::feedback::settle;
use crate::screen::Screen;
use crate::traits::{Delay, DoorHardware, MqttClient};

/// Why the broker link could not be brought up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectError {
    /// Every reconnect attempt allowed by the policy failed.
    Exhausted {
        /// Number of attempts made.
        attempts: u32,
    },
    /// Connected, but the broker refused the remote unlock subscription.
    Subscribe,
}

impl core::fmt::Display for ConnectError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Exhausted { attempts } => {
                write!(f, "broker unreachable after {} attempts", attempts)
            }
            Self::Subscribe => write!(f, "subscription to remote unlock topic failed"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ConnectError {}

/// State of the link after a successful [`ConnectionSupervisor::ensure_connected`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Link {
    /// Already connected and subscribed; nothing was done.
    Up,
    /// The session or the subscription had to be (re)established.
    Restored,
}

/// Keeps the broker session alive.
#[derive(Clone, Debug)]
pub struct ConnectionSupervisor {
    policy: RetryPolicy,
    unlock_topic: LongString,
    subscribed: bool,
}

impl ConnectionSupervisor {
    /// Supervisor for the topics and retry policy of `mqtt`.
    pub fn new(mqtt: &MqttConfig) -> Self {
        Self {
            policy: mqtt.retry,
            unlock_topic: mqtt.topic(TOPIC_UNLOCK_REMOTE),
            subscribed: false,
        }
    }

    /// Topic remote unlock commands arrive on.
    pub fn unlock_topic(&self) -> &str {
        &self.unlock_topic
    }

    /// True once the remote unlock subscription is in place.
    pub fn is_subscribed(&self) -> bool {
        self.subscribed
    }

    /// Make sure the client is connected and subscribed.
    ///
    /// Returns immediately when nothing needs doing. Otherwise the waiting
    /// screen is drawn and up to `max_attempts` reconnects are made,
    /// sleeping `delay_ms` between failures.
    ///
    /// # Errors
    ///
    /// [`ConnectError::Exhausted`] when the policy runs out of attempts and
    /// [`ConnectError::Subscribe`] when the broker accepted the session but
    /// not the subscription. The subscription is retried on the next call.
    pub fn ensure_connected<H, M>(
        &mut self,
        screen: &Screen,
        devices: &mut Devices<H>,
        mqtt: &mut M,
    ) -> Result<Link, ConnectError>
    where
        H: DoorHardware,
        M: MqttClient,
    {
        if mqtt.is_connected() {
            if self.subscribed {
                return Ok(Link::Up);
            }
            self.subscribe(mqtt)?;
            return Ok(Link::Restored);
        }

        if self.subscribed {
            match self.policy.max_block_ms() {
                Some(ms) => warn!("Broker connection lost, each retry pass may block {} ms", ms),
                None => warn!("Broker connection lost, retrying until it is back"),
            }
        }
        self.subscribed = false;
        settle("display", screen.show_waiting(&mut devices.display));

        let mut attempts = 0u32;
        loop {
            attempts += 1;
            match mqtt.reconnect() {
                Ok(()) => {
                    info!("Connected to broker after {} attempt(s)", attempts);
                    self.subscribe(mqtt)?;
                    return Ok(Link::Restored);
                }
                Err(e) => warn!("Broker connect attempt {} failed: {:?}", attempts, e),
            }

            if self.policy.exhausted(attempts) {
                return Err(ConnectError::Exhausted { attempts });
            }
            devices.delay.delay_ms(self.policy.delay_ms);
        }
    }

    fn subscribe<M: MqttClient>(&mut self, mqtt: &mut M) -> Result<(), ConnectError> {
        match mqtt.subscribe(&self.unlock_topic) {
            Ok(()) => {
                info!("Subscribed to {}", self.unlock_topic);
                self.subscribed = true;
                Ok(())
            }
            Err(e) => {
                warn!("Subscribe to {} failed: {:?}", self.unlock_topic, e);
                Err(ConnectError::Subscribe)
            }
        }
    }
}
