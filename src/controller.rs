//! The door controller: ties the reader, dispatcher, feedback sequences,
//! standby screen and telemetry together.
//!
//! The controller runs a single cooperative loop. Each [`tick`] makes at
//! most one card read and one inbound message check and runs at most one
//! event to completion before returning.
//!
//! ```text
//!            card / remote unlock
//!   Standby ----------------------> Active
//!      ^                              |
//!      +------ feedback complete -----+
//! ```
//!
//! [`tick`]: DoorController::tick

use log::{debug, info, warn};

use crate::config::{Config, ConfigError, SensorRange};
use crate::connection::{ConnectError, ConnectionSupervisor, Link};
use crate::credential::{AllowList, Credential};
use crate::dispatch::RemoteDispatcher;
use crate::events::{Event, Mode, UnlockOrigin};
use crate::feedback::{settle, FeedbackCoordinator};
use crate::screen::{format_clock, second_of_minute, Screen};
use crate::telemetry::{TelemetrySample, TelemetryThrottler, ThrottleState};
use crate::traits::{
    CardReader, CharDisplay, ClimateSensor, Delay, DoorHardware, MqttClient, WallClock,
};

/// The devices of one board.
pub struct Devices<H: DoorHardware> {
    /// Tag reader
    pub reader: H::Reader,
    /// Character display
    pub display: H::Display,
    /// Door strike relay
    pub relay: H::Relay,
    /// Feedback buzzer
    pub buzzer: H::Buzzer,
    /// Temperature/humidity sensor
    pub sensor: H::Sensor,
    /// Wall-clock source
    pub clock: H::Clock,
    /// Blocking delay
    pub delay: H::Delay,
}

/// What a single [`DoorController::tick`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// A card was presented and checked against the allow-list.
    Card {
        /// Whether the card was on the list.
        valid: bool,
    },
    /// A remote unlock command was executed.
    Remote(UnlockOrigin),
    /// Standby screen refreshed with the broker connected.
    Standby {
        /// Whether this tick was a telemetry publish slot.
        published: bool,
    },
    /// Standby screen refreshed while the broker could not be reached.
    Offline,
}

/// Event controller for one door.
pub struct DoorController<H: DoorHardware, M: MqttClient> {
    devices: Devices<H>,
    mqtt: M,
    allow_list: AllowList,
    dispatcher: RemoteDispatcher,
    feedback: FeedbackCoordinator,
    throttler: TelemetryThrottler,
    supervisor: ConnectionSupervisor,
    screen: Screen,
    settle_ms: u32,
    temperature_range: SensorRange,
    utc_offset_secs: i64,
    mode: Mode,
    standing_by: bool,
    current: Credential,
    sample: TelemetrySample,
    power_on_pending: bool,
}

impl<H: DoorHardware, M: MqttClient> DoorController<H, M> {
    /// Create a controller.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `config` fails validation.
    pub fn new(config: Config, devices: Devices<H>, mqtt: M) -> Result<Self, ConfigError> {
        config.validate()?;

        if config.debug.reveal_credential {
            warn!("Card UIDs will be shown on the display");
        }

        Ok(Self {
            devices,
            mqtt,
            allow_list: config.lock.allow_list.clone(),
            dispatcher: RemoteDispatcher::from_config(&config.lock),
            feedback: FeedbackCoordinator::new(&config),
            throttler: TelemetryThrottler::new(config.telemetry, &config.mqtt),
            supervisor: ConnectionSupervisor::new(&config.mqtt),
            screen: Screen::from_config(&config.display),
            settle_ms: config.display.settle_ms,
            temperature_range: config.telemetry.temperature,
            utc_offset_secs: config.ntp.utc_offset_secs(),
            mode: Mode::Standby,
            standing_by: false,
            current: Credential::empty(),
            sample: TelemetrySample::invalid(),
            power_on_pending: false,
        })
    }

    /// Bring up the display, connect and announce the boot.
    ///
    /// If the broker cannot be reached the power-on notification stays
    /// pending and goes out after the first successful reconnect.
    pub fn boot(&mut self) -> Result<(), ConnectError> {
        info!("Door controller starting, {} card(s) allowed", self.allow_list.len());

        settle("display", self.devices.display.init());
        settle("display", self.screen.define_glyphs(&mut self.devices.display));

        self.power_on_pending = true;
        self.supervise()
    }

    /// Run one iteration of the control loop.
    pub fn tick(&mut self) -> TickOutcome {
        let online = match self.supervise() {
            Ok(()) => true,
            Err(e) => {
                warn!("Broker offline: {}", e);
                false
            }
        };

        if let Some(valid) = self.poll_card() {
            return TickOutcome::Card { valid };
        }

        if online {
            if let Some(origin) = self.poll_remote() {
                return TickOutcome::Remote(origin);
            }
        }

        let published = self.standby();
        if online {
            TickOutcome::Standby { published }
        } else {
            TickOutcome::Offline
        }
    }

    /// Run `event` to completion and return to standby.
    ///
    /// Returns whether the event's message reached the broker.
    pub fn handle_event(&mut self, event: Event) -> bool {
        info!("Handling {:?}", event);

        self.begin_event(event);
        let published = self
            .feedback
            .run(event, &self.current, &mut self.devices, &mut self.mqtt);
        self.finish_event(event, published);

        published
    }

    /// Current mode.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Most recently read card.
    pub fn current_credential(&self) -> &Credential {
        &self.current
    }

    /// Telemetry countdown.
    pub fn throttle_state(&self) -> &ThrottleState {
        self.throttler.state()
    }

    /// Latest climate reading.
    pub fn sample(&self) -> &TelemetrySample {
        &self.sample
    }

    /// True while the standby template is on screen.
    pub fn is_standing_by(&self) -> bool {
        self.standing_by
    }

    /// True until the power-on notification has been published.
    pub fn power_on_pending(&self) -> bool {
        self.power_on_pending
    }

    /// The board's devices.
    pub fn devices(&self) -> &Devices<H> {
        &self.devices
    }

    /// Mutable access to the board's devices.
    pub fn devices_mut(&mut self) -> &mut Devices<H> {
        &mut self.devices
    }

    /// The messaging client.
    pub fn mqtt(&self) -> &M {
        &self.mqtt
    }

    /// Mutable access to the messaging client.
    pub fn mqtt_mut(&mut self) -> &mut M {
        &mut self.mqtt
    }

    fn supervise(&mut self) -> Result<(), ConnectError> {
        match self
            .supervisor
            .ensure_connected(&self.screen, &mut self.devices, &mut self.mqtt)
        {
            Ok(Link::Up) => Ok(()),
            Ok(Link::Restored) => {
                self.standing_by = false;
                if self.power_on_pending {
                    self.handle_event(Event::PowerOn);
                }
                Ok(())
            }
            Err(e) => {
                self.standing_by = false;
                Err(e)
            }
        }
    }

    /// Leave standby for events with a feedback sequence.
    fn begin_event(&mut self, event: Event) {
        if event.needs_feedback() {
            self.mode = Mode::Active;
            self.standing_by = false;
        }
    }

    fn finish_event(&mut self, event: Event, published: bool) {
        if event == Event::PowerOn && published {
            self.power_on_pending = false;
        }
        self.mode = Mode::Standby;
    }

    fn poll_card(&mut self) -> Option<bool> {
        let card = self.devices.reader.read_uid()?;
        if card.is_blank() {
            debug!("Ignoring blank card read");
            return None;
        }

        let valid = self.allow_list.is_valid(&card);
        info!("Card presented, {}", if valid { "accepted" } else { "rejected" });
        self.current = card;

        self.handle_event(if valid {
            Event::CardUnlockOk
        } else {
            Event::CardUnlockFail
        });
        Some(valid)
    }

    fn poll_remote(&mut self) -> Option<UnlockOrigin> {
        let message = self.mqtt.try_recv()?;
        if message.topic != self.supervisor.unlock_topic() {
            debug!("Ignoring message on {}", message.topic);
            return None;
        }

        match self.dispatcher.decode(&message.payload)? {
            Event::RemoteUnlock(origin) => {
                info!("Remote unlock requested via {}", origin.as_str());
                self.handle_event(Event::RemoteUnlock(origin));
                Some(origin)
            }
            _ => None,
        }
    }

    fn standby(&mut self) -> bool {
        if !self.standing_by {
            settle("display", self.screen.reset(&mut self.devices.display));
            self.devices.delay.delay_ms(self.settle_ms);
            settle(
                "display",
                self.screen.show_standby_template(&mut self.devices.display),
            );
            self.standing_by = true;
        }

        self.sample = match self.devices.sensor.read() {
            Ok(sample) => sample,
            Err(e) => {
                debug!("Climate sensor read failed: {:?}", e);
                TelemetrySample::invalid()
            }
        };

        let now = self.devices.clock.now_epoch_secs();
        if let Some(clock) = now.and_then(|secs| format_clock(secs, self.utc_offset_secs)) {
            settle("display", self.screen.show_clock(&mut self.devices.display, &clock));
        }

        if let Some(degrees) = self.sample.valid_temperature(&self.temperature_range) {
            settle(
                "display",
                self.screen.show_temperature(&mut self.devices.display, degrees),
            );
        }

        // Until the first sync the throttle counts seconds of uptime
        let second = match now {
            Some(secs) => second_of_minute(secs),
            None => (self.devices.clock.uptime_secs() % 60) as u32,
        };
        self.throttler
            .tick(second, &self.sample, &mut self.mqtt, &mut self.devices.delay)
    }
}
