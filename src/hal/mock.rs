//! Mock implementations for testing without hardware.
//!
//! This module provides test doubles for all hardware and network traits,
//! enabling development and testing on desktop without physical hardware.
//!
//! # Available Mocks
//!
//! | Mock | Trait | Purpose |
//! |------|-------|---------|
//! | [`MockReader`] | [`CardReader`] | Queued card presentations |
//! | [`MockDisplay`] | [`CharDisplay`] | Character grid plus write log |
//! | [`MockRelay`] | [`LockRelay`] | Records every state change |
//! | [`MockBuzzer`] | [`Buzzer`] | Records tone frequencies |
//! | [`MockSensor`] | [`ClimateSensor`] | Settable reading or failure |
//! | [`MockWallClock`] | [`WallClock`] | Controllable wall time |
//! | [`MockDelay`] | [`Delay`] | Records requested delays, never sleeps |
//! | [`MockMqtt`] | [`MqttClient`] | Captures pub/sub, simulates outages |
//!
//! [`MockBoard`] groups the hardware mocks into a [`DoorHardware`] family.
//!
//! # Example
//!
//! ```rust
//! use rs_doorlock::config::Config;
//! use rs_doorlock::controller::{DoorController, TickOutcome};
//! use rs_doorlock::hal::{mock_devices, MockMqtt};
//!
//! let config = Config::default();
//! let devices = mock_devices(&config);
//! let mut door = DoorController::new(config, devices, MockMqtt::new()).unwrap();
//! door.boot().unwrap();
//!
//! door.devices_mut().reader.present(&[0xAB, 0xCD, 0xEF, 0x00]);
//! assert_eq!(door.tick(), TickOutcome::Card { valid: true });
//! ```
//!
//! [`CardReader`]: crate::traits::CardReader
//! [`CharDisplay`]: crate::traits::CharDisplay
//! [`LockRelay`]: crate::traits::LockRelay
//! [`Buzzer`]: crate::traits::Buzzer
//! [`ClimateSensor`]: crate::traits::ClimateSensor
//! [`WallClock`]: crate::traits::WallClock
//! [`Delay`]: crate::traits::Delay
//! [`MqttClient`]: crate::traits::MqttClient
//! [`DoorHardware`]: crate::traits::DoorHardware

extern crate alloc;
use alloc::string::String;
use alloc::vec::Vec;

use super::grid::CharGrid;
use crate::config::Config;
use crate::controller::Devices;
use crate::credential::Credential;
use crate::telemetry::TelemetrySample;
use crate::traits::{
    Buzzer, CardReader, CharDisplay, ClimateSensor, Delay, DoorHardware, GlyphBitmap, LockRelay,
    LockState, MqttClient, MqttMessage, WallClock,
};

/// Error returned by mocks configured to fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MockError;

// ============================================================================
// Hardware Mocks
// ============================================================================

/// Mock card reader.
///
/// Cards queued with [`present`](Self::present) are returned one per
/// `read_uid()` call, in order.
///
/// # Example
///
/// ```rust
/// use rs_doorlock::hal::MockReader;
/// use rs_doorlock::traits::CardReader;
///
/// let mut reader = MockReader::new();
/// reader.present(&[1, 2, 3, 4]);
///
/// assert_eq!(reader.read_uid().unwrap().as_bytes(), &[1, 2, 3, 4]);
/// assert!(reader.read_uid().is_none());
/// ```
#[derive(Debug, Default)]
pub struct MockReader {
    /// Cards waiting to be read.
    pub queue: Vec<Credential>,
    /// Number of times `read_uid` was called.
    pub poll_count: usize,
}

impl MockReader {
    /// Creates a reader with nothing in the field.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a card presentation.
    pub fn present(&mut self, uid: &[u8]) {
        self.queue.push(Credential::from_slice(uid));
    }
}

impl CardReader for MockReader {
    fn read_uid(&mut self) -> Option<Credential> {
        self.poll_count += 1;
        if self.queue.is_empty() {
            None
        } else {
            Some(self.queue.remove(0))
        }
    }
}

/// Mock character display.
///
/// Keeps the screen contents in a [`CharGrid`] and logs each text write
/// with the cursor position it started at.
///
/// # Example
///
/// ```
/// use rs_doorlock::hal::MockDisplay;
/// use rs_doorlock::traits::CharDisplay;
///
/// let mut display = MockDisplay::new(16, 2);
/// display.init().unwrap();
/// display.set_cursor(2, 1).unwrap();
/// display.write_str("hi").unwrap();
///
/// assert_eq!(display.row_text(1), "  hi            ");
/// assert_eq!(display.writes, vec![(2, 1, "hi".to_string())]);
/// ```
#[derive(Debug)]
pub struct MockDisplay {
    /// Screen contents.
    pub grid: CharGrid,
    /// Every `write_str` call as (column, row, text).
    pub writes: Vec<(u8, u8, String)>,
    /// Number of times `clear()` was called.
    pub clears: usize,
    /// Whether `init()` was called.
    pub initialized: bool,
}

impl MockDisplay {
    /// Creates a blank display of the given size.
    pub fn new(width: u8, height: u8) -> Self {
        Self {
            grid: CharGrid::new(width, height),
            writes: Vec::new(),
            clears: 0,
            initialized: false,
        }
    }

    /// One row as text; see [`CharGrid::row_text`].
    pub fn row_text(&self, row: u8) -> String {
        self.grid.row_text(row)
    }

    /// Code in one cell.
    pub fn code_at(&self, col: u8, row: u8) -> u8 {
        self.grid.code_at(col, row)
    }

    /// Number of full-screen clears so far.
    pub fn clear_count(&self) -> usize {
        self.clears
    }

    /// Forget the write log.
    pub fn reset_log(&mut self) {
        self.writes.clear();
        self.clears = 0;
    }
}

impl Default for MockDisplay {
    fn default() -> Self {
        Self::new(16, 2)
    }
}

impl CharDisplay for MockDisplay {
    type Error = MockError;

    fn init(&mut self) -> Result<(), MockError> {
        self.initialized = true;
        self.grid.clear();
        Ok(())
    }

    fn clear(&mut self) -> Result<(), MockError> {
        self.clears += 1;
        self.grid.clear();
        Ok(())
    }

    fn set_cursor(&mut self, col: u8, row: u8) -> Result<(), MockError> {
        self.grid.set_cursor(col, row);
        Ok(())
    }

    fn write_str(&mut self, text: &str) -> Result<(), MockError> {
        let (col, row) = self.grid.cursor();
        self.writes.push((col, row, text.into()));
        self.grid.write_str(text);
        Ok(())
    }

    fn write_code(&mut self, code: u8) -> Result<(), MockError> {
        self.grid.put(code);
        Ok(())
    }

    fn define_glyph(&mut self, code: u8, bitmap: &GlyphBitmap) -> Result<(), MockError> {
        self.grid.define_glyph(code, bitmap);
        Ok(())
    }
}

/// Mock lock relay.
///
/// # Example
///
/// ```rust
/// use rs_doorlock::hal::MockRelay;
/// use rs_doorlock::traits::{LockRelay, LockState};
///
/// let mut relay = MockRelay::new();
/// relay.unlock().unwrap();
/// relay.lock().unwrap();
///
/// assert_eq!(relay.history(), &[LockState::Unlocked, LockState::Locked]);
/// ```
#[derive(Debug, Default)]
pub struct MockRelay {
    /// Current state.
    pub state: LockState,
    /// Every successful state change, in order.
    pub changes: Vec<LockState>,
    /// When true, `set_state` fails without changing anything.
    pub fail: bool,
}

impl MockRelay {
    /// Creates a locked relay.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent writes fail.
    pub fn set_fail(&mut self, fail: bool) {
        self.fail = fail;
    }

    /// State changes so far.
    pub fn history(&self) -> &[LockState] {
        &self.changes
    }
}

impl LockRelay for MockRelay {
    type Error = MockError;

    fn set_state(&mut self, state: LockState) -> Result<(), MockError> {
        if self.fail {
            return Err(MockError);
        }
        self.state = state;
        self.changes.push(state);
        Ok(())
    }

    fn state(&self) -> LockState {
        self.state
    }
}

/// Mock buzzer.
#[derive(Debug, Default)]
pub struct MockBuzzer {
    /// Frequency of every tone started, in order.
    pub started: Vec<u32>,
    /// Tone currently sounding.
    pub sounding: Option<u32>,
    /// Number of times `stop()` was called.
    pub stops: usize,
}

impl MockBuzzer {
    /// Creates a silent buzzer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Frequencies of the tones played so far.
    pub fn tones(&self) -> &[u32] {
        &self.started
    }
}

impl Buzzer for MockBuzzer {
    type Error = MockError;

    fn start_tone(&mut self, freq_hz: u32) -> Result<(), MockError> {
        self.started.push(freq_hz);
        self.sounding = Some(freq_hz);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), MockError> {
        self.sounding = None;
        self.stops += 1;
        Ok(())
    }
}

/// Mock climate sensor.
///
/// Returns `sample` on every read, or an error while `fail` is set.
#[derive(Debug)]
pub struct MockSensor {
    /// Reading returned by `read()`.
    pub sample: TelemetrySample,
    /// When true, reads fail.
    pub fail: bool,
}

impl MockSensor {
    /// Sensor reporting 25 °C and 60 %.
    pub fn new() -> Self {
        Self::with_reading(25.0, 60.0)
    }

    /// Sensor reporting fixed values.
    pub fn with_reading(temperature: f32, humidity: f32) -> Self {
        Self {
            sample: TelemetrySample::new(temperature, humidity),
            fail: false,
        }
    }

    /// Change the reading.
    pub fn set(&mut self, temperature: f32, humidity: f32) {
        self.sample = TelemetrySample::new(temperature, humidity);
    }
}

impl Default for MockSensor {
    fn default() -> Self {
        Self::new()
    }
}

impl ClimateSensor for MockSensor {
    type Error = MockError;

    fn read(&mut self) -> Result<TelemetrySample, MockError> {
        if self.fail {
            Err(MockError)
        } else {
            Ok(self.sample)
        }
    }
}

/// Mock wall clock.
///
/// # Example
///
/// ```rust
/// use rs_doorlock::hal::MockWallClock;
/// use rs_doorlock::traits::WallClock;
///
/// let mut clock = MockWallClock::unsynced();
/// assert_eq!(clock.now_epoch_secs(), None);
/// clock.advance(2);
/// assert_eq!(clock.uptime_secs(), 2);
///
/// clock.set(1_700_000_000);
/// clock.advance(5);
/// assert_eq!(clock.now_epoch_secs(), Some(1_700_000_005));
/// assert_eq!(clock.uptime_secs(), 7);
/// ```
#[derive(Debug)]
pub struct MockWallClock {
    /// Current UTC time, `None` until synchronized.
    pub epoch_secs: Option<i64>,
    /// Seconds since power-on.
    pub uptime_secs: u64,
}

impl MockWallClock {
    /// Clock synchronized to 2024-03-05 09:07:00 UTC.
    pub fn new() -> Self {
        Self {
            epoch_secs: Some(1_709_629_620),
            uptime_secs: 0,
        }
    }

    /// Clock that has not been synchronized yet.
    pub fn unsynced() -> Self {
        Self {
            epoch_secs: None,
            uptime_secs: 0,
        }
    }

    /// Set the current time.
    pub fn set(&mut self, epoch_secs: i64) {
        self.epoch_secs = Some(epoch_secs);
    }

    /// Let `secs` seconds pass. Wall time only moves once synchronized.
    pub fn advance(&mut self, secs: i64) {
        self.uptime_secs += secs.max(0) as u64;
        if let Some(now) = self.epoch_secs.as_mut() {
            *now += secs;
        }
    }
}

impl Default for MockWallClock {
    fn default() -> Self {
        Self::new()
    }
}

impl WallClock for MockWallClock {
    fn now_epoch_secs(&self) -> Option<i64> {
        self.epoch_secs
    }

    fn uptime_secs(&self) -> u64 {
        self.uptime_secs
    }
}

/// Mock delay that records requests and returns immediately.
#[derive(Debug, Default)]
pub struct MockDelay {
    /// Every requested delay in milliseconds.
    pub requested: Vec<u32>,
}

impl MockDelay {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requested delays so far.
    pub fn calls(&self) -> &[u32] {
        &self.requested
    }

    /// Sum of all requested delays.
    pub fn total_ms(&self) -> u64 {
        self.requested.iter().map(|ms| *ms as u64).sum()
    }

    /// Forget recorded delays.
    pub fn reset(&mut self) {
        self.requested.clear();
    }
}

impl Delay for MockDelay {
    fn delay_ms(&mut self, ms: u32) {
        self.requested.push(ms);
    }
}

/// [`DoorHardware`] family made of the mocks above.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockBoard;

impl DoorHardware for MockBoard {
    type Reader = MockReader;
    type Display = MockDisplay;
    type Relay = MockRelay;
    type Buzzer = MockBuzzer;
    type Sensor = MockSensor;
    type Clock = MockWallClock;
    type Delay = MockDelay;
}

/// Fresh mock devices sized for `config`'s display.
pub fn mock_devices(config: &Config) -> Devices<MockBoard> {
    Devices {
        reader: MockReader::new(),
        display: MockDisplay::new(config.display.width, config.display.height),
        relay: MockRelay::new(),
        buzzer: MockBuzzer::new(),
        sensor: MockSensor::new(),
        clock: MockWallClock::new(),
        delay: MockDelay::new(),
    }
}

// ============================================================================
// Network Mocks
// ============================================================================

/// Mock MQTT client for testing.
///
/// Records all publish/subscribe operations and allows injecting
/// incoming messages and connection failures.
///
/// # Example
///
/// ```rust
/// use rs_doorlock::hal::MockMqtt;
/// use rs_doorlock::traits::MqttClient;
///
/// let mut mqtt = MockMqtt::new();
///
/// // Queue incoming message
/// mqtt.inject("doorlock/unlock-remote", "web>>unlock");
/// assert_eq!(mqtt.try_recv().unwrap().payload_str(), Some("web>>unlock"));
///
/// // Simulate an outage that lasts two reconnect attempts
/// mqtt.disconnect();
/// mqtt.fail_next_connects(2);
/// assert!(mqtt.reconnect().is_err());
/// assert!(mqtt.reconnect().is_err());
/// assert!(mqtt.reconnect().is_ok());
/// assert!(mqtt.is_connected());
/// ```
#[derive(Debug, Default)]
pub struct MockMqtt {
    /// Messages that have been published (topic, payload, retain).
    pub published: Vec<(String, Vec<u8>, bool)>,
    /// Topics that have been subscribed to.
    pub subscriptions: Vec<String>,
    /// Queue of incoming messages to be returned by `try_recv()`.
    pub incoming: Vec<MqttMessage>,
    /// Whether the client is connected.
    pub connected: bool,
    /// Reconnect attempts that will still fail.
    pub connect_failures: u32,
    /// Number of `reconnect()` calls.
    pub connect_calls: u32,
    /// Number of `publish()` calls, including failed ones.
    pub publish_calls: usize,
    /// When true, every publish fails.
    pub fail_publish: bool,
    /// When true, every subscribe fails.
    pub fail_subscribe: bool,
}

impl MockMqtt {
    /// Creates a new mock MQTT client in connected state.
    pub fn new() -> Self {
        Self {
            connected: true,
            ..Default::default()
        }
    }

    /// Queue an incoming message
    pub fn inject(&mut self, topic: impl Into<String>, payload: impl Into<Vec<u8>>) {
        self.incoming.push(MqttMessage::new(topic, payload));
    }

    /// Drop the connection; subscriptions are forgotten, as on a real
    /// broker with a clean session.
    pub fn disconnect(&mut self) {
        self.connected = false;
        self.subscriptions.clear();
    }

    /// Make the next `count` reconnect attempts fail.
    pub fn fail_next_connects(&mut self, count: u32) {
        self.connect_failures = count;
    }

    /// Make publishes fail or succeed.
    pub fn set_fail_publish(&mut self, fail: bool) {
        self.fail_publish = fail;
    }

    /// Make subscribes fail or succeed.
    pub fn set_fail_subscribe(&mut self, fail: bool) {
        self.fail_subscribe = fail;
    }

    /// Number of reconnect attempts so far.
    pub fn connect_attempts(&self) -> u32 {
        self.connect_calls
    }

    /// Number of publish attempts so far.
    pub fn publish_attempts(&self) -> usize {
        self.publish_calls
    }

    /// Current subscriptions.
    pub fn subscriptions(&self) -> &[String] {
        &self.subscriptions
    }

    /// Check if a topic was subscribed to
    pub fn is_subscribed(&self, topic: &str) -> bool {
        self.subscriptions.iter().any(|t| t == topic)
    }

    /// Get published messages for a topic
    pub fn published_to(&self, topic: &str) -> Vec<&(String, Vec<u8>, bool)> {
        self.published
            .iter()
            .filter(|(t, _, _)| t == topic)
            .collect()
    }

    /// Payloads published to a topic, as text.
    pub fn published_payloads(&self, topic: &str) -> Vec<String> {
        self.published_to(topic)
            .into_iter()
            .map(|(_, payload, _)| String::from_utf8_lossy(payload).into_owned())
            .collect()
    }
}

impl MqttClient for MockMqtt {
    type Error = MockError;

    fn publish(&mut self, topic: &str, payload: &[u8], retain: bool) -> Result<(), MockError> {
        self.publish_calls += 1;
        if self.fail_publish || !self.connected {
            return Err(MockError);
        }
        self.published.push((topic.into(), payload.to_vec(), retain));
        Ok(())
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), MockError> {
        if self.fail_subscribe || !self.connected {
            return Err(MockError);
        }
        self.subscriptions.push(topic.into());
        Ok(())
    }

    fn try_recv(&mut self) -> Option<MqttMessage> {
        if self.incoming.is_empty() {
            None
        } else {
            Some(self.incoming.remove(0))
        }
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn reconnect(&mut self) -> Result<(), MockError> {
        self.connect_calls += 1;
        if self.connect_failures > 0 {
            self.connect_failures -= 1;
            return Err(MockError);
        }
        self.connected = true;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_reader_fifo_order() {
        let mut reader = MockReader::new();
        reader.present(&[1, 1, 1, 1]);
        reader.present(&[2, 2, 2, 2]);

        assert_eq!(reader.read_uid().unwrap().as_bytes(), &[1, 1, 1, 1]);
        assert_eq!(reader.read_uid().unwrap().as_bytes(), &[2, 2, 2, 2]);
        assert!(reader.read_uid().is_none());
        assert_eq!(reader.poll_count, 3);
    }

    #[test]
    fn mock_display_logs_writes() {
        let mut display = MockDisplay::new(16, 2);
        display.set_cursor(0, 1).unwrap();
        display.write_str("abc").unwrap();
        display.clear().unwrap();

        assert_eq!(display.writes, vec![(0, 1, "abc".to_string())]);
        assert_eq!(display.clear_count(), 1);
        assert_eq!(display.row_text(1).trim_end(), "");
    }

    #[test]
    fn mock_relay_failure_keeps_state() {
        let mut relay = MockRelay::new();
        relay.set_fail(true);
        assert_eq!(relay.unlock(), Err(MockError));
        assert_eq!(relay.state(), LockState::Locked);
        assert!(relay.history().is_empty());
    }

    #[test]
    fn mock_buzzer_tracks_tone() {
        let mut buzzer = MockBuzzer::new();
        buzzer.start_tone(4500).unwrap();
        assert_eq!(buzzer.sounding, Some(4500));
        buzzer.stop().unwrap();
        assert_eq!(buzzer.sounding, None);
        assert_eq!(buzzer.tones(), &[4500]);
    }

    #[test]
    fn mock_sensor_failure() {
        let mut sensor = MockSensor::with_reading(21.0, 40.0);
        assert_eq!(sensor.read().unwrap().temperature, 21.0);
        sensor.fail = true;
        assert!(sensor.read().is_err());
    }

    #[test]
    fn mock_mqtt_offline_publish_fails() {
        let mut mqtt = MockMqtt::new();
        mqtt.disconnect();
        assert!(mqtt.publish("t", b"x", false).is_err());
        assert_eq!(mqtt.publish_attempts(), 1);
        assert!(mqtt.published.is_empty());
    }

    #[test]
    fn mock_mqtt_disconnect_drops_subscriptions() {
        let mut mqtt = MockMqtt::new();
        mqtt.subscribe("doorlock/unlock-remote").unwrap();
        assert!(mqtt.is_subscribed("doorlock/unlock-remote"));
        mqtt.disconnect();
        assert!(!mqtt.is_subscribed("doorlock/unlock-remote"));
    }

    #[test]
    fn mock_delay_totals() {
        let mut delay = MockDelay::new();
        delay.delay_ms(1000);
        delay.delay_ms(500);
        assert_eq!(delay.total_ms(), 1500);
        delay.reset();
        assert!(delay.calls().is_empty());
    }
}
