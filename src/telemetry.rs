//! Temperature/humidity samples and the publish throttler.
//!
//! The throttler counts down in distinct wall-clock seconds rather than
//! ticks, so a fast control loop that lands several ticks in the same
//! second still publishes only once per interval.
//!
//! # Example
//!
//! ```rust
//! use rs_doorlock::telemetry::ThrottleState;
//!
//! let mut state = ThrottleState::new();
//!
//! // The very first observation is due immediately
//! assert!(state.advance(10, 5));
//!
//! // Same second again: nothing happens
//! assert!(!state.advance(10, 5));
//!
//! // Five distinct seconds later it is due again
//! for s in 11..=15 {
//!     assert!(!state.advance(s, 5));
//! }
//! assert!(state.advance(15, 5));
//! ```

use core::fmt::Write;

use heapless::String as HString;
use log::{debug, warn};

use crate::config::{
    LongString, MqttConfig, SensorRange, TelemetryConfig, TOPIC_HUMIDITY, TOPIC_TEMPERATURE,
};
use crate::traits::{Delay, MqttClient};

/// Longest payload published for one reading.
pub const PAYLOAD_LEN: usize = 2;

/// One reading from the climate sensor.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TelemetrySample {
    /// Temperature in °C
    pub temperature: f32,
    /// Relative humidity in %
    pub humidity: f32,
}

impl TelemetrySample {
    /// Create a sample.
    pub const fn new(temperature: f32, humidity: f32) -> Self {
        Self {
            temperature,
            humidity,
        }
    }

    /// A sample that is never displayed or published, used when the sensor
    /// read fails.
    pub const fn invalid() -> Self {
        Self::new(f32::NAN, f32::NAN)
    }

    /// Temperature truncated to whole degrees, if inside `range`.
    pub fn valid_temperature(&self, range: &SensorRange) -> Option<i32> {
        checked(self.temperature, range)
    }

    /// Humidity truncated to whole percent, if inside `range`.
    pub fn valid_humidity(&self, range: &SensorRange) -> Option<i32> {
        checked(self.humidity, range)
    }
}

impl Default for TelemetrySample {
    fn default() -> Self {
        Self::invalid()
    }
}

fn checked(value: f32, range: &SensorRange) -> Option<i32> {
    range.contains(value).then_some(value as i32)
}

/// Render a whole-number reading as a publish payload.
///
/// At most [`PAYLOAD_LEN`] characters are kept, so `100` becomes `"10"`.
/// Valid ranges keep real readings well inside that width.
pub fn format_reading(value: i32) -> HString<PAYLOAD_LEN> {
    let mut full: HString<12> = HString::new();
    let _ = write!(full, "{}", value);

    let mut out = HString::new();
    for c in full.chars().take(PAYLOAD_LEN) {
        let _ = out.push(c);
    }
    out
}

/// Countdown bookkeeping for periodic telemetry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ThrottleState {
    /// Distinct seconds left until the next publish; 0 means due now.
    pub countdown: u8,
    /// Second-of-minute seen on the previous tick, unset until the first.
    pub last_second: Option<u32>,
}

impl ThrottleState {
    /// Fresh state: due on the first tick.
    pub const fn new() -> Self {
        Self {
            countdown: 0,
            last_second: None,
        }
    }

    /// Record one tick observed at `second`.
    ///
    /// Returns `true` when a publish is due, in which case the countdown
    /// has already been reset to `interval`.
    pub fn advance(&mut self, second: u32, interval: u8) -> bool {
        if self.countdown == 0 {
            self.countdown = interval;
            self.last_second = Some(second);
            return true;
        }

        if self.last_second != Some(second) {
            self.last_second = Some(second);
            self.countdown -= 1;
        }
        false
    }
}

/// Publishes temperature and humidity at a fixed interval.
///
/// Publishing is fire-and-forget: failures are logged and never retried.
#[derive(Clone, Debug)]
pub struct TelemetryThrottler {
    config: TelemetryConfig,
    temperature_topic: LongString,
    humidity_topic: LongString,
    state: ThrottleState,
}

impl TelemetryThrottler {
    /// Create a throttler publishing under the topics of `mqtt`.
    pub fn new(config: TelemetryConfig, mqtt: &MqttConfig) -> Self {
        Self {
            config,
            temperature_topic: mqtt.topic(TOPIC_TEMPERATURE),
            humidity_topic: mqtt.topic(TOPIC_HUMIDITY),
            state: ThrottleState::new(),
        }
    }

    /// Current countdown state.
    pub fn state(&self) -> &ThrottleState {
        &self.state
    }

    /// Run one standby tick.
    ///
    /// `second` is the current second of the minute. Returns `true` if this
    /// tick was a publish slot, even when both readings were invalid and
    /// nothing was actually sent.
    pub fn tick<M, D>(
        &mut self,
        second: u32,
        sample: &TelemetrySample,
        mqtt: &mut M,
        delay: &mut D,
    ) -> bool
    where
        M: MqttClient,
        D: Delay,
    {
        if !self.state.advance(second, self.config.interval) {
            return false;
        }

        match sample.valid_temperature(&self.config.temperature) {
            Some(t) => publish(mqtt, &self.temperature_topic, t),
            None => debug!("Skipping temperature publish, reading {} invalid", sample.temperature),
        }

        delay.delay_ms(self.config.publish_gap_ms);

        match sample.valid_humidity(&self.config.humidity) {
            Some(h) => publish(mqtt, &self.humidity_topic, h),
            None => debug!("Skipping humidity publish, reading {} invalid", sample.humidity),
        }

        true
    }
}

fn publish<M: MqttClient>(mqtt: &mut M, topic: &str, value: i32) {
    let payload = format_reading(value);
    match mqtt.publish(topic, payload.as_bytes(), false) {
        Ok(()) => debug!("Published {} to {}", payload, topic),
        Err(e) => warn!("Telemetry publish to {} failed: {:?}", topic, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::{MockDelay, MockMqtt};

    fn throttler() -> TelemetryThrottler {
        TelemetryThrottler::new(TelemetryConfig::default(), &MqttConfig::default())
    }

    // =========================================================================
    // ThrottleState Tests
    // =========================================================================

    #[test]
    fn first_tick_is_due() {
        let mut state = ThrottleState::new();
        assert!(state.advance(42, 5));
        assert_eq!(state.countdown, 5);
        assert_eq!(state.last_second, Some(42));
    }

    #[test]
    fn same_second_does_not_count() {
        let mut state = ThrottleState::new();
        state.advance(0, 5);
        for _ in 0..100 {
            assert!(!state.advance(0, 5));
        }
        assert_eq!(state.countdown, 5);
    }

    #[test]
    fn counts_distinct_seconds_across_minute_wrap() {
        let mut state = ThrottleState::new();
        assert!(state.advance(57, 3));
        assert!(!state.advance(58, 3));
        assert!(!state.advance(59, 3));
        assert!(!state.advance(0, 3));
        assert_eq!(state.countdown, 0);
        assert!(state.advance(0, 3));
    }

    // =========================================================================
    // Payload Tests
    // =========================================================================

    #[test]
    fn payload_is_truncated_integer() {
        assert_eq!(format_reading(23).as_str(), "23");
        assert_eq!(format_reading(7).as_str(), "7");
        assert_eq!(format_reading(100).as_str(), "10");
        assert_eq!(format_reading(-5).as_str(), "-5");
    }

    #[test]
    fn sample_validation_truncates() {
        let sample = TelemetrySample::new(23.9, 61.2);
        let config = TelemetryConfig::default();
        assert_eq!(sample.valid_temperature(&config.temperature), Some(23));
        assert_eq!(sample.valid_humidity(&config.humidity), Some(61));
    }

    #[test]
    fn invalid_sample_never_validates() {
        let sample = TelemetrySample::invalid();
        let config = TelemetryConfig::default();
        assert_eq!(sample.valid_temperature(&config.temperature), None);
        assert_eq!(sample.valid_humidity(&config.humidity), None);
    }

    // =========================================================================
    // Throttler Tests
    // =========================================================================

    #[test]
    fn publishes_both_readings_with_gap() {
        let mut t = throttler();
        let mut mqtt = MockMqtt::new();
        let mut delay = MockDelay::new();

        assert!(t.tick(0, &TelemetrySample::new(24.5, 55.0), &mut mqtt, &mut delay));

        assert_eq!(mqtt.published_payloads("doorlock/temp"), vec!["24"]);
        assert_eq!(mqtt.published_payloads("doorlock/humid"), vec!["55"]);
        assert_eq!(delay.calls(), &[500]);
    }

    #[test]
    fn out_of_range_reading_is_skipped_but_countdown_resets() {
        let mut t = throttler();
        let mut mqtt = MockMqtt::new();
        let mut delay = MockDelay::new();

        assert!(t.tick(0, &TelemetrySample::new(120.0, 55.0), &mut mqtt, &mut delay));

        assert!(mqtt.published_payloads("doorlock/temp").is_empty());
        assert_eq!(mqtt.published_payloads("doorlock/humid"), vec!["55"]);
        assert_eq!(t.state().countdown, 5);
    }

    #[test]
    fn publish_failure_is_not_retried() {
        let mut t = throttler();
        let mut mqtt = MockMqtt::new();
        mqtt.set_fail_publish(true);
        let mut delay = MockDelay::new();

        assert!(t.tick(0, &TelemetrySample::new(20.0, 50.0), &mut mqtt, &mut delay));
        assert!(!t.tick(0, &TelemetrySample::new(20.0, 50.0), &mut mqtt, &mut delay));
        assert_eq!(mqtt.publish_attempts(), 2);
    }
}
