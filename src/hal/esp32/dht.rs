//! DHT11 temperature and humidity sensor on a single open-drain GPIO.
//!
//! The bus protocol is handled by the `dht-sensor` driver; this module adds
//! the pin setup, the sampling interval and the conversion to
//! [`TelemetrySample`].
//!
//! # Wiring
//!
//! - DATA → GPIO33 with a 10k pull-up to 3.3V
//! - VCC → 3.3V
//! - GND → GND

use core::fmt::Debug;

use dht_sensor::{dht11, DhtReading};
use esp_idf_hal::delay::Ets;
use esp_idf_hal::gpio::{InputOutput, InputPin, OutputPin, PinDriver};
use esp_idf_hal::peripheral::Peripheral;
use esp_idf_hal::sys::EspError;

use super::monotonic_us;
use crate::telemetry::TelemetrySample;
use crate::traits::ClimateSensor;

/// DHT11 read failure.
#[derive(Debug)]
pub enum DhtError {
    /// The sensor did not answer in time.
    Timeout,
    /// The checksum byte did not match the data.
    Checksum,
    /// GPIO driver error.
    Gpio(String),
}

impl core::fmt::Display for DhtError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            DhtError::Timeout => write!(f, "DHT11 did not respond"),
            DhtError::Checksum => write!(f, "DHT11 checksum mismatch"),
            DhtError::Gpio(e) => write!(f, "DHT11 GPIO error: {}", e),
        }
    }
}

impl std::error::Error for DhtError {}

impl From<EspError> for DhtError {
    fn from(e: EspError) -> Self {
        DhtError::Gpio(e.to_string())
    }
}

impl<E: Debug> From<dht_sensor::DhtError<E>> for DhtError {
    fn from(e: dht_sensor::DhtError<E>) -> Self {
        match e {
            dht_sensor::DhtError::Timeout => DhtError::Timeout,
            dht_sensor::DhtError::ChecksumMismatch => DhtError::Checksum,
            dht_sensor::DhtError::PinError(e) => DhtError::Gpio(format!("{:?}", e)),
        }
    }
}

/// DHT11 sensor.
///
/// The sensor cannot be sampled more than about once per second. Reads made
/// sooner than [`MIN_INTERVAL_US`](Self::MIN_INTERVAL_US) after the last
/// successful one return the cached sample.
///
/// # Example
///
/// ```ignore
/// use rs_doorlock::hal::esp32::Esp32Dht;
/// use rs_doorlock::traits::ClimateSensor;
///
/// let mut dht = Esp32Dht::new(peripherals.pins.gpio33)?;
/// let sample = dht.read()?;
/// ```
pub struct Esp32Dht<'d, P: InputPin + OutputPin> {
    pin: PinDriver<'d, P, InputOutput>,
    delay: Ets,
    last: Option<(i64, TelemetrySample)>,
}

impl<'d, P: InputPin + OutputPin> Esp32Dht<'d, P> {
    /// Minimum time between two bus transactions.
    pub const MIN_INTERVAL_US: i64 = 2_000_000;

    /// Take the data pin and leave the bus idle (released high).
    ///
    /// # Errors
    ///
    /// Returns an error if the GPIO cannot be configured.
    pub fn new(pin: impl Peripheral<P = P> + 'd) -> Result<Self, EspError> {
        let mut pin = PinDriver::input_output_od(pin)?;
        pin.set_high()?;
        Ok(Self {
            pin,
            delay: Ets,
            last: None,
        })
    }
}

impl<P: InputPin + OutputPin> ClimateSensor for Esp32Dht<'_, P> {
    type Error = DhtError;

    fn read(&mut self) -> Result<TelemetrySample, DhtError> {
        let now = monotonic_us();
        if let Some((at, sample)) = self.last {
            if now - at < Self::MIN_INTERVAL_US {
                return Ok(sample);
            }
        }

        let reading = dht11::Reading::read(&mut self.delay, &mut self.pin);
        // Leave the bus released whatever happened
        self.pin.set_high()?;

        let dht11::Reading {
            temperature,
            relative_humidity,
        } = reading?;
        let sample = TelemetrySample::new(temperature as f32, relative_humidity as f32);
        self.last = Some((now, sample));
        Ok(sample)
    }
}
