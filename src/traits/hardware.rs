//! Hardware abstraction traits for the card reader, lock relay, buzzer,
//! climate sensor and time sources.
//!
//! This module defines the device interfaces that allow rs-doorlock to
//! work across different platforms (ESP32, desktop simulator, test mocks).
//!
//! # Key Traits
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`CardReader`] | Contactless tag reader returning card UIDs |
//! | [`LockRelay`] | Relay driving the door strike |
//! | [`Buzzer`] | Piezo buzzer for audible feedback |
//! | [`ClimateSensor`] | Temperature and humidity sensor |
//! | [`WallClock`] | Network-synchronized wall time |
//! | [`Delay`] | Blocking delay used by feedback sequences |
//! | [`DoorHardware`] | Groups one implementation of each into a board |
//!
//! # Implementation
//!
//! For testing and desktop development, use the mock implementations
//! from [`crate::hal::mock`]. For ESP32 hardware, use the
//! implementations from `hal::esp32` (requires `esp32` feature).
//!
//! # Example
//!
//! ```rust
//! use rs_doorlock::traits::{LockRelay, LockState};
//! use rs_doorlock::hal::MockRelay;
//!
//! let mut relay = MockRelay::new();
//! relay.set_state(LockState::Unlocked).unwrap();
//! assert_eq!(relay.state(), LockState::Unlocked);
//! ```

use core::fmt::Debug;

use crate::credential::Credential;
use crate::telemetry::TelemetrySample;
use crate::traits::CharDisplay;

/// Position of the door strike.
///
/// # Default
///
/// Defaults to [`Locked`](Self::Locked) for safety.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum LockState {
    /// Strike energized, door can be opened.
    Unlocked,
    /// Strike released, door held shut.
    #[default]
    Locked,
}

impl LockState {
    /// Returns the state as a lowercase string.
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            LockState::Unlocked => "unlocked",
            LockState::Locked => "locked",
        }
    }
}

/// Contactless tag reader.
///
/// # Implementation Notes
///
/// - `read_uid()` must never block waiting for a card
/// - Return `None` when no new card is in the field or selection failed
/// - After a successful read the tag should be halted so the same
///   presentation is not reported twice
pub trait CardReader {
    /// Poll for a newly presented card.
    fn read_uid(&mut self) -> Option<Credential>;
}

/// Relay that drives the door strike.
pub trait LockRelay {
    /// Error type for relay operations.
    type Error: Debug;

    /// Energize or release the strike.
    fn set_state(&mut self, state: LockState) -> Result<(), Self::Error>;

    /// Last state written.
    fn state(&self) -> LockState;

    /// Convenience method to unlock the door.
    fn unlock(&mut self) -> Result<(), Self::Error> {
        self.set_state(LockState::Unlocked)
    }

    /// Convenience method to lock the door.
    fn lock(&mut self) -> Result<(), Self::Error> {
        self.set_state(LockState::Locked)
    }
}

/// Piezo buzzer.
///
/// Timing of a beep pattern is driven by the caller through [`Delay`];
/// implementations only start and stop the tone.
pub trait Buzzer {
    /// Error type for buzzer operations.
    type Error: Debug;

    /// Start a continuous tone at `freq_hz`.
    fn start_tone(&mut self, freq_hz: u32) -> Result<(), Self::Error>;

    /// Silence the buzzer.
    fn stop(&mut self) -> Result<(), Self::Error>;
}

/// Temperature and humidity sensor.
pub trait ClimateSensor {
    /// Error type for sensor reads.
    type Error: Debug;

    /// Take one reading.
    ///
    /// Implementations return whatever the sensor reports; range checks
    /// happen in [`crate::telemetry`].
    fn read(&mut self) -> Result<TelemetrySample, Self::Error>;
}

/// Wall-clock time source.
///
/// Provides UTC seconds since the Unix epoch. On ESP32 this is the system
/// time kept in sync by SNTP; on desktop it wraps `std::time::SystemTime`.
///
/// A monotonic uptime is available from power-on, before the first sync.
pub trait WallClock {
    /// Current UTC time, or `None` while the clock has not been synchronized.
    fn now_epoch_secs(&self) -> Option<i64>;

    /// Whole seconds since the device started. Never goes backwards.
    fn uptime_secs(&self) -> u64;
}

/// Blocking delay.
///
/// Feedback sequences deliberately hold the control loop while the door is
/// open, so this is a plain blocking call.
pub trait Delay {
    /// Block for the specified number of milliseconds.
    fn delay_ms(&mut self, ms: u32);
}

/// A complete set of door devices.
///
/// Each board (mock, desktop, ESP32) is a zero-sized marker type naming
/// its device implementations, which keeps the controller generic over a
/// single type parameter instead of seven.
pub trait DoorHardware {
    /// Tag reader.
    type Reader: CardReader;
    /// Character display.
    type Display: CharDisplay;
    /// Door strike relay.
    type Relay: LockRelay;
    /// Feedback buzzer.
    type Buzzer: Buzzer;
    /// Temperature/humidity sensor.
    type Sensor: ClimateSensor;
    /// Wall-clock source.
    type Clock: WallClock;
    /// Blocking delay.
    type Delay: Delay;
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // LockState Tests
    // =========================================================================

    #[test]
    fn lock_state_default_is_locked() {
        assert_eq!(LockState::default(), LockState::Locked);
    }

    #[test]
    fn lock_state_names() {
        assert_eq!(LockState::Unlocked.as_str(), "unlocked");
        assert_eq!(LockState::Locked.as_str(), "locked");
    }

    // =========================================================================
    // LockRelay Default Methods Tests
    // =========================================================================

    struct TestRelay {
        state: LockState,
        writes: u32,
    }

    impl LockRelay for TestRelay {
        type Error = ();

        fn set_state(&mut self, state: LockState) -> Result<(), ()> {
            self.state = state;
            self.writes += 1;
            Ok(())
        }

        fn state(&self) -> LockState {
            self.state
        }
    }

    #[test]
    fn relay_unlock_and_lock_default_impl() {
        let mut relay = TestRelay {
            state: LockState::Locked,
            writes: 0,
        };

        relay.unlock().unwrap();
        assert_eq!(relay.state(), LockState::Unlocked);

        relay.lock().unwrap();
        assert_eq!(relay.state(), LockState::Locked);
        assert_eq!(relay.writes, 2);
    }
}
