//! Door strike relay on a plain GPIO.

use esp_idf_hal::gpio::{Output, OutputPin, PinDriver};
use esp_idf_hal::peripheral::Peripheral;

use crate::traits::{LockRelay, LockState};

/// Relay module driving the door strike.
///
/// The input is active high: a high level energizes the coil and releases
/// the strike. The pin is driven low on construction so the door starts
/// locked.
///
/// # Example
///
/// ```ignore
/// use rs_doorlock::hal::esp32::Esp32Relay;
/// use rs_doorlock::traits::LockRelay;
///
/// let mut relay = Esp32Relay::new(peripherals.pins.gpio27)?;
/// relay.unlock()?;
/// ```
pub struct Esp32Relay<'d, P: OutputPin> {
    pin: PinDriver<'d, P, Output>,
    state: LockState,
}

impl<'d, P: OutputPin> Esp32Relay<'d, P> {
    /// Take the pin and lock the door.
    ///
    /// # Errors
    ///
    /// Returns an error if the GPIO cannot be configured as an output.
    pub fn new(pin: impl Peripheral<P = P> + 'd) -> Result<Self, esp_idf_hal::sys::EspError> {
        let mut pin = PinDriver::output(pin)?;
        pin.set_low()?;
        Ok(Self {
            pin,
            state: LockState::Locked,
        })
    }
}

impl<P: OutputPin> LockRelay for Esp32Relay<'_, P> {
    type Error = esp_idf_hal::sys::EspError;

    fn set_state(&mut self, state: LockState) -> Result<(), Self::Error> {
        match state {
            LockState::Unlocked => self.pin.set_high()?,
            LockState::Locked => self.pin.set_low()?,
        }
        self.state = state;
        Ok(())
    }

    fn state(&self) -> LockState {
        self.state
    }
}
