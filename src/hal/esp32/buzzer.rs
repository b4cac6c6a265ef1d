//! Passive buzzer driven by the LEDC PWM peripheral.

use esp_idf_hal::gpio::OutputPin;
use esp_idf_hal::ledc::{
    config::TimerConfig, LedcChannel, LedcDriver, LedcTimer, LedcTimerDriver, Resolution,
    SpeedMode,
};
use esp_idf_hal::peripheral::Peripheral;
use esp_idf_hal::prelude::*;
use esp_idf_hal::sys::{esp, ledc_mode_t, ledc_set_freq, ledc_timer_t, EspError};

use crate::traits::Buzzer;

/// Passive piezo buzzer.
///
/// Each tone retunes the LEDC timer and drives a 50% duty square wave.
/// The timer is dedicated to the buzzer, so retuning it does not disturb
/// other PWM users.
///
/// # Example
///
/// ```ignore
/// use rs_doorlock::hal::esp32::Esp32Buzzer;
/// use rs_doorlock::traits::Buzzer;
///
/// let mut buzzer = Esp32Buzzer::new(
///     peripherals.ledc.timer0,
///     peripherals.ledc.channel0,
///     peripherals.pins.gpio32,
/// )?;
/// buzzer.start_tone(4500)?;
/// ```
pub struct Esp32Buzzer<'d> {
    channel: LedcDriver<'d>,
    timer: ledc_timer_t,
    speed_mode: ledc_mode_t,
}

impl<'d> Esp32Buzzer<'d> {
    /// Idle frequency before the first tone.
    const IDLE_FREQ_HZ: u32 = 2_000;

    /// 10-bit resolution still reaches 40kHz on the 80MHz APB clock.
    const PWM_RESOLUTION: Resolution = Resolution::Bits10;

    /// Configure the timer and channel, silent.
    ///
    /// # Errors
    ///
    /// Returns an error if PWM initialization fails.
    pub fn new<T, TI, C, CI, P, PI>(timer: T, channel: C, pin: P) -> Result<Self, EspError>
    where
        TI: LedcTimer + 'd,
        T: Peripheral<P = TI> + 'd,
        CI: LedcChannel<SpeedMode = TI::SpeedMode> + 'd,
        C: Peripheral<P = CI> + 'd,
        PI: OutputPin + 'd,
        P: Peripheral<P = PI> + 'd,
    {
        let timer_config = TimerConfig::default()
            .frequency(Self::IDLE_FREQ_HZ.Hz())
            .resolution(Self::PWM_RESOLUTION);
        let timer_driver = LedcTimerDriver::new(timer, &timer_config)?;

        let mut channel = LedcDriver::new(channel, timer_driver, pin)?;
        channel.set_duty(0)?;

        Ok(Self {
            channel,
            timer: TI::timer(),
            speed_mode: <TI::SpeedMode as SpeedMode>::SPEED_MODE,
        })
    }
}

impl Buzzer for Esp32Buzzer<'_> {
    type Error = EspError;

    fn start_tone(&mut self, freq_hz: u32) -> Result<(), Self::Error> {
        esp!(unsafe { ledc_set_freq(self.speed_mode, self.timer, freq_hz) })?;
        let half = self.channel.get_max_duty() / 2;
        self.channel.set_duty(half)
    }

    fn stop(&mut self) -> Result<(), Self::Error> {
        self.channel.set_duty(0)
    }
}
