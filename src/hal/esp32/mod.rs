//! ESP32 DevKit hardware abstraction layer for the RFID door lock.
//!
//! # Hardware Configuration
//!
//! - **MCU**: ESP32-WROOM-32 DevKit (Xtensa 240MHz, 4MB Flash)
//! - **Reader**: MFRC522 (RC522) 13.56MHz card reader on VSPI
//! - **Lock**: 5V relay module driving a 12V solenoid strike
//! - **Buzzer**: passive piezo buzzer driven by LEDC PWM
//! - **Sensor**: DHT11 temperature and humidity sensor
//! - **Display**: SSD1306 128x64 OLED (I2C) rendered as a 16x2 character grid
//!
//! # Pin Assignments
//!
//! See the [`pins`] module for GPIO assignments.

mod buzzer;
mod delay;
mod dht;
mod reader;
mod relay;

pub use buzzer::Esp32Buzzer;
pub use delay::Esp32Delay;
pub use dht::{DhtError, Esp32Dht};
pub use reader::Esp32Reader;
pub use relay::Esp32Relay;

#[cfg(feature = "display")]
mod display;
#[cfg(feature = "display")]
pub use display::{DisplayError, Esp32Display};

#[cfg(feature = "wifi")]
mod clock;
#[cfg(feature = "wifi")]
pub use clock::Esp32WallClock;

#[cfg(feature = "wifi")]
mod wifi;
#[cfg(feature = "wifi")]
pub use wifi::Esp32Wifi;

#[cfg(feature = "esp32-mqtt")]
mod mqtt;
#[cfg(feature = "esp32-mqtt")]
pub use mqtt::{Esp32Mqtt, Esp32MqttError};

#[cfg(all(feature = "display", feature = "wifi"))]
pub use board::Esp32Board;

#[cfg(all(feature = "display", feature = "wifi"))]
mod board {
    use core::marker::PhantomData;

    use esp_idf_hal::gpio::{Gpio27, Gpio33};

    use super::*;
    use crate::traits::DoorHardware;

    /// [`DoorHardware`] family for the DevKit wiring in [`pins`].
    pub struct Esp32Board<'d>(PhantomData<&'d ()>);

    impl<'d> DoorHardware for Esp32Board<'d> {
        type Reader = Esp32Reader<'d>;
        type Display = Esp32Display<'d>;
        type Relay = Esp32Relay<'d, Gpio27>;
        type Buzzer = Esp32Buzzer<'d>;
        type Sensor = Esp32Dht<'d, Gpio33>;
        type Clock = Esp32WallClock;
        type Delay = Esp32Delay;
    }
}

/// Microseconds since boot from the ESP-IDF high resolution timer.
#[inline]
pub(crate) fn monotonic_us() -> i64 {
    // Plain read of the hardware timer
    unsafe { esp_idf_hal::sys::esp_timer_get_time() }
}

/// Pin assignments for the ESP32 DevKit.
///
/// These constants match the wiring of the door controller board:
/// - RC522 on the VSPI bus plus two control lines
/// - OLED on the default I2C pins
/// - Relay, buzzer and DHT11 on free GPIOs of the right header
pub mod pins {
    // =========================================================================
    // Card Reader (RC522, VSPI)
    // =========================================================================

    /// SPI chip select (SDA on the RC522 board)
    pub const RC522_SDA: i32 = 5;

    /// Reader reset line (active low)
    pub const RC522_RST: i32 = 4;

    /// SPI clock
    pub const SPI_SCK: i32 = 18;

    /// SPI MOSI
    pub const SPI_MOSI: i32 = 23;

    /// SPI MISO
    pub const SPI_MISO: i32 = 19;

    // =========================================================================
    // I2C Display (SSD1306)
    // =========================================================================

    /// I2C data line
    pub const I2C_SDA: i32 = 21;

    /// I2C clock line
    pub const I2C_SCL: i32 = 22;

    /// Default I2C address for SSD1306 OLED
    pub const OLED_I2C_ADDR: u8 = 0x3C;

    // =========================================================================
    // Actuators and Sensor
    // =========================================================================

    /// Relay input (active high energizes the strike)
    pub const RELAY: i32 = 27;

    /// Passive buzzer PWM output
    pub const BUZZER: i32 = 32;

    /// DHT11 single-wire data line (10k pull-up to 3.3V)
    pub const DHT11: i32 = 33;
}
