//! MFRC522 card reader on the ESP32 SPI bus.
//!
//! # Wiring
//!
//! - SDA (CS) → GPIO5
//! - SCK → GPIO18
//! - MOSI → GPIO23
//! - MISO → GPIO19
//! - RST → GPIO4
//! - 3.3V → 3.3V (the RC522 is not 5V tolerant)

use esp_idf_hal::gpio::{Gpio4, Output, PinDriver};
use esp_idf_hal::spi::{SpiDeviceDriver, SpiDriver};
use log::{debug, info};
use mfrc522::comm::blocking::spi::SpiInterface;
use mfrc522::{Initialized, Mfrc522};

use crate::credential::Credential;
use crate::traits::CardReader;

type Rc522<'d> = Mfrc522<SpiInterface<SpiDeviceDriver<'d, SpiDriver<'d>>>, Initialized>;

/// RC522 reader polled once per controller tick.
///
/// # Example
///
/// ```ignore
/// use esp_idf_hal::spi::{config::Config, SpiDeviceDriver, SpiDriver, SpiDriverConfig};
/// use rs_doorlock::hal::esp32::Esp32Reader;
///
/// let spi = SpiDriver::new(p.spi2, p.pins.gpio18, p.pins.gpio23, Some(p.pins.gpio19),
///     &SpiDriverConfig::new())?;
/// let device = SpiDeviceDriver::new(spi, Some(p.pins.gpio5), &Config::new())?;
/// let reader = Esp32Reader::new(device, PinDriver::output(p.pins.gpio4)?)?;
/// ```
pub struct Esp32Reader<'d> {
    rfid: Rc522<'d>,
    // Held high for as long as the reader is in use
    _reset: PinDriver<'d, Gpio4, Output>,
}

impl<'d> Esp32Reader<'d> {
    /// Release the reader from reset and initialize it.
    ///
    /// # Errors
    ///
    /// Returns an error if the reset line cannot be driven or the chip does
    /// not answer during initialization.
    pub fn new(
        spi: SpiDeviceDriver<'d, SpiDriver<'d>>,
        mut reset: PinDriver<'d, Gpio4, Output>,
    ) -> anyhow::Result<Self> {
        reset.set_high()?;

        let itf = SpiInterface::new(spi);
        let mut rfid = Mfrc522::new(itf)
            .init()
            .map_err(|e| anyhow::anyhow!("RC522 init failed: {:?}", e))?;

        match rfid.version() {
            Ok(version) => info!("RC522 ready, version 0x{:02X}", version),
            Err(e) => debug!("RC522 version read failed: {:?}", e),
        }

        Ok(Self {
            rfid,
            _reset: reset,
        })
    }
}

impl CardReader for Esp32Reader<'_> {
    fn read_uid(&mut self) -> Option<Credential> {
        // Timeout here is the normal "no card" answer
        let atqa = self.rfid.new_card_present().ok()?;

        let uid = match self.rfid.select(&atqa) {
            Ok(uid) => uid,
            Err(e) => {
                debug!("Card select failed: {:?}", e);
                return None;
            }
        };

        if let Err(e) = self.rfid.hlta() {
            debug!("Card halt failed: {:?}", e);
        }

        Some(Credential::from_slice(uid.as_bytes()))
    }
}
