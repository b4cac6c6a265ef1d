//! WiFi connection management for ESP32.
//!
//! Provides synchronous WiFi station mode connection using esp-idf-svc.
//!
//! # Example
//!
//! ```ignore
//! use rs_doorlock::hal::esp32::Esp32Wifi;
//! use rs_doorlock::config::WifiConfig;
//!
//! let config = WifiConfig::default()
//!     .with_ssid("MyNetwork")
//!     .with_password("secret123");
//!
//! let wifi = Esp32Wifi::new(modem, sysloop, nvs, &config, false)?;
//! // WiFi is now connected and has an IP address
//! log::info!("IP: {:?}", wifi.ip_addr());
//! ```

use crate::config::WifiConfig;
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::modem::Modem;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{BlockingWifi, ClientConfiguration, Configuration, EspWifi};
use log::{info, warn};
use std::net::Ipv4Addr;

/// WiFi connection manager for ESP32.
///
/// Manages a station-mode WiFi connection. The connection is established
/// during construction and maintained for the lifetime of this struct.
pub struct Esp32Wifi<'a> {
    wifi: BlockingWifi<EspWifi<'a>>,
}

impl<'a> Esp32Wifi<'a> {
    /// Create a new WiFi connection.
    ///
    /// This will:
    /// 1. Initialize the WiFi driver
    /// 2. Optionally wipe the credentials stored in NVS (`reset_stored`)
    /// 3. Configure station mode with the provided credentials
    /// 4. Connect to the access point, retrying up to `max_retries` times
    ///    (forever when it is zero)
    /// 5. Wait for DHCP to assign an IP address
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - WiFi initialization fails
    /// - Every connection attempt fails
    /// - DHCP times out
    pub fn new(
        modem: Modem,
        sysloop: EspSystemEventLoop,
        nvs: Option<EspDefaultNvsPartition>,
        config: &WifiConfig,
        reset_stored: bool,
    ) -> anyhow::Result<Self> {
        let esp_wifi = EspWifi::new(modem, sysloop.clone(), nvs)?;
        let mut wifi = BlockingWifi::wrap(esp_wifi, sysloop)?;

        if reset_stored {
            warn!("[WiFi] Erasing stored network settings");
            // Driver is initialized by EspWifi::new, which restore requires
            esp_idf_svc::sys::esp!(unsafe { esp_idf_svc::sys::esp_wifi_restore() })?;
        }

        // Configure station mode
        let ssid = config.ssid.as_str();
        let password = config.password.as_str();

        // Create heapless strings for esp-idf
        let mut ssid_buf: heapless::String<32> = heapless::String::new();
        let _ = ssid_buf.push_str(ssid);

        let mut pass_buf: heapless::String<64> = heapless::String::new();
        let _ = pass_buf.push_str(password);

        wifi.set_configuration(&Configuration::Client(ClientConfiguration {
            ssid: ssid_buf,
            password: pass_buf,
            ..Default::default()
        }))?;

        info!("[WiFi] Starting...");
        wifi.start()?;

        // max_retries == 0 keeps trying forever
        let limit = config.max_retries as u32;
        let pause_ms = config.connect_timeout_ms / limit.max(1);
        let mut attempt = 1;
        loop {
            info!("[WiFi] Connecting to '{}' (attempt {})...", ssid, attempt);
            match wifi.connect() {
                Ok(()) => break,
                Err(e) if limit == 0 || attempt < limit => {
                    warn!("[WiFi] Connect failed: {:?}", e);
                    attempt += 1;
                    FreeRtos::delay_ms(pause_ms);
                }
                Err(e) => return Err(e.into()),
            }
        }

        info!("[WiFi] Waiting for DHCP...");
        wifi.wait_netif_up()?;

        if let Ok(ip_info) = wifi.wifi().sta_netif().get_ip_info() {
            info!("[WiFi] Connected! IP: {}", ip_info.ip);
        }

        Ok(Self { wifi })
    }

    /// Get the current IP address, if connected.
    pub fn ip_addr(&self) -> Option<Ipv4Addr> {
        self.wifi
            .wifi()
            .sta_netif()
            .get_ip_info()
            .ok()
            .map(|info| info.ip)
    }

    /// Check if WiFi is connected.
    pub fn is_connected(&self) -> bool {
        self.wifi.is_connected().unwrap_or(false)
    }
}
