//! Wall clock synchronized over SNTP.

use core::cell::Cell;
use std::time::{SystemTime, UNIX_EPOCH};

use esp_idf_svc::sntp::{EspSntp, SntpConf, SyncStatus};
use log::info;

use crate::config::NtpConfig;
use crate::traits::WallClock;

/// Wall clock that reports nothing until the first SNTP sync completes.
///
/// Before the sync the ESP32 RTC counts from 1970, which would put a
/// nonsense date on the screen. After it, the system time is read directly
/// and lwIP keeps it disciplined. Uptime comes from the high resolution
/// timer and is valid from boot.
///
/// # Example
///
/// ```ignore
/// use rs_doorlock::hal::esp32::Esp32WallClock;
/// use rs_doorlock::traits::WallClock;
///
/// let clock = Esp32WallClock::new(&config.ntp)?;
/// if let Some(now) = clock.now_epoch_secs() {
///     // ...
/// }
/// ```
pub struct Esp32WallClock {
    sntp: EspSntp<'static>,
    synced: Cell<bool>,
}

impl Esp32WallClock {
    /// Start SNTP against the configured server.
    ///
    /// Requires the network interface to be up.
    ///
    /// # Errors
    ///
    /// Returns an error if the SNTP service cannot be started.
    pub fn new(config: &NtpConfig) -> anyhow::Result<Self> {
        let mut conf = SntpConf::default();
        conf.servers[0] = config.server.as_str();
        let sntp = EspSntp::new(&conf)?;
        info!("SNTP started against {}", config.server);
        Ok(Self {
            sntp,
            synced: Cell::new(false),
        })
    }
}

impl WallClock for Esp32WallClock {
    fn now_epoch_secs(&self) -> Option<i64> {
        if !self.synced.get() {
            if self.sntp.get_sync_status() != SyncStatus::Completed {
                return None;
            }
            info!("SNTP time synchronized");
            self.synced.set(true);
        }

        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .ok()
            .map(|d| d.as_secs() as i64)
    }

    fn uptime_secs(&self) -> u64 {
        (super::monotonic_us() / 1_000_000) as u64
    }
}
