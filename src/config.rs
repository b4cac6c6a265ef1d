//! Shared configuration system for desktop and ESP32.
//!
//! Uses `heapless::String` for `no_std` compatibility while remaining
//! ergonomic to use on desktop with `std`.
//!
//! # Example
//!
//! ```rust
//! use rs_doorlock::config::{Config, LockConfig, MqttConfig};
//! use rs_doorlock::credential::AllowList;
//!
//! // Use defaults
//! let config = Config::default();
//!
//! // Or customize
//! let config = Config::default()
//!     .with_mqtt(MqttConfig::default().with_host("192.168.1.100"))
//!     .with_lock(
//!         LockConfig::default()
//!             .with_allow_list(AllowList::new(&[[0x04, 0xA1, 0x22, 0x9C]]).unwrap())
//!             .with_unlock_hold_secs(5),
//!     );
//! ```

use heapless::String as HString;

use crate::credential::AllowList;

/// Maximum length for short config strings (hostnames, client IDs)
pub const MAX_SHORT_STRING: usize = 64;

/// Maximum length for longer config strings (topics)
pub const MAX_LONG_STRING: usize = 128;

/// Type alias for short config strings
pub type ShortString = HString<MAX_SHORT_STRING>;

/// Type alias for longer config strings
pub type LongString = HString<MAX_LONG_STRING>;

// ============================================================================
// Errors
// ============================================================================

/// Invalid configuration detected while building the controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// The allow-list has no entries.
    EmptyAllowList,
    /// More allow-list entries than the fixed capacity.
    AllowListFull {
        /// Maximum number of entries.
        capacity: usize,
    },
    /// An allow-list entry has the wrong number of bytes.
    BadUidLength {
        /// Position of the entry in the list.
        index: usize,
        /// Number of bytes it had.
        len: usize,
    },
    /// The display grid is too small for the screens the controller draws.
    DisplayTooSmall {
        /// Configured columns.
        width: u8,
        /// Configured rows.
        height: u8,
    },
    /// The telemetry interval must be at least one second.
    ZeroTelemetryInterval,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::EmptyAllowList => write!(f, "allow-list is empty"),
            Self::AllowListFull { capacity } => {
                write!(f, "allow-list holds at most {} cards", capacity)
            }
            Self::BadUidLength { index, len } => write!(
                f,
                "allow-list entry {} has {} bytes, expected {}",
                index,
                len,
                crate::credential::UID_SIZE
            ),
            Self::DisplayTooSmall { width, height } => {
                write!(f, "display {}x{} is smaller than 16x2", width, height)
            }
            Self::ZeroTelemetryInterval => write!(f, "telemetry interval must be non-zero"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

// ============================================================================
// Helper for creating heapless strings
// ============================================================================

/// Create a ShortString from a &str, truncating if too long
pub fn short_string(s: &str) -> ShortString {
    truncated(s)
}

/// Create a LongString from a &str, truncating if too long
pub fn long_string(s: &str) -> LongString {
    truncated(s)
}

fn truncated<const N: usize>(s: &str) -> HString<N> {
    let mut hs = HString::new();
    // Find valid UTF-8 boundary
    let valid_end = s
        .char_indices()
        .map(|(i, c)| i + c.len_utf8())
        .take_while(|end| *end <= N)
        .last()
        .unwrap_or(0);
    let _ = hs.push_str(&s[..valid_end]);
    hs
}

// ============================================================================
// Main Config
// ============================================================================

/// Complete application configuration
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    /// WiFi connection configuration
    pub wifi: WifiConfig,
    /// MQTT client configuration
    pub mqtt: MqttConfig,
    /// Allow-list, hold times and remote commands
    pub lock: LockConfig,
    /// Buzzer tone patterns
    pub buzzer: BuzzerConfig,
    /// Character display geometry
    pub display: DisplayConfig,
    /// Network time
    pub ntp: NtpConfig,
    /// Temperature/humidity reporting
    pub telemetry: TelemetryConfig,
    /// Debug toggles, resolved once at startup
    pub debug: DebugConfig,
}

impl Config {
    /// Set WiFi configuration
    pub fn with_wifi(mut self, wifi: WifiConfig) -> Self {
        self.wifi = wifi;
        self
    }

    /// Set MQTT configuration
    pub fn with_mqtt(mut self, mqtt: MqttConfig) -> Self {
        self.mqtt = mqtt;
        self
    }

    /// Set lock configuration
    pub fn with_lock(mut self, lock: LockConfig) -> Self {
        self.lock = lock;
        self
    }

    /// Set buzzer configuration
    pub fn with_buzzer(mut self, buzzer: BuzzerConfig) -> Self {
        self.buzzer = buzzer;
        self
    }

    /// Set display configuration
    pub fn with_display(mut self, display: DisplayConfig) -> Self {
        self.display = display;
        self
    }

    /// Set NTP configuration
    pub fn with_ntp(mut self, ntp: NtpConfig) -> Self {
        self.ntp = ntp;
        self
    }

    /// Set telemetry configuration
    pub fn with_telemetry(mut self, telemetry: TelemetryConfig) -> Self {
        self.telemetry = telemetry;
        self
    }

    /// Set debug toggles
    pub fn with_debug(mut self, debug: DebugConfig) -> Self {
        self.debug = debug;
        self
    }

    /// Check the parts of the configuration the controller relies on.
    ///
    /// The allow-list type already guarantees its own invariants; this
    /// covers the remaining sections.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lock.allow_list.is_empty() {
            return Err(ConfigError::EmptyAllowList);
        }
        if self.display.width < MIN_DISPLAY_WIDTH || self.display.height < MIN_DISPLAY_HEIGHT {
            return Err(ConfigError::DisplayTooSmall {
                width: self.display.width,
                height: self.display.height,
            });
        }
        if self.telemetry.interval == 0 {
            return Err(ConfigError::ZeroTelemetryInterval);
        }
        Ok(())
    }
}

// ============================================================================
// MQTT Config
// ============================================================================

/// Reconnect behaviour of the connection supervisor.
///
/// # Liveness
///
/// Every tick made while the broker is down runs a full supervision pass
/// before the card reader is polled. With the default of 10 attempts
/// 3 s apart that pass blocks for 27 s (see [`max_block_ms`](Self::max_block_ms)),
/// so an offline door reads at most one card per pass. Lower
/// `max_attempts` to keep card reads responsive during long outages.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RetryPolicy {
    /// Pause between failed attempts in milliseconds
    pub delay_ms: u32,
    /// Attempts per supervision pass (0 = unlimited)
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            delay_ms: 3000,
            max_attempts: 10,
        }
    }
}

impl RetryPolicy {
    /// Retry forever, the way a single-purpose device traditionally does.
    pub fn unlimited(delay_ms: u32) -> Self {
        Self {
            delay_ms,
            max_attempts: 0,
        }
    }

    /// True if `attempts` failed attempts use up the budget.
    pub fn exhausted(&self, attempts: u32) -> bool {
        self.max_attempts != 0 && attempts >= self.max_attempts
    }

    /// Longest time one failed supervision pass spends sleeping, or `None`
    /// when retries are unlimited.
    ///
    /// There is no pause after the last attempt.
    pub fn max_block_ms(&self) -> Option<u64> {
        if self.max_attempts == 0 {
            return None;
        }
        Some(u64::from(self.delay_ms) * u64::from(self.max_attempts - 1))
    }
}

/// MQTT client configuration
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MqttConfig {
    /// Broker hostname or IP
    pub host: ShortString,
    /// Broker port
    pub port: u16,
    /// Client ID (should be unique per device)
    pub client_id: ShortString,
    /// Topic prefix for all pub/sub (e.g., "doorlock" -> "doorlock/unlock-status")
    pub topic_prefix: ShortString,
    /// Username for authentication (empty = no auth)
    pub username: ShortString,
    /// Password for authentication
    pub password: ShortString,
    /// Keep-alive interval in seconds
    pub keep_alive_secs: u16,
    /// Reconnect policy
    pub retry: RetryPolicy,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            host: short_string("broker.hivemq.com"),
            port: 1883,
            client_id: short_string("rs-doorlock"),
            topic_prefix: short_string("doorlock"),
            username: ShortString::new(),
            password: ShortString::new(),
            keep_alive_secs: 30,
            retry: RetryPolicy::default(),
        }
    }
}

/// Topic suffix for inbound remote unlock commands.
pub const TOPIC_UNLOCK_REMOTE: &str = "unlock-remote";
/// Topic suffix for unlock status reports.
pub const TOPIC_UNLOCK_STATUS: &str = "unlock-status";
/// Topic suffix for the boot notification.
pub const TOPIC_POWER_ON: &str = "poweron";
/// Topic suffix for temperature readings.
pub const TOPIC_TEMPERATURE: &str = "temp";
/// Topic suffix for humidity readings.
pub const TOPIC_HUMIDITY: &str = "humid";

impl MqttConfig {
    /// Set the broker host
    pub fn with_host(mut self, host: &str) -> Self {
        self.host = short_string(host);
        self
    }

    /// Set the broker port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the client ID
    pub fn with_client_id(mut self, id: &str) -> Self {
        self.client_id = short_string(id);
        self
    }

    /// Set the topic prefix
    pub fn with_topic_prefix(mut self, prefix: &str) -> Self {
        self.topic_prefix = short_string(prefix);
        self
    }

    /// Set authentication credentials
    pub fn with_auth(mut self, username: &str, password: &str) -> Self {
        self.username = short_string(username);
        self.password = short_string(password);
        self
    }

    /// Set the reconnect policy
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Build a topic string with the configured prefix
    pub fn topic(&self, suffix: &str) -> LongString {
        let mut topic = LongString::new();
        let _ = topic.push_str(self.topic_prefix.as_str());
        let _ = topic.push('/');
        let _ = topic.push_str(suffix);
        topic
    }

    /// Check if authentication is configured
    pub fn has_auth(&self) -> bool {
        !self.username.is_empty()
    }
}

// ============================================================================
// Lock Config
// ============================================================================

/// Allow-list, hold durations and remote command literals
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LockConfig {
    /// Cards that open the door
    pub allow_list: AllowList,
    /// Seconds the relay stays unlocked after a successful unlock
    pub unlock_hold_secs: u8,
    /// Seconds the failure screen is held before returning to standby
    pub fail_hold_secs: u8,
    /// Payload that unlocks on behalf of the chat bot
    pub telegram_command: ShortString,
    /// Payload that unlocks on behalf of the web dashboard
    pub web_command: ShortString,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            allow_list: AllowList::default(),
            unlock_hold_secs: 3,
            fail_hold_secs: 2,
            telegram_command: short_string("telegram>>unlock"),
            web_command: short_string("web>>unlock"),
        }
    }
}

impl LockConfig {
    /// Set the allow-list
    pub fn with_allow_list(mut self, allow_list: AllowList) -> Self {
        self.allow_list = allow_list;
        self
    }

    /// Set the unlock hold time
    pub fn with_unlock_hold_secs(mut self, secs: u8) -> Self {
        self.unlock_hold_secs = secs;
        self
    }

    /// Set the failure hold time
    pub fn with_fail_hold_secs(mut self, secs: u8) -> Self {
        self.fail_hold_secs = secs;
        self
    }

    /// Set both remote command literals
    pub fn with_remote_commands(mut self, telegram: &str, web: &str) -> Self {
        self.telegram_command = short_string(telegram);
        self.web_command = short_string(web);
        self
    }
}

// ============================================================================
// Buzzer Config
// ============================================================================

/// One beep pattern: `repeat` tones of `freq_hz` lasting `duration_ms` each
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TonePattern {
    /// Tone frequency in hertz
    pub freq_hz: u32,
    /// Length of each tone in milliseconds
    pub duration_ms: u32,
    /// Number of tones
    pub repeat: u8,
}

impl TonePattern {
    /// Create a pattern
    pub const fn new(freq_hz: u32, duration_ms: u32, repeat: u8) -> Self {
        Self {
            freq_hz,
            duration_ms,
            repeat,
        }
    }
}

/// Buzzer tone configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BuzzerConfig {
    /// Short high beeps for an unlock
    pub success: TonePattern,
    /// Longer low beeps for a rejected card
    pub failure: TonePattern,
    /// Silence after each tone in milliseconds
    pub gap_ms: u32,
}

impl Default for BuzzerConfig {
    fn default() -> Self {
        Self {
            success: TonePattern::new(4500, 100, 2),
            failure: TonePattern::new(500, 200, 3),
            gap_ms: 50,
        }
    }
}

impl BuzzerConfig {
    /// Set the success pattern
    pub fn with_success(mut self, pattern: TonePattern) -> Self {
        self.success = pattern;
        self
    }

    /// Set the failure pattern
    pub fn with_failure(mut self, pattern: TonePattern) -> Self {
        self.failure = pattern;
        self
    }

    /// Set the gap between tones
    pub fn with_gap_ms(mut self, ms: u32) -> Self {
        self.gap_ms = ms;
        self
    }
}

// ============================================================================
// Display Config
// ============================================================================

/// Smallest grid the fixed screen layouts fit on (columns)
pub const MIN_DISPLAY_WIDTH: u8 = 16;
/// Smallest grid the fixed screen layouts fit on (rows)
pub const MIN_DISPLAY_HEIGHT: u8 = 2;

/// Character display configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DisplayConfig {
    /// Columns
    pub width: u8,
    /// Rows
    pub height: u8,
    /// Pause after a full clear before the standby template is drawn
    pub settle_ms: u32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: 16,
            height: 2,
            settle_ms: 100,
        }
    }
}

impl DisplayConfig {
    /// Set the grid size
    pub fn with_size(mut self, width: u8, height: u8) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set the settle delay
    pub fn with_settle_ms(mut self, ms: u32) -> Self {
        self.settle_ms = ms;
        self
    }
}

// ============================================================================
// NTP Config
// ============================================================================

/// Network time configuration
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct NtpConfig {
    /// NTP server or pool
    pub server: ShortString,
    /// Local time offset from UTC in whole hours
    pub utc_offset_hours: i8,
}

impl Default for NtpConfig {
    fn default() -> Self {
        Self {
            server: short_string("vn.pool.ntp.org"),
            utc_offset_hours: 7,
        }
    }
}

impl NtpConfig {
    /// Set the NTP server
    pub fn with_server(mut self, server: &str) -> Self {
        self.server = short_string(server);
        self
    }

    /// Set the UTC offset
    pub fn with_utc_offset_hours(mut self, hours: i8) -> Self {
        self.utc_offset_hours = hours;
        self
    }

    /// UTC offset in seconds
    pub fn utc_offset_secs(&self) -> i64 {
        self.utc_offset_hours as i64 * 3600
    }
}

// ============================================================================
// Telemetry Config
// ============================================================================

/// Inclusive range of readings a sensor can actually produce
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SensorRange {
    /// Lowest plausible value
    pub min: f32,
    /// Highest plausible value
    pub max: f32,
}

impl SensorRange {
    /// Create a range
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// True if `value` is a number inside the range
    pub fn contains(&self, value: f32) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Temperature/humidity reporting configuration
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TelemetryConfig {
    /// Distinct seconds between publishes
    pub interval: u8,
    /// Pause between the temperature and humidity publishes
    pub publish_gap_ms: u32,
    /// Valid temperature range (°C)
    pub temperature: SensorRange,
    /// Valid relative humidity range (%)
    pub humidity: SensorRange,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        // DHT11 datasheet ranges
        Self {
            interval: 5,
            publish_gap_ms: 500,
            temperature: SensorRange::new(0.0, 50.0),
            humidity: SensorRange::new(20.0, 90.0),
        }
    }
}

impl TelemetryConfig {
    /// Set the publish interval
    pub fn with_interval(mut self, interval: u8) -> Self {
        self.interval = interval;
        self
    }

    /// Set the pause between publishes
    pub fn with_publish_gap_ms(mut self, ms: u32) -> Self {
        self.publish_gap_ms = ms;
        self
    }
}

// ============================================================================
// Debug Config
// ============================================================================

/// Debug toggles
///
/// UIDs can be rewritten on cheap cards, so showing them on the door is
/// off by default.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DebugConfig {
    /// Show the card UID instead of the status label
    pub reveal_credential: bool,
    /// Forget stored network credentials at boot
    pub force_network_reset: bool,
}

impl DebugConfig {
    /// Enable or disable UID display
    pub fn with_reveal_credential(mut self, enabled: bool) -> Self {
        self.reveal_credential = enabled;
        self
    }

    /// Enable or disable the network reset at boot
    pub fn with_force_network_reset(mut self, enabled: bool) -> Self {
        self.force_network_reset = enabled;
        self
    }
}

// ============================================================================
// WiFi Config
// ============================================================================

/// WiFi connection configuration
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct WifiConfig {
    /// WiFi network SSID
    pub ssid: ShortString,
    /// WiFi password
    pub password: ShortString,
    /// Connection timeout in milliseconds
    pub connect_timeout_ms: u32,
    /// Whether WiFi is enabled
    pub enabled: bool,
    /// Maximum connection retry attempts (0 = unlimited)
    pub max_retries: u8,
}

impl Default for WifiConfig {
    fn default() -> Self {
        Self {
            ssid: ShortString::new(),
            password: ShortString::new(),
            connect_timeout_ms: 30_000,
            enabled: true,
            max_retries: 5,
        }
    }
}

impl WifiConfig {
    /// Set the SSID
    pub fn with_ssid(mut self, ssid: &str) -> Self {
        self.ssid = short_string(ssid);
        self
    }

    /// Set the password
    pub fn with_password(mut self, password: &str) -> Self {
        self.password = short_string(password);
        self
    }

    /// Set the connection timeout
    pub fn with_connect_timeout_ms(mut self, ms: u32) -> Self {
        self.connect_timeout_ms = ms;
        self
    }

    /// Enable or disable WiFi
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Set the maximum retry count
    pub fn with_max_retries(mut self, retries: u8) -> Self {
        self.max_retries = retries;
        self
    }

    /// Check if WiFi credentials are configured
    pub fn is_configured(&self) -> bool {
        !self.ssid.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================
