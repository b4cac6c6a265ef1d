//! Events handled by the door controller and the controller's mode.

/// Where a remote unlock request came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum UnlockOrigin {
    /// Chat bot relaying an unlock command.
    Telegram,
    /// Web dashboard button.
    Web,
}

impl UnlockOrigin {
    /// Returns the origin as a lowercase string.
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            UnlockOrigin::Telegram => "telegram",
            UnlockOrigin::Web => "web",
        }
    }
}

/// Something the controller has to react to.
///
/// Card events carry no UID; the controller keeps the most recent read in
/// its current-credential slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Event {
    /// The device has (re)booted, e.g. after a power cut.
    PowerOn,
    /// A card on the allow-list was presented.
    CardUnlockOk,
    /// A card not on the allow-list was presented.
    CardUnlockFail,
    /// An unlock command arrived over the messaging channel.
    RemoteUnlock(UnlockOrigin),
}

impl Event {
    /// True for events that open the door.
    pub const fn unlocks(&self) -> bool {
        matches!(self, Event::CardUnlockOk | Event::RemoteUnlock(_))
    }

    /// True for events that drive the display, buzzer and relay sequence.
    ///
    /// `PowerOn` is a publish-only notification.
    pub const fn needs_feedback(&self) -> bool {
        !matches!(self, Event::PowerOn)
    }
}

/// Controller mode.
///
/// The controller sits in `Standby` between events and switches to `Active`
/// for the duration of a feedback sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Mode {
    /// Showing the clock screen and waiting for input.
    #[default]
    Standby,
    /// Running an event's feedback sequence.
    Active,
}

/// Literal status payloads published on the unlock-status topic.
pub mod payloads {
    use super::{Event, UnlockOrigin};

    /// A listed card opened the door.
    pub const UNLOCKED_CARD: &str = "unlocked:card";
    /// An unknown card was presented.
    pub const UNLOCK_FAIL_CARD: &str = "unlock-fail:card";
    /// The chat bot opened the door.
    pub const UNLOCKED_TELEGRAM: &str = "unlocked:telegram";
    /// The web dashboard opened the door.
    pub const UNLOCKED_WEB: &str = "unlocked:web";
    /// Published once per boot on the power-on topic.
    pub const POWER_ON: &str = "poweron";

    /// Status payload for an event, if it has one.
    pub const fn status(event: &Event) -> Option<&'static str> {
        match event {
            Event::PowerOn => None,
            Event::CardUnlockOk => Some(UNLOCKED_CARD),
            Event::CardUnlockFail => Some(UNLOCK_FAIL_CARD),
            Event::RemoteUnlock(UnlockOrigin::Telegram) => Some(UNLOCKED_TELEGRAM),
            Event::RemoteUnlock(UnlockOrigin::Web) => Some(UNLOCKED_WEB),
        }
    }
}
