//! Decoding of inbound remote unlock commands.
//!
//! Payloads are compared as whole strings against the two configured
//! command literals. Anything else, including partial matches, surrounding
//! whitespace or invalid UTF-8, is ignored.

use log::debug;

use crate::config::{LockConfig, ShortString};
use crate::events::{Event, UnlockOrigin};

/// Maps inbound payloads to [`Event::RemoteUnlock`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteDispatcher {
    telegram: ShortString,
    web: ShortString,
}

impl RemoteDispatcher {
    /// Create a dispatcher from explicit command literals.
    pub fn new(telegram: &str, web: &str) -> Self {
        Self {
            telegram: crate::config::short_string(telegram),
            web: crate::config::short_string(web),
        }
    }

    /// Create a dispatcher from the lock configuration.
    pub fn from_config(lock: &LockConfig) -> Self {
        Self {
            telegram: lock.telegram_command.clone(),
            web: lock.web_command.clone(),
        }
    }

    /// Decode one payload.
    pub fn decode(&self, payload: &[u8]) -> Option<Event> {
        let Ok(message) = core::str::from_utf8(payload) else {
            debug!("Ignoring non-UTF-8 payload ({} bytes)", payload.len());
            return None;
        };

        if message == self.telegram.as_str() {
            Some(Event::RemoteUnlock(UnlockOrigin::Telegram))
        } else if message == self.web.as_str() {
            Some(Event::RemoteUnlock(UnlockOrigin::Web))
        } else {
            debug!("Ignoring unrecognized command {:?}", message);
            None
        }
    }
}

impl Default for RemoteDispatcher {
    fn default() -> Self {
        Self::from_config(&LockConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_exact_literals() {
        let d = RemoteDispatcher::default();
        assert_eq!(
            d.decode(b"telegram>>unlock"),
            Some(Event::RemoteUnlock(UnlockOrigin::Telegram))
        );
        assert_eq!(
            d.decode(b"web>>unlock"),
            Some(Event::RemoteUnlock(UnlockOrigin::Web))
        );
    }

    #[test]
    fn ignores_everything_else() {
        let d = RemoteDispatcher::default();
        assert_eq!(d.decode(b""), None);
        assert_eq!(d.decode(b"telegram"), None);
        assert_eq!(d.decode(b"telegram>>unlock "), None);
        assert_eq!(d.decode(b"WEB>>UNLOCK"), None);
        assert_eq!(d.decode(b"web>>unlock\0"), None);
        assert_eq!(d.decode(&[0xFF, 0xFE, 0xFD]), None);
    }

    #[test]
    fn custom_literals() {
        let d = RemoteDispatcher::new("open-sesame", "click");
        assert_eq!(
            d.decode(b"open-sesame"),
            Some(Event::RemoteUnlock(UnlockOrigin::Telegram))
        );
        assert_eq!(d.decode(b"click"), Some(Event::RemoteUnlock(UnlockOrigin::Web)));
        assert_eq!(d.decode(b"telegram>>unlock"), None);
    }
}
