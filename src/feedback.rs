//! Display, buzzer and relay sequences for each event outcome.
//!
//! Every sequence publishes its status first and then runs the local
//! feedback to completion. Local hardware is what the person at the door
//! relies on, so a failed publish or a failed device write is logged and
//! the sequence carries on.

use core::fmt::Debug;
use core::fmt::Write;

use heapless::String as HString;
use log::{info, warn};

use crate::config::{
    BuzzerConfig, Config, LongString, TonePattern, TOPIC_POWER_ON, TOPIC_UNLOCK_STATUS,
};
use crate::controller::Devices;
use crate::credential::{Credential, HEX_LEN};
use crate::events::{payloads, Event, UnlockOrigin};
use crate::screen::{glyphs, Screen};
use crate::traits::{Buzzer, Delay, DoorHardware, LockRelay, LockState, MqttClient};

/// Bottom row while the door is held open; the countdown follows it.
pub const UNLOCK_BOTTOM: &str = "Door close in ";
/// Top row label for a rejected card.
pub const FAIL_LABEL: &str = "Unlock failed";
/// Bottom row for a rejected card.
pub const FAIL_BOTTOM: &str = "Impostor!";
/// Top row label for a listed card.
pub const CARD_LABEL: &str = "Local card";

/// Log a device write failure without interrupting the caller.
pub(crate) fn settle<E: Debug>(what: &str, result: Result<(), E>) {
    if let Err(e) = result {
        warn!("{} write failed: {:?}", what, e);
    }
}

/// Runs the feedback sequence for an [`Event`].
#[derive(Clone, Debug)]
pub struct FeedbackCoordinator {
    screen: Screen,
    buzzer: BuzzerConfig,
    unlock_hold_secs: u8,
    fail_hold_secs: u8,
    reveal_credential: bool,
    status_topic: LongString,
    power_on_topic: LongString,
}

impl FeedbackCoordinator {
    /// Build from the full configuration.
    pub fn new(config: &Config) -> Self {
        Self {
            screen: Screen::from_config(&config.display),
            buzzer: config.buzzer,
            unlock_hold_secs: config.lock.unlock_hold_secs,
            fail_hold_secs: config.lock.fail_hold_secs,
            reveal_credential: config.debug.reveal_credential,
            status_topic: config.mqtt.topic(TOPIC_UNLOCK_STATUS),
            power_on_topic: config.mqtt.topic(TOPIC_POWER_ON),
        }
    }

    /// Run `event` to completion.
    ///
    /// `credential` is the card behind a card event; it is only shown when
    /// credential reveal is enabled. Returns whether the event's message
    /// reached the broker.
    pub fn run<H, M>(
        &self,
        event: Event,
        credential: &Credential,
        devices: &mut Devices<H>,
        mqtt: &mut M,
    ) -> bool
    where
        H: DoorHardware,
        M: MqttClient,
    {
        if !event.needs_feedback() {
            return publish(mqtt, &self.power_on_topic, payloads::POWER_ON);
        }

        let published = self.publish_status(event, mqtt);
        if event.unlocks() {
            self.unlock(event, credential, devices);
        } else {
            self.reject(credential, devices);
        }
        published
    }

    fn publish_status<M: MqttClient>(&self, event: Event, mqtt: &mut M) -> bool {
        match payloads::status(&event) {
            Some(payload) => publish(mqtt, &self.status_topic, payload),
            None => false,
        }
    }

    fn unlock<H: DoorHardware>(
        &self,
        event: Event,
        credential: &Credential,
        devices: &mut Devices<H>,
    ) {
        let label = match event {
            Event::RemoteUnlock(UnlockOrigin::Telegram) => top_row("Telegram"),
            Event::RemoteUnlock(UnlockOrigin::Web) => top_row("Web"),
            _ => self.card_row(CARD_LABEL, credential),
        };
        settle(
            "display",
            self.screen
                .show_status(&mut devices.display, glyphs::UNLOCK, &label, UNLOCK_BOTTOM),
        );

        play(
            &mut devices.buzzer,
            &mut devices.delay,
            &self.buzzer.success,
            self.buzzer.gap_ms,
        );

        settle("relay", devices.relay.set_state(LockState::Unlocked));
        info!("Door unlocked for {}s", self.unlock_hold_secs);

        for remaining in (1..=self.unlock_hold_secs).rev() {
            settle(
                "display",
                self.screen.show_countdown(&mut devices.display, remaining),
            );
            devices.delay.delay_ms(1000);
        }

        settle("relay", devices.relay.set_state(LockState::Locked));
        info!("Door locked");
    }

    fn reject<H: DoorHardware>(&self, credential: &Credential, devices: &mut Devices<H>) {
        let label = self.card_row(FAIL_LABEL, credential);
        settle(
            "display",
            self.screen
                .show_status(&mut devices.display, glyphs::FAIL, &label, FAIL_BOTTOM),
        );

        play(
            &mut devices.buzzer,
            &mut devices.delay,
            &self.buzzer.failure,
            self.buzzer.gap_ms,
        );

        for _ in 0..self.fail_hold_secs {
            devices.delay.delay_ms(1000);
        }
    }

    fn card_row(&self, label: &str, credential: &Credential) -> HString<{ HEX_LEN + 2 }> {
        if self.reveal_credential {
            top_row(&credential.to_hex())
        } else {
            top_row(label)
        }
    }
}

/// Two columns of padding for the icon, then the label.
fn top_row(label: &str) -> HString<{ HEX_LEN + 2 }> {
    let mut row = HString::new();
    let _ = write!(row, "  {}", label);
    row
}

/// Sound `pattern`, pausing `gap_ms` after each tone.
pub fn play<B: Buzzer, D: Delay>(
    buzzer: &mut B,
    delay: &mut D,
    pattern: &TonePattern,
    gap_ms: u32,
) {
    for _ in 0..pattern.repeat {
        settle("buzzer", buzzer.start_tone(pattern.freq_hz));
        delay.delay_ms(pattern.duration_ms);
        settle("buzzer", buzzer.stop());
        delay.delay_ms(gap_ms);
    }
}

fn publish<M: MqttClient>(mqtt: &mut M, topic: &str, payload: &str) -> bool {
    match mqtt.publish(topic, payload.as_bytes(), false) {
        Ok(()) => {
            info!("Published {} to {}", payload, topic);
            true
        }
        Err(e) => {
            warn!("Publish of {} to {} failed: {:?}", payload, topic, e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DebugConfig;
    use crate::hal::{mock_devices, MockBoard, MockMqtt};

    fn run(
        config: &Config,
        event: Event,
        card: &Credential,
    ) -> (Devices<MockBoard>, MockMqtt, bool) {
        let coordinator = FeedbackCoordinator::new(config);
        let mut devices = mock_devices(config);
        let mut mqtt = MockMqtt::new();
        let published = coordinator.run(event, card, &mut devices, &mut mqtt);
        (devices, mqtt, published)
    }

    #[test]
    fn card_unlock_sequence() {
        let card = Credential::from([0xAB, 0xCD, 0xEF, 0x00]);
        let (devices, mqtt, published) = run(&Config::default(), Event::CardUnlockOk, &card);

        assert!(published);
        assert_eq!(
            mqtt.published_payloads("doorlock/unlock-status"),
            vec!["unlocked:card"]
        );
        assert_eq!(
            devices.relay.history(),
            &[LockState::Unlocked, LockState::Locked]
        );
        assert_eq!(devices.buzzer.tones(), &[4500, 4500]);
        assert_eq!(devices.display.row_text(1), "Door close in 1 ");
        assert_eq!(devices.display.code_at(0, 0), glyphs::UNLOCK);
        assert_eq!(devices.display.row_text(0)[1..].trim_end(), " Local card");
        // 2 x (100ms tone + 50ms gap), then 3 x 1s hold
        assert_eq!(devices.delay.calls(), &[100, 50, 100, 50, 1000, 1000, 1000]);
    }

    #[test]
    fn remote_unlock_labels() {
        let (devices, mqtt, _) = run(
            &Config::default(),
            Event::RemoteUnlock(UnlockOrigin::Web),
            &Credential::empty(),
        );
        assert_eq!(
            mqtt.published_payloads("doorlock/unlock-status"),
            vec!["unlocked:web"]
        );
        assert_eq!(devices.display.row_text(0)[1..].trim_end(), " Web");

        let (devices, mqtt, _) = run(
            &Config::default(),
            Event::RemoteUnlock(UnlockOrigin::Telegram),
            &Credential::empty(),
        );
        assert_eq!(
            mqtt.published_payloads("doorlock/unlock-status"),
            vec!["unlocked:telegram"]
        );
        assert_eq!(devices.display.row_text(0)[1..].trim_end(), " Telegram");
    }

    #[test]
    fn rejected_card_never_touches_relay() {
        let card = Credential::from([0xAB, 0xCD, 0xEF, 0x01]);
        let (devices, mqtt, _) = run(&Config::default(), Event::CardUnlockFail, &card);

        assert_eq!(
            mqtt.published_payloads("doorlock/unlock-status"),
            vec!["unlock-fail:card"]
        );
        assert!(devices.relay.history().is_empty());
        assert_eq!(devices.buzzer.tones(), &[500, 500, 500]);
        assert_eq!(devices.display.code_at(0, 0), glyphs::FAIL);
        assert_eq!(devices.display.row_text(0)[1..].trim_end(), " Unlock failed");
        assert_eq!(devices.display.row_text(1).trim_end(), "Impostor!");
        assert_eq!(
            devices.delay.calls(),
            &[200, 50, 200, 50, 200, 50, 1000, 1000]
        );
    }

    #[test]
    fn reveal_shows_hex_uid() {
        let config = Config::default().with_debug(DebugConfig::default().with_reveal_credential(true));
        let card = Credential::from([0xAB, 0xCD, 0xEF, 0x01]);
        let (devices, _, _) = run(&config, Event::CardUnlockFail, &card);
        assert_eq!(devices.display.row_text(0)[1..].trim_end(), " AB CD EF 01");
    }

    #[test]
    fn reveal_does_not_apply_to_remote_unlocks() {
        let config = Config::default().with_debug(DebugConfig::default().with_reveal_credential(true));
        let card = Credential::from([0xAB, 0xCD, 0xEF, 0x00]);
        let (devices, _, _) = run(&config, Event::RemoteUnlock(UnlockOrigin::Telegram), &card);
        assert_eq!(devices.display.row_text(0)[1..].trim_end(), " Telegram");
    }

    #[test]
    fn power_on_only_publishes() {
        let (devices, mqtt, published) = run(&Config::default(), Event::PowerOn, &Credential::empty());

        assert!(published);
        assert_eq!(mqtt.published_payloads("doorlock/poweron"), vec!["poweron"]);
        assert!(mqtt.published_payloads("doorlock/unlock-status").is_empty());
        assert!(devices.relay.history().is_empty());
        assert!(devices.buzzer.tones().is_empty());
        assert!(devices.delay.calls().is_empty());
    }

    #[test]
    fn publish_failure_does_not_abort_unlock() {
        let coordinator = FeedbackCoordinator::new(&Config::default());
        let mut devices = mock_devices(&Config::default());
        let mut mqtt = MockMqtt::new();
        mqtt.set_fail_publish(true);

        let published = coordinator.run(
            Event::CardUnlockOk,
            &Credential::from([0xAB, 0xCD, 0xEF, 0x00]),
            &mut devices,
            &mut mqtt,
        );

        assert!(!published);
        assert_eq!(
            devices.relay.history(),
            &[LockState::Unlocked, LockState::Locked]
        );
    }

    #[test]
    fn relay_failure_still_runs_countdown() {
        let coordinator = FeedbackCoordinator::new(&Config::default());
        let mut devices = mock_devices(&Config::default());
        devices.relay.set_fail(true);
        let mut mqtt = MockMqtt::new();

        coordinator.run(
            Event::RemoteUnlock(UnlockOrigin::Web),
            &Credential::empty(),
            &mut devices,
            &mut mqtt,
        );

        assert_eq!(devices.delay.calls().iter().filter(|ms| **ms == 1000).count(), 3);
    }

    #[test]
    fn relay_moves_only_for_unlocking_events() {
        let card = Credential::from([0xAB, 0xCD, 0xEF, 0x00]);
        for event in [
            Event::PowerOn,
            Event::CardUnlockOk,
            Event::CardUnlockFail,
            Event::RemoteUnlock(UnlockOrigin::Telegram),
            Event::RemoteUnlock(UnlockOrigin::Web),
        ] {
            let (devices, _, _) = run(&Config::default(), event, &card);
            assert_eq!(!devices.relay.history().is_empty(), event.unlocks(), "{:?}", event);
            assert_eq!(devices.relay.state, LockState::Locked);
        }
    }
}
