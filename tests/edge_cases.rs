//! Edge case tests: broker outages, power-on delivery and failing devices

use rs_doorlock::{
    config::RetryPolicy,
    hal::{mock_devices, MockBoard, MockMqtt},
    Config, ConnectError, DoorController, LockState, MqttConfig, TickOutcome, UnlockOrigin,
};

const STATUS: &str = "doorlock/unlock-status";
const REMOTE: &str = "doorlock/unlock-remote";
const POWER_ON: &str = "doorlock/poweron";

fn config_with_retry(delay_ms: u32, max_attempts: u32) -> Config {
    Config::default().with_mqtt(MqttConfig::default().with_retry(RetryPolicy {
        delay_ms,
        max_attempts,
    }))
}

fn door_with(config: Config, mqtt: MockMqtt) -> DoorController<MockBoard, MockMqtt> {
    let devices = mock_devices(&config);
    DoorController::new(config, devices, mqtt).unwrap()
}

fn offline_mqtt(failures: u32) -> MockMqtt {
    let mut mqtt = MockMqtt::new();
    mqtt.disconnect();
    mqtt.fail_next_connects(failures);
    mqtt
}

// ============================================================================
// Bounded Reconnects
// ============================================================================

#[test]
fn reconnect_attempts_are_bounded() {
    let mut door = door_with(config_with_retry(3000, 3), MockMqtt::new());
    door.boot().unwrap();

    door.mqtt_mut().disconnect();
    door.mqtt_mut().fail_next_connects(100);
    door.devices_mut().delay.reset();

    assert_eq!(door.tick(), TickOutcome::Offline);
    assert_eq!(door.mqtt().connect_attempts(), 3);

    // Pause between attempts only, not after the last one
    let waits: Vec<u32> = door
        .devices()
        .delay
        .calls()
        .iter()
        .copied()
        .filter(|ms| *ms == 3000)
        .collect();
    assert_eq!(waits, vec![3000, 3000]);

    let policy = RetryPolicy {
        delay_ms: 3000,
        max_attempts: 3,
    };
    let blocked: u64 = waits.iter().map(|ms| u64::from(*ms)).sum();
    assert_eq!(Some(blocked), policy.max_block_ms());
}

#[test]
fn waiting_screen_is_shown_while_reconnecting() {
    let mut door = door_with(config_with_retry(10, 1), offline_mqtt(100));

    assert_eq!(door.boot(), Err(ConnectError::Exhausted { attempts: 1 }));
    let display = &door.devices().display;
    assert_eq!(display.row_text(0).trim_end(), "\u{1} Waiting for");
    assert_eq!(display.row_text(1).trim_end(), "MQTT client...");
}

#[test]
fn cards_still_work_offline() {
    let mut door = door_with(config_with_retry(10, 2), offline_mqtt(1000));
    assert!(door.boot().is_err());

    door.devices_mut().reader.present(&[0xAB, 0xCD, 0xEF, 0x00]);
    assert_eq!(door.tick(), TickOutcome::Card { valid: true });
    assert_eq!(
        door.devices().relay.history(),
        &[LockState::Unlocked, LockState::Locked]
    );
    // Status could not be published
    assert!(door.mqtt().published_payloads(STATUS).is_empty());

    door.devices_mut().reader.present(&[0x00, 0x00, 0x00, 0x01]);
    assert_eq!(door.tick(), TickOutcome::Card { valid: false });
    assert_eq!(door.devices().relay.history().len(), 2);
}

#[test]
fn offline_standby_still_updates_screen() {
    let mut door = door_with(config_with_retry(10, 1), offline_mqtt(1000));
    let _ = door.boot();

    assert_eq!(door.tick(), TickOutcome::Offline);
    assert_eq!(&door.devices().display.row_text(0)[..12], "04:07p 05/03");
}

#[test]
fn remote_messages_wait_for_the_link() {
    let mut door = door_with(config_with_retry(10, 1), MockMqtt::new());
    door.boot().unwrap();

    door.mqtt_mut().disconnect();
    door.mqtt_mut().fail_next_connects(1);
    door.mqtt_mut().inject(REMOTE, "telegram>>unlock");

    assert_eq!(door.tick(), TickOutcome::Offline);
    assert_eq!(door.mqtt().incoming.len(), 1);
    assert!(door.devices().relay.history().is_empty());

    // Link comes back: resubscribe, then the queued command runs
    assert_eq!(door.tick(), TickOutcome::Remote(UnlockOrigin::Telegram));
    assert!(door.mqtt().is_subscribed(REMOTE));
    assert_eq!(
        door.mqtt().published_payloads(STATUS),
        vec!["unlocked:telegram"]
    );
}

#[test]
fn unlimited_policy_retries_until_connected() {
    let mut door = door_with(config_with_retry(1000, 0), offline_mqtt(25));

    door.boot().unwrap();
    assert_eq!(door.mqtt().connect_attempts(), 26);
    assert!(door.mqtt().is_subscribed(REMOTE));
}

#[test]
fn failed_subscribe_is_retried_next_tick() {
    let mut mqtt = MockMqtt::new();
    mqtt.set_fail_subscribe(true);
    let mut door = door_with(Config::default(), mqtt);

    assert_eq!(door.boot(), Err(ConnectError::Subscribe));
    assert!(door.power_on_pending());
    assert_eq!(door.tick(), TickOutcome::Offline);

    door.mqtt_mut().set_fail_subscribe(false);
    assert!(matches!(door.tick(), TickOutcome::Standby { .. }));
    assert!(door.mqtt().is_subscribed(REMOTE));
    assert!(!door.power_on_pending());
    // No reconnects were needed, only the subscription
    assert_eq!(door.mqtt().connect_attempts(), 0);
}

// ============================================================================
// Power-On Notification
// ============================================================================

#[test]
fn power_on_waits_for_first_connection() {
    let mut door = door_with(config_with_retry(10, 2), offline_mqtt(4));

    assert_eq!(door.boot(), Err(ConnectError::Exhausted { attempts: 2 }));
    assert!(door.power_on_pending());
    assert!(door.mqtt().published_payloads(POWER_ON).is_empty());

    assert_eq!(door.tick(), TickOutcome::Offline);
    assert!(door.power_on_pending());

    assert!(matches!(door.tick(), TickOutcome::Standby { .. }));
    assert!(!door.power_on_pending());
    assert_eq!(door.mqtt().published_payloads(POWER_ON), vec!["poweron"]);
}

#[test]
fn power_on_is_sent_once_across_reconnects() {
    let mut door = door_with(config_with_retry(10, 2), MockMqtt::new());
    door.boot().unwrap();

    for _ in 0..3 {
        door.mqtt_mut().disconnect();
        door.tick();
    }

    assert_eq!(door.mqtt().published_payloads(POWER_ON), vec!["poweron"]);
}

#[test]
fn failed_power_on_publish_stays_pending() {
    let mut mqtt = MockMqtt::new();
    mqtt.set_fail_publish(true);
    let mut door = door_with(Config::default(), mqtt);

    door.boot().unwrap();
    assert!(door.power_on_pending());

    // Retried on the next restored link
    door.mqtt_mut().set_fail_publish(false);
    door.mqtt_mut().disconnect();
    door.tick();
    assert!(!door.power_on_pending());
    assert_eq!(door.mqtt().published_payloads(POWER_ON), vec!["poweron"]);
}

// ============================================================================
// Failing Devices
// ============================================================================

#[test]
fn relay_failure_does_not_abort_feedback() {
    let mut door = door_with(Config::default(), MockMqtt::new());
    door.boot().unwrap();
    door.devices_mut().relay.set_fail(true);
    door.devices_mut().reader.present(&[0xAB, 0xCD, 0xEF, 0x00]);

    assert_eq!(door.tick(), TickOutcome::Card { valid: true });
    assert_eq!(door.mqtt().published_payloads(STATUS), vec!["unlocked:card"]);
    assert_eq!(door.devices().buzzer.tones(), &[4500, 4500]);
    assert_eq!(door.devices().display.row_text(1), "Door close in 1 ");
}

#[test]
fn sensor_failure_skips_telemetry() {
    let mut door = door_with(Config::default(), MockMqtt::new());
    door.boot().unwrap();
    door.devices_mut().sensor.fail = true;

    assert_eq!(door.tick(), TickOutcome::Standby { published: true });
    assert!(door.sample().temperature.is_nan());
    assert!(door.mqtt().published_payloads("doorlock/temp").is_empty());
    assert!(door.mqtt().published_payloads("doorlock/humid").is_empty());
    assert_eq!(&door.devices().display.row_text(0)[13..15], "--");
}

#[test]
fn blank_reads_are_not_events() {
    let mut door = door_with(Config::default(), MockMqtt::new());
    door.boot().unwrap();
    door.devices_mut().reader.present(&[]);
    door.devices_mut().reader.present(&[0, 0, 0, 0]);

    assert!(matches!(door.tick(), TickOutcome::Standby { .. }));
    assert!(matches!(door.tick(), TickOutcome::Standby { .. }));
    assert!(door.mqtt().published_payloads(STATUS).is_empty());
}

#[test]
fn custom_topic_prefix_is_used_everywhere() {
    let config = Config::default().with_mqtt(MqttConfig::default().with_topic_prefix("door/front"));
    let mut door = door_with(config, MockMqtt::new());
    door.boot().unwrap();

    assert!(door.mqtt().is_subscribed("door/front/unlock-remote"));
    assert_eq!(
        door.mqtt().published_payloads("door/front/poweron"),
        vec!["poweron"]
    );

    door.mqtt_mut().inject("door/front/unlock-remote", "web>>unlock");
    assert_eq!(door.tick(), TickOutcome::Remote(UnlockOrigin::Web));
    assert_eq!(
        door.mqtt().published_payloads("door/front/unlock-status"),
        vec!["unlocked:web"]
    );
}
