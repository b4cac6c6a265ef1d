//! End-to-end door scenarios driven through the controller with mock hardware

use rs_doorlock::{
    config::{DebugConfig, LockConfig, TelemetryConfig},
    hal::{mock_devices, MockBoard, MockMqtt, MockWallClock},
    AllowList, Config, DoorController, Event, LockState, Mode, TickOutcome, UnlockOrigin,
};

const STATUS: &str = "doorlock/unlock-status";
const REMOTE: &str = "doorlock/unlock-remote";
const TEMP: &str = "doorlock/temp";
const HUMID: &str = "doorlock/humid";

fn door_with(config: Config) -> DoorController<MockBoard, MockMqtt> {
    let devices = mock_devices(&config);
    let mut door = DoorController::new(config, devices, MockMqtt::new()).unwrap();
    door.boot().unwrap();
    door
}

fn door() -> DoorController<MockBoard, MockMqtt> {
    door_with(Config::default())
}

// ============================================================================
// Card Scenarios
// ============================================================================

#[test]
fn listed_card_unlocks_for_hold_time() {
    let mut door = door();
    door.devices_mut().delay.reset();
    door.devices_mut().reader.present(&[0xAB, 0xCD, 0xEF, 0x00]);

    assert_eq!(door.tick(), TickOutcome::Card { valid: true });
    assert_eq!(door.mqtt().published_payloads(STATUS), vec!["unlocked:card"]);

    let devices = door.devices();
    assert_eq!(
        devices.relay.history(),
        &[LockState::Unlocked, LockState::Locked]
    );
    assert_eq!(devices.buzzer.tones(), &[4500, 4500]);
    // Two success beeps, then one second per countdown step
    assert_eq!(
        devices.delay.calls(),
        &[100, 50, 100, 50, 1000, 1000, 1000]
    );
    assert_eq!(devices.display.row_text(0), "\u{3} Local card    ");
    assert_eq!(devices.display.row_text(1), "Door close in 1 ");
}

#[test]
fn unknown_card_is_rejected_without_touching_relay() {
    let mut door = door();
    door.devices_mut().delay.reset();
    door.devices_mut().reader.present(&[0xAB, 0xCD, 0xEF, 0x01]);

    assert_eq!(door.tick(), TickOutcome::Card { valid: false });
    assert_eq!(
        door.mqtt().published_payloads(STATUS),
        vec!["unlock-fail:card"]
    );

    let devices = door.devices();
    assert!(devices.relay.history().is_empty());
    assert_eq!(devices.relay.state, LockState::Locked);
    assert_eq!(devices.buzzer.tones(), &[500, 500, 500]);
    assert_eq!(
        devices.delay.calls(),
        &[200, 50, 200, 50, 200, 50, 1000, 1000]
    );
    assert_eq!(devices.display.row_text(0), "\u{4} Unlock failed ");
    assert_eq!(devices.display.row_text(1), "Impostor!       ");
}

#[test]
fn revealed_credential_replaces_card_label() {
    let config = Config::default().with_debug(DebugConfig::default().with_reveal_credential(true));
    let mut door = door_with(config);
    door.devices_mut().reader.present(&[0xAB, 0xCD, 0xEF, 0x01]);

    door.tick();
    assert_eq!(door.devices().display.row_text(0), "\u{4} AB CD EF 01   ");
}

#[test]
fn second_listed_card_also_unlocks() {
    let allow = AllowList::new(&[[0xAB, 0xCD, 0xEF, 0x00], [0x12, 0x34, 0x56, 0x78]]).unwrap();
    let config = Config::default().with_lock(LockConfig::default().with_allow_list(allow));
    let mut door = door_with(config);

    door.devices_mut().reader.present(&[0x12, 0x34, 0x56, 0x78]);
    assert_eq!(door.tick(), TickOutcome::Card { valid: true });
    assert_eq!(door.current_credential().as_bytes(), &[0x12, 0x34, 0x56, 0x78]);
}

#[test]
fn seven_byte_uid_never_matches() {
    let mut door = door();
    door.devices_mut()
        .reader
        .present(&[0xAB, 0xCD, 0xEF, 0x00, 0x11, 0x22, 0x33]);

    assert_eq!(door.tick(), TickOutcome::Card { valid: false });
    assert!(door.devices().relay.history().is_empty());
}

// ============================================================================
// Remote Scenarios
// ============================================================================

#[test]
fn telegram_command_unlocks() {
    let mut door = door();
    door.mqtt_mut().inject(REMOTE, "telegram>>unlock");

    assert_eq!(door.tick(), TickOutcome::Remote(UnlockOrigin::Telegram));
    assert_eq!(
        door.mqtt().published_payloads(STATUS),
        vec!["unlocked:telegram"]
    );
    assert_eq!(
        door.devices().relay.history(),
        &[LockState::Unlocked, LockState::Locked]
    );
    assert_eq!(door.devices().display.row_text(0), "\u{3} Telegram      ");
}

#[test]
fn web_command_unlocks() {
    let mut door = door();
    door.mqtt_mut().inject(REMOTE, "web>>unlock");

    assert_eq!(door.tick(), TickOutcome::Remote(UnlockOrigin::Web));
    assert_eq!(door.mqtt().published_payloads(STATUS), vec!["unlocked:web"]);
    assert_eq!(door.devices().display.row_text(0), "\u{3} Web           ");
}

#[test]
fn near_miss_commands_are_ignored() {
    let mut door = door();
    for payload in ["", "telegram", "telegram>>unlock ", "WEB>>UNLOCK", "web>>unlock\n"] {
        door.mqtt_mut().inject(REMOTE, payload);
        assert!(matches!(door.tick(), TickOutcome::Standby { .. }));
    }
    assert!(door.mqtt().published_payloads(STATUS).is_empty());
    assert!(door.devices().relay.history().is_empty());
}

#[test]
fn custom_command_literals() {
    let config = Config::default()
        .with_lock(LockConfig::default().with_remote_commands("tg:open", "www:open"));
    let mut door = door_with(config);

    door.mqtt_mut().inject(REMOTE, "telegram>>unlock");
    assert!(matches!(door.tick(), TickOutcome::Standby { .. }));

    door.mqtt_mut().inject(REMOTE, "www:open");
    assert_eq!(door.tick(), TickOutcome::Remote(UnlockOrigin::Web));
}

#[test]
fn card_takes_precedence_over_queued_message() {
    let mut door = door();
    door.mqtt_mut().inject(REMOTE, "web>>unlock");
    door.devices_mut().reader.present(&[0xAB, 0xCD, 0xEF, 0x00]);

    assert_eq!(door.tick(), TickOutcome::Card { valid: true });
    assert_eq!(door.tick(), TickOutcome::Remote(UnlockOrigin::Web));
}

// ============================================================================
// State Machine
// ============================================================================

#[test]
fn every_event_returns_to_standby() {
    let mut door = door();
    for event in [
        Event::CardUnlockOk,
        Event::CardUnlockFail,
        Event::RemoteUnlock(UnlockOrigin::Telegram),
        Event::RemoteUnlock(UnlockOrigin::Web),
        Event::PowerOn,
    ] {
        door.handle_event(event);
        assert_eq!(door.mode(), Mode::Standby);
    }

    // Standby screen comes back on the next idle tick
    assert!(matches!(door.tick(), TickOutcome::Standby { .. }));
    assert!(door.is_standing_by());
    assert_eq!(&door.devices().display.row_text(1)[1..], " Insert card   ");
}

// ============================================================================
// Standby Screen
// ============================================================================

#[test]
fn standby_shows_clock_and_temperature() {
    let mut door = door();
    door.tick();

    // 09:07 UTC at +7 is 16:07 local
    assert_eq!(door.devices().display.row_text(0), "04:07p 05/03 25\u{DF}");
    assert_eq!(door.devices().display.row_text(1), "\u{2} Insert card   ");
}

#[test]
fn standby_template_is_drawn_once() {
    let mut door = door();
    door.tick();
    assert!(door.is_standing_by());

    door.devices_mut().display.reset_log();
    for _ in 0..5 {
        door.devices_mut().clock.advance(1);
        door.tick();
    }

    let display = &door.devices().display;
    assert_eq!(display.clear_count(), 0);
    // Only the clock and temperature fields are rewritten
    assert!(display
        .writes
        .iter()
        .all(|(col, row, _)| *row == 0 && (*col == 0 || *col == 13)));
    assert_eq!(&display.row_text(1)[1..], " Insert card   ");
}

#[test]
fn template_is_redrawn_after_an_event() {
    let mut door = door();
    door.tick();
    door.devices_mut().display.reset_log();

    door.devices_mut().reader.present(&[0xAB, 0xCD, 0xEF, 0x00]);
    door.tick();
    assert!(!door.is_standing_by());

    door.tick();
    assert_eq!(door.devices().display.clear_count(), 1);
    assert_eq!(&door.devices().display.row_text(1)[1..], " Insert card   ");
}

#[test]
fn out_of_range_temperature_leaves_field_alone() {
    let mut door = door();
    door.devices_mut().sensor.set(120.0, 60.0);

    assert_eq!(door.tick(), TickOutcome::Standby { published: true });
    assert_eq!(&door.devices().display.row_text(0)[13..15], "--");
    assert!(door.mqtt().published_payloads(TEMP).is_empty());
    assert_eq!(door.mqtt().published_payloads(HUMID), vec!["60"]);
}

fn unsynced_door() -> DoorController<MockBoard, MockMqtt> {
    let config = Config::default();
    let mut devices = mock_devices(&config);
    devices.clock = MockWallClock::unsynced();
    let mut door = DoorController::new(config, devices, MockMqtt::new()).unwrap();
    door.boot().unwrap();
    door
}

#[test]
fn unsynced_clock_keeps_template_but_publishes_at_boot() {
    let mut door = unsynced_door();

    assert_eq!(door.tick(), TickOutcome::Standby { published: true });
    assert_eq!(&door.devices().display.row_text(0)[..12], "--:--- --/--");
    assert_eq!(door.mqtt().published_payloads(TEMP), vec!["25"]);
    assert_eq!(door.mqtt().published_payloads(HUMID), vec!["60"]);
}

#[test]
fn unsynced_telemetry_is_throttled_by_uptime() {
    let mut door = unsynced_door();
    let mut slots = 0;

    // Twelve seconds of uptime, two ticks per second
    for _ in 0..12 {
        for _ in 0..2 {
            if door.tick() == (TickOutcome::Standby { published: true }) {
                slots += 1;
            }
        }
        door.devices_mut().clock.advance(1);
    }

    assert_eq!(slots, 3);
    assert_eq!(door.mqtt().published_payloads(TEMP).len(), 3);
}

#[test]
fn telemetry_keeps_running_across_first_sync() {
    let mut door = unsynced_door();
    assert_eq!(door.tick(), TickOutcome::Standby { published: true });

    door.devices_mut().clock.set(1_709_629_620);
    let mut slots = 0;
    for _ in 0..10 {
        if door.tick() == (TickOutcome::Standby { published: true }) {
            slots += 1;
        }
        door.devices_mut().clock.advance(1);
    }

    assert_eq!(slots, 1);
    assert_eq!(&door.devices().display.row_text(0)[..12], "04:07p 05/03");
}

// ============================================================================
// Telemetry
// ============================================================================

#[test]
fn telemetry_publishes_right_after_boot() {
    let mut door = door();

    assert_eq!(door.tick(), TickOutcome::Standby { published: true });
    assert_eq!(door.mqtt().published_payloads(TEMP), vec!["25"]);
    assert_eq!(door.mqtt().published_payloads(HUMID), vec!["60"]);
    assert_eq!(door.throttle_state().countdown, 5);
}

#[test]
fn telemetry_is_throttled_to_interval() {
    let mut door = door();
    let mut slots = 0;

    // Twenty seconds, two ticks per second
    for _ in 0..20 {
        for _ in 0..2 {
            if door.tick() == (TickOutcome::Standby { published: true }) {
                slots += 1;
            }
        }
        door.devices_mut().clock.advance(1);
    }

    assert_eq!(slots, 4);
    assert_eq!(door.mqtt().published_payloads(TEMP).len(), 4);
    assert_eq!(door.mqtt().published_payloads(HUMID).len(), 4);
}

#[test]
fn telemetry_interval_is_configurable() {
    let config =
        Config::default().with_telemetry(TelemetryConfig::default().with_interval(2));
    let mut door = door_with(config);
    let mut slots = 0;

    for _ in 0..6 {
        if door.tick() == (TickOutcome::Standby { published: true }) {
            slots += 1;
        }
        door.devices_mut().clock.advance(1);
    }

    // One tick per second: publish, two boundaries, publish, ...
    assert_eq!(slots, 2);
}

#[test]
fn no_extra_ticks_without_clock_movement() {
    let mut door = door();
    door.tick();
    for _ in 0..50 {
        assert_eq!(door.tick(), TickOutcome::Standby { published: false });
    }
    assert_eq!(door.mqtt().published_payloads(TEMP).len(), 1);
}
