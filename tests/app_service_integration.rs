//! Full-loop integration tests for the coordinator service.
//!
//! Everything runs on the host: the simulation hardware adapter stands
//! in for the peripherals, the NVS adapter uses its in-memory backend,
//! and a buffering sink captures every emitted event. Time is advanced
//! in fixed 10ms ticks, the same way the firmware loop drives the
//! service.

use vitaclock::adapters::hardware::SimHardware;
use vitaclock::adapters::nvs::NvsAlarmStore;
use vitaclock::alarm::{AlarmConfig, StopReason, TimeOfDay};
use vitaclock::app::commands::AppCommand;
use vitaclock::app::events::AppEvent;
use vitaclock::app::ports::AlarmStorePort;
use vitaclock::app::ports::EventSink;
use vitaclock::app::service::AppService;
use vitaclock::config::SystemConfig;
use vitaclock::mode::DisplayMode;
use vitaclock::presentation::NoticeKind;
use vitaclock::remote;
use vitaclock::sensors::{EnvReading, PulseReading};

const STEP_MS: u64 = 10;

#[derive(Default)]
struct VecSink {
    events: Vec<AppEvent>,
}

impl EventSink for VecSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(*event);
    }
}

struct Harness {
    svc: AppService,
    hw: SimHardware,
    store: NvsAlarmStore,
    sink: VecSink,
    now: u64,
}

impl Harness {
    fn new() -> Self {
        let store = NvsAlarmStore::new().unwrap();
        let svc = AppService::boot(SystemConfig::default(), &store);
        Self {
            svc,
            hw: SimHardware::new(),
            store,
            sink: VecSink::default(),
            now: 0,
        }
    }

    /// Advance simulated time, ticking the service every 10ms.
    fn run(&mut self, ms: u64) {
        let end = self.now + ms;
        while self.now < end {
            self.now += STEP_MS;
            self.svc.tick(self.now, &mut self.hw, &mut self.sink);
        }
    }

    /// A debounced press held for `held_ms`, including the release
    /// settling time.
    fn press(&mut self, held_ms: u64) {
        self.hw.button = true;
        self.run(held_ms);
        self.hw.button = false;
        self.run(60);
    }

    fn cmd(&mut self, cmd: AppCommand) {
        self.svc
            .handle_command(cmd, self.now, &mut self.store, &mut self.sink);
    }

    fn drain(&mut self) -> Vec<AppEvent> {
        std::mem::take(&mut self.sink.events)
    }

    fn set_clock(&mut self, hour: u8, minute: u8, second: u8) {
        self.hw.tod = TimeOfDay {
            hour,
            minute,
            second,
        };
    }

    fn finger(&mut self, heart_rate: u16) {
        self.hw.pulse = PulseReading {
            presence: heart_rate > 0,
            heart_rate,
            ir: if heart_rate > 0 { 90_000 } else { 10_000 },
        };
    }

    fn arm_alarm(&mut self, hour: u8, minute: u8) {
        self.cmd(AppCommand::SetAlarmHour(hour));
        self.cmd(AppCommand::SetAlarmMinute(minute));
        self.cmd(AppCommand::SetAlarmEnabled(true));
        self.drain();
    }
}

// ───────────────────────────────────────────────────────────────
// Alarm lifecycle
// ───────────────────────────────────────────────────────────────

#[test]
fn alarm_rings_at_match_and_button_acknowledges() {
    let mut h = Harness::new();
    h.arm_alarm(7, 30);

    h.set_clock(7, 29, 59);
    h.run(100);
    assert!(h.drain().is_empty());

    h.set_clock(7, 30, 0);
    h.run(50);
    let events = h.drain();
    assert!(events.contains(&AppEvent::AlarmTriggered { hour: 7, minute: 30 }));
    assert!(h.svc.snapshot().alarm_ringing);
    // The ring pattern starts in its ON phase.
    assert!(h.hw.buzzer);

    let mode_before = h.svc.snapshot().mode;
    h.press(100);
    let events = h.drain();
    assert!(events.contains(&AppEvent::AlarmStopped {
        reason: StopReason::Button
    }));
    assert!(!h.svc.snapshot().alarm_ringing);
    // Acknowledgement consumed the press: the mode did not advance.
    assert_eq!(h.svc.snapshot().mode, mode_before);

    h.run(STEP_MS);
    assert!(!h.hw.buzzer);
}

#[test]
fn alarm_triggers_once_per_matching_minute() {
    let mut h = Harness::new();
    h.arm_alarm(7, 30);

    h.set_clock(7, 30, 0);
    h.run(2000);
    let triggers = h
        .drain()
        .iter()
        .filter(|e| matches!(e, AppEvent::AlarmTriggered { .. }))
        .count();
    assert_eq!(triggers, 1);
}

#[test]
fn unacknowledged_ring_times_out() {
    let mut h = Harness::new();
    h.arm_alarm(7, 30);
    h.set_clock(7, 30, 0);
    h.run(100);
    h.set_clock(7, 30, 30);

    h.run(61_000);
    let events = h.drain();
    assert!(events.contains(&AppEvent::AlarmStopped {
        reason: StopReason::Timeout
    }));
    assert!(!h.svc.snapshot().alarm_ringing);
    assert!(!h.hw.buzzer);
}

#[test]
fn remote_acknowledge_stops_ring() {
    let mut h = Harness::new();
    h.arm_alarm(7, 30);
    h.set_clock(7, 30, 0);
    h.run(100);
    assert!(h.svc.snapshot().alarm_ringing);

    let cmd = remote::parse_command(r#"{"cmd":"acknowledge_alarm"}"#).unwrap();
    h.cmd(cmd);
    assert!(h.drain().contains(&AppEvent::AlarmStopped {
        reason: StopReason::Remote
    }));
    assert!(!h.svc.snapshot().alarm_ringing);
}

#[test]
fn acknowledge_without_ring_is_a_no_op() {
    let mut h = Harness::new();
    h.cmd(AppCommand::AcknowledgeAlarm);
    assert!(h.drain().is_empty());
}

#[test]
fn alarm_config_survives_reboot() {
    let mut h = Harness::new();
    h.arm_alarm(6, 45);

    let expected = AlarmConfig {
        hour: 6,
        minute: 45,
        enabled: true,
    };
    assert_eq!(h.store.load().unwrap(), expected);

    // "Reboot": a fresh service over the same store.
    let rebooted = AppService::boot(SystemConfig::default(), &h.store);
    assert_eq!(rebooted.snapshot().alarm, expected);
}

// ───────────────────────────────────────────────────────────────
// Display modes
// ───────────────────────────────────────────────────────────────

#[test]
fn auto_rotation_cycles_every_five_seconds() {
    let mut h = Harness::new();
    h.run(15_050);
    let modes: Vec<DisplayMode> = h
        .drain()
        .iter()
        .filter_map(|e| match e {
            AppEvent::ModeChanged { mode, auto: true } => Some(*mode),
            _ => None,
        })
        .collect();
    assert_eq!(
        modes,
        vec![
            DisplayMode::Vitals,
            DisplayMode::FullInfo,
            DisplayMode::TimeAndEnvironment,
        ]
    );
}

#[test]
fn short_press_advances_and_pins_the_mode() {
    let mut h = Harness::new();
    h.press(100);
    assert!(h.drain().contains(&AppEvent::ModeChanged {
        mode: DisplayMode::Vitals,
        auto: false,
    }));
    let snap = h.svc.snapshot();
    assert_eq!(snap.mode, DisplayMode::Vitals);
    assert!(!snap.auto_rotate);

    // Pinned: a long idle period never rotates.
    h.run(20_000);
    assert!(
        !h.drain()
            .iter()
            .any(|e| matches!(e, AppEvent::ModeChanged { .. }))
    );
    assert_eq!(h.svc.snapshot().mode, DisplayMode::Vitals);
}

#[test]
fn reenabling_auto_rotation_resumes_a_full_interval_later() {
    let mut h = Harness::new();
    h.press(100);
    h.drain();

    h.cmd(AppCommand::SetAutoRotate(true));
    // The command itself announces the rotation state; drop that event.
    h.drain();
    h.run(4_900);
    assert!(
        !h.drain()
            .iter()
            .any(|e| matches!(e, AppEvent::ModeChanged { auto: true, .. }))
    );
    h.run(200);
    assert!(h.drain().iter().any(|e| matches!(
        e,
        AppEvent::ModeChanged { auto: true, .. }
    )));
}

#[test]
fn long_press_outside_vitals_only_shows_a_hint() {
    let mut h = Harness::new();
    assert_eq!(h.svc.snapshot().mode, DisplayMode::TimeAndEnvironment);
    h.press(1100);

    let snap = h.svc.snapshot();
    assert!(!snap.muted);
    assert!(
        !h.drain()
            .iter()
            .any(|e| matches!(e, AppEvent::MuteToggled(_)))
    );
    assert!(matches!(
        snap.notice.map(|n| n.kind),
        Some(NoticeKind::LongPressHint)
    ));
}

// ───────────────────────────────────────────────────────────────
// Health monitoring and mute
// ───────────────────────────────────────────────────────────────

#[test]
fn heart_rate_warning_needs_the_full_dwell() {
    let mut h = Harness::new();
    h.finger(110);
    h.run(9_900);
    assert!(
        !h.drain()
            .iter()
            .any(|e| matches!(e, AppEvent::HealthWarningRaised { .. }))
    );

    h.run(200);
    assert!(h
        .drain()
        .contains(&AppEvent::HealthWarningRaised { heart_rate: 110 }));
    assert!(h.svc.snapshot().warning_active);

    h.finger(80);
    h.run(50);
    assert!(h
        .drain()
        .contains(&AppEvent::HealthWarningCleared { heart_rate: 80 }));
    assert!(!h.svc.snapshot().warning_active);
}

#[test]
fn mute_silences_the_beep_but_not_the_warning() {
    let mut h = Harness::new();
    // Vitals screen, then long press to mute.
    h.press(100);
    h.press(1100);
    assert!(h.drain().contains(&AppEvent::MuteToggled(true)));
    assert!(h.svc.snapshot().muted);
    // Let the mute feedback pattern finish.
    h.run(500);

    h.svc.set_connectivity(true, &mut h.sink);
    h.finger(110);

    // Drive well past the dwell; the buzzer must stay silent throughout.
    for _ in 0..1500 {
        h.now += STEP_MS;
        h.svc.tick(h.now, &mut h.hw, &mut h.sink);
        assert!(!h.hw.buzzer, "beeped while muted at {}ms", h.now);
    }

    let events = h.drain();
    assert!(events.contains(&AppEvent::HealthWarningRaised { heart_rate: 110 }));
    assert!(h.svc.snapshot().warning_active);
    // Telemetry reports the warning exactly as it would unmuted.
    assert!(events.iter().any(|e| matches!(
        e,
        AppEvent::Telemetry(t) if t.warning_active
    )));
}

#[test]
fn unmuting_restores_the_beep() {
    let mut h = Harness::new();
    h.press(100); // Vitals
    h.press(1100); // mute on
    h.press(1100); // mute off
    let events = h.drain();
    assert!(events.contains(&AppEvent::MuteToggled(true)));
    assert!(events.contains(&AppEvent::MuteToggled(false)));
    h.run(500);

    h.finger(110);
    let mut beeped = false;
    for _ in 0..1100 {
        h.now += STEP_MS;
        h.svc.tick(h.now, &mut h.hw, &mut h.sink);
        beeped |= h.hw.buzzer;
    }
    assert!(beeped);
}

#[test]
fn temperature_warning_respects_the_cooldown() {
    let mut h = Harness::new();
    h.hw.env = Some(EnvReading {
        humidity: 50.0,
        temperature_c: 36.0,
    });

    h.run(31_500);
    let warnings = h
        .drain()
        .iter()
        .filter(|e| matches!(e, AppEvent::TemperatureWarning { .. }))
        .count();
    // Once on the first read, once after the 30s cooldown.
    assert_eq!(warnings, 2);
}

// ───────────────────────────────────────────────────────────────
// Sensors and connectivity
// ───────────────────────────────────────────────────────────────

#[test]
fn environment_cache_survives_dropouts() {
    let mut h = Harness::new();
    h.hw.env = Some(EnvReading {
        humidity: 55.0,
        temperature_c: 24.5,
    });
    h.run(2_100);
    assert_eq!(h.svc.environment().unwrap().temperature_c, 24.5);

    // Sensor goes quiet: the cached reading is retained.
    h.hw.env = None;
    h.run(6_000);
    assert_eq!(h.svc.environment().unwrap().temperature_c, 24.5);

    h.hw.env = Some(EnvReading {
        humidity: 52.0,
        temperature_c: 26.0,
    });
    h.run(2_100);
    assert_eq!(h.svc.environment().unwrap().temperature_c, 26.0);
}

#[test]
fn telemetry_flows_only_while_online() {
    let mut h = Harness::new();
    h.run(10_000);
    assert!(
        !h.drain()
            .iter()
            .any(|e| matches!(e, AppEvent::Telemetry(_)))
    );

    h.svc.set_connectivity(true, &mut h.sink);
    h.run(6_100);
    let events = h.drain();
    assert!(events.contains(&AppEvent::ConnectivityChanged(true)));
    let count = events
        .iter()
        .filter(|e| matches!(e, AppEvent::Telemetry(_)))
        .count();
    // Immediate publish on reconnect, then the 3s cadence.
    assert_eq!(count, 3);

    h.svc.set_connectivity(false, &mut h.sink);
    h.drain();
    h.run(10_000);
    assert!(
        !h.drain()
            .iter()
            .any(|e| matches!(e, AppEvent::Telemetry(_)))
    );
}

// ───────────────────────────────────────────────────────────────
// Command rejection
// ───────────────────────────────────────────────────────────────

#[test]
fn invalid_commands_are_rejected_without_state_change() {
    let mut h = Harness::new();
    let before = h.svc.snapshot();

    h.cmd(AppCommand::SelectMode(7));
    h.cmd(AppCommand::SetAlarmHour(24));
    h.cmd(AppCommand::SetAlarmMinute(60));

    let rejections = h
        .drain()
        .iter()
        .filter(|e| matches!(e, AppEvent::CommandRejected(_)))
        .count();
    assert_eq!(rejections, 3);

    let after = h.svc.snapshot();
    assert_eq!(after.mode, before.mode);
    assert_eq!(after.alarm, before.alarm);
    // Nothing was persisted either.
    assert!(h.store.load().is_err());
}
