//! The application service: one tick of coordinator logic.
//!
//! Everything the appliance does funnels through [`AppService::tick`],
//! which evaluates the collaborators in a fixed order each pass:
//!
//! 1. sample sensors (environment on its own cadence, pulse every tick)
//! 2. classify the raw button level
//! 3. alarm trigger / timeout / disable
//! 4. health policies (heart-rate dwell, temperature cooldown)
//! 5. apply the classified press, acknowledgement taking precedence
//! 6. display auto-rotation
//! 7. drive the buzzer line from the audio arbiter
//! 8. notice expiry and telemetry
//!
//! The order is load-bearing: a press that lands on the same tick as a
//! trigger acknowledges the alarm instead of switching modes, and the
//! buzzer level always reflects every arbitration decision made earlier
//! in the same pass.

use log::{info, warn};

use crate::alarm::{AlarmScheduler, AlarmSignal, StopReason};
use crate::audio::{
    AudioArbiter, Priority, ALARM_RING, ENV_BEEP, HEALTH_BEEP, MODE_CHIRP, MUTE_OFF_FEEDBACK,
    MUTE_ON_FEEDBACK, STARTUP_CHIRP,
};
use crate::config::SystemConfig;
use crate::error::{Error, StoreError};
use crate::health::{HealthMonitor, VitalsInput};
use crate::input::{InputClassifier, PressKind};
use crate::mode::{DisplayMode, ModeCoordinator};
use crate::presentation::{Notice, NoticeKind};
use crate::sensors::{EnvironmentCache, PulseReading};

use super::commands::AppCommand;
use super::events::{AppEvent, TelemetryData};
use super::ports::{AlarmStorePort, BuzzerPort, ClockPort, EventSink, SensorPort};

/// Read-only view of the coordinator state, consumed by the renderer
/// and the remote status report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateSnapshot {
    pub mode: DisplayMode,
    pub auto_rotate: bool,
    pub alarm: crate::alarm::AlarmConfig,
    pub alarm_ringing: bool,
    pub muted: bool,
    pub online: bool,
    /// Heart rate is in the danger band right now (pre-dwell).
    pub warning_band: bool,
    /// A heart-rate warning is active (dwell satisfied, not yet cleared).
    pub warning_active: bool,
    pub notice: Option<Notice>,
}

/// Owns every collaborator and runs the per-tick evaluation order.
pub struct AppService {
    config: SystemConfig,
    input: InputClassifier,
    modes: ModeCoordinator,
    alarm: AlarmScheduler,
    health: HealthMonitor,
    audio: AudioArbiter,
    env_cache: EnvironmentCache,

    muted: bool,
    online: bool,
    needs_refresh: bool,
    notice: Option<Notice>,
    last_pulse: PulseReading,
    last_env_read_ms: Option<u64>,
    last_telemetry_ms: Option<u64>,
}

impl AppService {
    /// Build the service, loading the persisted alarm from `store`.
    ///
    /// A missing blob is the normal first-boot case; anything else the
    /// store reports is logged and replaced by defaults. Boot never
    /// fails on account of the alarm store.
    pub fn boot<S: AlarmStorePort>(config: SystemConfig, store: &S) -> Self {
        let alarm_config = match store.load() {
            Ok(loaded) => loaded.sanitized(),
            Err(StoreError::NotFound) => {
                info!("no stored alarm, using defaults");
                crate::alarm::AlarmConfig::default()
            }
            Err(err) => {
                warn!("alarm store load failed ({err}), using defaults");
                crate::alarm::AlarmConfig::default()
            }
        };

        Self {
            input: InputClassifier::new(config.debounce_ms, config.long_press_ms),
            modes: ModeCoordinator::new(config.mode_interval_ms),
            alarm: AlarmScheduler::new(alarm_config, config.alarm_timeout_ms),
            health: HealthMonitor::new(&config),
            audio: AudioArbiter::new(),
            env_cache: EnvironmentCache::new(),
            config,
            muted: false,
            online: false,
            needs_refresh: true,
            notice: None,
            last_pulse: PulseReading::default(),
            last_env_read_ms: None,
            last_telemetry_ms: None,
        }
    }

    /// Announce startup: one event, one greeting chirp.
    pub fn start(&mut self, now_ms: u64, sink: &mut impl EventSink) {
        info!("coordinator starting");
        sink.emit(&AppEvent::Started);
        self.audio.request(Priority::MuteFeedback, STARTUP_CHIRP, now_ms);
        self.needs_refresh = true;
    }

    // ───────────────────────────────────────────────────────────────
    // The tick
    // ───────────────────────────────────────────────────────────────

    /// Run one pass of the evaluation order and drive the buzzer line.
    pub fn tick<H>(&mut self, now_ms: u64, hw: &mut H, sink: &mut impl EventSink)
    where
        H: ClockPort + SensorPort + BuzzerPort,
    {
        // 1. Sensors. Environment reads are rate-limited; the cache
        //    retains the last good reading across failed attempts.
        let env_due = self
            .last_env_read_ms
            .is_none_or(|last| now_ms.saturating_sub(last) >= self.config.sensor_read_interval_ms);
        if env_due {
            self.last_env_read_ms = Some(now_ms);
            self.env_cache.update(hw.read_environment());
        }
        self.last_pulse = hw.read_pulse();

        // 2. Input classification from the raw level.
        let press = self.input.sample(hw.button_pressed(), now_ms);

        // 3. Alarm lifecycle.
        let tod = hw.time_of_day();
        match self.alarm.tick(now_ms, tod) {
            Some(AlarmSignal::Triggered) => {
                let cfg = self.alarm.config();
                self.audio.request(Priority::Alarm, ALARM_RING, now_ms);
                sink.emit(&AppEvent::AlarmTriggered {
                    hour: cfg.hour,
                    minute: cfg.minute,
                });
                self.needs_refresh = true;
            }
            Some(AlarmSignal::Stopped(reason)) => {
                self.stop_ring_feedback(reason, now_ms, sink);
            }
            None => {}
        }
        // The ring pattern repeats until cancelled, but a higher level
        // restart is harmless if something ever left the line idle.
        if self.alarm.is_ringing() && self.audio.is_idle() {
            self.audio.request(Priority::Alarm, ALARM_RING, now_ms);
        }

        // 4. Health policies. Warning state is mute-independent; mute
        //    only gates the repeating heart-rate beep.
        let vitals = VitalsInput {
            presence: self.last_pulse.presence,
            heart_rate: self.last_pulse.heart_rate,
        };
        let temp = self.env_cache.current().map(|e| e.temperature_c);
        let health = self.health.tick(now_ms, vitals, temp);

        if let Some(bpm) = health.vital_raised {
            sink.emit(&AppEvent::HealthWarningRaised { heart_rate: bpm });
            self.post_notice(NoticeKind::HealthDanger(bpm), now_ms);
        }
        if let Some(bpm) = health.vital_cleared {
            sink.emit(&AppEvent::HealthWarningCleared { heart_rate: bpm });
            self.post_notice(NoticeKind::HealthNormal(bpm), now_ms);
        }
        if health.beep_due && !self.muted {
            self.audio.request(Priority::HealthWarning, HEALTH_BEEP, now_ms);
        }
        if let Some(temp) = health.env_raised {
            sink.emit(&AppEvent::TemperatureWarning { temperature_c: temp });
            self.audio.request(Priority::HealthWarning, ENV_BEEP, now_ms);
            self.post_notice(NoticeKind::HighTemp(temp), now_ms);
        }

        // 5. Apply the classified press. Acknowledgement wins over any
        //    other press meaning while the alarm rings.
        if let Some(press) = press {
            if self.alarm.is_ringing() {
                self.alarm.acknowledge(StopReason::Button);
                self.stop_ring_feedback(StopReason::Button, now_ms, sink);
            } else {
                match press.kind {
                    PressKind::Short => {
                        let mode = self.modes.advance_manual();
                        self.audio.request(Priority::ModeChirp, MODE_CHIRP, now_ms);
                        sink.emit(&AppEvent::ModeChanged { mode, auto: false });
                        self.post_notice(NoticeKind::ModeChanged(mode), now_ms);
                        self.republish_status();
                    }
                    PressKind::Long => {
                        if self.modes.mode() == DisplayMode::Vitals {
                            self.muted = !self.muted;
                            let pattern = if self.muted {
                                MUTE_ON_FEEDBACK
                            } else {
                                MUTE_OFF_FEEDBACK
                            };
                            self.audio.request(Priority::MuteFeedback, pattern, now_ms);
                            sink.emit(&AppEvent::MuteToggled(self.muted));
                            self.post_notice(NoticeKind::MuteToggled(self.muted), now_ms);
                        } else {
                            self.post_notice(NoticeKind::LongPressHint, now_ms);
                        }
                    }
                }
            }
        }

        // 6. Display auto-rotation.
        if let Some(mode) = self.modes.tick(now_ms) {
            sink.emit(&AppEvent::ModeChanged { mode, auto: true });
            self.needs_refresh = true;
            self.republish_status();
        }

        // 7. Buzzer line.
        hw.set(self.audio.tick(now_ms));

        // 8. Notice expiry, then telemetry.
        if self.notice.is_some_and(|n| now_ms >= n.until_ms) {
            self.notice = None;
            self.needs_refresh = true;
        }
        self.maybe_publish_telemetry(now_ms, hw, sink);
    }

    /// Silence and announce a ring that just ended.
    fn stop_ring_feedback(&mut self, reason: StopReason, now_ms: u64, sink: &mut impl EventSink) {
        self.audio.cancel(Priority::Alarm);
        sink.emit(&AppEvent::AlarmStopped { reason });
        self.post_notice(NoticeKind::AlarmStopped(reason), now_ms);
    }

    /// Mode changes re-publish the remote status as soon as the link is
    /// up, instead of waiting out the telemetry cadence.
    fn republish_status(&mut self) {
        if self.online {
            self.last_telemetry_ms = None;
        }
    }

    fn post_notice(&mut self, kind: NoticeKind, now_ms: u64) {
        self.notice = Some(Notice {
            kind,
            until_ms: now_ms + kind.duration_ms(),
        });
        self.needs_refresh = true;
    }

    fn maybe_publish_telemetry<H: ClockPort>(
        &mut self,
        now_ms: u64,
        hw: &mut H,
        sink: &mut impl EventSink,
    ) {
        if !self.online {
            return;
        }
        let due = self
            .last_telemetry_ms
            .is_none_or(|last| now_ms.saturating_sub(last) >= self.config.telemetry_interval_ms);
        if !due {
            return;
        }
        self.last_telemetry_ms = Some(now_ms);
        let env = self.env_cache.current();
        sink.emit(&AppEvent::Telemetry(TelemetryData {
            time: hw.time_of_day(),
            date: hw.date(),
            temperature_c: env.map(|e| e.temperature_c),
            humidity: env.map(|e| e.humidity),
            heart_rate: self.last_pulse.heart_rate,
            mode: self.modes.mode(),
            alarm_ringing: self.alarm.is_ringing(),
            warning_active: self.health.warning_active(),
        }));
    }

    // ───────────────────────────────────────────────────────────────
    // Inbound commands
    // ───────────────────────────────────────────────────────────────

    /// Apply one external command. Rejections leave state untouched and
    /// surface as [`AppEvent::CommandRejected`]; accepted alarm
    /// mutations persist immediately.
    pub fn handle_command<S: AlarmStorePort>(
        &mut self,
        cmd: AppCommand,
        now_ms: u64,
        store: &mut S,
        sink: &mut impl EventSink,
    ) {
        match cmd {
            AppCommand::SetAlarmHour(hour) => match self.alarm.set_hour(hour) {
                Ok(()) => self.persist_alarm(store, sink),
                Err(err) => self.reject(err, sink),
            },
            AppCommand::SetAlarmMinute(minute) => match self.alarm.set_minute(minute) {
                Ok(()) => self.persist_alarm(store, sink),
                Err(err) => self.reject(err, sink),
            },
            AppCommand::SetAlarmEnabled(enabled) => {
                self.alarm.set_enabled(enabled);
                self.persist_alarm(store, sink);
            }
            AppCommand::AcknowledgeAlarm => {
                // No-op when nothing is ringing.
                if self.alarm.acknowledge(StopReason::Remote) {
                    self.stop_ring_feedback(StopReason::Remote, now_ms, sink);
                }
            }
            AppCommand::SetAutoRotate(enabled) => {
                self.modes.set_auto(enabled, now_ms);
                sink.emit(&AppEvent::ModeChanged {
                    mode: self.modes.mode(),
                    auto: enabled,
                });
                self.republish_status();
            }
            AppCommand::SelectMode(idx) => match self.modes.select_manual(idx) {
                Ok(mode) => {
                    sink.emit(&AppEvent::ModeChanged { mode, auto: false });
                    self.post_notice(NoticeKind::ModeChanged(mode), now_ms);
                    self.republish_status();
                }
                Err(err) => self.reject(err, sink),
            },
            AppCommand::AdvanceMode => {
                let mode = self.modes.advance_manual();
                sink.emit(&AppEvent::ModeChanged { mode, auto: false });
                self.post_notice(NoticeKind::ModeChanged(mode), now_ms);
                self.republish_status();
            }
        }
    }

    fn persist_alarm<S: AlarmStorePort>(&mut self, store: &mut S, sink: &mut impl EventSink) {
        let cfg = self.alarm.config();
        if let Err(err) = store.save(&cfg) {
            // The live scheduler already holds the new value; losing the
            // persisted copy only matters across a reboot.
            warn!("alarm save failed: {err}");
        }
        sink.emit(&AppEvent::AlarmConfigChanged(cfg));
        self.needs_refresh = true;
    }

    fn reject(&mut self, err: Error, sink: &mut impl EventSink) {
        warn!("command rejected: {err}");
        if let Error::Command(cmd_err) = err {
            sink.emit(&AppEvent::CommandRejected(cmd_err));
        }
    }

    // ───────────────────────────────────────────────────────────────
    // State access
    // ───────────────────────────────────────────────────────────────

    /// Remote channel availability. Going online schedules an immediate
    /// telemetry publish.
    pub fn set_connectivity(&mut self, online: bool, sink: &mut impl EventSink) {
        if self.online == online {
            return;
        }
        self.online = online;
        info!("connectivity {}", if online { "up" } else { "down" });
        sink.emit(&AppEvent::ConnectivityChanged(online));
        self.last_telemetry_ms = None;
        self.needs_refresh = true;
    }

    pub fn snapshot(&self) -> StateSnapshot {
        let hr = self.last_pulse.heart_rate;
        let warning_band = self.last_pulse.presence
            && hr > 0
            && (hr <= self.config.hr_low_bpm || hr >= self.config.hr_high_bpm);
        StateSnapshot {
            mode: self.modes.mode(),
            auto_rotate: self.modes.is_auto(),
            alarm: self.alarm.config(),
            alarm_ringing: self.alarm.is_ringing(),
            muted: self.muted,
            online: self.online,
            warning_band,
            warning_active: self.health.warning_active(),
            notice: self.notice,
        }
    }

    /// Last pulse reading seen by the tick, for the renderer.
    pub fn last_pulse(&self) -> PulseReading {
        self.last_pulse
    }

    /// Cached environment reading, for the renderer.
    pub fn environment(&self) -> Option<crate::sensors::EnvReading> {
        self.env_cache.current()
    }

    /// Take the pending redraw request, clearing it.
    pub fn take_refresh(&mut self) -> bool {
        core::mem::take(&mut self.needs_refresh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alarm::AlarmConfig;

    struct MemStore {
        stored: Result<AlarmConfig, StoreError>,
    }

    impl AlarmStorePort for MemStore {
        fn load(&self) -> Result<AlarmConfig, StoreError> {
            self.stored
        }
        fn save(&mut self, config: &AlarmConfig) -> Result<(), StoreError> {
            self.stored = Ok(*config);
            Ok(())
        }
    }

    #[test]
    fn boot_uses_defaults_when_store_empty() {
        let store = MemStore {
            stored: Err(StoreError::NotFound),
        };
        let svc = AppService::boot(SystemConfig::default(), &store);
        assert_eq!(svc.snapshot().alarm, AlarmConfig::default());
    }

    #[test]
    fn boot_sanitizes_corrupt_store() {
        let store = MemStore {
            stored: Ok(AlarmConfig {
                hour: 99,
                minute: 75,
                enabled: true,
            }),
        };
        let svc = AppService::boot(SystemConfig::default(), &store);
        let alarm = svc.snapshot().alarm;
        assert_eq!(alarm.hour, 7);
        assert_eq!(alarm.minute, 0);
        assert!(alarm.enabled);
    }

    #[test]
    fn boot_survives_store_io_error() {
        let store = MemStore {
            stored: Err(StoreError::IoError),
        };
        let svc = AppService::boot(SystemConfig::default(), &store);
        assert_eq!(svc.snapshot().alarm, AlarmConfig::default());
    }
}
