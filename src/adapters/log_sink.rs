//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (UART / USB-CDC in production, stderr on the
//! host). A future MQTT adapter would implement the same trait.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started => info!("START | coordinator up"),
            AppEvent::Telemetry(t) => {
                info!(
                    "TELEM | {:02}:{:02}:{:02} | T={} | H={} | HR={} | mode={} | ringing={} warn={}",
                    t.time.hour,
                    t.time.minute,
                    t.time.second,
                    t.temperature_c
                        .map_or("--".into(), |v| format!("{v:.1}C")),
                    t.humidity.map_or("--".into(), |v| format!("{v:.0}%")),
                    t.heart_rate,
                    t.mode.name(),
                    t.alarm_ringing,
                    t.warning_active,
                );
            }
            AppEvent::ModeChanged { mode, auto } => {
                info!(
                    "MODE  | {} ({})",
                    mode.name(),
                    if *auto { "auto" } else { "manual" }
                );
            }
            AppEvent::AlarmTriggered { hour, minute } => {
                info!("ALARM | triggered at {hour:02}:{minute:02}");
            }
            AppEvent::AlarmStopped { reason } => {
                info!("ALARM | stopped by {}", reason.label());
            }
            AppEvent::AlarmConfigChanged(cfg) => {
                info!(
                    "ALARM | config {:02}:{:02} {}",
                    cfg.hour,
                    cfg.minute,
                    if cfg.enabled { "on" } else { "off" }
                );
            }
            AppEvent::HealthWarningRaised { heart_rate } => {
                warn!("HEALTH| warning raised at {heart_rate} BPM");
            }
            AppEvent::HealthWarningCleared { heart_rate } => {
                info!("HEALTH| warning cleared at {heart_rate} BPM");
            }
            AppEvent::TemperatureWarning { temperature_c } => {
                warn!("HEALTH| high temperature {temperature_c:.1}C");
            }
            AppEvent::MuteToggled(muted) => {
                info!("MUTE  | {}", if *muted { "on" } else { "off" });
            }
            AppEvent::CommandRejected(err) => {
                warn!("CMD   | rejected: {err}");
            }
            AppEvent::ConnectivityChanged(online) => {
                info!("LINK  | {}", if *online { "online" } else { "offline" });
            }
        }
    }
}
