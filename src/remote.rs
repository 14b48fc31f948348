//! Remote channel codec: JSON commands in, JSON status out.
//!
//! The wire format is deliberately small. Inbound payloads are a tagged
//! object (`{"cmd":"set_alarm_hour","hour":7}`) decoded into an
//! [`AppCommand`]; anything unparseable maps to
//! [`CommandError::Malformed`] and is dropped without touching state.
//! Outbound, [`StatusReport`] mirrors the telemetry snapshot plus the
//! human-readable status line shown on the companion dashboard.

use serde::{Deserialize, Serialize};

use crate::app::commands::AppCommand;
use crate::app::events::TelemetryData;
use crate::app::service::StateSnapshot;
use crate::error::CommandError;

#[derive(Debug, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
enum WireCommand {
    SetAlarmHour { hour: u8 },
    SetAlarmMinute { minute: u8 },
    SetAlarmEnabled { enabled: bool },
    AcknowledgeAlarm,
    SetAutoMode { enabled: bool },
    SelectMode { mode: u8 },
    AdvanceMode,
}

/// Decode one inbound payload. Range validation happens in the service;
/// this layer only rejects payloads it cannot shape into a command.
pub fn parse_command(payload: &str) -> Result<AppCommand, CommandError> {
    let wire: WireCommand = serde_json::from_str(payload).map_err(|_| CommandError::Malformed)?;
    Ok(match wire {
        WireCommand::SetAlarmHour { hour } => AppCommand::SetAlarmHour(hour),
        WireCommand::SetAlarmMinute { minute } => AppCommand::SetAlarmMinute(minute),
        WireCommand::SetAlarmEnabled { enabled } => AppCommand::SetAlarmEnabled(enabled),
        WireCommand::AcknowledgeAlarm => AppCommand::AcknowledgeAlarm,
        WireCommand::SetAutoMode { enabled } => AppCommand::SetAutoRotate(enabled),
        WireCommand::SelectMode { mode } => AppCommand::SelectMode(mode),
        WireCommand::AdvanceMode => AppCommand::AdvanceMode,
    })
}

/// Outbound status payload published on the telemetry cadence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusReport {
    /// "HH:MM:SS"
    pub time: String,
    /// "DD/MM/YYYY"
    pub date: String,
    pub temperature_c: Option<f32>,
    pub humidity: Option<f32>,
    /// 0 when no finger is on the sensor.
    pub heart_rate: u16,
    pub status: String,
}

/// The dashboard status line.
pub fn status_line(snap: &StateSnapshot) -> String {
    if snap.alarm_ringing {
        return String::from("ALARM RINGING!");
    }
    let alarm = if snap.alarm.enabled {
        format!("Alarm: {:02}:{:02}", snap.alarm.hour, snap.alarm.minute)
    } else {
        String::from("Alarm: off")
    };
    let rotation = if snap.auto_rotate { "Auto" } else { "Manual" };
    format!("{alarm} | {} ({rotation})", snap.mode.name())
}

/// Assemble the publishable report from a snapshot and the matching
/// telemetry data.
pub fn status_report(snap: &StateSnapshot, telemetry: &TelemetryData) -> StatusReport {
    StatusReport {
        time: format!(
            "{:02}:{:02}:{:02}",
            telemetry.time.hour, telemetry.time.minute, telemetry.time.second
        ),
        date: format!(
            "{:02}/{:02}/{:04}",
            telemetry.date.day, telemetry.date.month, telemetry.date.year
        ),
        temperature_c: telemetry.temperature_c,
        humidity: telemetry.humidity,
        heart_rate: telemetry.heart_rate,
        status: status_line(snap),
    }
}

/// Serialise a report for publication.
pub fn encode_report(report: &StatusReport) -> Result<String, serde_json::Error> {
    serde_json::to_string(report)
}
