//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through
//! the [`EventSink`](super::ports::EventSink) port. Adapters on the
//! other side decide what to do with them — write to the serial log,
//! publish over the remote channel, or both. When connectivity is down
//! the remote adapter simply drops them; the core never knows.

use crate::alarm::{AlarmConfig, Date, StopReason, TimeOfDay};
use crate::error::CommandError;
use crate::mode::DisplayMode;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppEvent {
    /// The coordinator has started.
    Started,

    /// Periodic telemetry snapshot (only while online).
    Telemetry(TelemetryData),

    /// The active display mode changed (auto rotation or manual).
    ModeChanged { mode: DisplayMode, auto: bool },

    /// The alarm began ringing.
    AlarmTriggered { hour: u8, minute: u8 },

    /// The alarm stopped ringing, with the cause.
    AlarmStopped { reason: StopReason },

    /// The persisted alarm configuration was mutated.
    AlarmConfigChanged(AlarmConfig),

    /// Heart rate stayed in the danger band long enough to warn.
    HealthWarningRaised { heart_rate: u16 },

    /// A previously active heart-rate warning cleared.
    HealthWarningCleared { heart_rate: u16 },

    /// Temperature exceeded the warning threshold (cooldown permitting).
    TemperatureWarning { temperature_c: f32 },

    /// The mute flag was toggled by a long press.
    MuteToggled(bool),

    /// An inbound command was rejected; state is unchanged.
    CommandRejected(CommandError),

    /// The remote channel went online or offline.
    ConnectivityChanged(bool),
}

/// A point-in-time telemetry snapshot suitable for remote publication.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetryData {
    pub time: TimeOfDay,
    pub date: Date,
    /// Cached last-good temperature; `None` before the first good read.
    pub temperature_c: Option<f32>,
    pub humidity: Option<f32>,
    /// Heart rate; 0 when no finger is detected.
    pub heart_rate: u16,
    pub mode: DisplayMode,
    pub alarm_ringing: bool,
    pub warning_active: bool,
}
