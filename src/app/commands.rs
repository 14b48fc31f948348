//! Inbound commands to the application service.
//!
//! These represent actions requested by the outside world (remote
//! channel, serial console, tests) that the
//! [`AppService`](super::service::AppService) interprets and acts upon.
//! Local button presses do not arrive here — they are classified from
//! the raw level inside the tick — but both paths fold into the same
//! per-tick evaluation order.

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppCommand {
    /// Set the alarm hour (0–23).
    SetAlarmHour(u8),

    /// Set the alarm minute (0–59).
    SetAlarmMinute(u8),

    /// Enable or disable the alarm.
    SetAlarmEnabled(bool),

    /// Silence a ringing alarm.
    AcknowledgeAlarm,

    /// Enable or disable display auto-rotation.
    SetAutoRotate(bool),

    /// Pin a specific display mode (0–2).
    SelectMode(u8),

    /// Advance to the next display mode.
    AdvanceMode,
}
