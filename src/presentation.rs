//! Pure rendering of the 16×2 character display.
//!
//! The original firmware drew to the LCD inline, with blocking delays
//! holding feedback screens on-glass. Here every screen is a pure
//! function of the state snapshot plus the collaborator readings, and
//! transient feedback is a [`Notice`] carried in the snapshot with an
//! expiry deadline — the coordinator loop re-renders it each tick until
//! it lapses. Nothing in this module talks to hardware.

use core::fmt::Write as _;

use heapless::String;

use crate::alarm::{Date, StopReason, TimeOfDay};
use crate::app::service::StateSnapshot;
use crate::mode::DisplayMode;
use crate::sensors::{EnvReading, PulseReading};

/// IR level at which the vitals screen reports sensor overload.
const IR_OVERLOAD: u32 = 200_000;

/// One rendered frame: two 16-column lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub line0: String<16>,
    pub line1: String<16>,
}

impl Frame {
    fn new() -> Self {
        Self {
            line0: String::new(),
            line1: String::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Transient notices
// ---------------------------------------------------------------------------

/// A short-lived feedback screen (mode change, mute toggle, warnings).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Notice {
    pub kind: NoticeKind,
    /// Tick time at which the notice lapses.
    pub until_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NoticeKind {
    ModeChanged(DisplayMode),
    MuteToggled(bool),
    AlarmStopped(StopReason),
    HealthDanger(u16),
    HealthNormal(u16),
    HighTemp(f32),
    /// Long press outside the vitals screen does nothing — say so.
    LongPressHint,
}

impl NoticeKind {
    /// How long the feedback screen stays up.
    pub fn duration_ms(self) -> u64 {
        match self {
            Self::ModeChanged(_) | Self::LongPressHint => 1000,
            Self::MuteToggled(_) | Self::HealthNormal(_) => 1500,
            Self::AlarmStopped(_) | Self::HealthDanger(_) | Self::HighTemp(_) => 2000,
        }
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Render the frame for this tick.
///
/// Precedence: ringing alarm > live notice > the active mode screen.
pub fn render(
    snap: &StateSnapshot,
    tod: TimeOfDay,
    date: Date,
    env: Option<EnvReading>,
    pulse: PulseReading,
    now_ms: u64,
) -> Frame {
    if snap.alarm_ringing {
        return two_lines("*** ALARM! ***", "Press button!");
    }
    if let Some(notice) = snap.notice {
        return render_notice(notice.kind);
    }
    match snap.mode {
        DisplayMode::TimeAndEnvironment => render_time_env(snap, tod, env),
        DisplayMode::Vitals => render_vitals(snap, pulse, now_ms),
        DisplayMode::FullInfo => render_full(date, env, pulse),
    }
}

fn render_time_env(snap: &StateSnapshot, tod: TimeOfDay, env: Option<EnvReading>) -> Frame {
    let mut f = Frame::new();
    if snap.alarm.enabled {
        let _ = write!(
            f.line0,
            "{:02}:{:02}:{:02} A{:02}:{:02}",
            tod.hour, tod.minute, tod.second, snap.alarm.hour, snap.alarm.minute
        );
    } else {
        let _ = write!(f.line0, "{:02}:{:02}:{:02}", tod.hour, tod.minute, tod.second);
    }
    match env {
        Some(e) => {
            let _ = write!(f.line1, "T:{:.1}C H:{}%", e.temperature_c, e.humidity as i32);
        }
        None => {
            let _ = write!(f.line1, "T:--.-C H:--%");
        }
    }
    f
}

fn render_vitals(snap: &StateSnapshot, pulse: PulseReading, now_ms: u64) -> Frame {
    let mut f = Frame::new();
    let _ = write!(f.line0, "IR:{}k", pulse.ir / 1000);
    if snap.muted {
        let _ = write!(f.line0, " [M]");
    }

    if pulse.ir >= IR_OVERLOAD {
        let _ = write!(f.line1, "BPM:OVERLOAD!");
    } else if !pulse.presence {
        let _ = write!(f.line1, "BPM:--");
    } else if pulse.heart_rate == 0 {
        let _ = write!(f.line1, "BPM:Wait...");
    } else {
        let tag = if snap.warning_band { "HIGH!" } else { "OK" };
        let _ = write!(f.line1, "BPM:{} {}", pulse.heart_rate, tag);
        // Heartbeat blink, half-second cadence.
        if (now_ms / 500) % 2 == 0 {
            let _ = write!(f.line1, " *");
        }
    }
    f
}

fn render_full(date: Date, env: Option<EnvReading>, pulse: PulseReading) -> Frame {
    let mut f = Frame::new();
    let _ = write!(f.line0, "{:02}/{:02}/{:04}", date.day, date.month, date.year);
    match env {
        Some(e) => {
            let _ = write!(
                f.line1,
                "{:.1}C {}% {}BPM",
                e.temperature_c, e.humidity as i32, pulse.heart_rate
            );
        }
        None => {
            let _ = write!(f.line1, "--.-C --% {}BPM", pulse.heart_rate);
        }
    }
    f
}

fn render_notice(kind: NoticeKind) -> Frame {
    let mut f = Frame::new();
    match kind {
        NoticeKind::ModeChanged(mode) => {
            let _ = write!(f.line0, " MODE CHANGED ");
            let _ = write!(f.line1, "{}", mode.name());
        }
        NoticeKind::MuteToggled(muted) => {
            let _ = write!(f.line0, "Alarm Warning:");
            let _ = write!(f.line1, "{}", if muted { "MUTED" } else { "UNMUTED" });
        }
        NoticeKind::AlarmStopped(reason) => {
            let _ = write!(f.line0, "Alarm Stopped");
            let _ = write!(f.line1, "by {}", reason.label());
        }
        NoticeKind::HealthDanger(bpm) => {
            let _ = write!(f.line0, "! DANGER HR !");
            let _ = write!(f.line1, "{bpm} BPM");
        }
        NoticeKind::HealthNormal(bpm) => {
            let _ = write!(f.line0, "HR: Normal");
            let _ = write!(f.line1, "Was: {bpm} BPM");
        }
        NoticeKind::HighTemp(temp) => {
            let _ = write!(f.line0, "! HIGH TEMP !");
            let _ = write!(f.line1, "{temp:.1}C");
        }
        NoticeKind::LongPressHint => {
            let _ = write!(f.line0, "Long press:");
            let _ = write!(f.line1, "Mode 2 only");
        }
    }
    f
}

fn two_lines(l0: &str, l1: &str) -> Frame {
    let mut f = Frame::new();
    let _ = f.line0.push_str(l0);
    let _ = f.line1.push_str(l1);
    f
}
