//! Alarm scheduling: persisted configuration, edge-armed trigger,
//! ringing lifecycle with acknowledgement and timeout.
//!
//! The trigger is armed on the second boundary: it fires once when the
//! clock first reads `hh:mm:00` for the configured time, and cannot fire
//! again until the clock has left that instant — sub-second ticks during
//! the matching second are harmless, and the next fire needs the next
//! matching minute.

use log::{info, warn};
use serde::{Deserialize, Serialize};

/// Wall-clock time of day as reported by the clock peripheral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimeOfDay {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

/// Calendar date as reported by the clock peripheral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Date {
    pub day: u8,
    pub month: u8,
    pub year: u16,
}

// ---------------------------------------------------------------------------
// Persisted configuration
// ---------------------------------------------------------------------------

/// The single persisted alarm. Saved on every mutation, reloaded at boot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmConfig {
    pub hour: u8,
    pub minute: u8,
    pub enabled: bool,
}

impl Default for AlarmConfig {
    fn default() -> Self {
        Self {
            hour: 7,
            minute: 0,
            enabled: false,
        }
    }
}

impl AlarmConfig {
    /// Clamp out-of-range persisted fields to the safe defaults.
    /// Store corruption is corrected here, never propagated as fatal.
    pub fn sanitized(mut self) -> Self {
        if self.hour > 23 {
            warn!("stored alarm hour {} out of range, reset to 7", self.hour);
            self.hour = 7;
        }
        if self.minute > 59 {
            warn!(
                "stored alarm minute {} out of range, reset to 0",
                self.minute
            );
            self.minute = 0;
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Ringing lifecycle
// ---------------------------------------------------------------------------

/// Why a ringing alarm returned to idle. The label feeds telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Local button press while ringing.
    Button,
    /// Remote acknowledge command.
    Remote,
    /// Rang for the full timeout without acknowledgement.
    Timeout,
    /// `enabled` was cleared while ringing.
    Disabled,
}

impl StopReason {
    pub fn label(self) -> &'static str {
        match self {
            Self::Button => "button",
            Self::Remote => "remote",
            Self::Timeout => "timeout",
            Self::Disabled => "disabled",
        }
    }
}

/// Signal returned from [`AlarmScheduler::tick`] when the state changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmSignal {
    Triggered,
    Stopped(StopReason),
}

/// Owns the alarm configuration and the Idle ↔ Ringing state machine.
pub struct AlarmScheduler {
    config: AlarmConfig,
    timeout_ms: u64,
    ringing: bool,
    started_at_ms: u64,
    /// Cleared after a fire; re-set once the clock leaves `hh:mm:00`.
    armed: bool,
}

impl AlarmScheduler {
    pub fn new(config: AlarmConfig, timeout_ms: u64) -> Self {
        Self {
            config,
            timeout_ms,
            ringing: false,
            started_at_ms: 0,
            armed: true,
        }
    }

    /// Evaluate trigger, disable and timeout conditions for this tick.
    pub fn tick(&mut self, now_ms: u64, tod: TimeOfDay) -> Option<AlarmSignal> {
        if !self.config.enabled {
            if self.ringing {
                self.ringing = false;
                info!("alarm stopped: disabled externally");
                return Some(AlarmSignal::Stopped(StopReason::Disabled));
            }
            return None;
        }

        let at_match = tod.hour == self.config.hour
            && tod.minute == self.config.minute
            && tod.second == 0;

        if !at_match {
            self.armed = true;
        } else if self.armed && !self.ringing {
            self.armed = false;
            self.ringing = true;
            self.started_at_ms = now_ms;
            info!(
                "alarm triggered at {:02}:{:02}",
                self.config.hour, self.config.minute
            );
            return Some(AlarmSignal::Triggered);
        }

        if self.ringing && now_ms.saturating_sub(self.started_at_ms) > self.timeout_ms {
            self.ringing = false;
            info!("alarm stopped: ring timeout");
            return Some(AlarmSignal::Stopped(StopReason::Timeout));
        }

        None
    }

    /// Acknowledge a ringing alarm. Returns `true` if it was ringing.
    pub fn acknowledge(&mut self, source: StopReason) -> bool {
        if !self.ringing {
            return false;
        }
        self.ringing = false;
        info!("alarm stopped by {}", source.label());
        true
    }

    // -- Config mutation (allowed at any time, including while ringing) --

    pub fn set_hour(&mut self, hour: u8) -> crate::error::Result<()> {
        if hour > 23 {
            return Err(crate::error::CommandError::InvalidHour(hour).into());
        }
        self.config.hour = hour;
        info!("alarm hour set to {hour:02}");
        Ok(())
    }

    pub fn set_minute(&mut self, minute: u8) -> crate::error::Result<()> {
        if minute > 59 {
            return Err(crate::error::CommandError::InvalidMinute(minute).into());
        }
        self.config.minute = minute;
        info!("alarm minute set to {minute:02}");
        Ok(())
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.config.enabled = enabled;
        info!("alarm {}", if enabled { "enabled" } else { "disabled" });
    }

    pub fn config(&self) -> AlarmConfig {
        self.config
    }

    pub fn is_ringing(&self) -> bool {
        self.ringing
    }
}
