//! Display-mode selection: auto-rotation with manual-override precedence.
//!
//! Three screens rotate on a fixed interval while `auto` is set. Any
//! manual selection — local short press or remote command — pins the
//! chosen mode and stops rotation until auto is explicitly re-enabled.

use log::info;

use crate::error::{CommandError, Result};

/// The three display screens, in rotation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DisplayMode {
    /// Clock row plus temperature / humidity.
    TimeAndEnvironment = 0,
    /// Pulse sensor screen (BPM, presence, mute marker).
    Vitals = 1,
    /// Date plus combined environment and pulse summary.
    FullInfo = 2,
}

impl DisplayMode {
    pub const COUNT: u8 = 3;

    /// Human-readable screen name, as published in status lines.
    pub fn name(self) -> &'static str {
        match self {
            Self::TimeAndEnvironment => "Time+Temp",
            Self::Vitals => "Heart Rate",
            Self::FullInfo => "Full Info",
        }
    }

    /// Next mode in cyclic order.
    pub fn next(self) -> Self {
        Self::from_index((self as u8 + 1) % Self::COUNT).unwrap_or(Self::TimeAndEnvironment)
    }

    /// Convert a raw index; `None` outside 0–2.
    pub fn from_index(idx: u8) -> Option<Self> {
        match idx {
            0 => Some(Self::TimeAndEnvironment),
            1 => Some(Self::Vitals),
            2 => Some(Self::FullInfo),
            _ => None,
        }
    }
}

/// Owns the active mode and the rotation policy.
pub struct ModeCoordinator {
    mode: DisplayMode,
    auto: bool,
    last_switch_ms: u64,
    interval_ms: u64,
}

impl ModeCoordinator {
    pub fn new(interval_ms: u64) -> Self {
        Self {
            mode: DisplayMode::TimeAndEnvironment,
            auto: true,
            last_switch_ms: 0,
            interval_ms,
        }
    }

    /// Advance the rotation if due. Returns the new mode on a switch.
    pub fn tick(&mut self, now_ms: u64) -> Option<DisplayMode> {
        if !self.auto || now_ms.saturating_sub(self.last_switch_ms) < self.interval_ms {
            return None;
        }
        self.last_switch_ms = now_ms;
        self.mode = self.mode.next();
        info!("auto-rotated to {}", self.mode.name());
        Some(self.mode)
    }

    /// Pin a specific mode. Rejects indices outside 0–2, leaving state
    /// unchanged. Any accepted selection disables auto-rotation.
    pub fn select_manual(&mut self, idx: u8) -> Result<DisplayMode> {
        let mode = DisplayMode::from_index(idx).ok_or(CommandError::InvalidMode(idx))?;
        self.mode = mode;
        self.auto = false;
        info!("manual select: {}", mode.name());
        Ok(mode)
    }

    /// Cyclic advance, equivalent to a short press. Disables auto-rotation.
    pub fn advance_manual(&mut self) -> DisplayMode {
        self.mode = self.mode.next();
        self.auto = false;
        info!("manual advance: {}", self.mode.name());
        self.mode
    }

    /// Enable or disable auto-rotation. Enabling re-arms the interval so
    /// the next rotation is a full period away, not immediate.
    pub fn set_auto(&mut self, enabled: bool, now_ms: u64) {
        self.auto = enabled;
        if enabled {
            self.last_switch_ms = now_ms;
        }
        info!("auto rotation {}", if enabled { "enabled" } else { "disabled" });
    }

    pub fn mode(&self) -> DisplayMode {
        self.mode
    }

    pub fn is_auto(&self) -> bool {
        self.auto
    }
}
