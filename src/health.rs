//! Health monitoring: heart-rate dwell hysteresis and the
//! cooldown-gated temperature warning.
//!
//! The two policies are deliberately different and are kept separate:
//! the heart-rate band requires 10 s of continuous dwell before a
//! warning raises and carries an active/cleared lifecycle, while the
//! temperature check is level-triggered with a 30 s cooldown and no
//! persistent state. Mute suppression of the repeating beep happens in
//! the service layer — the warning state and telemetry here are
//! identical muted or not.

use log::{info, warn};

use crate::config::SystemConfig;

/// Heart-rate reading for one tick, as delivered by the pulse collaborator.
#[derive(Debug, Clone, Copy, Default)]
pub struct VitalsInput {
    /// Finger/sensor presence (debounced by the collaborator).
    pub presence: bool,
    /// Rolling-average heart rate; 0 while the average is not yet valid.
    pub heart_rate: u16,
}

/// What the monitor decided this tick. Consumed by the service, which
/// routes raises/clears to the event sink and beeps to the arbiter.
#[derive(Debug, Clone, Copy, Default)]
pub struct HealthOutput {
    /// A heart-rate warning raised this tick (carries the BPM).
    pub vital_raised: Option<u16>,
    /// An active heart-rate warning cleared this tick (carries the last BPM).
    pub vital_cleared: Option<u16>,
    /// A temperature warning raised this tick (carries the °C reading).
    pub env_raised: Option<f32>,
    /// The repeating warning beep is due this tick.
    pub beep_due: bool,
}

/// Tracks danger-band dwell and the environmental cooldown.
pub struct HealthMonitor {
    hr_low: u16,
    hr_high: u16,
    dwell_ms: u64,
    beep_interval_ms: u64,
    temp_high_c: f32,
    temp_cooldown_ms: u64,

    in_danger_zone: bool,
    entered_at_ms: u64,
    warning_active: bool,
    last_beep_ms: u64,
    last_temp_warning_ms: Option<u64>,
}

impl HealthMonitor {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            hr_low: config.hr_low_bpm,
            hr_high: config.hr_high_bpm,
            dwell_ms: config.hr_danger_dwell_ms,
            beep_interval_ms: config.hr_beep_interval_ms,
            temp_high_c: config.temp_high_c,
            temp_cooldown_ms: config.temp_cooldown_ms,
            in_danger_zone: false,
            entered_at_ms: 0,
            warning_active: false,
            last_beep_ms: 0,
            last_temp_warning_ms: None,
        }
    }

    /// Evaluate both policies for this tick.
    ///
    /// `temperature_c` is the cached last-good reading, or `None` before
    /// the first successful environment read.
    pub fn tick(
        &mut self,
        now_ms: u64,
        vitals: VitalsInput,
        temperature_c: Option<f32>,
    ) -> HealthOutput {
        let mut out = HealthOutput::default();

        // Absence of a valid reading forces "not in danger" for the tick,
        // which closes an open warning exactly as a normal reading would.
        let currently_in_danger = vitals.presence
            && vitals.heart_rate > 0
            && (vitals.heart_rate <= self.hr_low || vitals.heart_rate >= self.hr_high);

        if currently_in_danger {
            if !self.in_danger_zone {
                self.in_danger_zone = true;
                self.entered_at_ms = now_ms;
                info!("heart rate entered danger zone: {} BPM", vitals.heart_rate);
            }

            let dwell = now_ms.saturating_sub(self.entered_at_ms);
            if dwell >= self.dwell_ms && !self.warning_active {
                self.warning_active = true;
                self.last_beep_ms = now_ms;
                out.vital_raised = Some(vitals.heart_rate);
                out.beep_due = true;
                warn!(
                    "heart-rate warning: {} BPM held for {}s",
                    vitals.heart_rate,
                    dwell / 1000
                );
            } else if self.warning_active
                && now_ms.saturating_sub(self.last_beep_ms) >= self.beep_interval_ms
            {
                self.last_beep_ms = now_ms;
                out.beep_due = true;
            }
        } else if self.in_danger_zone {
            self.in_danger_zone = false;
            if self.warning_active {
                self.warning_active = false;
                out.vital_cleared = Some(vitals.heart_rate);
                info!("heart rate returned to normal");
            }
        }

        // Temperature: level-triggered, cooldown-gated, no dwell and no
        // active state. Distinct policy from the heart-rate band.
        if let Some(temp) = temperature_c {
            let cooled_down = self
                .last_temp_warning_ms
                .is_none_or(|last| now_ms.saturating_sub(last) > self.temp_cooldown_ms);
            if temp > self.temp_high_c && cooled_down {
                self.last_temp_warning_ms = Some(now_ms);
                out.env_raised = Some(temp);
                warn!("high temperature warning: {temp:.1}C");
            }
        }

        out
    }

    /// Whether a heart-rate warning is currently active.
    pub fn warning_active(&self) -> bool {
        self.warning_active
    }
}
