//! System configuration parameters
//!
//! All tunable parameters for the VitaClock coordinator. The defaults
//! carry the shipped timing and threshold constants; values can be
//! overridden at construction for bench testing.

use serde::{Deserialize, Serialize};

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Input ---
    /// Debounce window for the front button (milliseconds)
    pub debounce_ms: u64,
    /// Press duration at or above which a release classifies as Long (ms)
    pub long_press_ms: u64,

    // --- Display rotation ---
    /// Auto-rotation interval between display modes (milliseconds)
    pub mode_interval_ms: u64,

    // --- Alarm ---
    /// Ring duration before the alarm auto-stops (milliseconds)
    pub alarm_timeout_ms: u64,

    // --- Health thresholds ---
    /// Heart rate at or below which the reading is in the danger band (BPM)
    pub hr_low_bpm: u16,
    /// Heart rate at or above which the reading is in the danger band (BPM)
    pub hr_high_bpm: u16,
    /// Continuous dwell inside the danger band before a warning raises (ms)
    pub hr_danger_dwell_ms: u64,
    /// Cadence of the repeating beep while a heart-rate warning is active (ms)
    pub hr_beep_interval_ms: u64,
    /// Temperature above which an environmental warning raises (Celsius)
    pub temp_high_c: f32,
    /// Minimum gap between two environmental warnings (milliseconds)
    pub temp_cooldown_ms: u64,

    // --- Timing ---
    /// Environment sensor read interval (milliseconds)
    pub sensor_read_interval_ms: u64,
    /// Telemetry publish interval while online (milliseconds)
    pub telemetry_interval_ms: u64,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Input
            debounce_ms: 50,
            long_press_ms: 1000,

            // Display rotation
            mode_interval_ms: 5000,

            // Alarm
            alarm_timeout_ms: 60_000,

            // Health
            hr_low_bpm: 60,
            hr_high_bpm: 100,
            hr_danger_dwell_ms: 10_000,
            hr_beep_interval_ms: 2000,
            temp_high_c: 35.0,
            temp_cooldown_ms: 30_000,

            // Timing
            sensor_read_interval_ms: 2000,
            telemetry_interval_ms: 3000,
        }
    }
}
