//! Pulse-oximeter collaborator: presence detection and BPM averaging.
//!
//! The optical sensor reports raw IR intensity and per-beat detections;
//! this module turns them into the `presence` flag and rolling-average
//! heart rate the coordinator consumes. The core never sees raw IR
//! except for display.

use log::debug;

/// IR window inside which a finger is considered present.
const IR_PRESENT_MIN: u32 = 50_000;
const IR_PRESENT_MAX: u32 = 200_000;

/// Plausible instantaneous BPM band; beats outside are discarded.
const BPM_MIN: f32 = 20.0;
const BPM_MAX: f32 = 200.0;

/// Rolling-average window, in beats.
const RATE_WINDOW: usize = 4;

/// Absence duration after which the average is cleared (ms).
const ABSENCE_RESET_MS: u64 = 2000;

/// What the collaborator hands to the coordinator each tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PulseReading {
    /// Finger present in the IR window.
    pub presence: bool,
    /// Rolling-average heart rate; 0 until enough beats accumulate.
    pub heart_rate: u16,
    /// Raw IR intensity, for the vitals screen only.
    pub ir: u32,
}

/// Beat-to-BPM conversion with a rolling window.
pub struct PulseProcessor {
    rates: [u16; RATE_WINDOW],
    filled: usize,
    spot: usize,
    heart_rate: u16,
    presence: bool,
    last_beat_ms: Option<u64>,
    last_removed_ms: u64,
}

impl PulseProcessor {
    pub fn new() -> Self {
        Self {
            rates: [0; RATE_WINDOW],
            filled: 0,
            spot: 0,
            heart_rate: 0,
            presence: false,
            last_beat_ms: None,
            last_removed_ms: 0,
        }
    }

    /// Feed one sensor sample.
    ///
    /// `beat_detected` is the sensor driver's beat flag for this sample.
    pub fn sample(&mut self, ir: u32, beat_detected: bool, now_ms: u64) -> PulseReading {
        let present = ir > IR_PRESENT_MIN && ir < IR_PRESENT_MAX;
        if !present && self.presence {
            self.last_removed_ms = now_ms;
        }
        self.presence = present;

        if present && beat_detected {
            if let Some(last) = self.last_beat_ms {
                let delta = now_ms.saturating_sub(last);
                if delta > 0 {
                    let bpm = 60_000.0 / delta as f32;
                    if bpm > BPM_MIN && bpm < BPM_MAX {
                        self.push_rate(bpm as u16);
                    } else {
                        debug!("implausible beat interval {delta}ms dropped");
                    }
                }
            }
            self.last_beat_ms = Some(now_ms);
        }

        if !present && now_ms.saturating_sub(self.last_removed_ms) > ABSENCE_RESET_MS {
            self.reset();
        }

        PulseReading {
            presence: present,
            heart_rate: self.heart_rate,
            ir,
        }
    }

    fn push_rate(&mut self, bpm: u16) {
        self.rates[self.spot] = bpm;
        self.spot = (self.spot + 1) % RATE_WINDOW;
        self.filled = (self.filled + 1).min(RATE_WINDOW);
        let sum: u32 = self.rates[..self.filled.max(1)]
            .iter()
            .map(|&r| u32::from(r))
            .sum();
        self.heart_rate = (sum / self.filled as u32) as u16;
    }

    fn reset(&mut self) {
        self.rates = [0; RATE_WINDOW];
        self.filled = 0;
        self.spot = 0;
        self.heart_rate = 0;
        self.last_beat_ms = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FINGER_IR: u32 = 90_000;

    /// Feed beats at a fixed interval; returns the last reading.
    fn steady_beats(p: &mut PulseProcessor, interval_ms: u64, count: usize) -> PulseReading {
        let mut reading = PulseReading::default();
        for i in 0..count {
            reading = p.sample(FINGER_IR, true, (i as u64 + 1) * interval_ms);
        }
        reading
    }

    #[test]
    fn no_finger_reports_absent() {
        let mut p = PulseProcessor::new();
        let r = p.sample(10_000, false, 0);
        assert!(!r.presence);
        assert_eq!(r.heart_rate, 0);
    }

    #[test]
    fn overload_ir_reports_absent() {
        let mut p = PulseProcessor::new();
        assert!(!p.sample(250_000, false, 0).presence);
    }

    #[test]
    fn steady_beats_average_to_bpm() {
        let mut p = PulseProcessor::new();
        // 600ms intervals = 100 BPM; first beat only arms the interval.
        let r = steady_beats(&mut p, 600, 5);
        assert!(r.presence);
        assert_eq!(r.heart_rate, 100);
    }

    #[test]
    fn window_tracks_rate_changes() {
        let mut p = PulseProcessor::new();
        steady_beats(&mut p, 1000, 5); // 60 BPM
        // Speed up to 500ms (120 BPM); after a full window the average follows.
        let mut now = 5000;
        let mut r = PulseReading::default();
        for _ in 0..RATE_WINDOW {
            now += 500;
            r = p.sample(FINGER_IR, true, now);
        }
        assert_eq!(r.heart_rate, 120);
    }

    #[test]
    fn implausible_interval_is_discarded() {
        let mut p = PulseProcessor::new();
        steady_beats(&mut p, 600, 5);
        // A 100ms "beat" (600 BPM) must not disturb the average.
        let r = p.sample(FINGER_IR, true, 3100);
        assert_eq!(r.heart_rate, 100);
    }

    #[test]
    fn absence_clears_average_after_grace() {
        let mut p = PulseProcessor::new();
        steady_beats(&mut p, 600, 5);
        // Finger lifts at t=3000.
        let r = p.sample(0, false, 3000);
        assert!(!r.presence);
        // Within the grace window the last average is still reported.
        assert_eq!(p.sample(0, false, 4000).heart_rate, 100);
        // Past it, cleared.
        assert_eq!(p.sample(0, false, 5001).heart_rate, 0);
    }
}
