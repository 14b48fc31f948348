//! Audio arbitration: one buzzer line, many requesters.
//!
//! Pattern requests carry a priority class. At most one pattern plays at
//! a time; a strictly higher-priority request preempts the active one,
//! while equal or lower requests are dropped, never queued. Pattern
//! progress is driven by `tick(now)` — on/off transitions are stored
//! deadlines, nothing ever blocks the coordinator loop.

use log::debug;

/// Priority classes, highest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum Priority {
    Alarm = 0,
    HealthWarning = 1,
    ModeChirp = 2,
    MuteFeedback = 3,
}

/// One step of a buzzer pattern: output level held for a duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub on: bool,
    pub ms: u64,
}

const fn step(on: bool, ms: u64) -> Step {
    Step { on, ms }
}

/// A buzzer pattern: a step sequence, optionally repeating until cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pattern {
    pub steps: &'static [Step],
    pub repeat: bool,
}

/// Alarm ring: asymmetric duty cycle, repeats until cancelled.
pub const ALARM_RING: Pattern = Pattern {
    steps: &[step(true, 500), step(false, 1000)],
    repeat: true,
};

/// Heart-rate warning: three quick pulses (re-requested every cadence).
pub const HEALTH_BEEP: Pattern = Pattern {
    steps: &[
        step(true, 100),
        step(false, 100),
        step(true, 100),
        step(false, 100),
        step(true, 100),
        step(false, 100),
    ],
    repeat: false,
};

/// Temperature warning: two medium pulses.
pub const ENV_BEEP: Pattern = Pattern {
    steps: &[
        step(true, 150),
        step(false, 150),
        step(true, 150),
        step(false, 150),
    ],
    repeat: false,
};

/// Mode-change chirp: one very short blip.
pub const MODE_CHIRP: Pattern = Pattern {
    steps: &[step(true, 50)],
    repeat: false,
};

/// Mute engaged: two short beeps.
pub const MUTE_ON_FEEDBACK: Pattern = Pattern {
    steps: &[step(true, 100), step(false, 100), step(true, 100)],
    repeat: false,
};

/// Mute released: one long beep.
pub const MUTE_OFF_FEEDBACK: Pattern = Pattern {
    steps: &[step(true, 300)],
    repeat: false,
};

/// Power-on greeting: two short beeps.
pub const STARTUP_CHIRP: Pattern = Pattern {
    steps: &[step(true, 100), step(false, 100), step(true, 100)],
    repeat: false,
};

struct ActivePattern {
    pattern: Pattern,
    priority: Priority,
    step: usize,
    step_started_ms: u64,
}

/// Serialises competing pattern requests onto the single buzzer output.
pub struct AudioArbiter {
    active: Option<ActivePattern>,
}

impl AudioArbiter {
    pub fn new() -> Self {
        Self { active: None }
    }

    /// Request a pattern. Accepted when idle or when `priority` is
    /// strictly higher than the active pattern's. Returns acceptance.
    pub fn request(&mut self, priority: Priority, pattern: Pattern, now_ms: u64) -> bool {
        match &self.active {
            Some(active) if priority >= active.priority => {
                debug!("audio request {priority:?} dropped (busy at {:?})", active.priority);
                false
            }
            _ => {
                if self.active.is_some() {
                    debug!("audio request {priority:?} preempts");
                }
                self.active = Some(ActivePattern {
                    pattern,
                    priority,
                    step: 0,
                    step_started_ms: now_ms,
                });
                true
            }
        }
    }

    /// Cancel the active pattern if it belongs to `priority`.
    /// Used when an acknowledged alarm must fall silent immediately.
    pub fn cancel(&mut self, priority: Priority) {
        if self
            .active
            .as_ref()
            .is_some_and(|a| a.priority == priority)
        {
            self.active = None;
        }
    }

    /// Advance pending transitions and return the output level.
    pub fn tick(&mut self, now_ms: u64) -> bool {
        let Some(active) = &mut self.active else {
            return false;
        };

        // Walk forward through any steps whose deadlines have passed;
        // tolerant of arbitrarily delayed ticks.
        loop {
            let dur = active.pattern.steps[active.step].ms;
            if now_ms.saturating_sub(active.step_started_ms) < dur {
                break;
            }
            active.step_started_ms += dur;
            active.step += 1;
            if active.step == active.pattern.steps.len() {
                if active.pattern.repeat {
                    active.step = 0;
                } else {
                    self.active = None;
                    return false;
                }
            }
        }

        active.pattern.steps[active.step].on
    }

    /// Whether the output line is free for a new requester.
    pub fn is_idle(&self) -> bool {
        self.active.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_outputs_low() {
        let mut a = AudioArbiter::new();
        assert!(!a.tick(0));
        assert!(a.is_idle());
    }

    #[test]
    fn alarm_ring_duty_cycle() {
        let mut a = AudioArbiter::new();
        assert!(a.request(Priority::Alarm, ALARM_RING, 0));
        assert!(a.tick(0));
        assert!(a.tick(499));
        assert!(!a.tick(500));
        assert!(!a.tick(1499));
        // Repeats: wraps back into the ON phase.
        assert!(a.tick(1500));
        assert!(!a.tick(2100));
        assert!(!a.is_idle());
    }

    #[test]
    fn one_shot_completes_to_idle() {
        let mut a = AudioArbiter::new();
        a.request(Priority::ModeChirp, MODE_CHIRP, 0);
        assert!(a.tick(0));
        assert!(!a.tick(50));
        assert!(a.is_idle());
    }

    #[test]
    fn higher_priority_preempts() {
        let mut a = AudioArbiter::new();
        a.request(Priority::ModeChirp, MODE_CHIRP, 0);
        assert!(a.request(Priority::Alarm, ALARM_RING, 10));
        assert!(a.tick(10));
        assert!(a.tick(509));
        assert!(!a.tick(510));
    }

    #[test]
    fn equal_or_lower_priority_dropped_not_queued() {
        let mut a = AudioArbiter::new();
        a.request(Priority::HealthWarning, HEALTH_BEEP, 0);
        assert!(!a.request(Priority::HealthWarning, HEALTH_BEEP, 10));
        assert!(!a.request(Priority::MuteFeedback, MUTE_ON_FEEDBACK, 10));
        // The active pattern keeps playing uninterrupted.
        assert!(a.tick(10));
        // After completion nothing queued plays.
        assert!(!a.tick(600));
        assert!(a.is_idle());
    }

    #[test]
    fn cancel_silences_matching_priority_only() {
        let mut a = AudioArbiter::new();
        a.request(Priority::HealthWarning, HEALTH_BEEP, 0);
        a.cancel(Priority::Alarm);
        assert!(!a.is_idle());
        a.cancel(Priority::HealthWarning);
        assert!(a.is_idle());
        assert!(!a.tick(10));
    }

    #[test]
    fn delayed_tick_skips_whole_steps() {
        let mut a = AudioArbiter::new();
        a.request(Priority::HealthWarning, HEALTH_BEEP, 0);
        // Jump straight into the third pulse window.
        assert!(a.tick(420));
        // Far past the end of the pattern.
        assert!(!a.tick(10_000));
        assert!(a.is_idle());
    }
}
