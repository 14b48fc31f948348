//! Debounced press classification for the single front button.
//!
//! The raw level is sampled once per coordinator tick; a transition is
//! accepted only once the level has held unchanged for the full debounce
//! window since the last observed raw transition. An accepted release
//! classifies the press by its held duration and emits exactly one
//! [`PressEvent`]. Bounce inside the window produces nothing.

use log::debug;

/// Classification of an accepted button release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressKind {
    /// Held for less than the long-press boundary.
    Short,
    /// Held for the boundary duration or longer.
    Long,
}

/// One accepted button release. Transient — consumed the tick it is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PressEvent {
    pub kind: PressKind,
    /// Monotonic time at which the release was accepted (ms).
    pub released_at_ms: u64,
}

/// Debounce + press classification state machine.
pub struct InputClassifier {
    debounce_ms: u64,
    long_press_ms: u64,
    /// Last raw level observed (true = pressed).
    last_raw: bool,
    /// Time of the last observed raw transition.
    last_transition_ms: u64,
    /// Accepted (debounced) level.
    stable: bool,
    /// Time the accepted press began, while pressed.
    press_started_ms: Option<u64>,
}

impl InputClassifier {
    pub fn new(debounce_ms: u64, long_press_ms: u64) -> Self {
        Self {
            debounce_ms,
            long_press_ms,
            last_raw: false,
            last_transition_ms: 0,
            stable: false,
            press_started_ms: None,
        }
    }

    /// Feed one raw sample. Returns an event only on an accepted release.
    pub fn sample(&mut self, raw: bool, now_ms: u64) -> Option<PressEvent> {
        if raw != self.last_raw {
            // Raw edge — restart the stability window.
            self.last_raw = raw;
            self.last_transition_ms = now_ms;
            return None;
        }

        if raw == self.stable || now_ms.saturating_sub(self.last_transition_ms) < self.debounce_ms
        {
            return None;
        }

        // The changed level has held for the full window — accept it.
        self.stable = raw;

        if raw {
            self.press_started_ms = Some(now_ms);
            debug!("button pressed at {now_ms}ms");
            return None;
        }

        let started = self.press_started_ms.take()?;
        let duration = now_ms.saturating_sub(started);
        let kind = if duration < self.long_press_ms {
            PressKind::Short
        } else {
            PressKind::Long
        };
        debug!("button released after {duration}ms ({kind:?})");
        Some(PressEvent {
            kind,
            released_at_ms: now_ms,
        })
    }

    /// Accepted (debounced) pressed state.
    pub fn is_pressed(&self) -> bool {
        self.stable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> InputClassifier {
        InputClassifier::new(50, 1000)
    }

    /// Drive a full accepted press/release; returns the emitted event.
    fn press_and_release(
        c: &mut InputClassifier,
        press_at: u64,
        release_at: u64,
    ) -> Option<PressEvent> {
        assert_eq!(c.sample(true, press_at), None);
        assert_eq!(c.sample(true, press_at + 50), None);
        assert_eq!(c.sample(false, release_at), None);
        c.sample(false, release_at + 50)
    }

    #[test]
    fn no_events_without_press() {
        let mut c = classifier();
        assert_eq!(c.sample(false, 100), None);
        assert_eq!(c.sample(false, 10_000), None);
    }

    #[test]
    fn bounce_inside_window_emits_nothing() {
        let mut c = classifier();
        // Transitions spaced <50ms apart never stabilise.
        let mut now = 0;
        let mut raw = true;
        for _ in 0..40 {
            assert_eq!(c.sample(raw, now), None);
            raw = !raw;
            now += 30;
        }
        assert!(!c.is_pressed());
    }

    #[test]
    fn short_press_classifies_short() {
        let mut c = classifier();
        let ev = press_and_release(&mut c, 0, 400).unwrap();
        assert_eq!(ev.kind, PressKind::Short);
        assert_eq!(ev.released_at_ms, 450);
    }

    #[test]
    fn boundary_999ms_is_short() {
        let mut c = classifier();
        // Press accepted at t=50, release accepted at t=1049.
        let ev = press_and_release(&mut c, 0, 999).unwrap();
        assert_eq!(ev.kind, PressKind::Short);
    }

    #[test]
    fn boundary_1000ms_is_long() {
        let mut c = classifier();
        // Press accepted at t=50, release accepted at t=1050.
        let ev = press_and_release(&mut c, 0, 1000).unwrap();
        assert_eq!(ev.kind, PressKind::Long);
    }

    #[test]
    fn one_event_per_release() {
        let mut c = classifier();
        let ev = press_and_release(&mut c, 0, 300);
        assert!(ev.is_some());
        // Further released samples emit nothing.
        assert_eq!(c.sample(false, 500), None);
        assert_eq!(c.sample(false, 600), None);
    }

    #[test]
    fn bounce_on_release_does_not_double_fire() {
        let mut c = classifier();
        assert_eq!(c.sample(true, 0), None);
        assert_eq!(c.sample(true, 60), None);
        assert!(c.is_pressed());
        // Release bounces for a while, then settles.
        assert_eq!(c.sample(false, 200), None);
        assert_eq!(c.sample(true, 220), None);
        assert_eq!(c.sample(false, 240), None);
        let ev = c.sample(false, 300).unwrap();
        assert_eq!(ev.kind, PressKind::Short);
        assert_eq!(c.sample(false, 400), None);
    }
}
