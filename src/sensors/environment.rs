//! Environment (humidity + temperature) reading cache.
//!
//! The DHT-class sensor fails transiently; a failed read returns `None`
//! from the port and the cache keeps serving the last good value so the
//! display and health checks never see a gap. Implausible readings are
//! treated as failures rather than cached.

use log::debug;

/// One successful environment read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvReading {
    /// Relative humidity, percent.
    pub humidity: f32,
    /// Ambient temperature, Celsius.
    pub temperature_c: f32,
}

impl EnvReading {
    /// Physical plausibility for a room sensor.
    pub fn is_plausible(&self) -> bool {
        self.temperature_c.is_finite()
            && self.humidity.is_finite()
            && (-40.0..=80.0).contains(&self.temperature_c)
            && (0.0..=100.0).contains(&self.humidity)
    }
}

/// Retains the last good reading across transient read failures.
#[derive(Debug, Default)]
pub struct EnvironmentCache {
    last_good: Option<EnvReading>,
}

impl EnvironmentCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold in a port read. Returns the freshest usable reading — the
    /// new one when valid, otherwise whatever was cached.
    pub fn update(&mut self, reading: Option<EnvReading>) -> Option<EnvReading> {
        match reading {
            Some(r) if r.is_plausible() => {
                self.last_good = Some(r);
            }
            Some(r) => {
                debug!(
                    "implausible environment reading dropped: {:.1}C {:.0}%",
                    r.temperature_c, r.humidity
                );
            }
            None => {
                debug!("environment read failed, serving cached value");
            }
        }
        self.last_good
    }

    /// Last good reading, if any read has ever succeeded.
    pub fn current(&self) -> Option<EnvReading> {
        self.last_good
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROOM: EnvReading = EnvReading {
        humidity: 55.0,
        temperature_c: 24.5,
    };

    #[test]
    fn failure_before_first_read_yields_none() {
        let mut c = EnvironmentCache::new();
        assert_eq!(c.update(None), None);
    }

    #[test]
    fn failure_retains_cached_value() {
        let mut c = EnvironmentCache::new();
        assert_eq!(c.update(Some(ROOM)), Some(ROOM));
        assert_eq!(c.update(None), Some(ROOM));
        assert_eq!(c.current(), Some(ROOM));
    }

    #[test]
    fn implausible_reading_treated_as_failure() {
        let mut c = EnvironmentCache::new();
        c.update(Some(ROOM));
        let bogus = EnvReading {
            humidity: 180.0,
            temperature_c: 24.0,
        };
        assert_eq!(c.update(Some(bogus)), Some(ROOM));

        let nan = EnvReading {
            humidity: f32::NAN,
            temperature_c: f32::NAN,
        };
        assert_eq!(c.update(Some(nan)), Some(ROOM));
    }

    #[test]
    fn good_reading_replaces_cache() {
        let mut c = EnvironmentCache::new();
        c.update(Some(ROOM));
        let warmer = EnvReading {
            humidity: 50.0,
            temperature_c: 36.2,
        };
        assert_eq!(c.update(Some(warmer)), Some(warmer));
    }
}
