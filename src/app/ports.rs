//! Port traits — the boundary between the coordinator core and the
//! outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (clock chip, sensor buses, buzzer line, NVS, event
//! sinks) implement these traits. The
//! [`AppService`](super::service::AppService) consumes them via
//! generics, so the core never touches hardware directly and the whole
//! coordinator runs on the host under test mocks.

use crate::alarm::{AlarmConfig, Date, TimeOfDay};
use crate::error::StoreError;
use crate::sensors::{EnvReading, PulseReading};

// ───────────────────────────────────────────────────────────────
// Clock port (driven adapter: RTC chip → domain)
// ───────────────────────────────────────────────────────────────

/// Wall-clock source. The coordinator never does its own calendar math.
pub trait ClockPort {
    fn time_of_day(&mut self) -> TimeOfDay;
    fn date(&mut self) -> Date;
}

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapters: buses → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port for everything the coordinator samples per tick.
pub trait SensorPort {
    /// One environment read attempt. `None` on transient failure — the
    /// core retains its cached last-good value.
    fn read_environment(&mut self) -> Option<EnvReading>;

    /// Latest pulse collaborator output (presence + averaged BPM).
    fn read_pulse(&mut self) -> PulseReading;

    /// Raw front-button level, true = pressed. Debounce happens in the
    /// core, not here.
    fn button_pressed(&mut self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Buzzer port (driven adapter: domain → output line)
// ───────────────────────────────────────────────────────────────

/// The single audible output line. The arbiter owns its level.
pub trait BuzzerPort {
    fn set(&mut self, on: bool);
}

// ───────────────────────────────────────────────────────────────
// Alarm store port (driven adapter: domain ↔ NVS)
// ───────────────────────────────────────────────────────────────

/// Persists the single alarm configuration.
///
/// Implementations must be atomic per write — a power loss mid-save
/// yields either the old or the new blob, never a torn one (the ESP-IDF
/// NVS API guarantees this natively; in-memory mocks trivially).
pub trait AlarmStorePort {
    /// Load the persisted alarm. `Err(StoreError::NotFound)` on first boot.
    /// Callers sanitise the result — corruption is corrected, not fatal.
    fn load(&self) -> Result<AlarmConfig, StoreError>;

    /// Persist the alarm. Called on every mutation.
    fn save(&mut self, config: &AlarmConfig) -> Result<(), StoreError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / remote)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port. Adapters decide where they go (serial log,
/// remote publish, test buffer).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
