//! Collaborator models for the environment and pulse sensors.
//!
//! The coordinator core consumes abstracted readings through the
//! [`SensorPort`](crate::app::ports::SensorPort); these modules hold the
//! reading shapes and the collaborator-side processing (last-good
//! caching, beat averaging) shared by the hardware adapters and the
//! host-test mocks.

pub mod environment;
pub mod pulse;

pub use environment::{EnvReading, EnvironmentCache};
pub use pulse::{PulseProcessor, PulseReading};
