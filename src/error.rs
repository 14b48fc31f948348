//! Unified error types for the VitaClock firmware.
//!
//! A single `Error` enum that every subsystem can convert into, keeping
//! the top-level coordinator loop's error handling uniform. All variants
//! are `Copy` so they can be cheaply passed through the service without
//! allocation. No core error is fatal: the loop logs and carries on.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A remote or local command was rejected.
    Command(CommandError),
    /// The non-volatile alarm store failed.
    Store(StoreError),
    /// A sensor could not be read or returned implausible data.
    Sensor(SensorError),
    /// Peripheral initialisation failed.
    Init(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Command(e) => write!(f, "command: {e}"),
            Self::Store(e) => write!(f, "store: {e}"),
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Command errors
// ---------------------------------------------------------------------------

/// Rejection reasons for inbound commands. Surfaced via log/telemetry,
/// never fatal; the rejected command leaves all state unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandError {
    /// Display mode index outside 0–2.
    InvalidMode(u8),
    /// Alarm hour outside 0–23.
    InvalidHour(u8),
    /// Alarm minute outside 0–59.
    InvalidMinute(u8),
    /// The remote payload could not be parsed.
    Malformed,
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidMode(v) => write!(f, "invalid mode value {v} (must be 0-2)"),
            Self::InvalidHour(v) => write!(f, "invalid alarm hour {v} (must be 0-23)"),
            Self::InvalidMinute(v) => write!(f, "invalid alarm minute {v} (must be 0-59)"),
            Self::Malformed => write!(f, "malformed payload"),
        }
    }
}

impl From<CommandError> for Error {
    fn from(e: CommandError) -> Self {
        Self::Command(e)
    }
}

// ---------------------------------------------------------------------------
// Store errors
// ---------------------------------------------------------------------------

/// Errors from the non-volatile alarm store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    /// No persisted alarm exists yet (first boot).
    NotFound,
    /// The stored blob failed to decode.
    Corrupted,
    /// Generic I/O error from the storage backend.
    IoError,
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "alarm config not found"),
            Self::Corrupted => write!(f, "alarm config corrupted"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl From<StoreError> for Error {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// The bus read returned an error or timed out.
    ReadFailed,
    /// Reading is outside the physically plausible range.
    OutOfRange,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadFailed => write!(f, "bus read failed"),
            Self::OutOfRange => write!(f, "reading out of range"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
