//! Adapters — concrete implementations of the port traits.
//!
//! Everything that touches a peripheral, the ESP-IDF logger or NVS
//! lives here. On non-espidf targets the adapters fall back to
//! simulation backends so the whole stack runs on the host.

pub mod hardware;
pub mod log_sink;
pub mod nvs;
pub mod time;
