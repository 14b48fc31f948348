//! VitaClock firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod error;

pub mod alarm;
pub mod audio;
pub mod health;
pub mod input;
pub mod mode;

pub mod presentation;
pub mod remote;

// Outer ring: adapters are cfg-gated per target inside.
pub mod adapters;
pub mod sensors;
