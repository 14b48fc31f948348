//! Application core — pure coordinator logic, zero I/O.
//!
//! This module contains the business rules for the VitaClock: input
//! classification, display rotation, alarm lifecycle, health monitoring
//! and audio arbitration, orchestrated once per tick by the service.
//! All interaction with hardware happens through **port traits** defined
//! in [`ports`], keeping this layer fully testable without peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
