//! Application core: pure domain logic, zero I/O.
//!
//! Extremum tracking, intensity mapping, settings protocol and display
//! selection are orchestrated here.  All interaction with hardware happens
//! through **port traits** defined in [`ports`], keeping this layer fully
//! testable without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
