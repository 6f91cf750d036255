//! WallyBox charging-station controller library.
//!
//! Exposes the protocol engines, the charge-admission FSM and the
//! application core for integration testing and host simulation. All
//! ESP-IDF-specific code is guarded by `#[cfg(target_os = "espidf")]`
//! within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod ascii;
pub mod bridge;
pub mod config;
pub mod diagnostics;
pub mod fsm;
pub mod history;
pub mod persist;
pub mod queue;
pub mod rapi;
pub mod timer;
pub mod transport;
pub mod wifi;

pub mod error;
pub mod pins;

pub mod adapters;
pub mod drivers;
