//! Application core: controller logic behind port traits.
//!
//! The service here drives both protocol engines and the charge-admission
//! FSM. Panel, indicators, storage, clock, calendar and event output are
//! reached only through the **port traits** in [`ports`], so the core runs
//! unchanged on the host against mock adapters.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
