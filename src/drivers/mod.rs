//! Panel drivers: button filter, indicator colours and plug detection.

pub mod button;
pub mod led;
pub mod plug;
pub mod watchdog;
