//! System configuration parameters
//!
//! All tunable parameters for the WallyBox controller.
//! Values can be overridden via the persistent store (postcard blob).

use heapless::String;
use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;
use crate::ascii::push_truncated;

/// Short text fields (SSID, host names, device name).
pub type ShortText = String<32>;

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Scheduling ---
    /// Period of the cooperative control cycle (milliseconds)
    pub cycle_period_ms: u32,

    // --- Wi-Fi engine ---
    /// Response timeout for one AT command (milliseconds)
    pub wifi_cmd_timeout_ms: u32,
    /// Interval between ping / scan / time-sync housekeeping while connected (milliseconds)
    pub wifi_housekeeping_ms: u32,
    /// Idle time after which data mode falls back to command mode (milliseconds)
    pub data_mode_idle_ms: u32,
    /// Maintenance access point auto-revert timeout (milliseconds)
    pub maintenance_timeout_ms: u32,
    /// TCP port of the socket server opened once connected
    pub listen_port: u16,
    /// SSID broadcast in maintenance mode
    pub maintenance_ssid: ShortText,
    /// Name answered to the socket bridge
    pub device_name: ShortText,
    /// Host fetched to read the HTTP `Date:` header
    pub time_sync_host: ShortText,
    /// Path fetched on the time-sync host
    pub time_sync_path: ShortText,
    /// Address pinged during housekeeping; empty disables the ping
    pub gateway_host: ShortText,

    // --- Charging-hardware engine ---
    /// Response timeout for one RAPI command (milliseconds)
    pub rapi_timeout_ms: u32,
    /// Retries after the first attempt before the link is reset
    pub rapi_max_retries: u8,
    /// Start-up delay before status polling begins (milliseconds)
    pub rapi_warmup_ms: u32,
    /// Status polling period (milliseconds)
    pub rapi_poll_ms: u32,

    // --- Admission control ---
    /// Averaged plug-sense ADC level at or above which a vehicle is plugged
    pub plug_threshold: u16,
    /// Time the hardware stays enabled after plug-in while admission is off (milliseconds)
    pub plug_grace_ms: u32,
    /// Sampling period of the end-of-charge current check (milliseconds)
    pub low_current_interval_ms: u32,
    /// Current below which charging is considered finished (amperes)
    pub min_stop_current_a: u8,

    // --- Human interface ---
    /// Raw button level must be stable this long before it is accepted (milliseconds)
    pub button_filter_ms: u32,
    /// Hold time that turns a press into a long press (milliseconds)
    pub long_press_ms: u32,
    /// Half-period of blinking indicators (milliseconds)
    pub blink_half_period_ms: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            cycle_period_ms: 10,

            wifi_cmd_timeout_ms: 2_000,
            wifi_housekeeping_ms: 60_000,
            data_mode_idle_ms: 10_000,
            maintenance_timeout_ms: 900_000, // 15 min
            listen_port: 15_555,
            maintenance_ssid: fixed("WallyBox_Maint"),
            device_name: fixed("WallyBox"),
            time_sync_host: fixed("www.google.com"),
            time_sync_path: fixed("/"),
            gateway_host: fixed("192.168.1.254"),

            rapi_timeout_ms: 1_000,
            rapi_max_retries: 4,
            rapi_warmup_ms: 5_000,
            rapi_poll_ms: 2_000,

            plug_threshold: 2_000,
            plug_grace_ms: 10_000,
            low_current_interval_ms: 30_000,
            min_stop_current_a: 2,

            button_filter_ms: 100,
            long_press_ms: 5_000,
            blink_half_period_ms: 500,
        }
    }
}

fn fixed<const N: usize>(text: &str) -> String<N> {
    let mut out = String::new();
    push_truncated(&mut out, text);
    out
}

/// Range-check every field before it is persisted or applied.
pub fn validate(cfg: &SystemConfig) -> Result<(), ConfigError> {
    if !(1..=100).contains(&cfg.cycle_period_ms) {
        return Err(ConfigError::ValidationFailed(
            "cycle_period_ms must be 1–100",
        ));
    }
    if !(100..=30_000).contains(&cfg.wifi_cmd_timeout_ms) {
        return Err(ConfigError::ValidationFailed(
            "wifi_cmd_timeout_ms must be 100–30000",
        ));
    }
    if cfg.wifi_housekeeping_ms < 10_000 {
        return Err(ConfigError::ValidationFailed(
            "wifi_housekeeping_ms must be >= 10000",
        ));
    }
    if cfg.data_mode_idle_ms < 1_000 {
        return Err(ConfigError::ValidationFailed(
            "data_mode_idle_ms must be >= 1000",
        ));
    }
    if cfg.maintenance_timeout_ms < 60_000 {
        return Err(ConfigError::ValidationFailed(
            "maintenance_timeout_ms must be >= 60000",
        ));
    }
    if cfg.listen_port == 0 {
        return Err(ConfigError::ValidationFailed("listen_port must be non-zero"));
    }
    if cfg.maintenance_ssid.is_empty() || cfg.device_name.is_empty() {
        return Err(ConfigError::ValidationFailed(
            "maintenance_ssid and device_name must be non-empty",
        ));
    }
    if cfg.time_sync_host.is_empty() || !cfg.time_sync_path.starts_with('/') {
        return Err(ConfigError::ValidationFailed(
            "time_sync_host must be non-empty and time_sync_path must start with '/'",
        ));
    }
    if !(100..=10_000).contains(&cfg.rapi_timeout_ms) {
        return Err(ConfigError::ValidationFailed(
            "rapi_timeout_ms must be 100–10000",
        ));
    }
    if cfg.rapi_max_retries > 10 {
        return Err(ConfigError::ValidationFailed(
            "rapi_max_retries must be 0–10",
        ));
    }
    if cfg.rapi_poll_ms < 500 {
        return Err(ConfigError::ValidationFailed("rapi_poll_ms must be >= 500"));
    }
    if !(1..=4095).contains(&cfg.plug_threshold) {
        return Err(ConfigError::ValidationFailed(
            "plug_threshold must be 1–4095",
        ));
    }
    // 0 disables end-of-charge detection.
    if cfg.min_stop_current_a > 80 {
        return Err(ConfigError::ValidationFailed(
            "min_stop_current_a must be 0–80",
        ));
    }
    if cfg.low_current_interval_ms < 1_000 {
        return Err(ConfigError::ValidationFailed(
            "low_current_interval_ms must be >= 1000",
        ));
    }
    if cfg.button_filter_ms == 0 || cfg.long_press_ms <= cfg.button_filter_ms {
        return Err(ConfigError::ValidationFailed(
            "long_press_ms must exceed a non-zero button_filter_ms",
        ));
    }
    if cfg.blink_half_period_ms < cfg.cycle_period_ms {
        return Err(ConfigError::ValidationFailed(
            "blink_half_period_ms must be >= cycle_period_ms",
        ));
    }
    Ok(())
}
