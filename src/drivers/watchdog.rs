//! Task watchdog for the control loop.
//!
//! The loop task subscribes once and feeds the watchdog every cycle; a
//! cycle stuck longer than the timeout (for instance an inline Wi-Fi
//! answer that never drains) resets the controller. On the host the
//! watchdog does nothing.

#[cfg(target_os = "espidf")]
use esp_idf_sys::{ESP_OK, esp_task_wdt_add, esp_task_wdt_config_t, esp_task_wdt_reconfigure, esp_task_wdt_reset};

pub struct Watchdog {
    #[cfg(target_os = "espidf")]
    subscribed: bool,
}

impl Watchdog {
    #[cfg(target_os = "espidf")]
    pub fn subscribe(timeout_ms: u32) -> Self {
        let cfg = esp_task_wdt_config_t {
            timeout_ms,
            idle_core_mask: 0,
            trigger_panic: true,
        };
        // SAFETY: plain FFI calls on the current task, made once at start-up.
        let rc = unsafe { esp_task_wdt_reconfigure(&cfg) };
        if rc != ESP_OK as i32 {
            log::warn!("WDT: reconfigure returned {}", rc);
        }
        // SAFETY: as above; a null handle means the calling task.
        let rc = unsafe { esp_task_wdt_add(core::ptr::null_mut()) };
        let subscribed = rc == ESP_OK as i32;
        if subscribed {
            log::info!("WDT: control loop subscribed, {} ms", timeout_ms);
        } else {
            log::warn!("WDT: subscribe failed ({})", rc);
        }
        Self { subscribed }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn subscribe(_timeout_ms: u32) -> Self {
        Self {}
    }

    pub fn feed(&self) {
        #[cfg(target_os = "espidf")]
        if self.subscribed {
            // SAFETY: resets the watchdog of the subscribed calling task.
            unsafe {
                esp_task_wdt_reset();
            }
        }
    }
}
