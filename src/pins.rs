//! GPIO and peripheral assignments for the WallyBox controller board.
//!
//! Every driver takes its pin numbers from here.

// ---------------------------------------------------------------------------
// Wi-Fi module (SPWF01S) on UART1
// ---------------------------------------------------------------------------

pub const WIFI_UART_TX_GPIO: i32 = 17;
pub const WIFI_UART_RX_GPIO: i32 = 18;
pub const WIFI_UART_BAUD: u32 = 115_200;

// ---------------------------------------------------------------------------
// Charging hardware (OpenEVSE RAPI) on UART2
// ---------------------------------------------------------------------------

pub const RAPI_UART_TX_GPIO: i32 = 4;
pub const RAPI_UART_RX_GPIO: i32 = 5;
pub const RAPI_UART_BAUD: u32 = 115_200;

// ---------------------------------------------------------------------------
// Front panel
// ---------------------------------------------------------------------------

/// Push-button, active low with external pull-up.
pub const BUTTON_GPIO: i32 = 16;

/// Plug-sense divider on ADC1 channel 6 (GPIO 34 on ESP32).
pub const PLUG_ADC_GPIO: i32 = 34;
pub const PLUG_ADC_CHANNEL: u32 = 6;

/// Link-status indicator.
pub const WIFI_LED_R_GPIO: i32 = 25;
pub const WIFI_LED_G_GPIO: i32 = 26;
pub const WIFI_LED_B_GPIO: i32 = 27;

/// Charge-status indicator.
pub const CHARGE_LED_R_GPIO: i32 = 12;
pub const CHARGE_LED_G_GPIO: i32 = 13;
pub const CHARGE_LED_B_GPIO: i32 = 14;
