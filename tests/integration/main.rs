//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises one engine or the whole
//! service against mock adapters. All tests run on the host with no
//! charging hardware or Wi-Fi module attached.

mod admission_tests;
mod app_service_tests;
mod mock_hw;
mod rapi_tests;
mod wifi_tests;
