fn main() {
    // ESP-IDF environment propagation is only needed for the firmware image.
    // Host builds (tests, fuzzing) skip it entirely.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
