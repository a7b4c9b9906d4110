fn main() {
    // ESP-IDF environment propagation only matters for the device build;
    // host builds (tests, fuzzing) skip it.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
