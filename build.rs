fn main() {
    // embuild emits the linker/include flags for the ESP-IDF SDK.
    // Host builds (lib + tests, no default features) skip it entirely.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
