// Browser console on wasm32, the `log` facade everywhere else so native
// unit tests can exercise code paths that log.

#[cfg(target_arch = "wasm32")]
pub fn log(s: &str) {
    web_sys::console::log_1(&s.into());
}

#[cfg(target_arch = "wasm32")]
pub fn warn(s: &str) {
    web_sys::console::warn_1(&s.into());
}

#[cfg(not(target_arch = "wasm32"))]
pub fn log(s: &str) {
    ::log::info!("{}", s);
}

#[cfg(not(target_arch = "wasm32"))]
pub fn warn(s: &str) {
    ::log::warn!("{}", s);
}

// Note: The console_log / console_warn macros are defined in lib.rs
