use wasm_bindgen::prelude::*;

// Create a console module for logging
pub mod console;
// Error type shared by every module
pub mod error;
// Widget configuration and category catalog
pub mod category;
pub mod config;
// Parsed GeoJSON features
pub mod geojson_features;
// Shared models exposed to JS
pub mod models;
// Cache keys, layer cache and stale-fetch guard
pub mod cache_keys;
pub mod cache_manager;
pub mod cancellation;
// Active layers and the map surface they live on
pub mod registry;
pub mod surface;
// Feature-to-visual mapping and popups
pub mod mapper;
pub mod popup;
// Data fetching
pub mod fetcher;
// Toggle state machine and its async driver
pub mod controller;
pub mod toggle;
// Sensors and the filter panel
pub mod panel;
pub mod tracker;
// Browser bindings
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use error::MapError;

// Enable better panic messages in console during development
#[cfg(feature = "console_error_panic_hook")]
pub use console_error_panic_hook::set_once as set_panic_hook;

#[macro_export]
macro_rules! console_log {
    ($($t:tt)*) => ($crate::console::log(&format!($($t)*)))
}

#[macro_export]
macro_rules! console_warn {
    ($($t:tt)*) => ($crate::console::warn(&format!($($t)*)))
}

use std::sync::Once;
static INIT: Once = Once::new();

// This sets up the wasm_bindgen start functionality
#[wasm_bindgen(start)]
pub fn start() {
    INIT.call_once(|| {
        // Set the panic hook for better error messages
        #[cfg(feature = "console_error_panic_hook")]
        console_error_panic_hook::set_once();

        console_log!("WASM module initialized successfully");
    });
}
