use serde::{Deserialize, Serialize};

use crate::category::CategoryCatalog;
use crate::error::Result;

/// Fixed marker for the business itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HomeMarker {
    pub lat: f64,
    pub lng: f64,
    pub popup: String,
}

/// Everything the widget needs to boot. Every field has a default, so the
/// host page can pass `{}` or override just what it needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WidgetConfig {
    /// Prefix for every data resource, including the trailing slash
    pub data_dir: String,
    /// Initial view as [lat, lng]
    pub center: [f64; 2],
    pub zoom: u8,
    /// Zoom used when the first GPS fix recenters the map
    pub locate_zoom: u8,
    pub tile_url: String,
    pub max_zoom: u8,
    pub attribution: String,
    pub home: HomeMarker,
    pub filter_button: String,
    pub filter_panel: String,
    pub categories: CategoryCatalog,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            data_dir: "assets/data/".to_string(),
            center: [45.61, 10.69],
            zoom: 13,
            locate_zoom: 16,
            tile_url: "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
            max_zoom: 19,
            attribution: "&copy; OpenStreetMap".to_string(),
            home: HomeMarker {
                lat: 45.6214,
                lng: 10.7006,
                popup: "🏡 <b>Agriturismo Le Anze</b><br>Benvenuto!".to_string(),
            },
            filter_button: "btnFilter".to_string(),
            filter_panel: "filterPanel".to_string(),
            categories: CategoryCatalog::default(),
        }
    }
}

impl WidgetConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    #[cfg(target_arch = "wasm32")]
    pub fn from_js(value: wasm_bindgen::JsValue) -> Result<Self> {
        if value.is_undefined() || value.is_null() {
            return Ok(Self::default());
        }
        serde_wasm_bindgen::from_value(value)
            .map_err(|e| crate::error::MapError::Js(e.to_string()))
    }
}
