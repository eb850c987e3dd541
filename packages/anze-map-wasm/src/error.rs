use thiserror::Error;
use wasm_bindgen::JsValue;

/// Everything that can go wrong between a checkbox change and a layer on the map.
///
/// Most of these never reach the user: fetch and parse failures are logged and
/// the affected layer simply does not appear.
#[derive(Debug, Error)]
pub enum MapError {
    #[error("request for {resource} failed: {message}")]
    Network { resource: String, message: String },

    #[error("request for {resource} returned HTTP {status}")]
    Status { resource: String, status: u16 },

    #[error("invalid GeoJSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("unknown category '{0}'")]
    UnknownCategory(String),

    #[error("{0}")]
    Js(String),
}

impl From<MapError> for JsValue {
    fn from(err: MapError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}

impl From<JsValue> for MapError {
    fn from(value: JsValue) -> Self {
        MapError::Js(
            value
                .as_string()
                .unwrap_or_else(|| format!("{:?}", value)),
        )
    }
}

pub type Result<T> = std::result::Result<T, MapError>;
