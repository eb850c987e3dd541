use serde::{Deserialize, Serialize};

/// Glyph used when neither the feature nor its category provides one.
pub const DEFAULT_PIN: &str = "📍";

/// Stroke style applied to every line/polygon of a route category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineStyle {
    pub color: String,
    pub weight: f64,
    pub opacity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dash_array: Option<String>,
}

impl Default for LineStyle {
    // Leaflet's own path defaults
    fn default() -> Self {
        Self {
            color: "#3388ff".to_string(),
            weight: 3.0,
            opacity: 1.0,
            dash_array: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CategoryKind {
    /// Trail index with one sub-toggle per named route.
    Route {
        style: LineStyle,
        /// id of the master checkbox
        master_input: String,
        /// id of the element that receives the sub-toggle checkboxes
        sub_container: String,
    },
    /// Points of interest shown all at once.
    Poi {
        #[serde(default)]
        glyph: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub key: String,
    /// File name under the data directory
    pub resource: String,
    #[serde(flatten)]
    pub kind: CategoryKind,
}

impl Category {
    pub fn route(key: &str, style: LineStyle, master_input: &str, sub_container: &str) -> Self {
        Self {
            key: key.to_string(),
            resource: format!("percorsi_{}.geojson", key),
            kind: CategoryKind::Route {
                style,
                master_input: master_input.to_string(),
                sub_container: sub_container.to_string(),
            },
        }
    }

    pub fn poi(key: &str, glyph: &str) -> Self {
        Self {
            key: key.to_string(),
            resource: format!("{}.geojson", key),
            kind: CategoryKind::Poi {
                glyph: Some(glyph.to_string()),
            },
        }
    }

    pub fn is_route(&self) -> bool {
        matches!(self.kind, CategoryKind::Route { .. })
    }

    /// Style for lines and polygons drawn for this category.
    pub fn line_style(&self) -> LineStyle {
        match &self.kind {
            CategoryKind::Route { style, .. } => style.clone(),
            CategoryKind::Poi { .. } => LineStyle::default(),
        }
    }

    /// Category glyph, falling back to the generic pin.
    pub fn glyph(&self) -> &str {
        match &self.kind {
            CategoryKind::Poi { glyph: Some(g) } if !g.is_empty() => g,
            _ => DEFAULT_PIN,
        }
    }
}

/// Lookup table of every category the widget knows about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryCatalog {
    categories: Vec<Category>,
}

impl CategoryCatalog {
    pub fn new(categories: Vec<Category>) -> Self {
        Self { categories }
    }

    pub fn get(&self, key: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.key == key)
    }

    pub fn by_resource(&self, resource: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.resource == resource)
    }

    pub fn routes(&self) -> impl Iterator<Item = &Category> {
        self.categories.iter().filter(|c| c.is_route())
    }
}

impl Default for CategoryCatalog {
    fn default() -> Self {
        Self::new(vec![
            Category::route(
                "bici",
                LineStyle {
                    color: "#3b82f6".to_string(),
                    weight: 4.0,
                    opacity: 0.9,
                    dash_array: None,
                },
                "masterBici",
                "subBici",
            ),
            Category::route(
                "piedi",
                LineStyle {
                    color: "#22c55e".to_string(),
                    weight: 3.0,
                    opacity: 0.8,
                    dash_array: Some("6,6".to_string()),
                },
                "masterPiedi",
                "subPiedi",
            ),
            Category::poi("ristoranti", "🍽️"),
            Category::poi("bar", "☕"),
            Category::poi("noleggi", "🚲"),
            Category::poi("supermercati", "🛒"),
            Category::poi("raccolta_differenziata", "♻️"),
            Category::poi("farmacia", "💊"),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalog_resources() {
        let catalog = CategoryCatalog::default();
        assert_eq!(catalog.get("bici").unwrap().resource, "percorsi_bici.geojson");
        assert_eq!(catalog.by_resource("bar.geojson").unwrap().key, "bar");
        assert_eq!(catalog.routes().count(), 2);
    }

    #[test]
    fn glyph_falls_back_to_pin() {
        let empty = Category {
            key: "x".to_string(),
            resource: "x.geojson".to_string(),
            kind: CategoryKind::Poi { glyph: None },
        };
        assert_eq!(empty.glyph(), DEFAULT_PIN);
        assert_eq!(CategoryCatalog::default().get("bar").unwrap().glyph(), "☕");
    }

    #[test]
    fn deserializes_flattened_kind() {
        let json = r##"[{"key":"cavalli","resource":"cavalli.geojson","kind":"route",
            "style":{"color":"#aa0000","weight":2,"opacity":1},
            "master_input":"masterCavalli","sub_container":"subCavalli"}]"##;
        let catalog: CategoryCatalog = serde_json::from_str(json).unwrap();
        let cat = catalog.get("cavalli").unwrap();
        assert!(cat.is_route());
        assert_eq!(cat.line_style().color, "#aa0000");
        assert!(cat.line_style().dash_array.is_none());
    }
}
