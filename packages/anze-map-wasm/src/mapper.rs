use geo::BoundingRect;
use geo_types::{coord, Geometry, Point, Rect};
use serde_json::{json, Value};

use crate::category::{Category, LineStyle, DEFAULT_PIN};
use crate::geojson_features::{geometry_to_geojson, Feature, FeatureCollection, Field};
use crate::popup::{poi_popup, route_detail_popup, route_index_popup};

/// A renderable object the JS side turns into a marker or a styled path.
#[derive(Debug, Clone, PartialEq)]
pub enum VisualFeature {
    Marker {
        position: Point<f64>,
        glyph: String,
        popup: String,
    },
    Path {
        geometry: Geometry<f64>,
        style: LineStyle,
        popup: String,
    },
}

impl VisualFeature {
    pub fn geometry(&self) -> Geometry<f64> {
        match self {
            VisualFeature::Marker { position, .. } => Geometry::Point(*position),
            VisualFeature::Path { geometry, .. } => geometry.clone(),
        }
    }

    fn to_json(&self) -> Value {
        match self {
            VisualFeature::Marker {
                position,
                glyph,
                popup,
            } => json!({
                "kind": "marker",
                "lat": position.y(),
                "lng": position.x(),
                "glyph": glyph,
                "popup": popup,
            }),
            VisualFeature::Path {
                geometry,
                style,
                popup,
            } => json!({
                "kind": "path",
                "geometry": geometry_to_geojson(geometry),
                "style": style,
                "popup": popup,
            }),
        }
    }
}

/// Everything one toggle contributes to the map, plus the area it covers.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualLayer {
    pub category: String,
    pub features: Vec<VisualFeature>,
    pub bounds: Option<Rect<f64>>,
}

impl VisualLayer {
    fn new(category: &Category, features: Vec<VisualFeature>) -> Self {
        let bounds = features
            .iter()
            .filter_map(|f| f.geometry().bounding_rect())
            .reduce(merge_rects);
        Self {
            category: category.key.clone(),
            features,
            bounds,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Plain JSON description handed to the JS renderer. Bounds are
    /// `[[south, west], [north, east]]` like Leaflet expects.
    pub fn to_json(&self) -> Value {
        json!({
            "category": self.category,
            "features": self.features.iter().map(VisualFeature::to_json).collect::<Vec<_>>(),
            "bounds": self.bounds.map(bounds_to_json),
        })
    }
}

pub fn bounds_to_json(rect: Rect<f64>) -> Value {
    json!([[rect.min().y, rect.min().x], [rect.max().y, rect.max().x]])
}

fn merge_rects(a: Rect<f64>, b: Rect<f64>) -> Rect<f64> {
    Rect::new(
        coord! { x: a.min().x.min(b.min().x), y: a.min().y.min(b.min().y) },
        coord! { x: a.max().x.max(b.max().x), y: a.max().y.max(b.max().y) },
    )
}

// Points become markers, everything else a styled path. Features without
// geometry (pure index entries) produce nothing.
fn visualize<G, P>(feature: &Feature, glyph: G, style: &LineStyle, popup: P) -> Option<VisualFeature>
where
    G: FnOnce(&Feature) -> String,
    P: FnOnce(&Feature) -> String,
{
    match feature.geometry.as_ref()? {
        Geometry::Point(p) => Some(VisualFeature::Marker {
            position: *p,
            glyph: glyph(feature),
            popup: popup(feature),
        }),
        geometry => Some(VisualFeature::Path {
            geometry: geometry.clone(),
            style: style.clone(),
            popup: popup(feature),
        }),
    }
}

/// Point-of-interest layer: feature `icona`, else the category glyph, else the pin.
pub fn map_poi(category: &Category, data: &FeatureCollection) -> VisualLayer {
    let style = category.line_style();
    let features = data
        .features
        .iter()
        .filter_map(|f| {
            visualize(
                f,
                |f| {
                    f.properties
                        .get(Field::Icon)
                        .unwrap_or_else(|| category.glyph())
                        .to_string()
                },
                &style,
                |f| poi_popup(&f.properties),
            )
        })
        .collect();
    VisualLayer::new(category, features)
}

/// Route rendered from its detail resource.
pub fn map_route_detail(category: &Category, name: &str, detail: &FeatureCollection) -> VisualLayer {
    let style = category.line_style();
    let features = detail
        .features
        .iter()
        .filter_map(|f| {
            visualize(
                f,
                |_| DEFAULT_PIN.to_string(),
                &style,
                |f| route_detail_popup(&f.properties, name),
            )
        })
        .collect();
    VisualLayer::new(category, features)
}

/// Route rendered straight from the index feature's own geometry.
pub fn map_route_index(category: &Category, name: &str, feature: &Feature) -> VisualLayer {
    let style = category.line_style();
    let features = visualize(
        feature,
        |_| DEFAULT_PIN.to_string(),
        &style,
        |f| route_index_popup(&f.properties, name),
    )
    .into_iter()
    .collect();
    VisualLayer::new(category, features)
}
