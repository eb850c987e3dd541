use geo_types::{
    Coord, Geometry, GeometryCollection, LineString, MultiLineString, MultiPoint, MultiPolygon,
    Point, Polygon,
};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::{MapError, Result};

/// Optional attributes a feature may carry, in the order popups list them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Phone,
    Website,
    Menu,
    MapLink,
    Email,
    Hours,
    Notes,
    Icon,
    File,
    FullMap,
    Length,
    Elevation,
    Duration,
    AppLink,
}

/// Explicit record of the optional properties used by the widget.
///
/// Values are normalized while parsing: anything JavaScript would consider
/// falsy (`""`, `0`, `false`, `null`) is stored as `None`, so presence is a
/// plain `is_some()` check.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FeatureProperties {
    #[serde(deserialize_with = "truthy")]
    pub name: Option<String>,
    #[serde(deserialize_with = "truthy")]
    pub telefono: Option<String>,
    #[serde(deserialize_with = "truthy")]
    pub sito: Option<String>,
    #[serde(deserialize_with = "truthy")]
    pub menu: Option<String>,
    #[serde(deserialize_with = "truthy")]
    pub google: Option<String>,
    #[serde(deserialize_with = "truthy")]
    pub email: Option<String>,
    #[serde(deserialize_with = "truthy")]
    pub orari: Option<String>,
    #[serde(deserialize_with = "truthy")]
    pub note: Option<String>,
    #[serde(deserialize_with = "truthy")]
    pub icona: Option<String>,
    #[serde(deserialize_with = "truthy")]
    pub file: Option<String>,
    #[serde(deserialize_with = "truthy")]
    pub mappa: Option<String>,
    #[serde(deserialize_with = "truthy")]
    pub lunghezza: Option<String>,
    #[serde(deserialize_with = "truthy")]
    pub dislivello: Option<String>,
    #[serde(deserialize_with = "truthy")]
    pub tempo: Option<String>,
    #[serde(deserialize_with = "truthy")]
    pub app: Option<String>,
}

impl FeatureProperties {
    pub fn get(&self, field: Field) -> Option<&str> {
        let value = match field {
            Field::Name => &self.name,
            Field::Phone => &self.telefono,
            Field::Website => &self.sito,
            Field::Menu => &self.menu,
            Field::MapLink => &self.google,
            Field::Email => &self.email,
            Field::Hours => &self.orari,
            Field::Notes => &self.note,
            Field::Icon => &self.icona,
            Field::File => &self.file,
            Field::FullMap => &self.mappa,
            Field::Length => &self.lunghezza,
            Field::Elevation => &self.dislivello,
            Field::Duration => &self.tempo,
            Field::AppLink => &self.app,
        };
        value.as_deref()
    }

    pub fn has(&self, field: Field) -> bool {
        self.get(field).is_some()
    }
}

// JS truthiness: strings must be non-empty, numbers non-zero.
fn truthy<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) if !s.is_empty() => Some(s),
        Some(Value::Number(n)) if n.as_f64().map_or(true, |v| v != 0.0) => Some(n.to_string()),
        Some(Value::Bool(true)) => Some("true".to_string()),
        _ => None,
    })
}

/// One geospatial entity: optional geometry plus its properties.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub geometry: Option<Geometry<f64>>,
    pub properties: FeatureProperties,
}

impl Feature {
    pub fn name(&self) -> Option<&str> {
        self.properties.get(Field::Name)
    }
}

/// Parsed contents of one category's data resource.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(try_from = "RawFeatureCollection")]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// First feature whose name matches exactly.
    pub fn find_by_name(&self, name: &str) -> Option<&Feature> {
        self.features.iter().find(|f| f.name() == Some(name))
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

// Wire structures, converted into geo-types after deserialization

#[derive(Deserialize)]
struct RawFeatureCollection {
    #[serde(default)]
    features: Vec<RawFeature>,
}

#[derive(Deserialize)]
struct RawFeature {
    #[serde(default)]
    geometry: Option<RawGeometry>,
    #[serde(default)]
    properties: Option<FeatureProperties>,
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum RawGeometry {
    Point { coordinates: Vec<f64> },
    MultiPoint { coordinates: Vec<Vec<f64>> },
    LineString { coordinates: Vec<Vec<f64>> },
    MultiLineString { coordinates: Vec<Vec<Vec<f64>>> },
    Polygon { coordinates: Vec<Vec<Vec<f64>>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Vec<f64>>>> },
    GeometryCollection { geometries: Vec<RawGeometry> },
}

impl TryFrom<RawFeatureCollection> for FeatureCollection {
    type Error = MapError;

    fn try_from(raw: RawFeatureCollection) -> Result<Self> {
        let features = raw
            .features
            .into_iter()
            .map(|f| {
                Ok(Feature {
                    geometry: f.geometry.map(Geometry::try_from).transpose()?,
                    properties: f.properties.unwrap_or_default(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(FeatureCollection { features })
    }
}

fn coord(position: &[f64]) -> Result<Coord<f64>> {
    match position {
        // Anything past lng/lat (elevation, time) is dropped
        [x, y, ..] => Ok(Coord { x: *x, y: *y }),
        _ => Err(MapError::InvalidGeometry(format!(
            "position needs at least 2 ordinates, got {}",
            position.len()
        ))),
    }
}

fn line(positions: &[Vec<f64>]) -> Result<LineString<f64>> {
    positions
        .iter()
        .map(|p| coord(p))
        .collect::<Result<Vec<_>>>()
        .map(LineString::new)
}

fn polygon(rings: &[Vec<Vec<f64>>]) -> Result<Polygon<f64>> {
    let mut rings = rings.iter().map(|r| line(r));
    let exterior = rings
        .next()
        .transpose()?
        .ok_or_else(|| MapError::InvalidGeometry("polygon without exterior ring".to_string()))?;
    let interiors = rings.collect::<Result<Vec<_>>>()?;
    Ok(Polygon::new(exterior, interiors))
}

impl TryFrom<RawGeometry> for Geometry<f64> {
    type Error = MapError;

    fn try_from(raw: RawGeometry) -> Result<Self> {
        Ok(match raw {
            RawGeometry::Point { coordinates } => Geometry::Point(Point::from(coord(&coordinates)?)),
            RawGeometry::MultiPoint { coordinates } => Geometry::MultiPoint(MultiPoint::new(
                coordinates
                    .iter()
                    .map(|p| coord(p).map(Point::from))
                    .collect::<Result<Vec<_>>>()?,
            )),
            RawGeometry::LineString { coordinates } => Geometry::LineString(line(&coordinates)?),
            RawGeometry::MultiLineString { coordinates } => Geometry::MultiLineString(
                MultiLineString::new(coordinates.iter().map(|l| line(l)).collect::<Result<_>>()?),
            ),
            RawGeometry::Polygon { coordinates } => Geometry::Polygon(polygon(&coordinates)?),
            RawGeometry::MultiPolygon { coordinates } => Geometry::MultiPolygon(MultiPolygon::new(
                coordinates.iter().map(|p| polygon(p)).collect::<Result<_>>()?,
            )),
            RawGeometry::GeometryCollection { geometries } => {
                Geometry::GeometryCollection(GeometryCollection(
                    geometries
                        .into_iter()
                        .map(Geometry::try_from)
                        .collect::<Result<Vec<_>>>()?,
                ))
            }
        })
    }
}

fn position(c: Coord<f64>) -> Value {
    serde_json::json!([c.x, c.y])
}

fn ring(l: &LineString<f64>) -> Value {
    Value::Array(l.coords().map(|c| position(*c)).collect())
}

fn polygon_rings(p: &Polygon<f64>) -> Value {
    let mut rings = vec![ring(p.exterior())];
    rings.extend(p.interiors().iter().map(ring));
    Value::Array(rings)
}

/// Serialize a geometry back to a GeoJSON geometry object for the JS renderer.
pub fn geometry_to_geojson(geometry: &Geometry<f64>) -> Value {
    use serde_json::json;
    match geometry {
        Geometry::Point(p) => json!({ "type": "Point", "coordinates": position(p.0) }),
        Geometry::MultiPoint(mp) => json!({
            "type": "MultiPoint",
            "coordinates": mp.iter().map(|p| position(p.0)).collect::<Vec<_>>()
        }),
        Geometry::LineString(l) => json!({ "type": "LineString", "coordinates": ring(l) }),
        Geometry::MultiLineString(ml) => json!({
            "type": "MultiLineString",
            "coordinates": ml.iter().map(ring).collect::<Vec<_>>()
        }),
        Geometry::Polygon(p) => json!({ "type": "Polygon", "coordinates": polygon_rings(p) }),
        Geometry::MultiPolygon(mp) => json!({
            "type": "MultiPolygon",
            "coordinates": mp.iter().map(polygon_rings).collect::<Vec<_>>()
        }),
        Geometry::GeometryCollection(gc) => json!({
            "type": "GeometryCollection",
            "geometries": gc.iter().map(geometry_to_geojson).collect::<Vec<_>>()
        }),
        // Not produced by the parser; rendered as their polygon equivalents
        Geometry::Line(l) => geometry_to_geojson(&Geometry::LineString(LineString::from(*l))),
        Geometry::Rect(r) => geometry_to_geojson(&Geometry::Polygon(r.to_polygon())),
        Geometry::Triangle(t) => geometry_to_geojson(&Geometry::Polygon(t.to_polygon())),
    }
}
