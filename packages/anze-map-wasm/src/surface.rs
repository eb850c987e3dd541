use geo_types::{Point, Rect};

use crate::mapper::VisualLayer;
use crate::registry::LayerId;

/// The map the widget draws on. Implemented over the JS map library in the
/// browser and by a recording fake in tests.
///
/// Methods take `&self`: the surface is shared between the toggle machine
/// and the position tracker, and implementations keep their own interior
/// state.
pub trait MapSurface {
    fn add_layer(&self, layer: &VisualLayer) -> LayerId;
    fn remove_layer(&self, id: LayerId);
    fn fit_bounds(&self, bounds: Rect<f64>);
    /// Recenter; `position` is x = longitude, y = latitude.
    fn set_view(&self, position: Point<f64>, zoom: u8);
    fn add_user_marker(&self, position: Point<f64>, heading: f64) -> LayerId;
    fn move_marker(&self, id: LayerId, position: Point<f64>);
    fn rotate_marker(&self, id: LayerId, heading: f64);
}
