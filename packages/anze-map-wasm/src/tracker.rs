use std::rc::Rc;

use geo_types::Point;

use crate::console_warn;
use crate::registry::LayerId;
use crate::surface::MapSurface;

/// Follows the device position and compass heading with a single marker.
///
/// Position and heading are independent: either can update while the other
/// is stale. Only the first fix recenters the map so later fixes never fight
/// the user's own panning.
pub struct PositionTracker<S: MapSurface> {
    surface: Rc<S>,
    marker: Option<LayerId>,
    position: Option<Point<f64>>,
    heading: f64,
    locate_zoom: u8,
}

impl<S: MapSurface> PositionTracker<S> {
    pub fn new(surface: Rc<S>, locate_zoom: u8) -> Self {
        Self {
            surface,
            marker: None,
            position: None,
            heading: 0.0,
            locate_zoom,
        }
    }

    pub fn on_position(&mut self, lat: f64, lng: f64) {
        let position = Point::new(lng, lat);
        match self.marker {
            Some(id) => self.surface.move_marker(id, position),
            None => {
                self.marker = Some(self.surface.add_user_marker(position, self.heading));
            }
        }
        if self.position.is_none() {
            self.surface.set_view(position, self.locate_zoom);
        }
        self.position = Some(position);
    }

    /// `alpha` is the compass heading in degrees clockwise from north;
    /// `None` (sensor without a value) keeps the last known rotation.
    pub fn on_orientation(&mut self, alpha: Option<f64>) {
        if let Some(alpha) = alpha.filter(|a| a.is_finite()) {
            self.heading = alpha.rem_euclid(360.0);
        }
        if let Some(id) = self.marker {
            self.surface.rotate_marker(id, self.heading);
        }
    }

    pub fn on_error(&self, message: &str) {
        console_warn!("GPS error: {}", message);
    }

    pub fn heading(&self) -> f64 {
        self.heading
    }

    pub fn position(&self) -> Option<Point<f64>> {
        self.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::testing::{Call, RecordingSurface};

    fn tracker() -> (PositionTracker<RecordingSurface>, Rc<RecordingSurface>) {
        let surface = Rc::new(RecordingSurface::default());
        (PositionTracker::new(surface.clone(), 16), surface)
    }

    #[test]
    fn first_fix_creates_marker_and_recenters_once() {
        let (mut t, surface) = tracker();
        t.on_position(45.62, 10.70);
        t.on_position(45.63, 10.71);
        t.on_position(45.64, 10.72);

        let calls = surface.calls.borrow();
        let adds = calls.iter().filter(|c| matches!(c, Call::AddUserMarker(..))).count();
        let views = calls.iter().filter(|c| matches!(c, Call::SetView(..))).count();
        let moves = calls.iter().filter(|c| matches!(c, Call::MoveMarker(..))).count();
        assert_eq!((adds, views, moves), (1, 1, 2));
        assert_eq!(calls[1], Call::SetView(Point::new(10.70, 45.62), 16));
        assert_eq!(t.position(), Some(Point::new(10.72, 45.64)));
    }

    #[test]
    fn heading_before_fix_is_applied_to_new_marker() {
        let (mut t, surface) = tracker();
        t.on_orientation(Some(90.0));
        assert!(surface.calls.borrow().is_empty());
        t.on_position(45.62, 10.70);
        assert!(matches!(surface.calls.borrow()[0], Call::AddUserMarker(_, h) if h == 90.0));
    }

    #[test]
    fn missing_heading_keeps_last_rotation() {
        let (mut t, surface) = tracker();
        t.on_position(45.62, 10.70);
        t.on_orientation(Some(370.0));
        t.on_orientation(None);
        assert_eq!(t.heading(), 10.0);
        let rotations: Vec<f64> = surface
            .calls
            .borrow()
            .iter()
            .filter_map(|c| match c {
                Call::RotateMarker(_, h) => Some(*h),
                _ => None,
            })
            .collect();
        assert_eq!(rotations, vec![10.0, 10.0]);
    }

    #[test]
    fn negative_heading_normalized() {
        let (mut t, _) = tracker();
        t.on_orientation(Some(-45.0));
        assert_eq!(t.heading(), 315.0);
    }
}
