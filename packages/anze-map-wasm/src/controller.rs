use std::cell::RefCell;
use std::rc::Rc;

use crate::error::Result;
use crate::fetcher::GeoDataSource;
use crate::surface::MapSurface;
use crate::toggle::{MasterStep, SubStep, ToggleMachine};

/// Async driver around [`ToggleMachine`]. The machine is borrowed only
/// between awaits, so any number of toggle futures can be in flight on the
/// single-threaded executor at once.
pub struct LayerController<S: MapSurface, D: GeoDataSource> {
    machine: Rc<RefCell<ToggleMachine<S>>>,
    source: Rc<D>,
}

impl<S: MapSurface, D: GeoDataSource> Clone for LayerController<S, D> {
    fn clone(&self) -> Self {
        Self {
            machine: Rc::clone(&self.machine),
            source: Rc::clone(&self.source),
        }
    }
}

impl<S: MapSurface, D: GeoDataSource> LayerController<S, D> {
    pub fn new(machine: ToggleMachine<S>, source: D) -> Self {
        Self {
            machine: Rc::new(RefCell::new(machine)),
            source: Rc::new(source),
        }
    }

    pub fn machine(&self) -> &Rc<RefCell<ToggleMachine<S>>> {
        &self.machine
    }

    /// Handle a master checkbox change. Resolves once any fetch it started
    /// has completed (or been discarded).
    ///
    /// Returns `false` when the change left the category untouched: a fetch
    /// that was superseded before it landed, or one that failed. Callers
    /// must not redraw the sub-toggle list in that case.
    pub async fn set_master(&self, category: &str, checked: bool) -> Result<bool> {
        if !checked {
            self.machine.borrow_mut().master_off(category)?;
            return Ok(true);
        }

        let step = self.machine.borrow_mut().master_on(category)?;
        match step {
            MasterStep::Ready => Ok(true),
            MasterStep::Fetch {
                resource,
                generation,
            } => {
                let result = self.source.fetch(&resource).await;
                self.machine
                    .borrow_mut()
                    .complete_master(category, generation, result)
            }
        }
    }

    /// Handle a sub-toggle checkbox change.
    pub async fn set_sub(&self, category: &str, name: &str, checked: bool) -> Result<()> {
        if !checked {
            self.machine.borrow_mut().sub_off(category, name)?;
            return Ok(());
        }

        let step = self.machine.borrow_mut().sub_on(category, name)?;
        if let SubStep::Fetch {
            resource,
            generation,
        } = step
        {
            let result = self.source.fetch(&resource).await;
            self.machine
                .borrow_mut()
                .complete_sub(category, name, generation, result)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::CategoryCatalog;
    use crate::fetcher::testing::{ManualSource, StaticSource};
    use crate::mapper::VisualFeature;
    use crate::registry::ToggleKey;
    use crate::surface::testing::RecordingSurface;
    use futures::executor::{block_on, LocalPool};
    use futures::task::LocalSpawnExt;

    const INDEX: &str = r#"{"features":[{"properties":{"name":"Sentiero A","file":"a.geojson"}}]}"#;
    const DETAIL: &str = r#"{"features":[{"properties":{"name":"Sentiero A","lunghezza":"5km"},
        "geometry":{"type":"LineString","coordinates":[[10.60,45.50],[10.65,45.55]]}}]}"#;

    fn controller<D: GeoDataSource>(source: D) -> (LayerController<RecordingSurface, D>, Rc<RecordingSurface>) {
        let surface = Rc::new(RecordingSurface::default());
        let machine = ToggleMachine::new(CategoryCatalog::default(), surface.clone());
        (LayerController::new(machine, source), surface)
    }

    #[test]
    fn sentiero_a_scenario() {
        let source = StaticSource::default()
            .with("percorsi_piedi.geojson", INDEX)
            .with("a.geojson", DETAIL);
        let (ctl, surface) = controller(source);

        block_on(ctl.set_master("piedi", true)).unwrap();
        block_on(ctl.set_sub("piedi", "Sentiero A", true)).unwrap();

        assert_eq!(
            *ctl.source.requests.borrow(),
            vec!["percorsi_piedi.geojson".to_string(), "a.geojson".to_string()]
        );
        let layers = surface.layers.borrow();
        let layer = layers.values().next().unwrap();
        match &layer.features[0] {
            VisualFeature::Path { style, popup, .. } => {
                assert_eq!(style.color, "#22c55e");
                assert!(popup.contains("Sentiero A"));
                assert!(popup.contains("5km"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn cached_master_does_not_refetch() {
        let source = StaticSource::default().with("percorsi_bici.geojson", INDEX);
        let (ctl, _) = controller(source);
        block_on(ctl.set_master("bici", true)).unwrap();
        block_on(ctl.set_master("bici", false)).unwrap();
        block_on(ctl.set_master("bici", true)).unwrap();
        assert_eq!(ctl.source.requests.borrow().len(), 1);
        assert_eq!(ctl.machine().borrow().sub_toggles("bici").len(), 1);
    }

    #[test]
    fn failed_poi_fetch_shows_nothing() {
        let (ctl, surface) = controller(StaticSource::default());
        block_on(ctl.set_master("farmacia", true)).unwrap();
        assert_eq!(surface.attached(), 0);
        assert!(ctl.machine().borrow().cached("farmacia").is_none());
    }

    #[test]
    fn master_on_then_off_before_response() {
        let (ctl, surface) = controller(ManualSource::default());
        let mut pool = LocalPool::new();
        let on = ctl.clone();
        pool.spawner()
            .spawn_local(async move {
                on.set_master("piedi", true).await.unwrap();
            })
            .unwrap();
        pool.run_until_stalled();
        assert_eq!(ctl.source.pending(), 1);

        block_on(ctl.set_master("piedi", false)).unwrap();
        ctl.source.resolve_next(INDEX);
        pool.run_until_stalled();

        let machine = ctl.machine().borrow();
        assert!(machine.registry().is_empty());
        assert!(machine.sub_toggles("piedi").is_empty());
        assert_eq!(surface.attached(), 0);
    }

    #[test]
    fn master_off_while_detail_in_flight() {
        let (ctl, surface) = controller(ManualSource::default());
        let mut pool = LocalPool::new();

        let on = ctl.clone();
        pool.spawner()
            .spawn_local(async move { on.set_master("piedi", true).await.unwrap(); })
            .unwrap();
        pool.run_until_stalled();
        ctl.source.resolve_next(INDEX);
        pool.run_until_stalled();

        let sub = ctl.clone();
        pool.spawner()
            .spawn_local(async move { sub.set_sub("piedi", "Sentiero A", true).await.unwrap() })
            .unwrap();
        pool.run_until_stalled();
        assert_eq!(ctl.source.pending(), 1);

        block_on(ctl.set_master("piedi", false)).unwrap();
        assert_eq!(ctl.source.resolve_next(DETAIL), "a.geojson");
        pool.run_until_stalled();

        assert_eq!(surface.attached(), 0);
        assert!(ctl.machine().borrow().registry().is_empty());
    }

    #[test]
    fn double_click_two_fetches_last_wins() {
        let (ctl, _) = controller(ManualSource::default());
        let mut pool = LocalPool::new();
        for checked in [true, false, true] {
            let c = ctl.clone();
            pool.spawner()
                .spawn_local(async move { c.set_master("bici", checked).await.unwrap(); })
                .unwrap();
            pool.run_until_stalled();
        }
        assert_eq!(ctl.source.pending(), 2);

        ctl.source.resolve_next(r#"{"features":[{"properties":{"name":"Vecchio"}}]}"#);
        pool.run_until_stalled();
        ctl.source.resolve_next(INDEX);
        pool.run_until_stalled();

        let machine = ctl.machine().borrow();
        let cached = machine.cached("bici").unwrap();
        assert_eq!(cached.features[0].name(), Some("Sentiero A"));
        let names: Vec<&str> = machine.sub_toggles("bici").iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Sentiero A"]);
    }

    #[test]
    fn failed_detail_can_be_retried() {
        let (ctl, surface) = controller(ManualSource::default());
        let mut pool = LocalPool::new();
        let on = ctl.clone();
        pool.spawner()
            .spawn_local(async move { on.set_master("bici", true).await.unwrap(); })
            .unwrap();
        pool.run_until_stalled();
        ctl.source.resolve_next(INDEX);
        pool.run_until_stalled();

        for _ in 0..2 {
            let sub = ctl.clone();
            pool.spawner()
                .spawn_local(async move { sub.set_sub("bici", "Sentiero A", true).await.unwrap() })
                .unwrap();
            pool.run_until_stalled();
        }
        // Second activation while loading is a no-op
        assert_eq!(ctl.source.pending(), 1);
        ctl.source.fail_next();
        pool.run_until_stalled();
        assert_eq!(surface.attached(), 0);

        let sub = ctl.clone();
        pool.spawner()
            .spawn_local(async move { sub.set_sub("bici", "Sentiero A", true).await.unwrap() })
            .unwrap();
        pool.run_until_stalled();
        ctl.source.resolve_next(DETAIL);
        pool.run_until_stalled();
        assert_eq!(surface.attached(), 1);
    }

    #[test]
    fn late_stale_master_response_leaves_sub_layer_alone() {
        const TWO_ROUTES: &str = r#"{"features":[
            {"properties":{"name":"Sentiero A","file":"a.geojson"}},
            {"properties":{"name":"Anello Lago"},
             "geometry":{"type":"LineString","coordinates":[[10.61,45.60],[10.62,45.61]]}}]}"#;

        let (ctl, surface) = controller(ManualSource::default());
        let mut pool = LocalPool::new();
        let outcomes: Rc<RefCell<Vec<bool>>> = Rc::default();
        for checked in [true, false, true] {
            let c = ctl.clone();
            let outcomes = outcomes.clone();
            pool.spawner()
                .spawn_local(async move {
                    let applied = c.set_master("piedi", checked).await.unwrap();
                    outcomes.borrow_mut().push(applied);
                })
                .unwrap();
            pool.run_until_stalled();
        }
        assert_eq!(ctl.source.pending(), 2);
        // The off transition applies immediately
        assert_eq!(*outcomes.borrow(), vec![true]);

        ctl.source.resolve_newest(TWO_ROUTES);
        pool.run_until_stalled();
        assert_eq!(*outcomes.borrow(), vec![true, true]);

        block_on(ctl.set_sub("piedi", "Anello Lago", true)).unwrap();
        assert_eq!(surface.attached(), 1);

        ctl.source.resolve_next(r#"{"features":[{"properties":{"name":"Vecchio"}}]}"#);
        pool.run_until_stalled();
        assert_eq!(*outcomes.borrow(), vec![true, true, false]);

        let machine = ctl.machine().borrow();
        assert!(machine.registry().contains(&ToggleKey::sub("piedi", "Anello Lago")));
        assert_eq!(surface.attached(), 1);
        let names: Vec<&str> = machine.sub_toggles("piedi").iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Sentiero A", "Anello Lago"]);
    }

    #[test]
    fn cached_master_reports_applied() {
        let source = StaticSource::default().with("percorsi_bici.geojson", INDEX);
        let (ctl, _) = controller(source);
        assert!(block_on(ctl.set_master("bici", true)).unwrap());
        assert!(block_on(ctl.set_master("bici", false)).unwrap());
        assert!(block_on(ctl.set_master("bici", true)).unwrap());
    }

    #[test]
    fn failed_master_fetch_reports_not_applied() {
        let (ctl, _) = controller(StaticSource::default());
        assert!(!block_on(ctl.set_master("bici", true)).unwrap());
    }
}
