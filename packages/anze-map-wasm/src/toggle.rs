//! Toggle state machine.
//!
//! Keeps checkbox state, cached data and attached layers consistent while the
//! user flips master and sub toggles in any order. Every transition is a
//! synchronous method; anything that needs the network returns a `Fetch`
//! step carrying a [`Generation`], and the matching `complete_*` call applies
//! the result only if no later transition has superseded it.

use std::collections::HashMap;
use std::rc::Rc;

use crate::cache_keys::make_sub_toggle_id;
use crate::cache_manager::LayerCache;
use crate::cancellation::{Generation, GenerationManager};
use crate::category::{Category, CategoryCatalog};
use crate::error::{MapError, Result};
use crate::geojson_features::{FeatureCollection, Field};
use crate::mapper::{map_poi, map_route_detail, map_route_index, VisualLayer};
use crate::models::{CacheStats, SubToggle};
use crate::registry::{ActiveLayerRegistry, ToggleKey};
use crate::surface::MapSurface;
use crate::{console_log, console_warn};

const UNNAMED_ROUTE: &str = "Percorso";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToggleState {
    #[default]
    Hidden,
    Loading,
    Shown,
}

/// Outcome of checking a master toggle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MasterStep {
    /// Served from cache; already applied.
    Ready,
    Fetch {
        resource: String,
        generation: Generation,
    },
}

/// Outcome of checking a sub-toggle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubStep {
    /// Rendered from the index geometry.
    Shown,
    /// Needs the feature's detail file.
    Fetch {
        resource: String,
        generation: Generation,
    },
    /// Already loading or shown; nothing to do.
    AlreadyActive,
    /// No cached index or no feature by that name; the checkbox stays
    /// checked with nothing drawn.
    Unresolved,
}

pub struct ToggleMachine<S: MapSurface> {
    catalog: CategoryCatalog,
    cache: LayerCache,
    registry: ActiveLayerRegistry,
    generations: GenerationManager,
    states: HashMap<ToggleKey, ToggleState>,
    sub_toggles: HashMap<String, Vec<SubToggle>>,
    surface: Rc<S>,
}

impl<S: MapSurface> ToggleMachine<S> {
    pub fn new(catalog: CategoryCatalog, surface: Rc<S>) -> Self {
        Self {
            catalog,
            cache: LayerCache::new(),
            registry: ActiveLayerRegistry::new(),
            generations: GenerationManager::new(),
            states: HashMap::new(),
            sub_toggles: HashMap::new(),
            surface,
        }
    }

    fn category(&self, key: &str) -> Result<Category> {
        self.catalog
            .get(key)
            .cloned()
            .ok_or_else(|| MapError::UnknownCategory(key.to_string()))
    }

    pub fn catalog(&self) -> &CategoryCatalog {
        &self.catalog
    }

    pub fn state(&self, key: &ToggleKey) -> ToggleState {
        self.states.get(key).copied().unwrap_or_default()
    }

    pub fn sub_toggles(&self, category: &str) -> &[SubToggle] {
        self.sub_toggles
            .get(category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn registry(&self) -> &ActiveLayerRegistry {
        &self.registry
    }

    pub fn cached(&self, category: &str) -> Option<&FeatureCollection> {
        self.cache.peek(category)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Drop the cached collection so the next master-on refetches it.
    pub fn reload(&mut self, category: &str) -> Result<bool> {
        self.category(category)?;
        Ok(self.cache.invalidate(category))
    }

    // Attach `layer` for `key`, detaching whatever the key owned before.
    fn attach(&mut self, key: ToggleKey, layer: &VisualLayer, fit: bool) {
        let id = self.surface.add_layer(layer);
        if let Some(previous) = self.registry.insert(key.clone(), id) {
            self.surface.remove_layer(previous);
        }
        if fit {
            if let Some(bounds) = layer.bounds {
                self.surface.fit_bounds(bounds);
            }
        }
        self.states.insert(key, ToggleState::Shown);
    }

    fn detach(&mut self, key: &ToggleKey) -> bool {
        self.states.remove(key);
        match self.registry.remove(key) {
            Some(id) => {
                self.surface.remove_layer(id);
                true
            }
            None => false,
        }
    }

    // One entry per distinct name, in index order. Later duplicates would
    // share the same toggle identity, so they are collapsed into the first.
    fn populate_sub_toggles(&mut self, category: &str) {
        let Some(data) = self.cache.get(category) else {
            return;
        };
        let mut entries: Vec<SubToggle> = Vec::with_capacity(data.len());
        for feature in &data.features {
            let name = feature.name().unwrap_or(UNNAMED_ROUTE);
            if entries.iter().any(|e| e.name == name) {
                console_warn!("Duplicate route name '{}' in {}, keeping the first", name, category);
                continue;
            }
            entries.push(SubToggle {
                name: name.to_string(),
                dom_id: make_sub_toggle_id(category, name),
            });
        }
        self.sub_toggles.insert(category.to_string(), entries);
    }

    // Effect of master data becoming available while the master is current.
    fn apply_master(&mut self, category: &Category) {
        let key = ToggleKey::master(&category.key);
        if category.is_route() {
            self.populate_sub_toggles(&category.key);
            self.states.insert(key, ToggleState::Shown);
        } else if let Some(data) = self.cache.get(&category.key) {
            let layer = map_poi(category, data);
            self.attach(key, &layer, false);
        }
    }

    pub fn master_on(&mut self, category: &str) -> Result<MasterStep> {
        let cat = self.category(category)?;
        let key = ToggleKey::master(category);
        let generation = self.generations.begin(&key);

        if self.cache.get(category).is_some() {
            self.apply_master(&cat);
            return Ok(MasterStep::Ready);
        }

        self.states.insert(key, ToggleState::Loading);
        console_log!("Fetching {} for {}", cat.resource, category);
        Ok(MasterStep::Fetch {
            resource: cat.resource,
            generation,
        })
    }

    /// Store a finished master fetch and apply it if still wanted.
    /// Returns whether the result reached the map/UI.
    pub fn complete_master(
        &mut self,
        category: &str,
        generation: Generation,
        result: Result<FeatureCollection>,
    ) -> Result<bool> {
        let cat = self.category(category)?;
        let key = ToggleKey::master(category);
        let current = self.generations.is_current(&key, generation);

        match result {
            Ok(data) => {
                // Cached even when stale: the data itself is still valid
                self.cache.put(category, data);
                if !current {
                    console_log!("Discarding stale response for {}", category);
                    return Ok(false);
                }
                self.apply_master(&cat);
                Ok(true)
            }
            Err(e) => {
                console_warn!("Could not load {}: {}", cat.resource, e);
                if current {
                    self.states.remove(&key);
                }
                Ok(false)
            }
        }
    }

    /// Uncheck a master: every layer of the category goes away and the
    /// sub-toggle list is cleared. Returns the number of layers removed.
    pub fn master_off(&mut self, category: &str) -> Result<usize> {
        self.category(category)?;
        self.generations.cancel_category(category);
        let removed = self.registry.remove_category(category);
        for id in &removed {
            self.surface.remove_layer(*id);
        }
        self.states.retain(|k, _| !k.belongs_to(category));
        self.sub_toggles.remove(category);
        Ok(removed.len())
    }

    pub fn sub_on(&mut self, category: &str, name: &str) -> Result<SubStep> {
        let cat = self.category(category)?;
        let key = ToggleKey::sub(category, name);
        if self.state(&key) != ToggleState::Hidden {
            return Ok(SubStep::AlreadyActive);
        }

        let Some(feature) = self
            .cache
            .get(category)
            .and_then(|data| data.find_by_name(name))
            .cloned()
        else {
            console_warn!("No cached route '{}' in {}", name, category);
            return Ok(SubStep::Unresolved);
        };

        if let Some(file) = feature.properties.get(Field::File) {
            let generation = self.generations.begin(&key);
            self.states.insert(key, ToggleState::Loading);
            return Ok(SubStep::Fetch {
                resource: file.to_string(),
                generation,
            });
        }

        let layer = map_route_index(&cat, name, &feature);
        self.attach(key, &layer, true);
        Ok(SubStep::Shown)
    }

    pub fn complete_sub(
        &mut self,
        category: &str,
        name: &str,
        generation: Generation,
        result: Result<FeatureCollection>,
    ) -> Result<bool> {
        let cat = self.category(category)?;
        let key = ToggleKey::sub(category, name);
        if !self.generations.is_current(&key, generation) {
            console_log!("Discarding stale detail for {}", key);
            return Ok(false);
        }
        match result {
            Ok(detail) => {
                let layer = map_route_detail(&cat, name, &detail);
                self.attach(key, &layer, true);
                Ok(true)
            }
            Err(e) => {
                console_warn!("Could not load detail for {}: {}", key, e);
                self.states.remove(&key);
                Ok(false)
            }
        }
    }

    /// Uncheck a sub-toggle. Returns whether a layer was removed.
    pub fn sub_off(&mut self, category: &str, name: &str) -> Result<bool> {
        self.category(category)?;
        let key = ToggleKey::sub(category, name);
        self.generations.cancel(&key);
        Ok(self.detach(&key))
    }
}
