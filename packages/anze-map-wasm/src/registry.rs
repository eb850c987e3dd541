use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of one user-controllable filter: a whole category (master) or a
/// single named feature within it (sub-toggle).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ToggleKey {
    pub category: String,
    pub feature: Option<String>,
}

impl ToggleKey {
    pub fn master(category: &str) -> Self {
        Self {
            category: category.to_string(),
            feature: None,
        }
    }

    pub fn sub(category: &str, feature: &str) -> Self {
        Self {
            category: category.to_string(),
            feature: Some(feature.to_string()),
        }
    }

    pub fn belongs_to(&self, category: &str) -> bool {
        self.category == category
    }
}

impl fmt::Display for ToggleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.feature {
            Some(name) => write!(f, "{}_{}", self.category, name),
            None => f.write_str(&self.category),
        }
    }
}

/// Handle of a layer attached to the map surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LayerId(pub u32);

/// Which rendered layer each toggle currently owns. At most one per key.
#[derive(Debug, Default)]
pub struct ActiveLayerRegistry {
    layers: HashMap<ToggleKey, LayerId>,
}

impl ActiveLayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `layer` as owned by `key`, returning the layer it replaces.
    /// The caller is responsible for detaching the replaced layer.
    pub fn insert(&mut self, key: ToggleKey, layer: LayerId) -> Option<LayerId> {
        self.layers.insert(key, layer)
    }

    pub fn remove(&mut self, key: &ToggleKey) -> Option<LayerId> {
        self.layers.remove(key)
    }

    /// Drop every layer owned by the category, master and sub-toggles alike.
    pub fn remove_category(&mut self, category: &str) -> Vec<LayerId> {
        let keys: Vec<ToggleKey> = self
            .layers
            .keys()
            .filter(|k| k.belongs_to(category))
            .cloned()
            .collect();
        keys.iter().filter_map(|k| self.layers.remove(k)).collect()
    }

    pub fn contains(&self, key: &ToggleKey) -> bool {
        self.layers.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}
