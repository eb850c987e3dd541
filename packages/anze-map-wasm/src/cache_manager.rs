use std::collections::HashMap;

use crate::geojson_features::FeatureCollection;
use crate::models::CacheStats;

/// Session-scoped store of fetched feature collections, keyed by category.
///
/// There is no eviction and no request deduplication: every completed fetch
/// is stored, so when two fetches for the same category overlap the last
/// response to arrive wins.
#[derive(Debug, Default)]
pub struct LayerCache {
    collections: HashMap<String, FeatureCollection>,
    hits: usize,
    misses: usize,
}

impl LayerCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, category: &str) -> Option<&FeatureCollection> {
        if self.collections.contains_key(category) {
            self.hits += 1;
            self.collections.get(category)
        } else {
            self.misses += 1;
            None
        }
    }

    /// Lookup without touching the hit/miss counters.
    pub fn peek(&self, category: &str) -> Option<&FeatureCollection> {
        self.collections.get(category)
    }

    pub fn put(&mut self, category: &str, data: FeatureCollection) {
        self.collections.insert(category.to_string(), data);
    }

    /// Forget a category so its next activation refetches.
    pub fn invalidate(&mut self, category: &str) -> bool {
        self.collections.remove(category).is_some()
    }

    pub fn len(&self) -> usize {
        self.collections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        let total_requests = self.hits + self.misses;
        let hit_rate = if total_requests > 0 {
            self.hits as f64 / total_requests as f64
        } else {
            0.0
        };
        CacheStats {
            cached_categories: self.collections.len(),
            cached_features: self.collections.values().map(|c| c.len()).sum(),
            total_requests,
            hit_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collection(names: &[&str]) -> FeatureCollection {
        let features = names
            .iter()
            .map(|n| format!(r#"{{"properties":{{"name":"{}"}}}}"#, n))
            .collect::<Vec<_>>()
            .join(",");
        FeatureCollection::from_json_str(&format!(r#"{{"features":[{}]}}"#, features)).unwrap()
    }

    #[test]
    fn last_put_wins() {
        let mut cache = LayerCache::new();
        cache.put("bici", collection(&["Primo"]));
        cache.put("bici", collection(&["Secondo", "Terzo"]));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.peek("bici").unwrap().len(), 2);
    }

    #[test]
    fn stats_track_hits_and_misses() {
        let mut cache = LayerCache::new();
        assert!(cache.get("bar").is_none());
        cache.put("bar", collection(&["Bar Lago"]));
        assert!(cache.get("bar").is_some());
        assert!(cache.get("bar").is_some());
        let stats = cache.stats();
        assert_eq!(stats.total_requests, 3);
        assert!((stats.hit_rate - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(stats.cached_features, 1);
    }

    #[test]
    fn invalidate_forces_refetch() {
        let mut cache = LayerCache::new();
        cache.put("piedi", collection(&["Anello"]));
        assert!(cache.invalidate("piedi"));
        assert!(!cache.invalidate("piedi"));
        assert!(cache.peek("piedi").is_none());
    }
}
