// This is the models module containing data structures shared with JavaScript
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    pub cached_categories: usize,
    pub cached_features: usize,
    pub total_requests: usize,
    pub hit_rate: f64,
}

/// One checkbox in a route category's sub-toggle list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubToggle {
    pub name: String,
    pub dom_id: String,
}
