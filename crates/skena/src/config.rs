//! Scene construction settings.
//!
//! ```ignore
//! let config = SceneConfig::from_json(r#"{ "label": "level_1", "capacity": 2048 }"#)?;
//! let scene = Scene::with_config(config);
//! ```

use serde::Deserialize;

/// Default entity capacity of a scene.
pub const MAX_ENTITIES: usize = 10_000;

/// Settings fixed for the lifetime of a [`Scene`](crate::ecs::Scene).
///
/// Every field is optional in JSON; missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SceneConfig {
    /// Maximum number of live entities. Every component pool is allocated
    /// for this many slots up front.
    pub capacity: usize,
    /// Name used in log lines and diagnostics.
    pub label: String,
}

impl SceneConfig {
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Parse a config from JSON.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            capacity: MAX_ENTITIES,
            label: "scene".to_string(),
        }
    }
}
