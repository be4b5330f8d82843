//! Scene statistics for tooling.
//!
//! Enabled by the `diagnostics` feature flag. [`Scene::diagnostics_snapshot`]
//! collects a [`SceneStats`] and resets the per-frame counters, so hosts
//! typically take one snapshot per frame and ship or log it as JSON.
//!
//! [`Scene::diagnostics_snapshot`]: crate::ecs::Scene::diagnostics_snapshot

use serde::Serialize;

use crate::ecs::system::{Phase, SystemTiming};

#[derive(Clone, Debug, Serialize)]
pub struct SceneStats {
    pub label: String,
    pub capacity: usize,
    pub alive_count: usize,
    /// Rows ever handed out (live + free).
    pub total_slots: usize,
    pub free_count: usize,
    pub spawned_this_frame: u32,
    pub destroyed_this_frame: u32,
    pub pending_destroy: usize,
    /// In component id order.
    pub components: Vec<ComponentStats>,
    /// From the most recent run of each phase.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub system_timings: Vec<PhaseTiming>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ComponentStats {
    pub name: String,
    pub size_bytes: usize,
    pub live_count: usize,
    pub on_add_callbacks: usize,
    pub on_remove_callbacks: usize,
}

#[derive(Clone, Debug, Serialize)]
pub struct PhaseTiming {
    pub phase: Phase,
    #[serde(flatten)]
    pub timing: SystemTiming,
}

impl SceneStats {
    /// Share of handed-out rows currently sitting on the free list, in percent.
    pub fn fragmentation_pct(&self) -> f32 {
        if self.total_slots == 0 {
            0.0
        } else {
            self.free_count as f32 / self.total_slots as f32 * 100.0
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
