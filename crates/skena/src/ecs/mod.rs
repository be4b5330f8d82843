//! # Entity–Component Scene Store
//!
//! Entities are generational slot indices; each component type lives in its
//! own fixed-capacity arena indexed by that slot; a per-entity bitmask says
//! which arenas hold a live value for the slot.
//!
//! ## Module Overview
//!
//! - [`entity`] — Packed generational ids and the slot table
//! - [`mask`] — Component bitset
//! - [`component`] — Type descriptors, per-scene id registry, `Name`
//! - [`pool`] — Type-erased fixed-capacity component arena
//! - [`scene`] — Central container (entities + components + systems)
//! - [`query`] — Mask-filtered views
//! - [`system`] — Phases, system trait, reactive callbacks
//! - [`hierarchy`] — Parent/child links and transform propagation

pub mod component;
pub mod entity;
pub mod hierarchy;
pub mod mask;
pub(crate) mod pool;
pub mod query;
pub mod scene;
pub mod system;

pub use component::{Component, ComponentId, ComponentInfo, Name};
pub use entity::EntityId;
pub use hierarchy::{Child, Parent, TransformHierarchy, propagate_transforms};
pub use mask::{ComponentMask, MAX_COMPONENTS};
pub use query::{ComponentSet, View, ViewCursor};
pub use scene::Scene;
pub use system::{Phase, Reaction, ReactiveFn, Schedule, System};
