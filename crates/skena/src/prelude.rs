//! Common imports.
//!
//! ```ignore
//! use skena::prelude::*;
//! ```

pub use crate::config::SceneConfig;
pub use crate::ecs::{
    Child, EntityId, Name, Parent, Phase, Reaction, Scene, TransformHierarchy,
    propagate_transforms,
};
pub use crate::math::{Mat4, Quat, Transform, Vec2, Vec3};
