//! # Skena — Entity–Component Scene Store
//!
//! Generational entity ids, fixed-capacity type-erased component pools,
//! bitmask views, reactive component callbacks, phased systems and a
//! parent/child transform hierarchy.
//!
//! Start with `use skena::prelude::*` and create a [`Scene`](ecs::Scene).

pub mod config;
pub mod ecs;
pub mod math;
pub mod prelude;

#[cfg(feature = "diagnostics")]
pub mod diag;
