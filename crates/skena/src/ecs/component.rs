//! # Component — Type Descriptors and the Per-Scene Registry
//!
//! Component pools are untyped byte arenas, so every pool carries a
//! [`ComponentInfo`]: the `TypeId`, the type name for diagnostics, the memory
//! layout, and a `drop` function pointer that can destroy an instance given
//! only its address.
//!
//! ## Component Ids
//!
//! Each scene owns a [`ComponentRegistry`] that hands out small dense
//! [`ComponentId`]s in registration order. The id doubles as the bit position
//! in [`ComponentMask`](super::mask::ComponentMask) and as the index of the
//! pool in the scene. [`Name`] is always registered first and gets id 0.
//!
//! ```text
//! registry: { Name → 0, Transform → 1, Velocity → 2 }
//! pools:    [Pool<Name>, Pool<Transform>, Pool<Velocity>]
//! mask:     0b101   ← Name + Velocity
//! ```

use std::alloc::Layout;
use std::any::TypeId;
use std::collections::HashMap;

use super::mask::MAX_COMPONENTS;

/// Marker for types that can be stored in a scene.
///
/// Blanket-implemented for every `'static` type.
pub trait Component: 'static {}

impl<T: 'static> Component for T {}

/// Dense per-scene index of a component type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(pub(crate) u32);

impl ComponentId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Type-erased description of a component type.
#[derive(Clone, Copy, Debug)]
pub struct ComponentInfo {
    pub type_id: TypeId,
    pub name: &'static str,
    pub layout: Layout,
    /// Destroys the value at the given address in place.
    pub drop: unsafe fn(*mut u8),
}

impl ComponentInfo {
    pub fn of<T: Component>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
            layout: Layout::new::<T>(),
            drop: drop_ptr::<T>,
        }
    }

    /// Type name without the module path (e.g. `skena::math::Transform` →
    /// `Transform`).
    pub fn short_name(&self) -> &'static str {
        short_type_name(self.name)
    }
}

/// # Safety
///
/// `ptr` must point to a valid, initialized `T` that is not used afterwards.
unsafe fn drop_ptr<T>(ptr: *mut u8) {
    unsafe { std::ptr::drop_in_place(ptr.cast::<T>()) }
}

/// Maps component `TypeId`s to dense [`ComponentId`]s.
#[derive(Default)]
pub(crate) struct ComponentRegistry {
    ids: HashMap<TypeId, ComponentId>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn lookup<T: Component>(&self) -> Option<ComponentId> {
        self.ids.get(&TypeId::of::<T>()).copied()
    }

    /// Returns the id for `info`, and whether it was newly assigned.
    ///
    /// # Panics
    ///
    /// Panics when more than [`MAX_COMPONENTS`] types are registered.
    pub fn register(&mut self, info: &ComponentInfo) -> (ComponentId, bool) {
        if let Some(&id) = self.ids.get(&info.type_id) {
            return (id, false);
        }
        let next = self.ids.len();
        assert!(
            next < MAX_COMPONENTS,
            "Cannot register component `{}`: scene already has {MAX_COMPONENTS} component types",
            info.name
        );
        let id = ComponentId(next as u32);
        self.ids.insert(info.type_id, id);
        (id, true)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.ids.len()
    }
}

/// Human-readable label every entity gets on creation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Name(pub String);

impl Name {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

pub(crate) fn short_type_name(full: &str) -> &str {
    // Generic parameters may contain `::` too; only strip the outer path.
    let head = full.split('<').next().unwrap_or(full);
    let start = head.rfind("::").map(|i| i + 2).unwrap_or(0);
    &full[start..]
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Position;
    struct Velocity;

    #[test]
    fn ids_follow_registration_order() {
        let mut registry = ComponentRegistry::new();
        let (p, new_p) = registry.register(&ComponentInfo::of::<Position>());
        let (v, new_v) = registry.register(&ComponentInfo::of::<Velocity>());
        assert_eq!((p.index(), v.index()), (0, 1));
        assert!(new_p && new_v);

        let (again, new_again) = registry.register(&ComponentInfo::of::<Position>());
        assert_eq!(again, p);
        assert!(!new_again);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.lookup::<Velocity>(), Some(v));
        assert_eq!(registry.lookup::<u8>(), None);
    }

    #[test]
    fn info_describes_type() {
        let info = ComponentInfo::of::<u64>();
        assert_eq!(info.type_id, TypeId::of::<u64>());
        assert_eq!(info.layout.size(), 8);
        assert_eq!(info.short_name(), "u64");
    }

    #[test]
    fn short_name_strips_module_path() {
        assert_eq!(short_type_name("skena::math::Transform"), "Transform");
        assert_eq!(short_type_name("Transform"), "Transform");
        assert_eq!(
            short_type_name("alloc::vec::Vec<skena::ecs::EntityId>"),
            "Vec<skena::ecs::EntityId>"
        );
    }

    #[test]
    #[should_panic(expected = "already has 64 component types")]
    fn too_many_components_panics() {
        let mut registry = ComponentRegistry::new();
        for _ in 0..=MAX_COMPONENTS {
            // Fake distinct types by varying the TypeId of arrays of different lengths.
            let info = ComponentInfo {
                type_id: next_type_id(&registry),
                ..ComponentInfo::of::<u8>()
            };
            registry.register(&info);
        }
    }

    fn next_type_id(registry: &ComponentRegistry) -> TypeId {
        macro_rules! ids {
            ($($n:literal)*) => { [$(TypeId::of::<[u8; $n]>()),*] };
        }
        let all = ids!(0 1 2 3 4 5 6 7 8 9 10 11 12 13 14 15 16 17 18 19 20 21 22 23 24 25 26 27
            28 29 30 31 32 33 34 35 36 37 38 39 40 41 42 43 44 45 46 47 48 49 50 51 52 53 54 55
            56 57 58 59 60 61 62 63 64);
        all[registry.len()]
    }
}
