//! # Query — Mask-Filtered Views Over Live Entities
//!
//! A view is built from a [`ComponentSet`] (a tuple of component types, or
//! `()` for "every live entity"). The set is turned into a target mask once;
//! iteration is then a forward scan of the entity table.
//!
//! ```text
//! scene.view::<(Transform, Velocity)>()
//!
//! 1. target = bit(Transform) | bit(Velocity)
//! 2. for slot in 0..rows:
//!      row.id valid && row.mask ⊇ target  → yield row.id
//! ```
//!
//! Iteration order is ascending slot index. There is no snapshot: entities
//! created or destroyed during a scan are simply seen or not seen depending
//! on where the scan is.
//!
//! [`View`] borrows the scene, so the borrow checker rules out structural
//! changes mid-loop. Systems that need to mutate while scanning use the
//! detached [`ViewCursor`], or queue destructions with
//! [`Scene::defer_destroy`](super::scene::Scene::defer_destroy).

use super::component::Component;
use super::entity::{EntityId, EntityRow};
use super::mask::ComponentMask;
use super::scene::Scene;

/// A compile-time set of component types.
///
/// Implemented for `()` and tuples of up to eight components.
pub trait ComponentSet {
    /// Target mask for this set in `scene`, or `None` if a member type has
    /// never been registered there (so no entity can match).
    fn mask(scene: &Scene) -> Option<ComponentMask>;

    /// Register every member type with `scene`.
    fn register(scene: &mut Scene);
}

impl ComponentSet for () {
    fn mask(_scene: &Scene) -> Option<ComponentMask> {
        Some(ComponentMask::EMPTY)
    }

    fn register(_scene: &mut Scene) {}
}

macro_rules! impl_component_set {
    ($($T:ident),+) => {
        impl<$($T: Component),+> ComponentSet for ($($T,)+) {
            fn mask(scene: &Scene) -> Option<ComponentMask> {
                let mut mask = ComponentMask::EMPTY;
                $(mask.set(scene.component_id::<$T>()?.index());)+
                Some(mask)
            }

            fn register(scene: &mut Scene) {
                $(scene.register_component::<$T>();)+
            }
        }
    };
}

impl_component_set!(A);
impl_component_set!(A, B);
impl_component_set!(A, B, C);
impl_component_set!(A, B, C, D);
impl_component_set!(A, B, C, D, E);
impl_component_set!(A, B, C, D, E, F);
impl_component_set!(A, B, C, D, E, F, G);
impl_component_set!(A, B, C, D, E, F, G, H);

/// Scan `rows` from `start` for the first live row matching `target`.
#[inline]
fn scan(rows: &[EntityRow], start: usize, target: ComponentMask) -> Option<(usize, EntityId)> {
    rows.get(start..)?
        .iter()
        .position(|row| row.id.is_valid() && row.mask.is_superset_of(target))
        .map(|offset| (start + offset, rows[start + offset].id))
}

/// Lazy iterator over the entities matching a [`ComponentSet`].
pub struct View<'s> {
    rows: &'s [EntityRow],
    target: Option<ComponentMask>,
    position: usize,
}

impl<'s> View<'s> {
    pub(crate) fn new<Q: ComponentSet>(scene: &'s Scene) -> Self {
        Self {
            rows: scene.rows(),
            target: Q::mask(scene),
            position: 0,
        }
    }
}

impl Iterator for View<'_> {
    type Item = EntityId;

    fn next(&mut self) -> Option<EntityId> {
        let target = self.target?;
        let (slot, id) = scan(self.rows, self.position, target)?;
        self.position = slot + 1;
        Some(id)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.rows.len().saturating_sub(self.position)))
    }
}

/// A view that does not hold a borrow of the scene.
///
/// Each [`advance`](Self::advance) repeats the forward scan from the current
/// position against the scene as it is *now*, so the caller may assign,
/// remove or destroy between steps. Slots that stop matching are skipped;
/// mutating the same component set while scanning it gives no ordering
/// guarantees beyond "each slot is visited at most once".
///
/// If a member type is not registered yet when the cursor is created, the
/// target mask is resolved again on each step until it is.
#[derive(Clone, Copy, Debug)]
pub struct ViewCursor {
    target: Option<ComponentMask>,
    resolve: fn(&Scene) -> Option<ComponentMask>,
    position: usize,
}

impl ViewCursor {
    pub(crate) fn new<Q: ComponentSet>(scene: &Scene) -> Self {
        Self {
            target: Q::mask(scene),
            resolve: Q::mask,
            position: 0,
        }
    }

    pub fn advance(&mut self, scene: &Scene) -> Option<EntityId> {
        if self.target.is_none() {
            self.target = (self.resolve)(scene);
        }
        let target = self.target?;
        let (slot, id) = scan(scene.rows(), self.position, target)?;
        self.position = slot + 1;
        Some(id)
    }
}
