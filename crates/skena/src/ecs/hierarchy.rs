//! # Entity Hierarchies — Parent/Child Links and Transform Propagation
//!
//! Children of an entity form an intrusive doubly-linked list threaded
//! through their [`Child`] components. The parent only stores the head and
//! the count in its [`Parent`] component.
//!
//! ```text
//!   root: Parent { child_count: 3, first_child: c }
//!
//!   c ◀──▶ b ◀──▶ a        (newest child first)
//!   Child { parent: root, prev, next }
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! TransformHierarchy::install(&mut scene);
//!
//! let root = scene.new_entity("root");
//! scene.assign_with(root, Transform::from_xyz(5.0, 0.0, 0.0));
//! let arm = scene.new_entity("arm");
//! scene.assign_with(arm, Transform::from_xyz(1.0, 0.0, 0.0));
//! scene.set_parent(arm, root);
//!
//! scene.simulate_scene(dt);
//! // arm's world translation is now (6, 0, 0)
//! ```
//!
//! ## Cleanup
//!
//! Links are kept consistent by OnRemove hooks on both components, so
//! destroying an entity in the middle of a tree is always safe: a destroyed
//! child is unlinked from its parent, and the children of a destroyed parent
//! become roots. Use [`Scene::destroy_recursive`] to take a whole subtree
//! down instead.

use super::entity::EntityId;
use super::scene::Scene;
use super::system::{Phase, Reaction};
use crate::math::{Mat4, Transform};

/// Present on every entity that has at least one child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parent {
    pub child_count: u32,
    pub first_child: EntityId,
}

impl Default for Parent {
    fn default() -> Self {
        Self {
            child_count: 0,
            first_child: EntityId::INVALID,
        }
    }
}

/// Link of a child into its parent's sibling list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Child {
    pub parent: EntityId,
    pub prev: EntityId,
    pub next: EntityId,
}

impl Default for Child {
    fn default() -> Self {
        Self {
            parent: EntityId::INVALID,
            prev: EntityId::INVALID,
            next: EntityId::INVALID,
        }
    }
}

/// What has been installed on a scene so far.
#[derive(Debug, Default)]
pub(crate) struct HierarchyState {
    hooks: bool,
    system: bool,
}

/// The transform propagation system.
pub struct TransformHierarchy;

impl TransformHierarchy {
    /// Register the link cleanup hooks and the Update-phase propagation
    /// system. Calling it again has no effect.
    pub fn install(scene: &mut Scene) {
        install_hooks(scene);
        if !scene.hierarchy.system {
            scene.hierarchy.system = true;
            scene.register_component::<Transform>();
            scene.register_system(Phase::Update, transform_hierarchy_system);
        }
    }

    /// Run one propagation pass immediately.
    pub fn run(scene: &mut Scene) {
        propagate_transforms(scene);
    }
}

fn transform_hierarchy_system(scene: &mut Scene, _dt: f32) {
    propagate_transforms(scene);
}

fn install_hooks(scene: &mut Scene) {
    if scene.hierarchy.hooks {
        return;
    }
    scene.hierarchy.hooks = true;
    scene.register_reactive_system::<Child>(Reaction::OnRemove, on_child_removed);
    scene.register_reactive_system::<Parent>(Reaction::OnRemove, on_parent_removed);
}

/// A `Child` is going away: take it out of its parent's list.
fn on_child_removed(scene: &mut Scene, id: EntityId) {
    let Some(link) = scene.try_get::<Child>(id).copied() else {
        return;
    };
    if scene.is_alive(link.parent) {
        unlink(scene, id, link);
    }
}

/// A `Parent` is going away: every remaining child becomes a root.
fn on_parent_removed(scene: &mut Scene, id: EntityId) {
    for child in scene.children(id) {
        if let Some(link) = scene.try_get_mut::<Child>(child) {
            // Detached first so `on_child_removed` leaves the list alone.
            link.parent = EntityId::INVALID;
        }
        scene.remove::<Child>(child);
    }
    if let Some(parent) = scene.try_get_mut::<Parent>(id) {
        parent.child_count = 0;
        parent.first_child = EntityId::INVALID;
    }
}

/// Splice `child` out of `link.parent`'s list and drop the parent's
/// `Parent` component once it has no children left. `child` keeps its
/// (now stale) `Child` component.
fn unlink(scene: &mut Scene, child: EntityId, link: Child) {
    if link.prev.is_valid() {
        if let Some(prev) = scene.try_get_mut::<Child>(link.prev) {
            prev.next = link.next;
        }
    } else if let Some(parent) = scene.try_get_mut::<Parent>(link.parent)
        && parent.first_child == child
    {
        parent.first_child = link.next;
    }
    if link.next.is_valid()
        && let Some(next) = scene.try_get_mut::<Child>(link.next)
    {
        next.prev = link.prev;
    }

    let remaining = match scene.try_get_mut::<Parent>(link.parent) {
        Some(parent) => {
            parent.child_count = parent.child_count.saturating_sub(1);
            parent.child_count
        }
        None => return,
    };
    if remaining == 0 {
        scene.remove::<Parent>(link.parent);
    }
}

impl Scene {
    /// Make `child` the first child of `parent`, detaching it from any
    /// previous parent. Stale ids are ignored.
    ///
    /// # Panics
    ///
    /// Panics if `child == parent`. In debug builds also panics if `parent`
    /// is a descendant of `child`.
    pub fn set_parent(&mut self, child: EntityId, parent: EntityId) {
        if !self.is_alive(child) || !self.is_alive(parent) {
            log::trace!("set_parent({child:?}, {parent:?}) on stale id ignored");
            return;
        }
        assert_ne!(child, parent, "Cannot parent entity {child:?} to itself");
        debug_assert!(
            !self.is_ancestor_of(child, parent),
            "Parenting {child:?} under {parent:?} would create a cycle"
        );
        install_hooks(self);

        match self.parent_of(child) {
            Some(current) if current == parent => return,
            Some(current) => self.unset_parent(child, current),
            None => {}
        }
        if !self.has::<Parent>(parent) {
            self.assign::<Parent>(parent);
        }
        let Some(head) = self.try_get::<Parent>(parent).map(|p| p.first_child) else {
            return;
        };

        // Splice in before the Child is assigned, so its OnAdd callbacks see a
        // consistent list.
        if let Some(first) = self.try_get_mut::<Child>(head) {
            first.prev = child;
        }
        if let Some(p) = self.try_get_mut::<Parent>(parent) {
            p.first_child = child;
            p.child_count += 1;
        }
        let link = Child {
            parent,
            prev: EntityId::INVALID,
            next: head,
        };
        match self.try_get_mut::<Child>(child) {
            // Left over from a removed parent.
            Some(existing) => *existing = link,
            None => {
                self.assign_with(child, link);
            }
        }
    }

    /// Detach `child` from `parent`. Does nothing for stale ids or when
    /// `child` is not a child of `parent`.
    pub fn unset_parent(&mut self, child: EntityId, parent: EntityId) {
        if !self.is_alive(child) || !self.is_alive(parent) {
            return;
        }
        let Some(link) = self.try_get::<Child>(child).copied() else {
            return;
        };
        if link.parent != parent {
            return;
        }
        unlink(self, child, link);
        if let Some(c) = self.try_get_mut::<Child>(child) {
            c.parent = EntityId::INVALID;
        }
        self.remove::<Child>(child);
    }

    /// Direct children of `parent`, newest first.
    pub fn children(&self, parent: EntityId) -> Vec<EntityId> {
        let Some(p) = self.try_get::<Parent>(parent) else {
            return Vec::new();
        };
        let mut out = Vec::with_capacity(p.child_count as usize);
        let mut cursor = p.first_child;
        while out.len() < p.child_count as usize {
            let Some(link) = self.try_get::<Child>(cursor) else {
                break;
            };
            out.push(cursor);
            cursor = link.next;
        }
        out
    }

    pub fn parent_of(&self, child: EntityId) -> Option<EntityId> {
        self.try_get::<Child>(child)
            .map(|c| c.parent)
            .filter(|&p| self.is_alive(p))
    }

    /// Walk up from `id` looking for `ancestor`.
    pub fn is_ancestor_of(&self, ancestor: EntityId, id: EntityId) -> bool {
        let mut current = self.parent_of(id);
        while let Some(p) = current {
            if p == ancestor {
                return true;
            }
            current = self.parent_of(p);
        }
        false
    }

    /// Destroy `id` and all its descendants, deepest first.
    pub fn destroy_recursive(&mut self, id: EntityId) {
        if !self.is_alive(id) {
            return;
        }
        for child in self.children(id) {
            self.destroy_recursive(child);
        }
        self.destroy_entity(id);
    }
}

/// Recompute `Transform::world` for every entity.
///
/// - Roots (`Transform` and no `Child`) get `world = T * R * S`.
/// - Children get `world = parent_world * local`, walking down from each
///   root that has children.
/// - A child without a `Transform` is skipped together with its subtree.
pub fn propagate_transforms(scene: &mut Scene) {
    let mut roots = Vec::new();
    let mut cursor = scene.view_cursor::<(Transform,)>();
    while let Some(id) = cursor.advance(scene) {
        if scene.has::<Child>(id) {
            continue;
        }
        let Some(transform) = scene.try_get_mut::<Transform>(id) else {
            continue;
        };
        transform.world = transform.matrix();
        let world = transform.world;
        if scene.has::<Parent>(id) {
            roots.push((id, world));
        }
    }

    for (root, world) in roots {
        propagate_children(scene, root, world);
    }
}

fn propagate_children(scene: &mut Scene, parent: EntityId, parent_world: Mat4) {
    for child in scene.children(parent) {
        let Some(transform) = scene.try_get_mut::<Transform>(child) else {
            continue;
        };
        transform.world = parent_world * transform.matrix();
        let world = transform.world;
        if scene.has::<Parent>(child) {
            propagate_children(scene, child, world);
        }
    }
}
