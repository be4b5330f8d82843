//! # Scene — The Entity–Component Store
//!
//! The [`Scene`] owns the entity table, one fixed-capacity pool per component
//! type, the reactive callback lists, and the per-phase system schedules.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │ Scene                                                    │
//! │                                                          │
//! │  entities: EntityTable                                   │
//! │    rows[slot] = { id, mask }   free_list = [..]          │
//! │                                                          │
//! │  registry: TypeId → ComponentId (bit + pool index)       │
//! │                                                          │
//! │  pools[ComponentId]: ComponentPool                       │
//! │    arena[slot] = T          on_added / on_removed        │
//! │                                                          │
//! │  schedules: [PreUpdate, Update, Render]                  │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Slot Lifecycle
//!
//! ```text
//! Free ──new_entity──▶ Allocated(g) ──destroy_entity──▶ Free(g+1) ──▶ Allocated(g+1) …
//! ```
//!
//! ## Ordering Rules
//!
//! - `assign`: construct → set mask bit → OnAdd callbacks.
//! - `remove` / `destroy_entity`: OnRemove callbacks → clear mask bit → drop.
//!
//! So a callback always sees `has::<T>(id) == true` for the component it is
//! being told about.
//!
//! ## Misuse vs. Races
//!
//! Assigning a component twice, reading a component the entity does not have,
//! or running out of slots are bugs in the caller and panic. Touching an
//! entity that was destroyed earlier is an expected race in gameplay code and
//! quietly returns `None` / `false`.

use super::component::{Component, ComponentId, ComponentInfo, ComponentRegistry, Name};
use super::entity::{EntityId, EntityRow, EntityTable};
use super::hierarchy::HierarchyState;
use super::pool::ComponentPool;
use super::query::{ComponentSet, View, ViewCursor};
use super::system::{Phase, Reaction, ReactiveFn, Schedule, System};
use crate::config::SceneConfig;

/// Fraction of the capacity at which a warning is logged once.
const CAPACITY_WARN_RATIO: f32 = 0.9;

/// The central container for entities, components and systems.
pub struct Scene {
    label: String,
    entities: EntityTable,
    registry: ComponentRegistry,
    /// Indexed by `ComponentId`.
    pools: Vec<ComponentPool>,
    /// Indexed by `Phase`.
    schedules: [Schedule; 3],
    /// Ids queued with `defer_destroy`, destroyed by `flush_destroyed`.
    pending_destroy: Vec<EntityId>,
    pub(crate) hierarchy: HierarchyState,
    capacity_warned: bool,
    #[cfg(feature = "diagnostics")]
    spawned_this_frame: u32,
    #[cfg(feature = "diagnostics")]
    destroyed_this_frame: u32,
}

impl Scene {
    /// A scene with the default configuration.
    pub fn new() -> Self {
        Self::with_config(SceneConfig::default())
    }

    pub fn with_config(config: SceneConfig) -> Self {
        let mut scene = Self {
            entities: EntityTable::new(config.capacity),
            label: config.label,
            registry: ComponentRegistry::new(),
            pools: Vec::new(),
            schedules: Default::default(),
            pending_destroy: Vec::new(),
            hierarchy: HierarchyState::default(),
            capacity_warned: false,
            #[cfg(feature = "diagnostics")]
            spawned_this_frame: 0,
            #[cfg(feature = "diagnostics")]
            destroyed_this_frame: 0,
        };
        scene.register_component::<Name>();
        log::debug!(
            "Created scene \"{}\" with capacity {}",
            scene.label,
            scene.capacity()
        );
        scene
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Maximum number of simultaneously live entities.
    pub fn capacity(&self) -> usize {
        self.entities.capacity()
    }

    /// Number of live entities.
    pub fn entity_count(&self) -> usize {
        self.entities.alive_count()
    }

    /// Check that `id` still names a live entity of this scene.
    #[inline]
    pub fn is_alive(&self, id: EntityId) -> bool {
        self.entities.is_alive(id)
    }

    #[inline]
    pub(crate) fn rows(&self) -> &[EntityRow] {
        self.entities.rows()
    }

    // ── Component Types ─────────────────────────────────────────────

    /// Register `T` and create its pool. Idempotent.
    ///
    /// Component types are also registered implicitly the first time they are
    /// assigned or observed by a reactive system; registering up front fixes
    /// the id order.
    ///
    /// # Panics
    ///
    /// Panics if the scene already has [`MAX_COMPONENTS`](super::mask::MAX_COMPONENTS)
    /// component types.
    pub fn register_component<T: Component>(&mut self) -> ComponentId {
        if let Some(id) = self.registry.lookup::<T>() {
            return id;
        }
        let info = ComponentInfo::of::<T>();
        let (id, _) = self.registry.register(&info);
        debug_assert_eq!(id.index(), self.pools.len());
        log::trace!("Registered component `{}` as {:?}", info.name, id);
        self.pools.push(ComponentPool::new(info, self.capacity()));
        id
    }

    /// Register every type of a [`ComponentSet`] tuple, in order.
    pub fn register_components<Q: ComponentSet>(&mut self) {
        Q::register(self);
    }

    /// Id of `T` in this scene, if it has been registered.
    #[inline]
    pub fn component_id<T: Component>(&self) -> Option<ComponentId> {
        self.registry.lookup::<T>()
    }

    /// Id of `T` if `id` is alive and currently has a `T`.
    #[inline]
    fn live_component<T: Component>(&self, id: EntityId) -> Option<ComponentId> {
        if !self.entities.is_alive(id) {
            return None;
        }
        let cid = self.registry.lookup::<T>()?;
        self.entities
            .row(id.index())
            .mask
            .contains(cid.index())
            .then_some(cid)
    }

    // ── Entities ────────────────────────────────────────────────────

    /// Create an entity carrying a [`Name`] component.
    ///
    /// # Panics
    ///
    /// Panics if the scene is at capacity.
    pub fn new_entity(&mut self, name: &str) -> EntityId {
        let id = self.entities.allocate();
        #[cfg(feature = "diagnostics")]
        {
            self.spawned_this_frame += 1;
        }
        self.check_capacity_pressure();
        self.assign_with(id, Name(name.to_owned()));
        id
    }

    fn check_capacity_pressure(&mut self) {
        let alive = self.entities.alive_count();
        let threshold = (self.capacity() as f32 * CAPACITY_WARN_RATIO) as usize;
        if !self.capacity_warned && alive >= threshold.max(1) {
            self.capacity_warned = true;
            log::warn!(
                "Scene \"{}\" is at {alive}/{} entities",
                self.label,
                self.capacity()
            );
        }
    }

    /// The entity's [`Name`], or `None` for a stale id.
    pub fn entity_name(&self, id: EntityId) -> Option<&str> {
        self.try_get::<Name>(id).map(Name::as_str)
    }

    /// Destroy an entity and every component on it.
    ///
    /// Components are torn down one at a time in ascending id order: OnRemove
    /// callbacks run while the id is still live and the component still
    /// present, then the component is dropped. Components with a lower id are
    /// already gone by then, so `Name` (id 0) is never visible to other
    /// components' callbacks. The id is invalidated and the slot freed last.
    ///
    /// Stale ids, and ids already being destroyed further up the call stack,
    /// are ignored.
    pub fn destroy_entity(&mut self, id: EntityId) {
        if !self.entities.is_alive(id) {
            log::trace!("destroy_entity on stale {id:?} ignored");
            return;
        }
        let index = id.index();
        if self.entities.row(index).destroying {
            return;
        }
        self.entities.row_mut(index).destroying = true;

        // Callbacks may add or remove components, so re-read the mask each time.
        loop {
            let row = self.entities.row(index);
            let Some(bit) = row.mask.iter().next() else {
                break;
            };
            let cid = ComponentId(bit as u32);
            if !row.removing.contains(bit) {
                // Guards against a callback removing this same component.
                self.entities.row_mut(index).removing.set(bit);
                self.fire(cid, Reaction::OnRemove, id);
            }
            let row = self.entities.row_mut(index);
            row.removing.clear(bit);
            if row.mask.contains(bit) {
                row.mask.clear(bit);
                // SAFETY: the mask bit was set, so the slot holds a live value.
                unsafe { self.pools[bit].erase(index as usize) };
            }
        }

        self.entities.release(index);
        #[cfg(feature = "diagnostics")]
        {
            self.destroyed_this_frame += 1;
        }
    }

    /// Queue `id` for destruction at the end of the next
    /// [`simulate_scene`](Self::simulate_scene) (or an explicit
    /// [`flush_destroyed`](Self::flush_destroyed)).
    pub fn defer_destroy(&mut self, id: EntityId) {
        if self.entities.is_alive(id) {
            self.pending_destroy.push(id);
        }
    }

    /// Destroy every entity queued with [`defer_destroy`](Self::defer_destroy).
    /// Ids that died in the meantime are skipped.
    pub fn flush_destroyed(&mut self) {
        while !self.pending_destroy.is_empty() {
            let pending = std::mem::take(&mut self.pending_destroy);
            for id in pending {
                self.destroy_entity(id);
            }
        }
    }

    /// Destroy every live entity, firing callbacks as usual.
    pub fn destroy_all(&mut self) {
        let all: Vec<EntityId> = self.view::<()>().collect();
        for id in all {
            self.destroy_entity(id);
        }
        self.pending_destroy.clear();
    }

    // ── Components ──────────────────────────────────────────────────

    /// Default-construct a `T` on `id`.
    ///
    /// Returns `None` if `id` is stale, or if an OnAdd callback removed the
    /// component or destroyed the entity before this call returned.
    ///
    /// # Panics
    ///
    /// Panics if the entity already has a `T`.
    pub fn assign<T: Component + Default>(&mut self, id: EntityId) -> Option<&mut T> {
        self.assign_with(id, T::default())
    }

    /// Move `value` onto `id`. Same contract as [`assign`](Self::assign).
    pub fn assign_with<T: Component>(&mut self, id: EntityId, value: T) -> Option<&mut T> {
        if !self.entities.is_alive(id) {
            log::trace!(
                "assign `{}` on stale {id:?} ignored",
                std::any::type_name::<T>()
            );
            return None;
        }
        let cid = self.register_component::<T>();
        let index = id.index();
        assert!(
            !self.entities.row(index).mask.contains(cid.index()),
            "Entity {id:?} already has component `{}`",
            std::any::type_name::<T>()
        );

        // SAFETY: `cid` is `T`'s pool and the mask says the slot is vacant.
        unsafe { self.pools[cid.index()].write(index as usize, value) };
        self.entities.row_mut(index).mask.set(cid.index());
        self.fire(cid, Reaction::OnAdd, id);

        self.try_get_mut::<T>(id)
    }

    /// Remove and drop `id`'s `T`.
    ///
    /// Returns `false` (and does nothing) for stale ids or when the entity
    /// has no `T`.
    pub fn remove<T: Component>(&mut self, id: EntityId) -> bool {
        match self.live_component::<T>(id) {
            Some(cid) => self.remove_by_id(id, cid),
            None => false,
        }
    }

    fn remove_by_id(&mut self, id: EntityId, cid: ComponentId) -> bool {
        let index = id.index();
        let bit = cid.index();
        if self.entities.row(index).removing.contains(bit) {
            // Already inside this component's OnRemove callbacks.
            return false;
        }

        self.entities.row_mut(index).removing.set(bit);
        self.fire(cid, Reaction::OnRemove, id);

        // A callback may have destroyed the entity, which also dropped the value.
        if !self.entities.is_alive(id) {
            return true;
        }
        let row = self.entities.row_mut(index);
        row.removing.clear(bit);
        row.mask.clear(bit);
        // SAFETY: the bit was set before the callbacks and only `destroy_entity`
        // (ruled out above) or this function clear it.
        unsafe { self.pools[bit].erase(index as usize) };
        true
    }

    /// Shared reference to `id`'s `T`.
    ///
    /// Returns `None` for stale ids.
    ///
    /// # Panics
    ///
    /// Panics if the live entity has no `T`; check with [`has`](Self::has)
    /// first or use [`try_get`](Self::try_get).
    pub fn get<T: Component>(&self, id: EntityId) -> Option<&T> {
        if !self.entities.is_alive(id) {
            return None;
        }
        let cid = self
            .live_component::<T>(id)
            .unwrap_or_else(|| missing_component::<T>(id));
        // SAFETY: the mask bit for `T` is set on this slot.
        Some(unsafe { self.pools[cid.index()].get::<T>(id.index() as usize) })
    }

    /// Mutable reference to `id`'s `T`. Same contract as [`get`](Self::get).
    pub fn get_mut<T: Component>(&mut self, id: EntityId) -> Option<&mut T> {
        if !self.entities.is_alive(id) {
            return None;
        }
        let cid = self
            .live_component::<T>(id)
            .unwrap_or_else(|| missing_component::<T>(id));
        // SAFETY: the mask bit for `T` is set on this slot.
        Some(unsafe { self.pools[cid.index()].get_mut::<T>(id.index() as usize) })
    }

    /// Like [`get`](Self::get), but `None` instead of a panic when the
    /// component is missing.
    pub fn try_get<T: Component>(&self, id: EntityId) -> Option<&T> {
        let cid = self.live_component::<T>(id)?;
        // SAFETY: the mask bit for `T` is set on this slot.
        Some(unsafe { self.pools[cid.index()].get::<T>(id.index() as usize) })
    }

    pub fn try_get_mut<T: Component>(&mut self, id: EntityId) -> Option<&mut T> {
        let cid = self.live_component::<T>(id)?;
        // SAFETY: the mask bit for `T` is set on this slot.
        Some(unsafe { self.pools[cid.index()].get_mut::<T>(id.index() as usize) })
    }

    /// `false` for stale ids and for types never registered in this scene.
    #[inline]
    pub fn has<T: Component>(&self, id: EntityId) -> bool {
        self.live_component::<T>(id).is_some()
    }

    // ── Reactive Systems ────────────────────────────────────────────

    /// Attach `f` to `T`'s add or remove edge. Callbacks run in registration
    /// order, synchronously, before the triggering call returns.
    pub fn register_reactive_system<T: Component>(&mut self, reaction: Reaction, f: ReactiveFn) {
        let cid = self.register_component::<T>();
        self.pools[cid.index()].push_reaction(reaction, f);
    }

    fn fire(&mut self, cid: ComponentId, reaction: Reaction, id: EntityId) {
        let mut i = 0;
        while let Some(f) = self.pools[cid.index()].reaction(reaction, i) {
            f(self, id);
            i += 1;
        }
    }

    // ── Systems ─────────────────────────────────────────────────────

    /// Append a system to `phase`.
    pub fn register_system<S: System + 'static>(&mut self, phase: Phase, system: S) {
        self.schedules[phase.index()].add_system(system);
    }

    pub fn system_count(&self, phase: Phase) -> usize {
        self.schedules[phase.index()].len()
    }

    /// Run PreUpdate then Update systems, then destroy deferred entities.
    pub fn simulate_scene(&mut self, dt: f32) {
        self.run_phase(Phase::PreUpdate, dt);
        self.run_phase(Phase::Update, dt);
        self.flush_destroyed();
    }

    /// Run Render systems.
    pub fn render_scene(&mut self, dt: f32) {
        self.run_phase(Phase::Render, dt);
    }

    fn run_phase(&mut self, phase: Phase, dt: f32) {
        // The schedule is moved out so systems can borrow the scene mutably.
        // Systems registered meanwhile land in the empty slot and are appended.
        let mut schedule = std::mem::take(&mut self.schedules[phase.index()]);
        schedule.run(self, dt);
        schedule.append(&mut self.schedules[phase.index()]);
        self.schedules[phase.index()] = schedule;
    }

    // ── Query ───────────────────────────────────────────────────────

    /// Iterate the entities that have every component in `Q`, in slot order.
    ///
    /// ```ignore
    /// for id in scene.view::<(Transform, Velocity)>() { … }
    /// ```
    pub fn view<Q: ComponentSet>(&self) -> View<'_> {
        View::new::<Q>(self)
    }

    /// A [`ViewCursor`] over `Q` that lets the caller mutate between steps.
    /// Types of `Q` first registered after this call are picked up by later
    /// steps.
    pub fn view_cursor<Q: ComponentSet>(&self) -> ViewCursor {
        ViewCursor::new::<Q>(self)
    }

    // ── Diagnostics ─────────────────────────────────────────────────

    /// Collect entity pool and component statistics, and reset the per-frame
    /// spawn/destroy counters.
    #[cfg(feature = "diagnostics")]
    pub fn diagnostics_snapshot(&mut self) -> crate::diag::SceneStats {
        let components = self
            .pools
            .iter()
            .map(|pool| crate::diag::ComponentStats {
                name: pool.info().short_name().to_string(),
                size_bytes: pool.info().layout.size(),
                live_count: pool.live_count(),
                on_add_callbacks: pool.reaction_count(Reaction::OnAdd),
                on_remove_callbacks: pool.reaction_count(Reaction::OnRemove),
            })
            .collect();
        let system_timings = Phase::ALL
            .iter()
            .flat_map(|&phase| {
                self.schedules[phase.index()]
                    .timings
                    .iter()
                    .map(move |t| crate::diag::PhaseTiming {
                        phase,
                        timing: t.clone(),
                    })
            })
            .collect();

        let stats = crate::diag::SceneStats {
            label: self.label.clone(),
            capacity: self.capacity(),
            alive_count: self.entities.alive_count(),
            total_slots: self.entities.total_slots(),
            free_count: self.entities.free_count(),
            spawned_this_frame: self.spawned_this_frame,
            destroyed_this_frame: self.destroyed_this_frame,
            pending_destroy: self.pending_destroy.len(),
            components,
            system_timings,
        };
        self.spawned_this_frame = 0;
        self.destroyed_this_frame = 0;
        stats
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Scene {
    /// Drop every live component. Callbacks do not run during teardown.
    fn drop(&mut self) {
        let mut dropped = 0usize;
        for row in self.entities.rows() {
            if !row.id.is_valid() {
                continue;
            }
            for bit in row.mask.iter() {
                // SAFETY: the mask bit is set, so the slot holds a live value.
                unsafe { self.pools[bit].erase(row.id.index() as usize) };
                dropped += 1;
            }
        }
        log::debug!(
            "Dropped scene \"{}\" ({} entities, {dropped} components)",
            self.label,
            self.entities.alive_count()
        );
    }
}

#[cold]
#[track_caller]
fn missing_component<T>(id: EntityId) -> ! {
    panic!(
        "Entity {id:?} does not have component `{}`",
        std::any::type_name::<T>()
    )
}
