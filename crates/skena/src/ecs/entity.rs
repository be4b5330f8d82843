//! # Entity — Packed Generational Identifiers
//!
//! An [`EntityId`] is a single `u64`: the low 32 bits are the slot index in
//! the entity table (and in every component pool), the high 32 bits are the
//! generation of that slot.
//!
//! ```text
//!  63                32 31                 0
//! ┌────────────────────┬────────────────────┐
//! │     generation     │       index        │
//! └────────────────────┴────────────────────┘
//! ```
//!
//! ## Stale Handles
//!
//! The id itself only knows whether its index is the reserved sentinel
//! ([`EntityId::is_valid`]). Whether it still names a *live* entity is decided
//! by the [`EntityTable`]: the row at `index` must hold exactly the same id.
//!
//! ```text
//! spawn            → table[5] = 5v0        handle 5v0 is live
//! destroy          → table[5] = INVALIDv1  handle 5v0 is stale
//! spawn (reuse 5)  → table[5] = 5v1        handle 5v0 is still stale
//! ```
//!
//! The generation is bumped at destroy time, so a slot only becomes eligible
//! for reuse after every old handle has been outdated.

use std::fmt;

use super::mask::ComponentMask;

/// Index value reserved for "no entity".
pub const INVALID_INDEX: u32 = u32::MAX;

/// A lightweight handle to an entity in a [`Scene`](super::scene::Scene).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(u64);

impl EntityId {
    /// The "no entity" id. Used as the null link in the hierarchy lists.
    pub const INVALID: Self = Self::new(INVALID_INDEX, 0);

    #[inline]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self(((generation as u64) << 32) | index as u64)
    }

    /// Slot index in the entity table and in every component pool.
    #[inline]
    pub const fn index(self) -> u32 {
        self.0 as u32
    }

    #[inline]
    pub const fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Returns `false` only for ids whose index is the reserved sentinel.
    ///
    /// This does not say whether the entity is still alive; use
    /// [`Scene::is_alive`](super::scene::Scene::is_alive) for that.
    #[inline]
    pub const fn is_valid(self) -> bool {
        self.index() != INVALID_INDEX
    }

    #[inline]
    pub const fn to_bits(self) -> u64 {
        self.0
    }

    #[inline]
    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::INVALID
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "EntityId({}v{})", self.index(), self.generation())
        } else {
            write!(f, "EntityId(INVALIDv{})", self.generation())
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index(), self.generation())
    }
}

/// One row of the entity table.
#[derive(Clone, Copy, Debug)]
pub(crate) struct EntityRow {
    /// Current id of the slot. Invalidated (sentinel index) while the slot
    /// sits on the free list.
    pub id: EntityId,
    /// Which component types are live for this slot.
    pub mask: ComponentMask,
    /// Set while `destroy_entity` is tearing the row down, so re-entrant
    /// destroys from callbacks are no-ops.
    pub destroying: bool,
    /// Components whose OnRemove callbacks are currently running.
    pub removing: ComponentMask,
}

/// Slot bookkeeping for a scene.
///
/// ```text
/// rows:      [0v0, INVALIDv1, 2v0, INVALIDv3]
/// free_list: [1, 3]        ← reclaimed slots, reused LIFO
/// alive:     2
/// ```
pub(crate) struct EntityTable {
    rows: Vec<EntityRow>,
    free_list: Vec<u32>,
    alive: usize,
    capacity: usize,
}

impl EntityTable {
    pub fn new(capacity: usize) -> Self {
        assert!(
            capacity > 0 && capacity < INVALID_INDEX as usize,
            "Scene capacity must be in 1..{INVALID_INDEX}, got {capacity}"
        );
        Self {
            rows: Vec::new(),
            free_list: Vec::new(),
            alive: 0,
            capacity,
        }
    }

    /// Hand out a slot: reuse a reclaimed one if available (its generation was
    /// already bumped on release), otherwise grow the table by one row.
    ///
    /// # Panics
    ///
    /// Panics if every slot up to the capacity is in use.
    pub fn allocate(&mut self) -> EntityId {
        let id = if let Some(index) = self.free_list.pop() {
            let row = &mut self.rows[index as usize];
            row.id = EntityId::new(index, row.id.generation());
            row.mask = ComponentMask::EMPTY;
            row.removing = ComponentMask::EMPTY;
            row.destroying = false;
            row.id
        } else {
            assert!(
                self.rows.len() < self.capacity,
                "Scene capacity of {} entities exhausted",
                self.capacity
            );
            let id = EntityId::new(self.rows.len() as u32, 0);
            self.rows.push(EntityRow {
                id,
                mask: ComponentMask::EMPTY,
                destroying: false,
                removing: ComponentMask::EMPTY,
            });
            id
        };
        self.alive += 1;
        id
    }

    /// Invalidate a slot and return it to the free list.
    ///
    /// The caller must have already torn down every component of the row.
    pub fn release(&mut self, index: u32) {
        let row = &mut self.rows[index as usize];
        debug_assert!(row.id.is_valid(), "releasing an already free slot {index}");
        row.id = EntityId::new(INVALID_INDEX, row.id.generation().wrapping_add(1));
        row.mask = ComponentMask::EMPTY;
        row.removing = ComponentMask::EMPTY;
        row.destroying = false;
        self.free_list.push(index);
        self.alive -= 1;
    }

    /// Check that `id` names the entity currently occupying its slot.
    #[inline]
    pub fn is_alive(&self, id: EntityId) -> bool {
        id.is_valid()
            && self
                .rows
                .get(id.index() as usize)
                .is_some_and(|row| row.id == id)
    }

    #[inline]
    pub fn row(&self, index: u32) -> &EntityRow {
        &self.rows[index as usize]
    }

    #[inline]
    pub fn row_mut(&mut self, index: u32) -> &mut EntityRow {
        &mut self.rows[index as usize]
    }

    /// Rows in slot order, including free ones.
    #[inline]
    pub fn rows(&self) -> &[EntityRow] {
        &self.rows
    }

    pub fn alive_count(&self) -> usize {
        self.alive
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[cfg(any(feature = "diagnostics", test))]
    pub fn free_count(&self) -> usize {
        self.free_list.len()
    }

    #[cfg(any(feature = "diagnostics", test))]
    pub fn total_slots(&self) -> usize {
        self.rows.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packs_index_and_generation() {
        let id = EntityId::new(7, 3);
        assert_eq!(id.index(), 7);
        assert_eq!(id.generation(), 3);
        assert_eq!(id.to_bits(), (3u64 << 32) | 7);
        assert_eq!(EntityId::from_bits(id.to_bits()), id);
    }

    #[test]
    fn sentinel_is_invalid() {
        assert!(!EntityId::INVALID.is_valid());
        assert!(!EntityId::default().is_valid());
        assert!(!EntityId::new(INVALID_INDEX, 9).is_valid());
        assert!(EntityId::new(0, 0).is_valid());
    }

    #[test]
    fn allocate_sequential() {
        let mut table = EntityTable::new(8);
        let e0 = table.allocate();
        let e1 = table.allocate();
        assert_eq!(e0, EntityId::new(0, 0));
        assert_eq!(e1, EntityId::new(1, 0));
        assert_eq!(table.alive_count(), 2);
    }

    #[test]
    fn release_bumps_generation_before_reuse() {
        let mut table = EntityTable::new(8);
        let e0 = table.allocate();
        table.release(e0.index());

        let row = table.row(0);
        assert!(!row.id.is_valid());
        assert_eq!(row.id.generation(), 1);
        assert!(!table.is_alive(e0));

        let reused = table.allocate();
        assert_eq!(reused.index(), 0);
        assert_eq!(reused.generation(), 1);
        assert_ne!(reused, e0);
        assert!(table.is_alive(reused));
        assert!(!table.is_alive(e0));
    }

    #[test]
    fn free_count_and_total_slots() {
        let mut table = EntityTable::new(8);
        let e0 = table.allocate();
        let _e1 = table.allocate();
        assert_eq!(table.total_slots(), 2);
        assert_eq!(table.free_count(), 0);

        table.release(e0.index());
        assert_eq!(table.total_slots(), 2);
        assert_eq!(table.free_count(), 1);
        assert_eq!(table.alive_count(), 1);
    }

    #[test]
    fn unknown_index_is_not_alive() {
        let table = EntityTable::new(4);
        assert!(!table.is_alive(EntityId::new(3, 0)));
        assert!(!table.is_alive(EntityId::INVALID));
    }

    #[test]
    #[should_panic(expected = "capacity of 2 entities exhausted")]
    fn allocate_past_capacity_panics() {
        let mut table = EntityTable::new(2);
        table.allocate();
        table.allocate();
        table.allocate();
    }
}
