//! # Component Pool — Fixed-Capacity Type-Erased Arena
//!
//! One pool per component type. The pool is a single aligned allocation of
//! `size_of::<T>() * capacity` bytes; the entity slot index *is* the offset,
//! there is no dense/sparse remapping.
//!
//! ```text
//! Pool<Transform>, capacity 4, size 80
//!
//! bytes: [ slot 0 | slot 1 | slot 2 | slot 3 ]
//!          live     inert    live     inert
//!          ▲                 ▲
//!          mask bit set      mask bit set
//! ```
//!
//! The pool does not track occupancy. The owning scene's entity masks say
//! which slots hold a constructed value, which is why every typed accessor
//! here is `unsafe`: the caller vouches for the mask.
//!
//! Each pool also carries the OnAdd / OnRemove callback lists for its type.

use std::alloc::{self, Layout};
use std::any::TypeId;
use std::ptr::{self, NonNull};

use super::component::{Component, ComponentInfo};
use super::system::{Reaction, ReactiveFn};

pub(crate) struct ComponentPool {
    info: ComponentInfo,
    data: NonNull<u8>,
    /// Layout of the whole arena (size 0 for zero-sized components).
    arena: Layout,
    capacity: usize,
    /// Number of constructed values, for diagnostics.
    live: usize,
    on_added: Vec<ReactiveFn>,
    on_removed: Vec<ReactiveFn>,
}

impl ComponentPool {
    /// Allocate an arena for `capacity` values described by `info`.
    pub fn new(info: ComponentInfo, capacity: usize) -> Self {
        let size = info
            .layout
            .size()
            .checked_mul(capacity)
            .unwrap_or_else(|| panic!("Pool for `{}` overflows with {capacity} slots", info.name));
        let arena = Layout::from_size_align(size, info.layout.align())
            .unwrap_or_else(|e| panic!("Invalid pool layout for `{}`: {e}", info.name));

        let data = if arena.size() == 0 {
            // Zero-sized components: any aligned non-null address will do.
            NonNull::new(ptr::without_provenance_mut(arena.align())).unwrap_or(NonNull::dangling())
        } else {
            // SAFETY: `arena` has a non-zero size.
            let raw = unsafe { alloc::alloc(arena) };
            NonNull::new(raw).unwrap_or_else(|| alloc::handle_alloc_error(arena))
        };

        Self {
            info,
            data,
            arena,
            capacity,
            live: 0,
            on_added: Vec::new(),
            on_removed: Vec::new(),
        }
    }

    #[cfg(any(feature = "diagnostics", test))]
    pub fn info(&self) -> &ComponentInfo {
        &self.info
    }

    #[cfg(any(feature = "diagnostics", test))]
    pub fn live_count(&self) -> usize {
        self.live
    }

    /// Address of the value slot for `slot`.
    ///
    /// # Panics
    ///
    /// Panics if `slot` is outside the arena.
    #[inline]
    pub fn get_raw(&self, slot: usize) -> *mut u8 {
        assert!(
            slot < self.capacity,
            "Slot {slot} out of range for `{}` pool of capacity {}",
            self.info.name,
            self.capacity
        );
        // SAFETY: `slot < capacity`, so the offset stays inside the arena
        // (or is zero for zero-sized components).
        unsafe { self.data.as_ptr().add(slot * self.info.layout.size()) }
    }

    /// Move `value` into `slot`.
    ///
    /// # Safety
    ///
    /// `T` must be the pool's component type and `slot` must not hold a live
    /// value (it would be leaked, not dropped).
    #[inline]
    pub unsafe fn write<T: Component>(&mut self, slot: usize, value: T) {
        debug_assert_eq!(self.info.type_id, TypeId::of::<T>(), "wrong pool for `{}`", self.info.name);
        let ptr = self.get_raw(slot).cast::<T>();
        unsafe { ptr.write(value) };
        self.live += 1;
    }

    /// # Safety
    ///
    /// `T` must be the pool's component type and `slot` must hold a live value.
    #[inline]
    pub unsafe fn get<T: Component>(&self, slot: usize) -> &T {
        debug_assert_eq!(self.info.type_id, TypeId::of::<T>(), "wrong pool for `{}`", self.info.name);
        unsafe { &*self.get_raw(slot).cast::<T>() }
    }

    /// # Safety
    ///
    /// `T` must be the pool's component type and `slot` must hold a live value.
    #[inline]
    pub unsafe fn get_mut<T: Component>(&mut self, slot: usize) -> &mut T {
        debug_assert_eq!(self.info.type_id, TypeId::of::<T>(), "wrong pool for `{}`", self.info.name);
        unsafe { &mut *self.get_raw(slot).cast::<T>() }
    }

    /// Run the stored destructor on the value at `slot`. The bytes are left
    /// as they are; the slot is inert until the next write.
    ///
    /// # Safety
    ///
    /// `slot` must hold a live value, and nothing may read it afterwards.
    pub unsafe fn erase(&mut self, slot: usize) {
        let ptr = self.get_raw(slot);
        unsafe { (self.info.drop)(ptr) };
        self.live -= 1;
    }

    pub fn push_reaction(&mut self, kind: Reaction, f: ReactiveFn) {
        match kind {
            Reaction::OnAdd => self.on_added.push(f),
            Reaction::OnRemove => self.on_removed.push(f),
        }
    }

    /// The `i`-th callback of a list. Callbacks may register more callbacks
    /// while a list is being walked, so callers index instead of iterating.
    #[inline]
    pub fn reaction(&self, kind: Reaction, i: usize) -> Option<ReactiveFn> {
        match kind {
            Reaction::OnAdd => self.on_added.get(i).copied(),
            Reaction::OnRemove => self.on_removed.get(i).copied(),
        }
    }

    #[cfg(any(feature = "diagnostics", test))]
    pub fn reaction_count(&self, kind: Reaction) -> usize {
        match kind {
            Reaction::OnAdd => self.on_added.len(),
            Reaction::OnRemove => self.on_removed.len(),
        }
    }
}

impl Drop for ComponentPool {
    fn drop(&mut self) {
        // Values are erased by the owning scene; only the buffer is freed here.
        if self.arena.size() > 0 {
            // SAFETY: allocated in `new` with exactly this layout.
            unsafe { alloc::dealloc(self.data.as_ptr(), self.arena) };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn write_and_read_back() {
        let mut pool = ComponentPool::new(ComponentInfo::of::<[f32; 3]>(), 8);
        unsafe {
            pool.write(2, [1.0f32, 2.0, 3.0]);
            pool.write(5, [4.0f32, 5.0, 6.0]);
            assert_eq!(*pool.get::<[f32; 3]>(2), [1.0, 2.0, 3.0]);
            pool.get_mut::<[f32; 3]>(5)[1] = 50.0;
            assert_eq!(*pool.get::<[f32; 3]>(5), [4.0, 50.0, 6.0]);
        }
        assert_eq!(pool.live_count(), 2);
    }

    #[test]
    fn slot_index_is_the_offset() {
        let pool = ComponentPool::new(ComponentInfo::of::<u64>(), 4);
        let base = pool.get_raw(0) as usize;
        assert_eq!(pool.get_raw(3) as usize - base, 3 * 8);
        assert_eq!(base % std::mem::align_of::<u64>(), 0);
    }

    #[test]
    fn erase_runs_destructor() {
        static DROPS: AtomicUsize = AtomicUsize::new(0);
        struct Tracked(#[allow(dead_code)] u32);
        impl Drop for Tracked {
            fn drop(&mut self) {
                DROPS.fetch_add(1, Ordering::SeqCst);
            }
        }

        let mut pool = ComponentPool::new(ComponentInfo::of::<Tracked>(), 4);
        unsafe {
            pool.write(0, Tracked(1));
            pool.write(1, Tracked(2));
            pool.erase(1);
        }
        assert_eq!(DROPS.load(Ordering::SeqCst), 1);
        assert_eq!(pool.live_count(), 1);

        // The pool itself never drops values.
        drop(pool);
        assert_eq!(DROPS.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn heap_owning_components_are_freed_on_erase() {
        let mut pool = ComponentPool::new(ComponentInfo::of::<String>(), 2);
        unsafe {
            pool.write(0, String::from("hello"));
            assert_eq!(pool.get::<String>(0), "hello");
            pool.erase(0);
        }
        assert_eq!(pool.live_count(), 0);
    }

    #[test]
    fn zero_sized_components() {
        struct Marker;
        let mut pool = ComponentPool::new(ComponentInfo::of::<Marker>(), 16);
        unsafe {
            pool.write(15, Marker);
            let _ = pool.get::<Marker>(15);
            pool.erase(15);
        }
        assert_eq!(pool.get_raw(0), pool.get_raw(15));
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn get_raw_past_capacity_panics() {
        let pool = ComponentPool::new(ComponentInfo::of::<u32>(), 4);
        pool.get_raw(4);
    }

    #[test]
    fn reactions_keep_registration_order() {
        use crate::ecs::{EntityId, Scene};
        fn first(_: &mut Scene, _: EntityId) {}
        fn second(_: &mut Scene, _: EntityId) {}

        let mut pool = ComponentPool::new(ComponentInfo::of::<u32>(), 1);
        pool.push_reaction(Reaction::OnAdd, first);
        pool.push_reaction(Reaction::OnAdd, second);
        assert_eq!(pool.reaction_count(Reaction::OnAdd), 2);
        assert_eq!(pool.reaction_count(Reaction::OnRemove), 0);
        assert!(pool.reaction(Reaction::OnAdd, 1).is_some());
        assert!(pool.reaction(Reaction::OnAdd, 2).is_none());
    }
}
