//! Fixed-width component bitset.

use std::fmt;

/// Maximum number of component types a single scene can register.
pub const MAX_COMPONENTS: usize = 64;

/// One bit per registered component type.
///
/// Bit *i* is set for a slot iff that slot holds a live component with
/// [`ComponentId`](super::component::ComponentId) *i*.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ComponentMask(u64);

impl ComponentMask {
    pub const EMPTY: Self = Self(0);

    #[inline]
    pub fn set(&mut self, bit: usize) {
        debug_assert!(bit < MAX_COMPONENTS);
        self.0 |= 1u64 << bit;
    }

    #[inline]
    pub fn clear(&mut self, bit: usize) {
        debug_assert!(bit < MAX_COMPONENTS);
        self.0 &= !(1u64 << bit);
    }

    #[inline]
    pub const fn contains(self, bit: usize) -> bool {
        bit < MAX_COMPONENTS && self.0 & (1u64 << bit) != 0
    }

    /// True if every bit of `other` is also set in `self`.
    #[inline]
    pub const fn is_superset_of(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn count(self) -> u32 {
        self.0.count_ones()
    }

    /// Set bits in ascending order.
    pub fn iter(self) -> impl Iterator<Item = usize> {
        let mut remaining = self.0;
        std::iter::from_fn(move || {
            if remaining == 0 {
                return None;
            }
            let bit = remaining.trailing_zeros() as usize;
            remaining &= remaining - 1;
            Some(bit)
        })
    }
}

impl fmt::Debug for ComponentMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentMask({:#b})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_clear_contains() {
        let mut mask = ComponentMask::EMPTY;
        mask.set(0);
        mask.set(63);
        assert!(mask.contains(0));
        assert!(mask.contains(63));
        assert!(!mask.contains(5));
        mask.clear(0);
        assert!(!mask.contains(0));
        assert_eq!(mask.count(), 1);
    }

    #[test]
    fn superset() {
        let mut ab = ComponentMask::EMPTY;
        ab.set(1);
        ab.set(2);
        let mut a = ComponentMask::EMPTY;
        a.set(1);

        assert!(ab.is_superset_of(a));
        assert!(!a.is_superset_of(ab));
        assert!(a.is_superset_of(ComponentMask::EMPTY));
    }

    #[test]
    fn iter_ascending() {
        let mut mask = ComponentMask::EMPTY;
        for bit in [40, 3, 17] {
            mask.set(bit);
        }
        assert_eq!(mask.iter().collect::<Vec<_>>(), vec![3, 17, 40]);
        assert_eq!(ComponentMask::EMPTY.iter().count(), 0);
    }
}
