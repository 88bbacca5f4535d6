//! # Free List — Slot-Reuse Array
//!
//! A [`FreeList`] is a `Vec` whose removed slots are recycled by later inserts.
//! Indices stay stable: an index handed out by [`insert`](FreeList::insert)
//! addresses the same value until that index is removed, no matter what
//! happens to other slots.
//!
//! ## Memory Layout
//!
//! ```text
//! slots:      [A, ·→3, C, ·→∅, E]   ← vacant slots link to the next vacant one
//! first_free: 1                      ← head of the free chain (∅ = append)
//! ```
//!
//! Insert pops the head of the chain if there is one, otherwise pushes. Remove
//! turns the slot into the new head, storing the previous head as its link.
//! The backing `Vec` never shrinks, so a burst of removes followed by a burst
//! of inserts does no reallocation at all.
//!
//! The chain is LIFO: `insert`, `remove`, `insert` hands back the same index.

use std::ops::{Index, IndexMut};

#[derive(Debug, Clone)]
enum Slot<T> {
    Occupied(T),
    Vacant { next_free: Option<usize> },
}

/// A dense array with O(1) insert and O(1) remove-by-index.
#[derive(Debug, Clone)]
pub struct FreeList<T> {
    slots: Vec<Slot<T>>,
    /// Head of the free chain. `None` means the next insert appends.
    first_free: Option<usize>,
    len: usize,
}

impl<T> FreeList<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            first_free: None,
            len: 0,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            first_free: None,
            len: 0,
        }
    }

    /// Store `value` and return its index. Reuses the most recently freed slot
    /// if there is one.
    pub fn insert(&mut self, value: T) -> usize {
        self.len += 1;
        match self.first_free {
            Some(index) => {
                let slot = std::mem::replace(&mut self.slots[index], Slot::Occupied(value));
                if let Slot::Vacant { next_free } = slot {
                    self.first_free = next_free;
                }
                index
            }
            None => {
                self.slots.push(Slot::Occupied(value));
                self.slots.len() - 1
            }
        }
    }

    /// Free the slot at `index`, returning its value.
    ///
    /// Returns `None` (and leaves the chain alone) if the slot is already
    /// vacant or out of range, so a double remove cannot corrupt the chain.
    pub fn remove(&mut self, index: usize) -> Option<T> {
        match self.slots.get(index) {
            Some(Slot::Occupied(_)) => {}
            _ => return None,
        }
        let freed = Slot::Vacant {
            next_free: self.first_free,
        };
        let old = std::mem::replace(&mut self.slots[index], freed);
        self.first_free = Some(index);
        self.len -= 1;
        match old {
            Slot::Occupied(value) => Some(value),
            Slot::Vacant { .. } => None,
        }
    }

    /// Checked access. `None` for vacant or out-of-range indices.
    pub fn get(&self, index: usize) -> Option<&T> {
        match self.slots.get(index) {
            Some(Slot::Occupied(value)) => Some(value),
            _ => None,
        }
    }

    /// Checked mutable access.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        match self.slots.get_mut(index) {
            Some(Slot::Occupied(value)) => Some(value),
            _ => None,
        }
    }

    /// Overwrite the value at a live index.
    ///
    /// # Panics
    ///
    /// Panics if `index` is vacant or out of range.
    pub fn set(&mut self, index: usize, value: T) {
        self[index] = value;
    }

    pub fn contains(&self, index: usize) -> bool {
        matches!(self.slots.get(index), Some(Slot::Occupied(_)))
    }

    /// Drop every value and forget the free chain. Capacity is kept.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.first_free = None;
        self.len = 0;
    }

    /// Number of live values.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of slots ever handed out (live + vacant). Indices are always
    /// below this.
    pub fn range(&self) -> usize {
        self.slots.len()
    }

    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    /// Iterate live `(index, value)` pairs in index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &T)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| match slot {
                Slot::Occupied(value) => Some((i, value)),
                Slot::Vacant { .. } => None,
            })
    }
}

impl<T> Default for FreeList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Index<usize> for FreeList<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        match &self.slots[index] {
            Slot::Occupied(value) => value,
            Slot::Vacant { .. } => panic!("free list slot {index} is vacant"),
        }
    }
}

impl<T> IndexMut<usize> for FreeList<T> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        match &mut self.slots[index] {
            Slot::Occupied(value) => value,
            Slot::Vacant { .. } => panic!("free list slot {index} is vacant"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_appends_when_no_holes() {
        let mut list = FreeList::new();
        assert_eq!(list.insert("a"), 0);
        assert_eq!(list.insert("b"), 1);
        assert_eq!(list.len(), 2);
        assert_eq!(list[1], "b");
    }

    #[test]
    fn remove_then_insert_reuses_index() {
        let mut list = FreeList::new();
        let x = list.insert(10);
        let _y = list.insert(20);
        assert_eq!(list.remove(x), Some(10));
        let z = list.insert(30);
        assert_eq!(z, x);
        assert_eq!(list[z], 30);
        assert_eq!(list.range(), 2);
    }

    #[test]
    fn free_chain_is_lifo() {
        let mut list = FreeList::new();
        for i in 0..5 {
            list.insert(i);
        }
        list.remove(1);
        list.remove(3);
        assert_eq!(list.insert(100), 3);
        assert_eq!(list.insert(101), 1);
        assert_eq!(list.insert(102), 5);
    }

    #[test]
    fn indices_stay_stable_across_other_activity() {
        let mut list = FreeList::new();
        let keep = list.insert("keep");
        let mut churn = Vec::new();
        for i in 0..50 {
            churn.push(list.insert("tmp"));
            if i % 3 == 0 {
                let idx = churn.remove(0);
                list.remove(idx);
            }
        }
        assert_eq!(list[keep], "keep");
        list.set(keep, "still");
        assert_eq!(list.get(keep), Some(&"still"));
    }

    #[test]
    fn double_remove_is_rejected() {
        let mut list = FreeList::new();
        let a = list.insert(1);
        let b = list.insert(2);
        assert_eq!(list.remove(a), Some(1));
        assert_eq!(list.remove(a), None);
        assert_eq!(list.len(), 1);
        // Chain still has exactly one hole.
        assert_eq!(list.insert(3), a);
        assert_eq!(list.insert(4), 2);
        assert!(list.contains(b));
    }

    #[test]
    fn clear_keeps_capacity() {
        let mut list = FreeList::with_capacity(16);
        for i in 0..10 {
            list.insert(i);
        }
        list.remove(4);
        let cap = list.capacity();
        list.clear();
        assert!(list.is_empty());
        assert_eq!(list.range(), 0);
        assert_eq!(list.capacity(), cap);
        assert_eq!(list.insert(7), 0);
    }

    #[test]
    fn iter_skips_vacant_slots() {
        let mut list = FreeList::new();
        for i in 0..4 {
            list.insert(i * 10);
        }
        list.remove(2);
        let live: Vec<_> = list.iter().collect();
        assert_eq!(live, vec![(0, &0), (1, &10), (3, &30)]);
        assert!(list.get(2).is_none());
    }

    #[test]
    #[should_panic(expected = "vacant")]
    fn indexing_a_vacant_slot_panics() {
        let mut list = FreeList::new();
        let a = list.insert(1);
        list.remove(a);
        let _value: i32 = list[a];
    }
}
