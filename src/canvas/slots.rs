use std::sync::Arc;

/// Identity comparison for values stored in a [`SlotTable`].
pub trait SameIdentity {
    fn same_identity(&self, other: &Self) -> bool;
}

impl<T: ?Sized> SameIdentity for Arc<T> {
    fn same_identity(&self, other: &Self) -> bool {
        Arc::as_ptr(self).cast::<()>() == Arc::as_ptr(other).cast::<()>()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotInsert {
    Inserted(usize),
    AlreadyPresent(usize),
    Full,
}

/// Fixed-capacity registry keyed by identity. A slot is free when empty.
#[derive(Debug, Clone)]
pub struct SlotTable<T> {
    slots: Vec<Option<T>>,
}

impl<T: SameIdentity> SlotTable<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: std::iter::repeat_with(|| None).take(capacity).collect(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn position(&self, item: &T) -> Option<usize> {
        self.slots
            .iter()
            .position(|slot| slot.as_ref().is_some_and(|held| held.same_identity(item)))
    }

    /// Places `item` in the lowest free slot unless it is already held.
    pub fn insert(&mut self, item: T) -> SlotInsert {
        let mut open = None;
        for idx in (0..self.slots.len()).rev() {
            match &self.slots[idx] {
                Some(held) if held.same_identity(&item) => return SlotInsert::AlreadyPresent(idx),
                Some(_) => {}
                None => open = Some(idx),
            }
        }
        match open {
            Some(idx) => {
                self.slots[idx] = Some(item);
                SlotInsert::Inserted(idx)
            }
            None => SlotInsert::Full,
        }
    }

    pub fn remove(&mut self, item: &T) -> Option<usize> {
        let idx = self.position(item)?;
        self.slots[idx] = None;
        Some(idx)
    }

    pub fn get(&self, idx: usize) -> Option<&T> {
        self.slots.get(idx).and_then(Option::as_ref)
    }

    /// Occupied slots in index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(idx, slot)| slot.as_ref().map(|item| (idx, item)))
    }
}
