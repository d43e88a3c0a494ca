//! Owning store for live cells.
//!
//! Grid buffers hold `CellId`s rather than cells, so a cell keeps its
//! identity while it is referenced from `current` and `next` during a
//! tick, and neighbour mutations (wetting, impact kicks) land on the one
//! live copy no matter which buffer it has been written to.

use crate::cell::Cell;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct CellId(u32);

impl CellId {
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Default)]
pub struct Arena {
    slots: Vec<Option<Cell>>,
    free: Vec<u32>,
    live: usize,
}

impl Arena {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            live: 0,
        }
    }

    pub fn insert(&mut self, cell: Cell) -> CellId {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            self.slots[index as usize] = Some(cell);
            CellId(index)
        } else {
            self.slots.push(Some(cell));
            CellId((self.slots.len() - 1) as u32)
        }
    }

    pub fn remove(&mut self, id: CellId) -> Option<Cell> {
        let removed = self.slots.get_mut(id.index())?.take();
        if removed.is_some() {
            self.live -= 1;
            self.free.push(id.0);
        }
        removed
    }

    #[must_use]
    pub fn get(&self, id: CellId) -> Option<&Cell> {
        self.slots.get(id.index())?.as_ref()
    }

    pub fn get_mut(&mut self, id: CellId) -> Option<&mut Cell> {
        self.slots.get_mut(id.index())?.as_mut()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.live
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.live = 0;
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Cell> {
        self.slots.iter_mut().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Material;

    #[test]
    fn insert_get_remove() {
        let mut arena = Arena::default();
        let id = arena.insert(Cell::new(Material::Sand, 1, 2));
        assert_eq!(arena.len(), 1);
        assert_eq!(arena.get(id).map(|c| c.material), Some(Material::Sand));

        let removed = arena.remove(id);
        assert_eq!(removed.map(|c| (c.x, c.y)), Some((1, 2)));
        assert!(arena.is_empty());
        assert!(arena.get(id).is_none());
        assert!(arena.remove(id).is_none());
    }

    #[test]
    fn freed_slots_are_reused() {
        let mut arena = Arena::default();
        let a = arena.insert(Cell::new(Material::Sand, 0, 0));
        let _b = arena.insert(Cell::new(Material::Water, 0, 0));
        arena.remove(a);
        let c = arena.insert(Cell::new(Material::Stone, 0, 0));
        assert_eq!(a, c);
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn mutation_is_visible_through_id() {
        let mut arena = Arena::with_capacity(4);
        let id = arena.insert(Cell::new(Material::Sand, 0, 0));
        if let Some(cell) = arena.get_mut(id) {
            cell.wetness = 3.0;
        }
        assert!((arena.get(id).map_or(0.0, |c| c.wetness) - 3.0).abs() < f32::EPSILON);
    }
}
