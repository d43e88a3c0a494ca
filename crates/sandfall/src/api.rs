//! Relative-offset API for material update functions.

use crate::arena::CellId;
use crate::cell::{Cell, Material};
use crate::tuning::Tuning;
use crate::Grid;

/// View of the grid centred on the cell being updated.
///
/// Reads go to the `current` buffer, writes go to `next`. The cell itself
/// is held by value in `cell` while its rule runs and is written back to
/// the arena when the rule commits with `move_to`, `stay`, `swap_with` or
/// `remove`. Out-of-bounds reads are empty; out-of-bounds moves are never
/// attempted by the rules.
#[derive(Debug)]
pub struct CellApi<'a> {
    grid: &'a mut Grid,
    pub tuning: &'a Tuning,
    pub x: i32,
    pub y: i32,
    id: CellId,
    pub cell: Cell,
}

impl<'a> CellApi<'a> {
    pub fn new(grid: &'a mut Grid, tuning: &'a Tuning, x: i32, y: i32, id: CellId, cell: Cell) -> Self {
        Self {
            grid,
            tuning,
            x,
            y,
            id,
            cell,
        }
    }

    #[must_use]
    pub fn in_bounds(&self, dx: i32, dy: i32) -> bool {
        self.grid.in_bounds(self.x + dx, self.y + dy)
    }

    /// On the bottom row; nothing below to fall into.
    #[must_use]
    pub fn at_floor(&self) -> bool {
        self.y >= self.grid.height as i32 - 1
    }

    #[must_use]
    pub fn get(&self, dx: i32, dy: i32) -> Option<Cell> {
        self.grid.get(self.x + dx, self.y + dy).copied()
    }

    #[must_use]
    pub fn material(&self, dx: i32, dy: i32) -> Option<Material> {
        self.grid.get(self.x + dx, self.y + dy).map(|c| c.material)
    }

    /// Empty in `current`. Placement-only displacement never applies during a tick.
    #[must_use]
    pub fn is_vacant(&self, dx: i32, dy: i32) -> bool {
        self.grid.is_empty(self.x + dx, self.y + dy, None)
    }

    /// Already written to in `next` this tick (or outside the grid).
    #[must_use]
    pub fn is_claimed(&self, dx: i32, dy: i32) -> bool {
        self.grid.is_claimed(self.x + dx, self.y + dy)
    }

    /// In bounds, empty now and still free in `next`.
    #[must_use]
    pub fn is_open(&self, dx: i32, dy: i32) -> bool {
        self.in_bounds(dx, dy) && self.is_vacant(dx, dy) && !self.is_claimed(dx, dy)
    }

    #[must_use]
    pub fn is_immovable(&self, dx: i32, dy: i32) -> bool {
        self.grid.is_immovable(self.x + dx, self.y + dy)
    }

    /// The occupant of `(dx, dy)` has committed to staying in its own slot
    /// this tick, so it can still be displaced by a swap.
    #[must_use]
    pub fn holds_own_slot(&self, dx: i32, dy: i32) -> bool {
        let (x, y) = (self.x + dx, self.y + dy);
        match (self.grid.id_at(x, y), self.grid.next_id_at(x, y)) {
            (Some(now), Some(next)) => now == next,
            _ => false,
        }
    }

    /// Mutable access to a neighbour through the arena, wherever it has been
    /// written this tick.
    pub fn neighbor_mut(&mut self, dx: i32, dy: i32) -> Option<&mut Cell> {
        let id = self.grid.id_at(self.x + dx, self.y + dy)?;
        if id == self.id {
            return None;
        }
        self.grid.arena.get_mut(id)
    }

    pub fn unit(&mut self) -> f32 {
        self.grid.rng.unit()
    }

    pub fn chance(&mut self, p: f32) -> bool {
        self.grid.rng.chance(p)
    }

    /// Random left/right preference: `[-1, 1]` or `[1, -1]`.
    pub fn sides(&mut self) -> [i32; 2] {
        if self.grid.rng.coin() {
            [-1, 1]
        } else {
            [1, -1]
        }
    }

    /// Random horizontal direction, `1` or `-1`.
    pub fn direction(&mut self) -> i32 {
        if self.grid.rng.coin() {
            1
        } else {
            -1
        }
    }

    pub fn splash(&mut self, dx: i32, dy: i32, vy: f32) {
        let grid = &mut *self.grid;
        grid.splashes
            .spawn(self.x + dx, self.y + dy, vy, grid.rng.as_mut());
    }

    pub fn move_to(&mut self, dx: i32, dy: i32) {
        self.store();
        self.grid.commit(self.id, self.x + dx, self.y + dy);
    }

    pub fn stay(&mut self) {
        self.move_to(0, 0);
    }

    /// Trade places with the occupant of `(dx, dy)`, which must hold its own
    /// slot in `next`.
    pub fn swap_with(&mut self, dx: i32, dy: i32) {
        let Some(other) = self.grid.id_at(self.x + dx, self.y + dy) else {
            self.stay();
            return;
        };
        self.grid.release(self.x + dx, self.y + dy);
        self.move_to(dx, dy);
        self.grid.commit(other, self.x, self.y);
    }

    /// Drop this cell from the simulation; it is reclaimed at the buffer swap.
    pub fn remove(&mut self) {
        self.store();
        self.grid.doom(self.id);
    }

    fn store(&mut self) {
        if let Some(slot) = self.grid.arena.get_mut(self.id) {
            *slot = self.cell;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::ScriptedRandom;
    use proptest::prelude::*;

    fn api_at<'a>(grid: &'a mut Grid, tuning: &'a Tuning, x: i32, y: i32) -> CellApi<'a> {
        let id = grid.id_at(x, y).expect("cell at origin");
        let cell = *grid.get(x, y).expect("cell at origin");
        CellApi::new(grid, tuning, x, y, id, cell)
    }

    #[test]
    fn move_to_writes_next_and_position() {
        let tuning = Tuning::default();
        let mut grid = Grid::new(8, 8);
        grid.set(3, 3, Cell::new(Material::Sand, 3, 3));
        {
            let mut api = api_at(&mut grid, &tuning, 3, 3);
            api.cell.vx = 0.25;
            api.move_to(1, 1);
        }
        assert!(grid.is_claimed(4, 4));
        // `current` is untouched until the swap.
        assert_eq!(grid.get(3, 3).map(|c| c.material), Some(Material::Sand));
        grid.swap();
        let moved = grid.get(4, 4).copied().expect("moved cell");
        assert_eq!((moved.x, moved.y), (4, 4));
        assert!((moved.vx - 0.25).abs() < f32::EPSILON);
        assert!(grid.get(3, 3).is_none());
    }

    #[test]
    fn swap_with_exchanges_slots() {
        let tuning = Tuning::default();
        let mut grid = Grid::new(4, 4);
        grid.set(1, 1, Cell::new(Material::Sand, 1, 1));
        grid.set(1, 2, Cell::new(Material::Water, 1, 2));
        {
            let mut water = api_at(&mut grid, &tuning, 1, 2);
            water.stay();
        }
        {
            let sand = api_at(&mut grid, &tuning, 1, 1);
            assert!(sand.holds_own_slot(0, 1));
        }
        {
            let mut sand = api_at(&mut grid, &tuning, 1, 1);
            sand.swap_with(0, 1);
        }
        grid.swap();
        assert_eq!(grid.get(1, 2).map(|c| c.material), Some(Material::Sand));
        assert_eq!(grid.get(1, 1).map(|c| c.material), Some(Material::Water));
        assert_eq!(grid.count_occupied(), 2);
    }

    #[test]
    fn remove_reclaims_at_swap() {
        let tuning = Tuning::default();
        let mut grid = Grid::new(4, 4);
        grid.set(0, 0, Cell::new(Material::Water, 0, 0));
        {
            let mut api = api_at(&mut grid, &tuning, 0, 0);
            api.remove();
        }
        // Still visible to the rest of the pass.
        assert!(grid.get(0, 0).is_some());
        grid.swap();
        assert!(grid.get(0, 0).is_none());
        assert_eq!(grid.count_occupied(), 0);
    }

    #[test]
    fn neighbor_mut_skips_self() {
        let tuning = Tuning::default();
        let mut grid = Grid::new(4, 4);
        grid.set(1, 1, Cell::new(Material::Water, 1, 1));
        grid.set(2, 1, Cell::new(Material::Sand, 2, 1));
        let mut api = api_at(&mut grid, &tuning, 1, 1);
        assert!(api.neighbor_mut(0, 0).is_none());
        if let Some(sand) = api.neighbor_mut(1, 0) {
            sand.wetness = 2.0;
        }
        assert!((api.get(1, 0).map_or(0.0, |c| c.wetness) - 2.0).abs() < f32::EPSILON);
    }

    #[test]
    fn scripted_sides() {
        let tuning = Tuning::default();
        let mut grid = Grid::with_rng(4, 4, Box::new(ScriptedRandom::new(vec![0.9, 0.1])));
        grid.set(1, 1, Cell::new(Material::Water, 1, 1));
        let mut api = api_at(&mut grid, &tuning, 1, 1);
        assert_eq!(api.sides(), [-1, 1]);
        assert_eq!(api.sides(), [1, -1]);
    }

    proptest! {
        #[test]
        fn prop_out_of_bounds_reads_are_empty(
            x in 0i32..16,
            y in 0i32..16,
            dx in -40i32..40,
            dy in -40i32..40,
        ) {
            prop_assume!(!(0..16).contains(&(x + dx)) || !(0..16).contains(&(y + dy)));
            let tuning = Tuning::default();
            let mut grid = Grid::new(16, 16);
            grid.set(x, y, Cell::new(Material::Sand, x, y));
            let api = api_at(&mut grid, &tuning, x, y);
            prop_assert!(api.get(dx, dy).is_none());
            prop_assert!(!api.in_bounds(dx, dy));
            prop_assert!(api.is_claimed(dx, dy));
            prop_assert!(!api.is_open(dx, dy));
        }
    }
}
