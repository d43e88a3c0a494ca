//! Sand, water and stone cellular automaton engine.

pub mod api;
pub mod arena;
pub mod cell;
pub mod effects;
pub mod elements;
pub mod random;
pub mod tuning;
pub mod universe;

use arena::{Arena, CellId};
use cell::{Cell, Material};
use effects::{Splash, SplashRelay};
use random::RandomSource;
use tuning::Tuning;

pub use universe::Universe;

/// Double-buffered 2D grid of cells.
///
/// `current` is read during a tick and `next` is written; `swap` publishes
/// `next`. Out-of-bounds reads are empty and writes are no-ops.
#[derive(Debug)]
pub struct Grid {
    pub width: usize,
    pub height: usize,
    pub generation: u32,
    current: Vec<Option<CellId>>,
    next: Vec<Option<CellId>>,
    pub(crate) arena: Arena,
    /// Cells consumed this tick; still visible in `current` until the swap.
    doomed: Vec<CellId>,
    pub(crate) splashes: SplashRelay,
    pub(crate) rng: Box<dyn RandomSource>,
    tuning: Tuning,
}

impl Grid {
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self::with_rng(width, height, Box::new(random::seeded(0)))
    }

    #[must_use]
    pub fn with_rng(width: usize, height: usize, rng: Box<dyn RandomSource>) -> Self {
        let tuning = Tuning::default();
        Self {
            width,
            height,
            generation: 0,
            current: vec![None; width * height],
            next: vec![None; width * height],
            arena: Arena::with_capacity(width * height),
            doomed: Vec::new(),
            splashes: SplashRelay::new(tuning.max_splashes),
            rng,
            tuning,
        }
    }

    #[must_use]
    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn set_tuning(&mut self, tuning: Tuning) {
        self.splashes.set_capacity(tuning.max_splashes);
        self.tuning = tuning;
    }

    #[must_use]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && (x as usize) < self.width && y >= 0 && (y as usize) < self.height
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        self.in_bounds(x, y)
            .then(|| y as usize * self.width + x as usize)
    }

    #[must_use]
    pub(crate) fn id_at(&self, x: i32, y: i32) -> Option<CellId> {
        self.index(x, y).and_then(|i| self.current[i])
    }

    #[must_use]
    pub(crate) fn next_id_at(&self, x: i32, y: i32) -> Option<CellId> {
        self.index(x, y).and_then(|i| self.next[i])
    }

    /// Occupant of `(x, y)` in the current buffer.
    #[must_use]
    pub fn get(&self, x: i32, y: i32) -> Option<&Cell> {
        self.id_at(x, y).and_then(|id| self.arena.get(id))
    }

    /// Place `cell` at `(x, y)` in the current buffer, destroying any occupant.
    pub fn set(&mut self, x: i32, y: i32, mut cell: Cell) {
        let Some(index) = self.index(x, y) else {
            return;
        };
        if let Some(old) = self.current[index].take() {
            self.arena.remove(old);
        }
        cell.x = x;
        cell.y = y;
        self.current[index] = Some(self.arena.insert(cell));
    }

    /// Empty `(x, y)` in the current buffer, returning the destroyed occupant.
    pub fn remove(&mut self, x: i32, y: i32) -> Option<Cell> {
        let index = self.index(x, y)?;
        let id = self.current[index].take()?;
        self.arena.remove(id)
    }

    /// Empty, or water while `displacing` is stone.
    ///
    /// The displacement case lets a stone brush paint into water; ticks
    /// always pass `None`.
    #[must_use]
    pub fn is_empty(&self, x: i32, y: i32, displacing: Option<Material>) -> bool {
        match self.get(x, y) {
            None => true,
            Some(cell) => {
                cell.material == Material::Water && displacing == Some(Material::Stone)
            }
        }
    }

    #[must_use]
    pub fn is_immovable(&self, x: i32, y: i32) -> bool {
        self.get(x, y).is_some_and(Cell::is_immovable)
    }

    /// Slot already written this tick; outside the grid counts as claimed.
    #[must_use]
    pub fn is_claimed(&self, x: i32, y: i32) -> bool {
        self.index(x, y).is_none_or(|i| self.next[i].is_some())
    }

    #[must_use]
    pub fn count_occupied(&self) -> usize {
        self.arena.len()
    }

    /// Occupied cells of the current buffer in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> + '_ {
        self.current
            .iter()
            .flatten()
            .filter_map(|&id| self.arena.get(id))
    }

    #[must_use]
    pub fn splashes(&self) -> &[Splash] {
        self.splashes.particles()
    }

    pub fn clear(&mut self) {
        self.current.fill(None);
        self.next.fill(None);
        self.arena.clear();
        self.doomed.clear();
        self.splashes.clear();
        log::debug!("grid cleared");
    }

    /// Publish `next` as `current` and start an empty `next`.
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.current, &mut self.next);
        self.next.fill(None);
        for id in self.doomed.drain(..) {
            self.arena.remove(id);
        }
        debug_assert_eq!(
            self.current.iter().flatten().count(),
            self.arena.len(),
            "every live cell occupies exactly one slot"
        );
    }

    pub(crate) fn commit(&mut self, id: CellId, x: i32, y: i32) {
        let Some(index) = self.index(x, y) else {
            return;
        };
        debug_assert!(
            self.next[index].is_none_or(|held| held == id),
            "two cells claimed ({x}, {y})"
        );
        self.next[index] = Some(id);
        let supported = self.supports(id, x, y);
        if let Some(cell) = self.arena.get_mut(id) {
            cell.x = x;
            cell.y = y;
            if supported {
                cell.land();
            }
        }
    }

    pub(crate) fn release(&mut self, x: i32, y: i32) {
        if let Some(index) = self.index(x, y) {
            self.next[index] = None;
        }
    }

    pub(crate) fn doom(&mut self, id: CellId) {
        self.doomed.push(id);
    }

    /// Whether cell `id` placed at `(x, y)` would rest on what is below it.
    fn supports(&self, id: CellId, x: i32, y: i32) -> bool {
        if y + 1 >= self.height as i32 {
            return true;
        }
        let Some(material) = self.arena.get(id).map(|c| c.material) else {
            return false;
        };
        match self.id_at(x, y + 1) {
            Some(below) if below != id => self
                .arena
                .get(below)
                .is_some_and(|c| material.rests_on(c.material)),
            _ => false,
        }
    }

    /// Stone is airborne over an empty slot, or over water while it still
    /// carries falling speed.
    fn has_air_below(&self, x: i32, y: i32, vy: f32) -> bool {
        if y + 1 >= self.height as i32 {
            return false;
        }
        match self.get(x, y + 1) {
            None => true,
            Some(below) => below.material == Material::Water && vy > 0.0,
        }
    }

    fn pressure_above(&self, x: i32, y: i32, tuning: &Tuning) -> f32 {
        let stacked = (1..=tuning.pressure_depth)
            .filter(|&d| self.get(x, y - d).is_some())
            .count();
        stacked as f32 * tuning.pressure_per_cell
    }

    /// Advance the simulation by one tick.
    ///
    /// Scans rows bottom-to-top; even rows run left-to-right, odd rows
    /// right-to-left. Cells whose processed flag is already set are skipped.
    pub fn tick(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        for cell in self.arena.iter_mut() {
            cell.updated = false;
        }

        let tuning = self.tuning.clone();
        let w = self.width as i32;
        let h = self.height as i32;

        for y in (0..h).rev() {
            let x_range: Box<dyn Iterator<Item = i32>> = if y % 2 == 0 {
                Box::new(0..w)
            } else {
                Box::new((0..w).rev())
            };
            for x in x_range {
                self.update_slot(x, y, &tuning);
            }
        }

        self.swap();
        self.splashes.step(tuning.gravity);
    }

    fn update_slot(&mut self, x: i32, y: i32, tuning: &Tuning) {
        let Some(id) = self.id_at(x, y) else {
            return;
        };
        let Some(mut cell) = self.arena.get(id).copied() else {
            return;
        };
        if cell.updated {
            return;
        }

        let in_air = cell.material == Material::Stone && self.has_air_below(x, y, cell.vy);
        cell.integrate(in_air, tuning);
        let pressure = self.pressure_above(x, y, tuning);
        let draw = if cell.material == Material::Water {
            self.rng.unit()
        } else {
            0.5
        };
        cell.apply_pressure(pressure, draw);

        // At most one slot per axis per tick, so nothing tunnels past an occupant.
        let step = |v: f32| (v.round() as i32).clamp(-1, 1);
        let tx = (x + step(cell.vx)).clamp(0, self.width as i32 - 1);
        let ty = (y + step(cell.vy)).clamp(0, self.height as i32 - 1);
        let (dx, dy) = (tx - x, ty - y);

        let material = cell.material;
        let vy = cell.vy;
        let mut api = api::CellApi::new(self, tuning, x, y, id, cell);
        if api.is_vacant(dx, dy) && !api.is_claimed(dx, dy) {
            api.move_to(dx, dy);
            if material == Material::Water && dy > 0 && api.chance(tuning.splash_probability) {
                api.splash(dx, dy, vy);
            }
            return;
        }
        elements::update_cell(material, &mut api);
    }

    /// Fill the circular brush footprint with new `material` cells.
    ///
    /// Only empty slots are painted, except that stone displaces water.
    /// Returns the number of cells written.
    pub fn place_material(&mut self, material: Material, cx: i32, cy: i32, radius: i32) -> usize {
        let radius = self.brush_radius(radius);
        let mut written = 0;
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if !in_brush(dx, dy, radius) {
                    continue;
                }
                let (x, y) = (cx.saturating_add(dx), cy.saturating_add(dy));
                if !self.in_bounds(x, y) || !self.is_empty(x, y, Some(material)) {
                    continue;
                }
                let displaced_water = self.get(x, y).is_some();

                let mut cell = Cell::new(material, x, y);
                if material != Material::Stone {
                    let vx = (self.rng.unit() - 0.5) * 0.5;
                    let vy = self.rng.unit() * 0.5;
                    cell = cell.with_velocity(vx, vy);
                }
                self.set(x, y, cell);
                written += 1;

                if displaced_water {
                    self.splashes.spawn(x, y, 0.0, self.rng.as_mut());
                }
                let lands_on_water = self
                    .get(x, y + 1)
                    .is_some_and(|c| c.material == Material::Water);
                if material == Material::Water
                    && lands_on_water
                    && self.rng.chance(self.tuning.placement_splash_chance)
                {
                    self.splashes.spawn(x, y, cell.vy, self.rng.as_mut());
                }
            }
        }
        log::debug!("placed {written} {material} at ({cx}, {cy}) r={radius}");
        written
    }

    /// Empty every slot in the circular brush footprint. Returns cells removed.
    pub fn erase(&mut self, cx: i32, cy: i32, radius: i32) -> usize {
        let radius = self.brush_radius(radius);
        let mut removed = 0;
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if in_brush(dx, dy, radius)
                    && self
                        .remove(cx.saturating_add(dx), cy.saturating_add(dy))
                        .is_some()
                {
                    removed += 1;
                }
            }
        }
        log::debug!("erased {removed} cells at ({cx}, {cy}) r={radius}");
        removed
    }

    /// A brush wider than the grid paints nothing extra.
    fn brush_radius(&self, radius: i32) -> i32 {
        let widest = i32::try_from(self.width.max(self.height)).unwrap_or(i32::MAX);
        radius.clamp(0, widest)
    }
}

/// Euclidean brush footprint, in `i64` so wide brushes cannot overflow.
fn in_brush(dx: i32, dy: i32, radius: i32) -> bool {
    let (dx, dy, r) = (i64::from(dx), i64::from(dy), i64::from(radius));
    dx * dx + dy * dy <= r * r
}
