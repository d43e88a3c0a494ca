//! Water element: falls, slides off stone, flows diagonally, soaks into
//! sand, spreads horizontally.
//!
//! Horizontal spread ray-casts up to `water_spread_rate * (1 + pressure)`
//! cells in a random direction and takes the nearest free slot. Water under
//! more pressure may look past unprocessed, lower-pressure water in that
//! first direction; the return direction stops at any occupant.

use crate::api::CellApi;
use crate::cell::Material;

/// Horizontal speed given to spreading water.
const SPREAD_SPEED: f32 = 2.0;

pub fn update_water(api: &mut CellApi) {
    if !api.at_floor() {
        let below = api.material(0, 1);

        // Phase 1: gravity.
        if below.is_none() && !api.is_claimed(0, 1) && !api.is_immovable(0, 1) {
            api.cell.vy += api.tuning.gravity;
            api.move_to(0, 1);
            return;
        }

        // Phase 2: pushed aside by stone.
        if below == Some(Material::Stone) {
            for dx in api.sides() {
                if api.is_open(dx, 0) {
                    api.move_to(dx, 0);
                    return;
                }
            }
            api.stay();
            return;
        }

        // Phase 3: diagonal fall.
        for dx in api.sides() {
            if api.is_open(dx, 1) && !api.is_immovable(dx, 1) {
                api.cell.vx = dx as f32;
                api.cell.vy = 1.0;
                api.move_to(dx, 1);
                return;
            }
        }

        // Phase 4: partial absorption into sand.
        let (absorb, consume) = (
            api.tuning.absorption_chance,
            api.tuning.absorption_removal_chance,
        );
        if below == Some(Material::Sand) && api.chance(absorb) {
            soak_nearby_sand(api);
            if api.chance(consume) {
                log::trace!("water absorbed at ({}, {})", api.x, api.y);
                api.remove();
            } else {
                api.stay();
            }
            return;
        }
    }

    // Phase 5: horizontal spread.
    let distance = (api.tuning.water_spread_rate * (1.0 + api.cell.pressure)).floor() as i32;
    let dir = api.direction();
    if try_spread(api, dir, distance, true) || try_spread(api, -dir, distance, false) {
        return;
    }
    api.stay();
}

/// Wet sand in this row and the one below, fading linearly with
/// horizontal distance.
fn soak_nearby_sand(api: &mut CellApi) {
    let radius = api.tuning.wetness_spread_radius;
    let rate = api.tuning.water_absorption_rate;
    let cap = api.tuning.max_wetness;
    for dy in 0..=1 {
        for dx in -radius..=radius {
            if let Some(sand) = api
                .neighbor_mut(dx, dy)
                .filter(|c| c.material == Material::Sand && c.wetness < cap)
            {
                let falloff = 1.0 - dx.abs() as f32 / (radius as f32 + 1.0);
                sand.wet(rate * falloff, cap);
            }
        }
    }
}

/// Ray-cast up to `distance` cells in direction `dir` for a free slot.
///
/// Never passes the grid edge, resting stone or (unless `bypass` allows
/// it) another occupant.
fn try_spread(api: &mut CellApi, dir: i32, distance: i32, bypass: bool) -> bool {
    for step in 1..=distance {
        let dx = dir * step;
        if !api.in_bounds(dx, 0) || api.is_immovable(dx, 0) {
            return false;
        }
        match api.get(dx, 0) {
            None => {
                if !api.is_claimed(dx, 0) {
                    api.cell.vx = dir as f32 * SPREAD_SPEED;
                    api.move_to(dx, 0);
                    return true;
                }
            }
            Some(neighbor) => {
                let defers = neighbor.material == Material::Water
                    && !neighbor.updated
                    && api.cell.pressure > neighbor.pressure;
                if !(bypass && defers) {
                    return false;
                }
            }
        }
    }
    false
}
