//! Sand: falls, sinks through water, rests on stone, slumps diagonally.
//!
//! Slumping is gated by an angle of repose: a diagonal with full support
//! two rows down is only taken when a draw clears the repose probability,
//! which is higher for wet sand, so wet sand holds steeper slopes.

use crate::api::CellApi;
use crate::cell::Material;

/// Velocity given to sand sliding down a diagonal.
const SLUMP_VX: f32 = 0.5;
const SLUMP_VY: f32 = 1.0;

pub fn update_sand(api: &mut CellApi) {
    if !api.at_floor() {
        match api.material(0, 1) {
            None if !api.is_claimed(0, 1) => {
                fall(api);
                return;
            }
            Some(Material::Water) => {
                // The water already left this slot in `next`.
                if !api.is_claimed(0, 1) {
                    fall(api);
                    return;
                }
                if api.holds_own_slot(0, 1) && !api.is_claimed(0, 0) {
                    let (amount, cap) = (api.tuning.sand_wetting, api.tuning.max_wetness);
                    api.cell.wet(amount, cap);
                    api.swap_with(0, 1);
                    return;
                }
            }
            Some(Material::Stone) => {
                api.stay();
                return;
            }
            _ => {}
        }

        if try_slump(api) {
            return;
        }
    }
    api.stay();
}

fn fall(api: &mut CellApi) {
    api.cell.vy += api.tuning.gravity;
    api.move_to(0, 1);
}

fn try_slump(api: &mut CellApi) -> bool {
    let repose = if api.cell.wetness > 0.0 {
        api.tuning.wet_angle_of_repose
    } else {
        api.tuning.dry_angle_of_repose
    };

    for dx in api.sides() {
        if !api.in_bounds(dx, 0) {
            continue;
        }
        let diagonal_open = api.is_open(dx, 1) && !api.is_immovable(dx, 1);
        if !diagonal_open || api.material(dx, 0).is_some() {
            continue;
        }
        let support = (dx - 1..=dx + 1)
            .filter(|&sx| api.material(sx, 2).is_some())
            .count() as u32;
        if support < api.tuning.support_threshold || api.unit() >= repose {
            api.cell.vx = dx as f32 * SLUMP_VX;
            api.cell.vy = SLUMP_VY;
            api.move_to(dx, 1);
            return true;
        }
    }
    false
}
