//! Stone: falls while airborne, strikes water, otherwise an obstacle.

use crate::api::CellApi;
use crate::cell::Material;

pub fn update_stone(api: &mut CellApi) {
    if api.cell.in_air && !api.at_floor() {
        match api.material(0, 1) {
            None if !api.is_claimed(0, 1) => {
                api.move_to(0, 1);
                return;
            }
            Some(Material::Water) if api.holds_own_slot(0, 1) => {
                impact(api);
                api.cell.land();
                api.stay();
                return;
            }
            _ => {}
        }
    }
    api.stay();
}

/// Splash and throw the (up to three) water cells under the stone outward
/// and up. The stone keeps its slot; the water moves on a later tick.
fn impact(api: &mut CellApi) {
    let vy = api.cell.vy;
    api.splash(0, 1, vy);
    let force = api.tuning.stone_impact_force;
    for dx in -1..=1 {
        if let Some(water) = api
            .neighbor_mut(dx, 1)
            .filter(|c| c.material == Material::Water)
        {
            water.vx = dx as f32 * force;
            water.vy = -force;
        }
    }
    log::trace!("stone impact at ({}, {}) vy={vy:.2}", api.x, api.y);
}
