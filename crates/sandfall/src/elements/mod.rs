//! Per-material update rules dispatched from the tick loop.
//!
//! A rule runs only when a cell could not take its free-fall target; every
//! rule ends by committing the cell somewhere (or removing it).

mod sand;
mod stone;
mod water;

use crate::api::CellApi;
use crate::cell::Material;

pub fn update_cell(material: Material, api: &mut CellApi) {
    match material {
        Material::Sand => sand::update_sand(api),
        Material::Water => water::update_water(api),
        Material::Stone => stone::update_stone(api),
    }
}
