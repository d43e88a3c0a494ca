//! Browser-facing facade over [`Grid`].
//!
//! The shell owns the selected material, eraser toggle and brush size and
//! passes them in with each command.

use wasm_bindgen::prelude::*;

use crate::cell::{Material, Rgba, UnknownMaterial};
use crate::random;
use crate::tuning::{Tuning, TuningError};
use crate::Grid;

/// Install the console logger and panic hook.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn init_logging() {
    console_error_panic_hook::set_once();
    // A second call finds the logger already installed.
    console_log::init_with_level(log::Level::Debug).ok();
}

#[wasm_bindgen]
#[derive(Debug)]
pub struct Universe {
    grid: Grid,
}

#[wasm_bindgen]
impl Universe {
    #[wasm_bindgen(constructor)]
    #[must_use]
    pub fn new(width: u32, height: u32, seed: u64) -> Self {
        log::info!("universe {width}x{height} seed={seed}");
        Self {
            grid: Grid::with_rng(width as usize, height as usize, Box::new(random::seeded(seed))),
        }
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.grid.width as u32
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.grid.height as u32
    }

    pub fn tick(&mut self) {
        self.grid.tick();
    }

    /// Paint `material` (shell code 1..=3) with a circular brush.
    /// Unknown codes paint nothing.
    pub fn place(&mut self, material: u8, x: i32, y: i32, radius: i32) -> u32 {
        match self.try_place(material, x, y, radius) {
            Ok(written) => written as u32,
            Err(err) => {
                log::warn!("{err}");
                0
            }
        }
    }

    pub fn erase(&mut self, x: i32, y: i32, radius: i32) -> u32 {
        self.grid.erase(x, y, radius) as u32
    }

    pub fn clear(&mut self) {
        self.grid.clear();
    }

    #[must_use]
    pub fn count_occupied(&self) -> u32 {
        self.grid.count_occupied() as u32
    }

    /// Material code at `(x, y)`; 0 when empty or out of bounds.
    #[must_use]
    pub fn material_at(&self, x: i32, y: i32) -> u8 {
        self.grid.get(x, y).map_or(0, |c| c.material as u8)
    }

    /// Row-major RGBA bytes for every slot; empty slots are transparent.
    #[must_use]
    pub fn colors(&self) -> Vec<u8> {
        let max_wetness = self.grid.tuning().max_wetness;
        let mut bytes = Vec::with_capacity(self.grid.width * self.grid.height * 4);
        for y in 0..self.grid.height as i32 {
            for x in 0..self.grid.width as i32 {
                let color = self
                    .grid
                    .get(x, y)
                    .map_or(Rgba::TRANSPARENT, |c| c.color(max_wetness));
                bytes.extend_from_slice(&color.to_array());
            }
        }
        bytes
    }

    /// Flat `[x, y, size, alpha]` quadruples for the live splash droplets.
    #[must_use]
    pub fn splashes(&self) -> Vec<f32> {
        self.grid
            .splashes()
            .iter()
            .flat_map(|s| [s.x, s.y, s.size, s.alpha()])
            .collect()
    }

    /// Replace tuning from a (possibly partial) JSON object.
    pub fn set_tuning(&mut self, json: &str) -> Result<(), JsValue> {
        self.try_set_tuning(json)
            .map_err(|err| JsValue::from_str(&err.to_string()))
    }
}

impl Universe {
    #[must_use]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn try_place(&mut self, material: u8, x: i32, y: i32, radius: i32) -> Result<usize, UnknownMaterial> {
        let material = Material::try_from(material)?;
        Ok(self.grid.place_material(material, x, y, radius))
    }

    pub fn try_set_tuning(&mut self, json: &str) -> Result<(), TuningError> {
        let tuning = Tuning::from_json(json).inspect_err(|err| log::warn!("rejected tuning: {err}"))?;
        log::info!("tuning replaced");
        self.grid.set_tuning(tuning);
        Ok(())
    }
}
