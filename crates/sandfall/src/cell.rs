//! Cell and Material types for the simulation grid.

use std::fmt;

use crate::tuning::Tuning;

/// Velocity components are clamped to `[-MAX_SPEED, MAX_SPEED]`.
pub const MAX_SPEED: f32 = 5.0;

/// Below this on both axes a cell counts as settled.
pub const SETTLE_EPSILON: f32 = 0.01;

const WETNESS_DECAY: f32 = 0.001;

/// Discriminant values are the material codes exchanged with the shell; 0 is empty.
#[repr(u8)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Material {
    Sand = 1,
    Water = 2,
    Stone = 3,
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sand => write!(f, "Sand"),
            Self::Water => write!(f, "Water"),
            Self::Stone => write!(f, "Stone"),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct UnknownMaterial(pub u8);

impl fmt::Display for UnknownMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown material code {}", self.0)
    }
}

impl std::error::Error for UnknownMaterial {}

impl TryFrom<u8> for Material {
    type Error = UnknownMaterial;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Self::Sand),
            2 => Ok(Self::Water),
            3 => Ok(Self::Stone),
            other => Err(UnknownMaterial(other)),
        }
    }
}

/// Fixed per-material physical constants.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Properties {
    pub mass: f32,
    pub density: f32,
    pub friction: f32,
    pub inertial_resistance: f32,
}

impl Material {
    #[must_use]
    pub const fn properties(self) -> Properties {
        match self {
            Self::Sand => Properties {
                mass: 1.5,
                density: 1.5,
                friction: 0.5,
                inertial_resistance: 0.3,
            },
            Self::Water => Properties {
                mass: 1.0,
                density: 1.0,
                friction: 0.05,
                inertial_resistance: 0.1,
            },
            Self::Stone => Properties {
                mass: 2.0,
                density: 2.0,
                friction: 0.8,
                inertial_resistance: 0.5,
            },
        }
    }

    #[must_use]
    pub const fn base_color(self) -> Rgba {
        match self {
            Self::Sand => DRY_SAND,
            Self::Water => Rgba::new(30, 144, 255, 200),
            Self::Stone => Rgba::new(128, 128, 128, 255),
        }
    }

    /// Whether a cell of this material comes to rest on top of `below`
    /// instead of sinking into it.
    #[must_use]
    pub const fn rests_on(self, below: Material) -> bool {
        match self {
            Self::Water => true,
            Self::Sand | Self::Stone => !matches!(below, Self::Water),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);

    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    #[must_use]
    pub fn lerp(self, other: Self, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (f32::from(a) + (f32::from(b) - f32::from(a)) * t).round() as u8;
        Self::new(
            mix(self.r, other.r),
            mix(self.g, other.g),
            mix(self.b, other.b),
            mix(self.a, other.a),
        )
    }

    #[must_use]
    pub const fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

pub const DRY_SAND: Rgba = Rgba::new(244, 164, 96, 255);
pub const WET_SAND: Rgba = Rgba::new(101, 67, 33, 255);

/// One occupied grid slot.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Cell {
    pub material: Material,
    /// Mirrors the slot holding this cell; rewritten on every placement.
    pub x: i32,
    pub y: i32,
    pub vx: f32,
    pub vy: f32,
    pub settled: bool,
    pub pressure: f32,
    /// Sand only.
    pub wetness: f32,
    /// Stone only: nothing beneath that can hold it up.
    pub in_air: bool,
    pub updated: bool,
    pub age: u32,
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@({}, {})", self.material, self.x, self.y)
    }
}

impl Cell {
    #[must_use]
    pub fn new(material: Material, x: i32, y: i32) -> Self {
        Self {
            material,
            x,
            y,
            vx: 0.0,
            vy: 0.0,
            settled: true,
            pressure: 0.0,
            wetness: 0.0,
            in_air: false,
            updated: false,
            age: 0,
        }
    }

    #[must_use]
    pub fn with_velocity(mut self, vx: f32, vy: f32) -> Self {
        self.vx = vx;
        self.vy = vy;
        self.refresh_settled();
        self
    }

    /// Per-tick integration: gravity, damping, clamping and wetness decay.
    ///
    /// `in_air` is only consulted for stone.
    pub fn integrate(&mut self, in_air: bool, tuning: &Tuning) {
        self.age = self.age.wrapping_add(1);
        self.updated = true;
        let props = self.material.properties();

        match self.material {
            Material::Stone => {
                self.in_air = in_air;
                if in_air {
                    self.vy += tuning.stone_gravity * props.mass;
                } else {
                    self.vx = 0.0;
                    self.vy = 0.0;
                }
            }
            Material::Sand => {
                let friction = tuning.sand_friction;
                self.vy += tuning.gravity * props.mass;
                self.vx *= 1.0 - friction;
                self.vy *= 1.0 - friction * 0.5;
            }
            Material::Water => {
                self.vy += tuning.gravity * props.mass;
                self.vx *= tuning.water_viscosity;
                self.vy *= tuning.water_viscosity;
            }
        }

        self.vx = self.vx.clamp(-MAX_SPEED, MAX_SPEED);
        self.vy = self.vy.clamp(-MAX_SPEED, MAX_SPEED);
        self.refresh_settled();

        if self.material == Material::Sand && self.wetness > 0.0 {
            self.wetness = (self.wetness - WETNESS_DECAY).max(0.0);
        }
    }

    /// Store this tick's pressure; water turns it into lateral jitter from `draw` in `[0, 1)`.
    pub fn apply_pressure(&mut self, pressure: f32, draw: f32) {
        self.pressure = pressure;
        if self.material == Material::Water {
            self.vx += (draw - 0.5) * pressure * 0.1;
        }
    }

    /// Kill vertical motion after coming to rest on support.
    pub fn land(&mut self) {
        self.vy = 0.0;
        self.refresh_settled();
    }

    pub fn wet(&mut self, amount: f32, cap: f32) {
        self.wetness = (self.wetness + amount).min(cap);
    }

    /// Resting stone is an obstacle; falling stone will move out of the way.
    #[must_use]
    pub fn is_immovable(&self) -> bool {
        self.material == Material::Stone && !self.in_air
    }

    #[must_use]
    pub fn color(&self, max_wetness: f32) -> Rgba {
        if self.material == Material::Sand && self.wetness > 0.0 && max_wetness > 0.0 {
            let amount = (self.wetness / max_wetness).min(1.0);
            return DRY_SAND.lerp(WET_SAND, amount.powf(0.7));
        }
        self.material.base_color()
    }

    fn refresh_settled(&mut self) {
        self.settled = self.vx.abs() < SETTLE_EPSILON && self.vy.abs() < SETTLE_EPSILON;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn arb_material() -> impl Strategy<Value = Material> {
        prop_oneof![
            Just(Material::Sand),
            Just(Material::Water),
            Just(Material::Stone),
        ]
    }

    #[test]
    fn material_codes_round_trip() {
        for material in [Material::Sand, Material::Water, Material::Stone] {
            assert_eq!(Material::try_from(material as u8), Ok(material));
        }
        assert_eq!(Material::try_from(0), Err(UnknownMaterial(0)));
        assert_eq!(Material::try_from(9), Err(UnknownMaterial(9)));
    }

    #[test]
    fn material_display() {
        assert_eq!(format!("{}", Material::Sand), "Sand");
        assert_eq!(format!("{}", Cell::new(Material::Stone, 2, 3)), "Stone@(2, 3)");
    }

    #[test]
    fn new_cell_is_at_rest() {
        let cell = Cell::new(Material::Water, 4, 7);
        assert_eq!((cell.x, cell.y), (4, 7));
        assert!(cell.settled);
        assert!(!cell.updated);
        assert!(cell.wetness.abs() < f32::EPSILON);
    }

    #[test]
    fn sand_integration_adds_damped_gravity() {
        let tuning = Tuning::default();
        let mut sand = Cell::new(Material::Sand, 0, 0);
        sand.integrate(false, &tuning);
        // (0 + 0.5 * 1.5) * (1 - 0.25)
        assert!((sand.vy - 0.5625).abs() < 1e-6);
        assert!(sand.updated);
        assert!(!sand.settled);
        assert_eq!(sand.age, 1);
    }

    #[test]
    fn water_integration_applies_viscosity() {
        let tuning = Tuning::default();
        let mut water = Cell::new(Material::Water, 0, 0).with_velocity(1.0, 0.0);
        water.integrate(false, &tuning);
        assert!((water.vx - 0.95).abs() < 1e-6);
        assert!((water.vy - 0.475).abs() < 1e-6);
    }

    #[test]
    fn resting_stone_loses_velocity() {
        let tuning = Tuning::default();
        let mut stone = Cell::new(Material::Stone, 0, 0).with_velocity(0.0, 3.0);
        stone.integrate(false, &tuning);
        assert!(stone.is_immovable());
        assert!(stone.settled);

        stone.integrate(true, &tuning);
        assert!(!stone.is_immovable());
        assert!((stone.vy - 1.6).abs() < 1e-6);
    }

    #[test]
    fn water_pressure_jitter_is_centered() {
        let mut water = Cell::new(Material::Water, 0, 0);
        water.apply_pressure(0.9, 0.5);
        assert!(water.vx.abs() < f32::EPSILON);
        water.apply_pressure(0.9, 1.0);
        assert!((water.vx - 0.045).abs() < 1e-6);

        let mut sand = Cell::new(Material::Sand, 0, 0);
        sand.apply_pressure(0.9, 1.0);
        assert!(sand.vx.abs() < f32::EPSILON);
        assert!((sand.pressure - 0.9).abs() < f32::EPSILON);
    }

    #[test]
    fn sand_color_darkens_with_wetness() {
        let mut sand = Cell::new(Material::Sand, 0, 0);
        assert_eq!(sand.color(10.0), DRY_SAND);
        sand.wetness = 10.0;
        assert_eq!(sand.color(10.0), WET_SAND);
        sand.wetness = 5.0;
        let half = sand.color(10.0);
        // 0.5^0.7 ~ 0.616, so past the linear midpoint.
        assert!(half.r < 173);
        assert!(half.r > WET_SAND.r);
    }

    #[test]
    fn water_is_translucent() {
        let water = Cell::new(Material::Water, 0, 0);
        assert_eq!(water.color(10.0).a, 200);
    }

    #[test]
    fn rests_on_matrix() {
        assert!(Material::Water.rests_on(Material::Water));
        assert!(Material::Sand.rests_on(Material::Stone));
        assert!(!Material::Sand.rests_on(Material::Water));
        assert!(!Material::Stone.rests_on(Material::Water));
    }

    proptest! {
        #[test]
        fn prop_integration_clamps_velocity(
            material in arb_material(),
            vx in -100.0f32..100.0,
            vy in -100.0f32..100.0,
            in_air in any::<bool>(),
        ) {
            let tuning = Tuning::default();
            let mut cell = Cell::new(material, 0, 0).with_velocity(vx, vy);
            cell.integrate(in_air, &tuning);
            prop_assert!(cell.vx.abs() <= MAX_SPEED);
            prop_assert!(cell.vy.abs() <= MAX_SPEED);
        }

        #[test]
        fn prop_wetness_never_exceeds_cap(steps in proptest::collection::vec(0.0f32..5.0, 1..50)) {
            let mut sand = Cell::new(Material::Sand, 0, 0);
            for amount in steps {
                sand.wet(amount, 10.0);
                prop_assert!(sand.wetness <= 10.0);
            }
        }

        #[test]
        fn prop_wetness_decays_to_zero_floor(start in 0.0f32..0.01, ticks in 1usize..50) {
            let tuning = Tuning::default();
            let mut sand = Cell::new(Material::Sand, 0, 0);
            sand.wetness = start;
            for _ in 0..ticks {
                sand.integrate(false, &tuning);
            }
            prop_assert!(sand.wetness >= 0.0);
        }
    }
}
