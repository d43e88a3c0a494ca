//! Data-driven physics and probability knobs.
//!
//! A shell can override any subset of fields from JSON; missing fields
//! keep their defaults.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Upper bound on the cell-count reach of `wetness_spread_radius` and
/// `pressure_depth`; both are scanned once per cell per tick.
pub const MAX_REACH: i32 = 1024;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Downward acceleration per tick for sand and water, scaled by mass.
    pub gravity: f32,
    /// Downward acceleration per tick for airborne stone, scaled by mass.
    pub stone_gravity: f32,
    pub sand_friction: f32,
    pub water_viscosity: f32,
    /// Base horizontal scan distance for water; grows with pressure.
    pub water_spread_rate: f32,
    /// Chance that water entering a lower slot spawns a splash.
    pub splash_probability: f32,
    pub max_wetness: f32,
    /// Wetness gained by sand each time it sinks through water.
    pub sand_wetting: f32,
    /// Wetness given to sand directly next to absorbing water.
    pub water_absorption_rate: f32,
    pub wetness_spread_radius: i32,
    pub absorption_chance: f32,
    /// Chance an absorbing water cell is consumed.
    pub absorption_removal_chance: f32,
    pub stone_impact_force: f32,
    pub pressure_per_cell: f32,
    pub pressure_depth: i32,
    pub dry_angle_of_repose: f32,
    pub wet_angle_of_repose: f32,
    /// Sand slumps freely when fewer than this many cells support the diagonal.
    pub support_threshold: u32,
    pub placement_splash_chance: f32,
    pub max_splashes: usize,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            gravity: 0.5,
            stone_gravity: 0.8,
            sand_friction: 0.5,
            water_viscosity: 0.95,
            water_spread_rate: 4.0,
            splash_probability: 0.1,
            max_wetness: 10.0,
            sand_wetting: 0.1,
            water_absorption_rate: 1.0,
            wetness_spread_radius: 10,
            absorption_chance: 0.02,
            absorption_removal_chance: 0.1,
            stone_impact_force: 0.3,
            pressure_per_cell: 0.3,
            pressure_depth: 3,
            dry_angle_of_repose: 0.5,
            wet_angle_of_repose: 0.7,
            support_threshold: 3,
            placement_splash_chance: 0.3,
            max_splashes: 512,
        }
    }
}

#[derive(Debug)]
pub enum TuningError {
    Parse(serde_json::Error),
    OutOfRange { field: &'static str, value: f32 },
}

impl fmt::Display for TuningError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "invalid tuning JSON: {err}"),
            Self::OutOfRange { field, value } => {
                write!(f, "tuning field `{field}` out of range: {value}")
            }
        }
    }
}

impl std::error::Error for TuningError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            Self::OutOfRange { .. } => None,
        }
    }
}

impl From<serde_json::Error> for TuningError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err)
    }
}

impl Tuning {
    /// Parse a (possibly partial) JSON override and validate it.
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Self = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn validate(&self) -> Result<(), TuningError> {
        let non_negative = [
            ("gravity", self.gravity),
            ("stone_gravity", self.stone_gravity),
            ("water_spread_rate", self.water_spread_rate),
            ("max_wetness", self.max_wetness),
            ("sand_wetting", self.sand_wetting),
            ("water_absorption_rate", self.water_absorption_rate),
            ("stone_impact_force", self.stone_impact_force),
            ("pressure_per_cell", self.pressure_per_cell),
            ("wetness_spread_radius", self.wetness_spread_radius as f32),
            ("pressure_depth", self.pressure_depth as f32),
        ];
        for (field, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(TuningError::OutOfRange { field, value });
            }
        }

        let reach = [
            ("wetness_spread_radius", self.wetness_spread_radius),
            ("pressure_depth", self.pressure_depth),
        ];
        for (field, value) in reach {
            if value > MAX_REACH {
                return Err(TuningError::OutOfRange {
                    field,
                    value: value as f32,
                });
            }
        }

        let unit = [
            ("sand_friction", self.sand_friction),
            ("water_viscosity", self.water_viscosity),
            ("splash_probability", self.splash_probability),
            ("absorption_chance", self.absorption_chance),
            ("absorption_removal_chance", self.absorption_removal_chance),
            ("dry_angle_of_repose", self.dry_angle_of_repose),
            ("wet_angle_of_repose", self.wet_angle_of_repose),
            ("placement_splash_chance", self.placement_splash_chance),
        ];
        for (field, value) in unit {
            if !(0.0..=1.0).contains(&value) {
                return Err(TuningError::OutOfRange { field, value });
            }
        }
        Ok(())
    }
}
