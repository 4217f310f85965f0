//! Tuning knobs for the prototype.
//!
//! Every section has defaults, so a JSON file only needs to name the values it
//! changes, e.g. `{ "movement": { "speed": 4.5 } }`.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use bevy_ecs::prelude::*;
use glam::Vec3;
use serde::Deserialize;

use crate::engine::camera::{FirstPersonRig, ThirdPersonRig};

#[derive(Resource, Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub movement: MovementConfig,
    pub camera: ThirdPersonRig,
    pub first_person: FirstPersonRig,
    pub swing: SwingConfig,
    pub tree: TreeConfig,
    pub character: CharacterConfig,
    pub axe: AxeConfig,
    pub world: WorldConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    /// Ground speed in units per second
    pub speed: f32,
    /// Per-frame velocity smoothing while a direction is held
    pub acceleration: f32,
    /// Per-frame velocity smoothing towards rest
    pub deceleration: f32,
    /// Per-frame facing slerp in third person
    pub turn: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self { speed: 3.0, acceleration: 0.15, deceleration: 0.2, turn: 0.2 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SwingConfig {
    pub cooldown: f32,
    /// Progress per second (a swing lasts 1 / speed seconds)
    pub speed: f32,
    /// Peak extra rotation in radians
    pub amplitude: f32,
}

impl Default for SwingConfig {
    fn default() -> Self {
        Self { cooldown: 0.35, speed: 3.5, amplitude: 0.8 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    pub position: Vec3,
    pub health: u32,
    pub chop_range: f32,
    /// Radians per second while falling
    pub fall_speed: f32,
    /// Height the trunk sinks to once it lies flat
    pub sunk_height: f32,
    pub pulse_decay: f32,
    pub pulse_scale: f32,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            position: Vec3::new(3.0, 0.0, -2.0),
            health: 3,
            chop_range: 2.5,
            fall_speed: 0.8,
            sunk_height: -2.0,
            pulse_decay: 3.0,
            pulse_scale: 0.05,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CharacterConfig {
    pub scale: f32,
    pub bob_frequency: f32,
    pub bob_amplitude: f32,
    pub fade_in: f32,
    pub fade_out: f32,
}

impl Default for CharacterConfig {
    fn default() -> Self {
        Self { scale: 1.1, bob_frequency: 8.0, bob_amplitude: 0.02, fade_in: 0.1, fade_out: 0.15 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AxeStyle {
    /// Two boxes
    Primitive,
    /// Rounded handle with an extruded blade
    #[default]
    Procedural,
}

/// Axe placement relative to the bone it is mounted on. Overrides the
/// per-bone default mount once the rig is resolved.
///
/// The defaults are for the built-in meter-scale axe. The imported axe model
/// these values replace was tuned at position (-0.00175, 0.001, -0.0001),
/// rotation (2.0, 0.0, 0.25) and scale 0.08; the Z roll carries over as is,
/// the X tilt is eased to 1.6 so the blade faces forward from the wrist.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AxeConfig {
    pub style: AxeStyle,
    pub position: Vec3,
    /// XYZ Euler angles in radians
    pub rotation: Vec3,
    pub scale: f32,
}

impl Default for AxeConfig {
    fn default() -> Self {
        Self {
            style: AxeStyle::default(),
            position: Vec3::new(0.0, -0.06, 0.02),
            rotation: Vec3::new(1.6, 0.0, 0.25),
            scale: 1.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub ground_size: f32,
    pub ground_divisions: usize,
    /// `0xRRGGBB`
    pub sky_color: u32,
    pub ambient: f32,
    pub sun_position: Vec3,
    pub sun_intensity: f32,
    pub inventory_slots: usize,
    pub hotbar_slots: usize,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            ground_size: 20.0,
            ground_divisions: 40,
            sky_color: 0x8dbbe1,
            ambient: 0.5,
            sun_position: Vec3::new(6.0, 10.0, 4.0),
            sun_intensity: 1.0,
            inventory_slots: 20,
            hotbar_slots: 5,
        }
    }
}

impl GameConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("parse config json")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("read config: {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("in {}", path.display()))
    }
}
