//! The choppable tree: health, hit feedback and the fall.

use std::f32::consts::FRAC_PI_2;

use bevy_ecs::prelude::*;
use glam::{Mat4, Quat, Vec3};

use crate::config::TreeConfig;
use crate::engine::components::Color;
use crate::engine::picking::{intersect_sphere, Aabb, Ray};

pub const TRUNK_COLOR: u32 = 0x6a4a2f;
pub const TRUNK_COLOR_INACTIVE: u32 = 0x4f3a26;
pub const LEAF_COLOR: u32 = 0x2f6f32;
pub const TOP_COLOR: u32 = 0x357a3a;

/// Trunk geometry: radius top/bottom and height, centered on the tree origin.
pub const TRUNK: (f32, f32, f32) = (0.25, 0.35, 2.2);
/// Canopy cone radius/height and its center height.
pub const LEAVES: (f32, f32, f32) = (1.2, 2.4, 1.6);
/// Top sphere radius and center height.
pub const TOP: (f32, f32) = (0.6, 2.8);

/// Result of a chop attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChopOutcome {
    Ignored,
    Hit { remaining: u32 },
    Felled,
}

#[derive(Component, Debug, Clone, PartialEq)]
pub struct Tree {
    pub position: Vec3,
    pub health: u32,
    pub falling: bool,
    /// Rotation about Z in radians, never decreasing, capped at π/2
    pub fall_angle: f32,
    /// Seconds since the last hit
    pub hit_time: f32,
}

impl Tree {
    pub fn new(config: &TreeConfig) -> Self {
        Self {
            position: config.position,
            health: config.health,
            falling: false,
            fall_angle: 0.0,
            // Start with the pulse already spent.
            hit_time: f32::MAX,
        }
    }

    pub fn can_chop(&self, player: Vec3, config: &TreeConfig) -> bool {
        self.health > 0 && player.distance(self.position) < config.chop_range
    }

    pub fn chop(&mut self, player: Vec3, config: &TreeConfig) -> ChopOutcome {
        if self.falling || !self.can_chop(player, config) {
            return ChopOutcome::Ignored;
        }
        self.health = self.health.saturating_sub(1);
        self.hit_time = 0.0;
        if self.health == 0 {
            self.falling = true;
            ChopOutcome::Felled
        } else {
            ChopOutcome::Hit { remaining: self.health }
        }
    }

    pub fn advance(&mut self, dt: f32, config: &TreeConfig) {
        if self.hit_time < f32::MAX {
            self.hit_time += dt;
        }
        if self.falling {
            self.fall_angle = (self.fall_angle + dt * config.fall_speed).min(FRAC_PI_2);
        }
    }

    pub fn fully_fallen(&self) -> bool {
        self.fall_angle >= FRAC_PI_2
    }

    /// Remaining hit pulse in [0, 1].
    pub fn pulse(&self, config: &TreeConfig) -> f32 {
        (1.0 - self.hit_time * config.pulse_decay).max(0.0)
    }

    pub fn trunk_scale(&self, config: &TreeConfig) -> f32 {
        1.0 + self.pulse(config) * config.pulse_scale
    }

    pub fn trunk_color(&self, choppable: bool) -> Color {
        Color::from_hex(if choppable { TRUNK_COLOR } else { TRUNK_COLOR_INACTIVE })
    }

    /// The canopy top is dropped as soon as the tree starts falling.
    pub fn shows_top(&self) -> bool {
        !self.falling
    }

    /// World matrix of the tree group (fall rotation, sunk once flat).
    pub fn world_matrix(&self, config: &TreeConfig) -> Mat4 {
        let mut position = self.position;
        if self.fully_fallen() {
            position.y = config.sunk_height;
        }
        Mat4::from_rotation_translation(Quat::from_rotation_z(self.fall_angle), position)
    }

    /// Distance along `ray` to the first part of the tree it hits.
    pub fn pick(&self, ray: &Ray, config: &TreeConfig) -> Option<f32> {
        let world = self.world_matrix(config);
        let local = ray.to_local(&world);
        let (_, trunk_bottom, trunk_h) = TRUNK;
        let (leaf_r, leaf_h, leaf_y) = LEAVES;
        let (top_r, top_y) = TOP;

        let trunk = Aabb::from_center_half(Vec3::ZERO, Vec3::new(trunk_bottom, trunk_h * 0.5, trunk_bottom));
        let leaves = Aabb::from_center_half(Vec3::new(0.0, leaf_y, 0.0), Vec3::new(leaf_r, leaf_h * 0.5, leaf_r));

        let mut hits = vec![trunk.intersect(&local), leaves.intersect(&local)];
        if self.shows_top() {
            hits.push(intersect_sphere(&local, Vec3::new(0.0, top_y, 0.0), top_r));
        }
        hits.into_iter().flatten().min_by(|a, b| a.total_cmp(b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn near() -> Vec3 {
        Vec3::new(2.0, 0.0, -1.0)
    }

    #[test]
    fn chopping_requires_range() {
        let cfg = TreeConfig::default();
        let mut tree = Tree::new(&cfg);
        assert!(!tree.can_chop(Vec3::ZERO, &cfg), "origin is ~3.6 away");
        assert_eq!(tree.chop(Vec3::ZERO, &cfg), ChopOutcome::Ignored);
        assert!(tree.can_chop(near(), &cfg));
        assert_eq!(tree.chop(near(), &cfg), ChopOutcome::Hit { remaining: 2 });
    }

    #[test]
    fn third_hit_fells_and_health_stays_at_zero() {
        let cfg = TreeConfig::default();
        let mut tree = Tree::new(&cfg);
        tree.chop(near(), &cfg);
        tree.chop(near(), &cfg);
        assert_eq!(tree.chop(near(), &cfg), ChopOutcome::Felled);
        assert!(tree.falling);
        assert!(!tree.shows_top());
        assert_eq!(tree.chop(near(), &cfg), ChopOutcome::Ignored);
        assert_eq!(tree.health, 0);
        assert!(!tree.can_chop(near(), &cfg));
    }

    #[test]
    fn fall_is_monotonic_and_sinks_when_flat() {
        let cfg = TreeConfig::default();
        let mut tree = Tree::new(&cfg);
        tree.falling = true;
        let mut last = 0.0;
        for _ in 0..200 {
            tree.advance(1.0 / 60.0, &cfg);
            assert!(tree.fall_angle >= last);
            last = tree.fall_angle;
        }
        assert!(tree.fully_fallen());
        assert_eq!(tree.fall_angle, FRAC_PI_2);
        let origin = tree.world_matrix(&cfg).transform_point3(Vec3::ZERO);
        assert_eq!(origin.y, -2.0);
    }

    #[test]
    fn hit_pulse_decays() {
        let cfg = TreeConfig::default();
        let mut tree = Tree::new(&cfg);
        assert_eq!(tree.trunk_scale(&cfg), 1.0);
        tree.chop(near(), &cfg);
        assert!((tree.trunk_scale(&cfg) - 1.05).abs() < 1e-6);
        tree.advance(0.2, &cfg);
        assert!((tree.pulse(&cfg) - 0.4).abs() < 1e-5);
        tree.advance(0.2, &cfg);
        assert_eq!(tree.trunk_scale(&cfg), 1.0);
    }

    #[test]
    fn picking_hits_trunk_and_misses_beside() {
        let cfg = TreeConfig::default();
        let tree = Tree::new(&cfg);
        let hit = Ray::new(Vec3::new(3.0, 0.2, 5.0), -Vec3::Z);
        let t = tree.pick(&hit, &cfg).unwrap();
        assert!((t - (5.0 - (-2.0) - 0.35)).abs() < 1e-4);
        let miss = Ray::new(Vec3::new(6.0, 0.2, 5.0), -Vec3::Z);
        assert!(tree.pick(&miss, &cfg).is_none());
    }

    #[test]
    fn colors_reflect_choppability() {
        let tree = Tree::new(&TreeConfig::default());
        assert_eq!(tree.trunk_color(true), Color::from_hex(TRUNK_COLOR));
        assert_eq!(tree.trunk_color(false), Color::from_hex(TRUNK_COLOR_INACTIVE));
    }
}
