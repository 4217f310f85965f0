//! Character movement integration.
//!
//! WASD produces an input direction. Third person moves along world axes (W is
//! -Z); first person moves relative to the look yaw. Velocity eases towards the
//! target speed, so starts and stops are smooth, and the character turns to
//! face its last movement direction.

use bevy_ecs::prelude::*;
use glam::{Quat, Vec3};

use crate::config::MovementConfig;
use crate::engine::camera::damp;

#[derive(Component, Debug, Clone, PartialEq)]
pub struct Player {
    pub velocity: Vec3,
    pub last_move_dir: Vec3,
    pub walking: bool,
}

impl Default for Player {
    fn default() -> Self {
        Self { velocity: Vec3::ZERO, last_move_dir: Vec3::Z, walking: false }
    }
}

/// World-space movement direction for input axes `(x, z)` = (D - A, S - W).
/// `first_person_yaw` switches to look-relative movement.
pub fn move_direction(axes: (f32, f32), first_person_yaw: Option<f32>) -> Vec3 {
    let (x, z) = axes;
    let input = Vec3::new(x, 0.0, z);
    if input.length_squared() == 0.0 {
        return Vec3::ZERO;
    }
    let input = input.normalize();
    match first_person_yaw {
        None => input,
        Some(yaw) => {
            let forward = Vec3::new(yaw.sin(), 0.0, yaw.cos());
            let right = Vec3::new(-forward.z, 0.0, forward.x);
            (right * input.x + forward * -input.z).normalize_or_zero()
        }
    }
}

/// Yaw that faces along `dir` (0 = +Z).
pub fn facing_yaw(dir: Vec3) -> f32 {
    dir.x.atan2(dir.z)
}

impl Player {
    /// Advance velocity and return the displacement for this frame.
    pub fn integrate(&mut self, dir: Vec3, dt: f32, config: &MovementConfig) -> Vec3 {
        if dir != Vec3::ZERO {
            self.last_move_dir = dir;
            self.velocity = self.velocity.lerp(dir * config.speed, damp(config.acceleration, dt));
            self.walking = true;
        } else {
            self.velocity = self.velocity.lerp(Vec3::ZERO, damp(config.deceleration, dt));
            self.walking = false;
        }
        self.velocity * dt
    }

    /// Third-person facing: slerp towards the last movement direction while walking.
    pub fn turn(&self, current: Quat, dt: f32, config: &MovementConfig) -> Quat {
        if !self.walking {
            return current;
        }
        let target = Quat::from_rotation_y(facing_yaw(self.last_move_dir));
        current.slerp(target, damp(config.turn, dt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    const DT: f32 = 1.0 / 60.0;

    #[test]
    fn third_person_uses_world_axes() {
        assert_eq!(move_direction((0.0, -1.0), None), -Vec3::Z);
        let diag = move_direction((1.0, 1.0), None);
        assert!((diag.length() - 1.0).abs() < 1e-6);
        assert_eq!(move_direction((0.0, 0.0), Some(1.0)), Vec3::ZERO);
    }

    #[test]
    fn first_person_is_yaw_relative() {
        // Looking along +X, W moves +X and D moves +Z (to the right).
        let fwd = move_direction((0.0, -1.0), Some(FRAC_PI_2));
        assert!((fwd - Vec3::X).length() < 1e-6);
        let right = move_direction((1.0, 0.0), Some(FRAC_PI_2));
        assert!((right - Vec3::Z).length() < 1e-6);
    }

    #[test]
    fn velocity_eases_to_speed_and_back() {
        let cfg = MovementConfig::default();
        let mut p = Player::default();
        let first = p.integrate(Vec3::X, DT, &cfg);
        assert!((first.x - 3.0 * 0.15 * DT).abs() < 1e-5);
        for _ in 0..300 {
            p.integrate(Vec3::X, DT, &cfg);
        }
        assert!((p.velocity.x - 3.0).abs() < 1e-3);
        assert!(p.walking);

        for _ in 0..300 {
            p.integrate(Vec3::ZERO, DT, &cfg);
        }
        assert!(p.velocity.length() < 1e-3);
        assert!(!p.walking);
        assert_eq!(p.last_move_dir, Vec3::X);
    }

    #[test]
    fn turning_converges_on_move_direction() {
        let cfg = MovementConfig::default();
        let mut p = Player::default();
        p.integrate(Vec3::X, DT, &cfg);
        let mut q = Quat::IDENTITY;
        for _ in 0..120 {
            q = p.turn(q, DT, &cfg);
        }
        assert!((q * Vec3::Z - Vec3::X).length() < 1e-3);

        p.integrate(Vec3::ZERO, DT, &cfg);
        assert_eq!(p.turn(Quat::IDENTITY, DT, &cfg), Quat::IDENTITY);
    }
}
