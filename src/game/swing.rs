//! Attack swing timing.
//!
//! A swing runs its progress from 0 to 1 and eases the extra weapon rotation
//! with `sin(π · progress)`, so the arc peaks half-way and returns to rest.
//! Each swing alternates direction. The cooldown outlasts the swing itself
//! and gates both new swings and the "chopping" animation state.

use bevy_ecs::prelude::*;

use crate::config::SwingConfig;

#[derive(Component, Debug, Clone, PartialEq)]
pub struct Swing {
    /// +1 or -1; flipped on every swing
    pub direction: f32,
    /// Extra weapon rotation this frame
    pub value: f32,
    pub progress: f32,
    pub active: bool,
    pub cooldown: f32,
    pub chopping: bool,
}

impl Default for Swing {
    fn default() -> Self {
        Self { direction: 1.0, value: 0.0, progress: 0.0, active: false, cooldown: 0.0, chopping: false }
    }
}

impl Swing {
    /// Start a swing unless still cooling down. Returns whether one started.
    pub fn trigger(&mut self, config: &SwingConfig) -> bool {
        if self.cooldown > 0.0 {
            return false;
        }
        self.direction = -self.direction;
        self.progress = 0.0;
        self.active = true;
        self.cooldown = config.cooldown;
        self.chopping = true;
        true
    }

    pub fn advance(&mut self, dt: f32, config: &SwingConfig) {
        if self.cooldown > 0.0 {
            self.cooldown = (self.cooldown - dt).max(0.0);
            if self.cooldown == 0.0 {
                self.chopping = false;
            }
        }

        if self.active {
            self.progress = (self.progress + dt * config.speed).min(1.0);
            let phase = (std::f32::consts::PI * self.progress).sin();
            self.value = phase * config.amplitude * self.direction;
            if self.progress >= 1.0 {
                self.active = false;
                self.value = 0.0;
            }
        }
    }
}
