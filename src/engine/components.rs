// Core ECS components shared by the engine and the game

use bevy_ecs::prelude::*;
use glam::{Mat4, Quat, Vec3};

/// Position, orientation and scale of an entity in world space
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = Vec3::splat(scale);
        self
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }
}

/// Index into the renderer's mesh library
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MeshHandle(pub u32);

/// Linear RGB color for rendering
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const WHITE: Color = Color { r: 1.0, g: 1.0, b: 1.0 };

    /// `0xRRGGBB` in sRGB, converted to linear.
    pub fn from_hex(hex: u32) -> Self {
        let channel = |shift: u32| srgb_to_linear(((hex >> shift) & 0xff) as f32 / 255.0);
        Self { r: channel(16), g: channel(8), b: channel(0) }
    }

    /// Hue in degrees, saturation and lightness in [0, 1] (sRGB space).
    pub fn from_hsl(hue: f32, saturation: f32, lightness: f32) -> Self {
        let h = hue.rem_euclid(360.0) / 60.0;
        let c = (1.0 - (2.0 * lightness - 1.0).abs()) * saturation;
        let x = c * (1.0 - (h % 2.0 - 1.0).abs());
        let (r, g, b) = match h as u32 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };
        let m = lightness - c / 2.0;
        Self {
            r: srgb_to_linear(r + m),
            g: srgb_to_linear(g + m),
            b: srgb_to_linear(b + m),
        }
    }

    pub fn to_vec3(self) -> Vec3 {
        Vec3::new(self.r, self.g, self.b)
    }

    pub fn to_rgba(self) -> [f32; 4] {
        [self.r, self.g, self.b, 1.0]
    }
}

fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 { c / 12.92 } else { ((c + 0.055) / 1.055).powf(2.4) }
}

/// A single mesh drawn at the entity's transform
#[derive(Component, Debug, Clone, Copy)]
pub struct Renderable {
    pub mesh: MeshHandle,
    pub color: Color,
    pub visible: bool,
}

impl Renderable {
    pub fn new(mesh: MeshHandle, color: Color) -> Self {
        Self { mesh, color, visible: true }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_roundtrips_extremes() {
        assert_eq!(Color::from_hex(0xffffff), Color::WHITE);
        assert_eq!(Color::from_hex(0x000000), Color { r: 0.0, g: 0.0, b: 0.0 });
    }

    #[test]
    fn hsl_primary_hues() {
        let red = Color::from_hsl(0.0, 1.0, 0.5);
        assert!((red.r - 1.0).abs() < 1e-5 && red.g.abs() < 1e-5 && red.b.abs() < 1e-5);
        let green = Color::from_hsl(120.0, 1.0, 0.5);
        assert!(green.r.abs() < 1e-5 && (green.g - 1.0).abs() < 1e-5);
    }

    #[test]
    fn transform_matrix_applies_scale_then_translation() {
        let t = Transform { position: Vec3::new(1.0, 2.0, 3.0), ..Default::default() }.with_scale(2.0);
        let p = t.matrix().transform_point3(Vec3::X);
        assert!((p - Vec3::new(3.0, 2.0, 3.0)).length() < 1e-6);
    }
}
