// Engine module - reusable building blocks: math-side scene pieces,
// input sampling, camera rigs, procedural geometry and GPU plumbing

pub mod anim;
pub mod camera;
pub mod components;
pub mod input;
pub mod mesh;
pub mod overlay;
pub mod picking;
pub mod primitives;
pub mod renderer;
pub mod skeleton;

// Re-export commonly used items
pub use components::*;
