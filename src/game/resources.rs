// World-wide resources shared between the gameplay systems, the renderer
// and the UI.

use bevy_ecs::prelude::*;

use crate::engine::components::MeshHandle;

/// Frame delta and total play time in seconds.
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct FrameTime {
    pub dt: f32,
    pub elapsed: f32,
}

#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    ThirdPerson,
    FirstPerson,
}

impl ViewMode {
    pub fn is_first_person(self) -> bool {
        self == ViewMode::FirstPerson
    }

    pub fn toggled(self) -> Self {
        match self {
            ViewMode::ThirdPerson => ViewMode::FirstPerson,
            ViewMode::FirstPerson => ViewMode::ThirdPerson,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ViewMode::ThirdPerson => "third person",
            ViewMode::FirstPerson => "first person",
        }
    }
}

/// Cursor grab state. Systems only record a request; the window owner applies
/// it and reports back through `locked`.
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct PointerLock {
    pub locked: bool,
    pub request: Option<bool>,
}

impl PointerLock {
    pub fn acquire(&mut self) {
        if !self.locked {
            self.request = Some(true);
        }
    }

    pub fn release(&mut self) {
        if self.locked {
            self.request = Some(false);
        }
    }
}

/// GPU mesh handles for every procedural model in the scene.
#[derive(Resource, Debug, Clone, Copy)]
pub struct SceneMeshes {
    pub ground: MeshHandle,
    pub trunk: MeshHandle,
    pub leaves: MeshHandle,
    pub top: MeshHandle,
    pub body_part: MeshHandle,
    pub axe: MeshHandle,
}

/// Viewport size in physical pixels, for picking rays and aspect ratio.
#[derive(Resource, Debug, Clone, Copy)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self { width: 1280.0, height: 720.0 }
    }
}

impl Viewport {
    pub fn aspect(&self) -> f32 {
        if self.height > 0.0 { self.width / self.height } else { 1.0 }
    }
}

/// Marks entities that are despawned and rebuilt on restart.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct SceneEntity;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pointer_requests_only_on_change() {
        let mut p = PointerLock::default();
        p.release();
        assert_eq!(p.request, None);
        p.acquire();
        assert_eq!(p.request, Some(true));
        p.locked = true;
        p.request = None;
        p.acquire();
        assert_eq!(p.request, None);
        p.release();
        assert_eq!(p.request, Some(false));
    }

    #[test]
    fn view_mode_toggles() {
        assert!(ViewMode::ThirdPerson.toggled().is_first_person());
        assert_eq!(ViewMode::FirstPerson.toggled(), ViewMode::ThirdPerson);
        assert_eq!(Viewport { width: 800.0, height: 0.0 }.aspect(), 1.0);
    }
}
