//! Procedural humanoid: skeleton, box body, clips and the animation controller.
//!
//! The rig faces +Z with its right side on -X. Body parts are boxes bound
//! rigidly to one bone each. The axe is mounted on the right hand (or whichever
//! arm bone the lookup finds first) and mirrored on every swing.

use bevy_ecs::prelude::*;
use glam::{Mat4, Quat, Vec3};

use crate::config::{AxeConfig, CharacterConfig};
use crate::engine::anim::{find_clip, AnimationClip, LoopMode, Mixer};
use crate::engine::components::{Color, MeshHandle};
use crate::engine::renderer::DrawItem;
use crate::engine::skeleton::{weapon_mount, LimbBones, Mount, Skeleton};

const SKIN: u32 = 0xe0b48c;
const SHIRT: u32 = 0x3b6e8f;
const PANTS: u32 = 0x4a4236;
const BOOTS: u32 = 0x2e2620;

/// A box (center and half extents in bone space) riding on a bone.
#[derive(Debug, Clone, Copy)]
pub struct BodyPart {
    pub bone: usize,
    pub center: Vec3,
    pub half: Vec3,
    pub color: Color,
}

impl BodyPart {
    /// Model matrix for a unit cube mesh (half extent 0.5).
    pub fn local_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.half * 2.0, Quat::IDENTITY, self.center)
    }
}

/// Which clip the controller last started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    Idle,
    Walk,
    Chop,
}

#[derive(Debug, Clone, Copy, Default)]
struct ClipSet {
    idle: Option<usize>,
    walk: Option<usize>,
    chop: Option<usize>,
}

#[derive(Component, Debug, Clone)]
pub struct CharacterRig {
    pub skeleton: Skeleton,
    pub mixer: Mixer,
    pub mount: Option<Mount>,
    pub parts: Vec<BodyPart>,
    /// Vertical walk bob applied under the root
    pub pivot_y: f32,
    pub body_visible: bool,
    clips: ClipSet,
    current: Option<(Motion, usize)>,
}

struct RigBuilder {
    skeleton: Skeleton,
    parts: Vec<BodyPart>,
}

impl RigBuilder {
    fn bone(&mut self, name: &str, parent: Option<usize>, at: Vec3, part: Option<(Vec3, Vec3, u32)>) -> usize {
        let bone = self.skeleton.add_bone(name, parent, at);
        if let Some((center, half, color)) = part {
            self.parts.push(BodyPart { bone, center, half, color: Color::from_hex(color) });
        }
        bone
    }
}

fn build_body() -> (Skeleton, Vec<BodyPart>) {
    let mut b = RigBuilder { skeleton: Skeleton::new(), parts: Vec::new() };

    let hips = b.bone("Hips", None, Vec3::new(0.0, 0.95, 0.0), Some((Vec3::new(0.0, 0.03, 0.0), Vec3::new(0.17, 0.1, 0.1), PANTS)));
    let spine = b.bone("Spine", Some(hips), Vec3::new(0.0, 0.12, 0.0), Some((Vec3::new(0.0, 0.1, 0.0), Vec3::new(0.16, 0.1, 0.09), SHIRT)));
    let chest = b.bone("Chest", Some(spine), Vec3::new(0.0, 0.2, 0.0), Some((Vec3::new(0.0, 0.12, 0.0), Vec3::new(0.19, 0.13, 0.11), SHIRT)));
    b.bone("Head", Some(chest), Vec3::new(0.0, 0.27, 0.0), Some((Vec3::new(0.0, 0.14, 0.0), Vec3::new(0.12, 0.14, 0.12), SKIN)));

    for (side, x) in [("L", 1.0), ("R", -1.0)] {
        let upper = b.bone(
            &format!("UpperArm{side}"),
            Some(chest),
            Vec3::new(0.24 * x, 0.2, 0.0),
            Some((Vec3::new(0.0, -0.14, 0.0), Vec3::new(0.055, 0.14, 0.055), SHIRT)),
        );
        let lower = b.bone(
            &format!("LowerArm{side}"),
            Some(upper),
            Vec3::new(0.0, -0.28, 0.0),
            Some((Vec3::new(0.0, -0.13, 0.0), Vec3::new(0.05, 0.13, 0.05), SKIN)),
        );
        b.bone(
            &format!("Wrist{side}"),
            Some(lower),
            Vec3::new(0.0, -0.26, 0.0),
            Some((Vec3::new(0.0, -0.05, 0.0), Vec3::new(0.05, 0.05, 0.05), SKIN)),
        );
    }

    for (side, x) in [("L", 1.0), ("R", -1.0)] {
        let upper = b.bone(
            &format!("UpperLeg{side}"),
            Some(hips),
            Vec3::new(0.09 * x, -0.06, 0.0),
            Some((Vec3::new(0.0, -0.21, 0.0), Vec3::new(0.075, 0.21, 0.075), PANTS)),
        );
        b.bone(
            &format!("LowerLeg{side}"),
            Some(upper),
            Vec3::new(0.0, -0.42, 0.0),
            Some((Vec3::new(0.0, -0.22, 0.0), Vec3::new(0.065, 0.23, 0.07), BOOTS)),
        );
    }

    (b.skeleton, b.parts)
}

fn rx(a: f32) -> Quat {
    Quat::from_rotation_x(a)
}

/// Idle, walk and slash clips keyed against `skeleton`'s bone names.
/// Bones the rig lacks are skipped.
pub fn build_clips(skeleton: &Skeleton) -> Vec<AnimationClip> {
    let bone = |name: &str| skeleton.find_exact(name);

    let mut idle = AnimationClip::new("Idle_Neutral", 2.0, LoopMode::Repeat);
    if let Some(chest) = bone("Chest") {
        idle = idle.with_track(skeleton, chest, &[(0.0, rx(0.0)), (1.0, rx(0.04)), (2.0, rx(0.0))]);
    }
    for (name, sign) in [("UpperArmL", 1.0), ("UpperArmR", -1.0)] {
        if let Some(b) = bone(name) {
            let out = Quat::from_rotation_z(0.08 * sign);
            let rest = Quat::from_rotation_z(0.05 * sign);
            idle = idle.with_track(skeleton, b, &[(0.0, rest), (1.0, out), (2.0, rest)]);
        }
    }

    // Legs swing opposite to each other; arms opposite to their leg.
    let mut walk = AnimationClip::new("Walk", 0.8, LoopMode::Repeat);
    let swing = |amp: f32| [(0.0, rx(-amp)), (0.4, rx(amp)), (0.8, rx(-amp))];
    for (name, amp) in [("UpperLegL", 0.5), ("UpperLegR", -0.5), ("UpperArmL", -0.4), ("UpperArmR", 0.4)] {
        if let Some(b) = bone(name) {
            walk = walk.with_track(skeleton, b, &swing(amp));
        }
    }
    // Knees bend while the leg swings forward.
    let knees = [
        ("LowerLegL", [(0.0, 0.1), (0.2, 0.7), (0.4, 0.1), (0.8, 0.1)]),
        ("LowerLegR", [(0.0, 0.1), (0.4, 0.1), (0.6, 0.7), (0.8, 0.1)]),
    ];
    for (name, keys) in knees {
        if let Some(b) = bone(name) {
            let keys: Vec<(f32, Quat)> = keys.iter().map(|&(t, a)| (t, rx(a))).collect();
            walk = walk.with_track(skeleton, b, &keys);
        }
    }

    let mut slash = AnimationClip::new("Sword_Slash", 0.6, LoopMode::Once);
    let slash_tracks: [(&str, [f32; 4], fn(f32) -> Quat); 3] = [
        ("UpperArmR", [0.0, -2.2, -0.6, 0.0], Quat::from_rotation_x),
        ("LowerArmR", [0.0, -0.6, -0.2, 0.0], Quat::from_rotation_x),
        ("Chest", [0.0, 0.3, -0.3, 0.0], Quat::from_rotation_y),
    ];
    for (name, angles, axis) in slash_tracks {
        if let Some(b) = bone(name) {
            let times = [0.0, 0.2, 0.45, 0.6];
            let keys: Vec<(f32, Quat)> = times.iter().zip(angles).map(|(&t, a)| (t, axis(a))).collect();
            slash = slash.with_track(skeleton, b, &keys);
        }
    }

    vec![idle, walk, slash]
}

impl CharacterRig {
    /// Build the procedural rig, resolve its limbs and mount the axe.
    pub fn procedural(axe: &AxeConfig) -> Self {
        let (skeleton, parts) = build_body();
        let clips = build_clips(&skeleton);
        Self::from_parts(skeleton, parts, clips, axe)
    }

    pub fn from_parts(skeleton: Skeleton, parts: Vec<BodyPart>, clips: Vec<AnimationClip>, axe: &AxeConfig) -> Self {
        if skeleton.is_empty() {
            log::warn!("rig has no bones");
        }
        let limbs = LimbBones::resolve(&skeleton);
        let mount = weapon_mount(&limbs, axe.scale).map(|m| Mount {
            position: axe.position,
            rotation: axe.rotation,
            ..m
        });
        match &mount {
            Some(m) => log::debug!("axe mounted on {} ({:?})", skeleton.name(m.bone), m.point),
            None => log::warn!("no hand or arm bone found; axe not attached"),
        }

        let clips_found = ClipSet {
            idle: find_clip(&clips, &["idle_neutral", "idle"]),
            walk: find_clip(&clips, &["walk"]),
            chop: find_clip(&clips, &["sword_slash", "attack", "swing"]),
        };
        let mut mixer = Mixer::new(clips);

        let current = if let Some(i) = clips_found.idle {
            mixer.play(i);
            Some((Motion::Idle, i))
        } else if let Some(i) = clips_found.walk {
            mixer.play(i);
            Some((Motion::Walk, i))
        } else {
            log::debug!("rig has no idle or walk clip");
            None
        };

        let mut rig = Self {
            skeleton,
            mixer,
            mount,
            parts,
            pivot_y: 0.0,
            body_visible: true,
            clips: clips_found,
            current,
        };
        rig.mixer.apply(&mut rig.skeleton);
        rig
    }

    #[cfg(test)]
    pub fn motion(&self) -> Option<Motion> {
        self.current.map(|(m, _)| m)
    }

    /// Cross-fade to the clip matching the current state. Chopping wins over
    /// walking, walking over idle; a missing clip falls through.
    pub fn select_motion(&mut self, walking: bool, chopping: bool, config: &CharacterConfig) {
        let wanted = if chopping && self.clips.chop.is_some() {
            self.clips.chop.map(|i| (Motion::Chop, i))
        } else if walking && self.clips.walk.is_some() {
            self.clips.walk.map(|i| (Motion::Walk, i))
        } else {
            self.clips.idle.map(|i| (Motion::Idle, i))
        };
        let Some((motion, index)) = wanted else {
            return;
        };
        if self.current.map(|(_, i)| i) == Some(index) {
            return;
        }
        if let Some((_, prev)) = self.current {
            self.mixer.fade_out(prev, config.fade_out);
        }
        self.mixer.reset(index).fade_in(index, config.fade_in).play(index);
        self.current = Some((motion, index));
    }

    /// Per-frame update: walk bob, clip selection, mixer, visibility.
    pub fn update(&mut self, time: f32, dt: f32, walking: bool, chopping: bool, first_person: bool, config: &CharacterConfig) {
        self.pivot_y = if walking && !chopping {
            (time * config.bob_frequency).sin() * config.bob_amplitude
        } else {
            0.0
        };
        self.body_visible = !first_person;
        self.select_motion(walking, chopping, config);
        self.mixer.advance(dt);
        self.mixer.apply(&mut self.skeleton);
    }

    /// Axe matrix relative to its bone: tuned rotation plus the swing on Z,
    /// mirrored on X by the swing direction.
    pub fn axe_local(&self, swing: f32, direction: f32) -> Option<Mat4> {
        let mount = self.mount?;
        let swung = Mount { rotation: mount.rotation + Vec3::Z * swing, ..mount };
        Some(swung.local_matrix() * Mat4::from_scale(Vec3::new(direction, 1.0, 1.0)))
    }

    /// Draw list for the body and axe under `root` (the character's world matrix).
    pub fn draws(&self, root: Mat4, part_mesh: MeshHandle, axe_mesh: MeshHandle, swing: f32, direction: f32) -> Vec<DrawItem> {
        let pivot = root * Mat4::from_translation(Vec3::Y * self.pivot_y);
        let bones = self.skeleton.world_matrices();
        let mut out = Vec::with_capacity(self.parts.len() + 1);
        if self.body_visible {
            out.extend(self.parts.iter().map(|p| DrawItem {
                mesh: part_mesh,
                model: pivot * bones[p.bone] * p.local_matrix(),
                color: p.color,
            }));
        }
        if let (Some(mount), Some(local)) = (self.mount, self.axe_local(swing, direction)) {
            out.push(DrawItem { mesh: axe_mesh, model: pivot * bones[mount.bone] * local, color: Color::WHITE });
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::skeleton::MountPoint;

    const DT: f32 = 1.0 / 60.0;

    fn rig() -> CharacterRig {
        CharacterRig::procedural(&AxeConfig::default())
    }

    #[test]
    fn procedural_rig_resolves_every_limb() {
        let r = rig();
        let l = LimbBones::resolve(&r.skeleton);
        assert_eq!(l.right_hand.map(|b| r.skeleton.name(b)), Some("WristR"));
        assert_eq!(l.left_lower_arm.map(|b| r.skeleton.name(b)), Some("LowerArmL"));
        assert_eq!(l.right_lower_leg.map(|b| r.skeleton.name(b)), Some("LowerLegR"));
        let mount = r.mount.unwrap();
        assert_eq!(mount.point, MountPoint::Hand);
        assert_eq!(mount.position, AxeConfig::default().position);
        assert_eq!(r.parts.len(), r.skeleton.len());
    }

    #[test]
    fn starts_idle_and_prefers_chop_over_walk() {
        let cfg = CharacterConfig::default();
        let mut r = rig();
        assert_eq!(r.motion(), Some(Motion::Idle));
        r.update(0.0, DT, true, false, false, &cfg);
        assert_eq!(r.motion(), Some(Motion::Walk));
        r.update(0.0, DT, true, true, false, &cfg);
        assert_eq!(r.motion(), Some(Motion::Chop));
        r.update(0.0, DT, false, false, false, &cfg);
        assert_eq!(r.motion(), Some(Motion::Idle));
    }

    #[test]
    fn cross_fade_weights() {
        let cfg = CharacterConfig::default();
        let mut r = rig();
        let idle = find_clip(r.mixer.clips(), &["idle"]).unwrap();
        let walk = find_clip(r.mixer.clips(), &["walk"]).unwrap();
        r.update(0.0, 0.05, true, false, false, &cfg);
        assert!((r.mixer.action(walk).weight - 0.5).abs() < 1e-4);
        for _ in 0..20 {
            r.update(0.0, DT, true, false, false, &cfg);
        }
        assert_eq!(r.mixer.action(walk).weight, 1.0);
        assert!(!r.mixer.action(idle).playing);
    }

    #[test]
    fn bob_only_while_walking_without_chop() {
        let cfg = CharacterConfig::default();
        let mut r = rig();
        let t = std::f32::consts::PI / 16.0;
        r.update(t, DT, true, false, false, &cfg);
        assert!((r.pivot_y - 0.02).abs() < 1e-5);
        r.update(t, DT, true, true, false, &cfg);
        assert_eq!(r.pivot_y, 0.0);
    }

    #[test]
    fn first_person_hides_body_but_keeps_axe() {
        let cfg = CharacterConfig::default();
        let mut r = rig();
        r.update(0.0, DT, false, false, true, &cfg);
        let draws = r.draws(Mat4::IDENTITY, MeshHandle(0), MeshHandle(1), 0.0, 1.0);
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].mesh, MeshHandle(1));

        r.update(0.0, DT, false, false, false, &cfg);
        let draws = r.draws(Mat4::IDENTITY, MeshHandle(0), MeshHandle(1), 0.0, 1.0);
        assert_eq!(draws.len(), r.parts.len() + 1);
    }

    #[test]
    fn axe_swing_adds_to_z_and_mirrors() {
        let r = rig();
        let rest = r.axe_local(0.0, 1.0).unwrap();
        let swung = r.axe_local(0.5, -1.0).unwrap();
        assert!(swung.determinant() < 0.0);
        assert!(rest.determinant() > 0.0);
        assert!(rest.abs_diff_eq(r.mount.unwrap().local_matrix(), 1e-6));

        // Mirroring flips X only; the swing rolls the blade about the bone's Z.
        let mirrored = r.axe_local(0.0, -1.0).unwrap();
        assert!((mirrored.x_axis + rest.x_axis).length() < 1e-5);
        assert!(mirrored.y_axis.abs_diff_eq(rest.y_axis, 1e-6));
    }

    #[test]
    fn rig_without_arms_has_no_mount() {
        let mut s = Skeleton::new();
        s.add_bone("Hips", None, Vec3::ZERO);
        let clips = build_clips(&s);
        let r = CharacterRig::from_parts(s, Vec::new(), clips, &AxeConfig::default());
        assert!(r.mount.is_none());
        assert!(r.axe_local(0.0, 1.0).is_none());
    }
}
