//! Bone hierarchy, pose composition and name-based bone lookup.
//!
//! Rigs from different authoring tools name the same joint differently
//! (`WristR`, `wrist.r`, `mixamorig:RightHand`, ...). Lookups therefore try an
//! exact name first and then fall back to case-insensitive substring patterns.

use glam::{Mat4, Quat, Vec3};

#[derive(Debug, Clone)]
pub struct Bone {
    pub name: String,
    pub parent: Option<usize>,
    pub bind_translation: Vec3,
    pub bind_rotation: Quat,
    /// Current local rotation, written by the animation mixer each frame.
    pub rotation: Quat,
}

#[derive(Debug, Clone, Default)]
pub struct Skeleton {
    bones: Vec<Bone>,
}

impl Skeleton {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a bone. Parents must be added before their children.
    pub fn add_bone(&mut self, name: &str, parent: Option<usize>, translation: Vec3) -> usize {
        debug_assert!(parent.is_none_or(|p| p < self.bones.len()), "parent must precede child");
        self.bones.push(Bone {
            name: name.to_string(),
            parent,
            bind_translation: translation,
            bind_rotation: Quat::IDENTITY,
            rotation: Quat::IDENTITY,
        });
        self.bones.len() - 1
    }

    #[cfg(test)]
    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    pub fn name(&self, index: usize) -> &str {
        &self.bones[index].name
    }

    pub fn set_rotation(&mut self, index: usize, rotation: Quat) {
        self.bones[index].rotation = rotation;
    }

    pub fn bind_rotation(&self, index: usize) -> Quat {
        self.bones[index].bind_rotation
    }

    /// Model-space matrix of every bone, in bone order.
    pub fn world_matrices(&self) -> Vec<Mat4> {
        let mut out: Vec<Mat4> = Vec::with_capacity(self.bones.len());
        for bone in &self.bones {
            let local = Mat4::from_rotation_translation(bone.rotation, bone.bind_translation);
            let m = match bone.parent {
                Some(p) => out[p] * local,
                None => local,
            };
            out.push(m);
        }
        out
    }

    pub fn find_exact(&self, name: &str) -> Option<usize> {
        self.bones.iter().position(|b| b.name == name)
    }

    /// First bone whose lowercase name contains any of `patterns` (which are
    /// expected to be lowercase already).
    pub fn find_by_patterns(&self, patterns: &[&str]) -> Option<usize> {
        self.bones.iter().position(|b| {
            let lower = b.name.to_lowercase();
            patterns.iter().any(|p| lower.contains(p))
        })
    }

    /// Exact name, else the pattern heuristic.
    pub fn find_bone(&self, exact: &str, patterns: &[&str]) -> Option<usize> {
        self.find_exact(exact).or_else(|| self.find_by_patterns(patterns))
    }
}

/// Bones of interest for equipping and posing a humanoid rig.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LimbBones {
    pub right_hand: Option<usize>,
    pub right_lower_arm: Option<usize>,
    pub right_upper_arm: Option<usize>,
    pub left_lower_arm: Option<usize>,
    pub left_upper_arm: Option<usize>,
    pub left_upper_leg: Option<usize>,
    pub left_lower_leg: Option<usize>,
    pub right_upper_leg: Option<usize>,
    pub right_lower_leg: Option<usize>,
}

impl LimbBones {
    /// Note that the generic `forearm`, `thigh` and `calf` patterns match
    /// either side, so rigs without sided names resolve both limbs to the
    /// first such bone.
    pub fn resolve(skeleton: &Skeleton) -> Self {
        Self {
            right_hand: skeleton.find_bone(
                "WristR",
                &["wristr", "wrist.r", "right_wrist", "rhand", "right_hand"],
            ),
            right_lower_arm: skeleton.find_bone("LowerArmR", &["lowerarmr", "forearm", "r lowerarm"]),
            right_upper_arm: skeleton.find_bone("UpperArmR", &["upperarmr", "r upperarm"]),
            left_lower_arm: skeleton.find_bone("LowerArmL", &["lowerarml", "forearm", "l lowerarm"]),
            left_upper_arm: skeleton.find_bone("UpperArmL", &["upperarml", "l upperarm"]),
            left_upper_leg: skeleton.find_bone("UpperLegL", &["upperlegl", "thigh"]),
            left_lower_leg: skeleton.find_bone("LowerLegL", &["lowerlegl", "calf"]),
            right_upper_leg: skeleton.find_bone("UpperLegR", &["upperlegr", "thigh"]),
            right_lower_leg: skeleton.find_bone("LowerLegR", &["lowerlegr", "calf"]),
        }
    }
}

/// Which bone a weapon ended up on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountPoint {
    Hand,
    LowerArm,
    UpperArm,
}

/// Weapon placement relative to its parent bone. Rotation is XYZ Euler.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mount {
    pub bone: usize,
    pub point: MountPoint,
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: f32,
}

impl Mount {
    pub fn local_matrix(&self) -> Mat4 {
        let r = self.rotation;
        Mat4::from_scale_rotation_translation(
            Vec3::splat(self.scale),
            Quat::from_euler(glam::EulerRot::XYZ, r.x, r.y, r.z),
            self.position,
        )
    }
}

/// Pick the hand, else the forearm, else the upper arm, with a default
/// placement for each. `None` when the rig has none of them.
pub fn weapon_mount(limbs: &LimbBones, scale: f32) -> Option<Mount> {
    use std::f32::consts::FRAC_PI_2;

    let (bone, point, position, base_x) = if let Some(b) = limbs.right_hand {
        (b, MountPoint::Hand, Vec3::new(0.015, -0.015, 0.02), 0.2)
    } else if let Some(b) = limbs.right_lower_arm {
        (b, MountPoint::LowerArm, Vec3::new(0.02, -0.03, 0.015), 0.1)
    } else if let Some(b) = limbs.right_upper_arm {
        (b, MountPoint::UpperArm, Vec3::new(0.04, -0.03, 0.015), 0.05)
    } else {
        return None;
    };
    Some(Mount {
        bone,
        point,
        position,
        rotation: Vec3::new(base_x, 0.2, FRAC_PI_2),
        scale,
    })
}
