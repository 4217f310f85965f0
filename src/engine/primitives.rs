// Procedural primitive builders.
//
// All shapes are centered the same way three-style primitives are: boxes,
// cylinders, cones and spheres around the origin, ground planes at y = 0.
// Every face uses CCW winding viewed from outside.

use std::f32::consts::{PI, TAU};

use glam::{Vec2, Vec3};
use rand::Rng;

use super::components::Color;
use super::mesh::PolyMesh;

/// Axis-aligned box with the given half extents.
///
/// Vertex layout (relative offsets from center, half-extent h):
///   0: (-x, -y, +z)  front-bottom-left
///   1: (+x, -y, +z)  front-bottom-right
///   2: (+x, +y, +z)  front-top-right
///   3: (-x, +y, +z)  front-top-left
///   4: (+x, -y, -z)  back-bottom-right
///   5: (-x, -y, -z)  back-bottom-left
///   6: (-x, +y, -z)  back-top-left
///   7: (+x, +y, -z)  back-top-right
pub fn cuboid(half: Vec3, color: Color) -> PolyMesh {
    let mut mesh = PolyMesh::new();
    let c = color.to_vec3();
    let (x, y, z) = (half.x, half.y, half.z);
    let v = [
        Vec3::new(-x, -y,  z),
        Vec3::new( x, -y,  z),
        Vec3::new( x,  y,  z),
        Vec3::new(-x,  y,  z),
        Vec3::new( x, -y, -z),
        Vec3::new(-x, -y, -z),
        Vec3::new(-x,  y, -z),
        Vec3::new( x,  y, -z),
    ];
    for p in v {
        mesh.add_colored_vertex(p, c);
    }
    mesh.add_face(vec![0, 1, 2, 3]); // front  (+Z)
    mesh.add_face(vec![4, 5, 6, 7]); // back   (-Z)
    mesh.add_face(vec![5, 0, 3, 6]); // left   (-X)
    mesh.add_face(vec![1, 4, 7, 2]); // right  (+X)
    mesh.add_face(vec![3, 2, 7, 6]); // top    (+Y)
    mesh.add_face(vec![5, 4, 1, 0]); // bottom (-Y)
    mesh
}

fn ring_point(radius: f32, theta: f32, y: f32) -> Vec3 {
    Vec3::new(radius * theta.sin(), y, radius * theta.cos())
}

/// Capped cylinder spanning y ∈ [-height/2, height/2]. A top radius of zero
/// produces a cone with a single apex.
pub fn cylinder(radius_top: f32, radius_bottom: f32, height: f32, segments: usize, color: Color) -> PolyMesh {
    let segments = segments.max(3);
    let mut mesh = PolyMesh::new();
    let c = color.to_vec3();
    let half = height * 0.5;
    let step = TAU / segments as f32;

    let bottom: Vec<usize> = (0..segments)
        .map(|i| mesh.add_colored_vertex(ring_point(radius_bottom, i as f32 * step, -half), c))
        .collect();

    if radius_top <= f32::EPSILON {
        let apex = mesh.add_colored_vertex(Vec3::new(0.0, half, 0.0), c);
        for i in 0..segments {
            let j = (i + 1) % segments;
            mesh.add_face(vec![bottom[i], bottom[j], apex]);
        }
    } else {
        let top: Vec<usize> = (0..segments)
            .map(|i| mesh.add_colored_vertex(ring_point(radius_top, i as f32 * step, half), c))
            .collect();
        for i in 0..segments {
            let j = (i + 1) % segments;
            mesh.add_face(vec![bottom[i], bottom[j], top[j], top[i]]);
        }
        mesh.add_face(top.clone());
    }

    mesh.add_face(bottom.iter().rev().copied().collect());
    mesh
}

pub fn cone(radius: f32, height: f32, segments: usize, color: Color) -> PolyMesh {
    cylinder(0.0, radius, height, segments, color)
}

/// UV sphere with `segments` around Y and `rings` from pole to pole.
pub fn sphere(radius: f32, segments: usize, rings: usize, color: Color) -> PolyMesh {
    let segments = segments.max(3);
    let rings = rings.max(2);
    let mut mesh = PolyMesh::new();
    let c = color.to_vec3();

    // (rings + 1) rows of (segments + 1) columns; the seam column duplicates
    // column 0 so that quads never wrap indices.
    let cols = segments + 1;
    for j in 0..=rings {
        let phi = PI * j as f32 / rings as f32;
        for i in 0..=segments {
            let theta = TAU * i as f32 / segments as f32;
            let p = Vec3::new(
                radius * phi.sin() * theta.sin(),
                radius * phi.cos(),
                radius * phi.sin() * theta.cos(),
            );
            mesh.add_colored_vertex(p, c);
        }
    }

    let at = |j: usize, i: usize| j * cols + i;
    for j in 0..rings {
        for i in 0..segments {
            if j == 0 {
                mesh.add_face(vec![at(j, i), at(j + 1, i), at(j + 1, i + 1)]);
            } else if j == rings - 1 {
                mesh.add_face(vec![at(j, i), at(j + 1, i), at(j, i + 1)]);
            } else {
                mesh.add_face(vec![at(j, i), at(j + 1, i), at(j + 1, i + 1), at(j, i + 1)]);
            }
        }
    }
    mesh
}

/// Square ground grid on y = 0 with per-vertex grass tinting.
///
/// Each vertex gets a random hue in [100°, 130°] at 55% saturation and
/// 25–40% lightness, the same palette grass blades were painted with.
pub fn grass_plane(size: f32, divisions: usize, rng: &mut impl Rng) -> PolyMesh {
    let divisions = divisions.max(1);
    let mut mesh = PolyMesh::new();
    let half = size * 0.5;
    let cell = size / divisions as f32;
    let base = Color::from_hex(0x3a7a2a).to_vec3();
    let cols = divisions + 1;

    for zi in 0..=divisions {
        for xi in 0..=divisions {
            let p = Vec3::new(-half + xi as f32 * cell, 0.0, -half + zi as f32 * cell);
            let blade = Color::from_hsl(
                rng.gen_range(100.0..130.0),
                0.55,
                rng.gen_range(0.25..0.40),
            )
            .to_vec3();
            mesh.add_colored_vertex(p, base.lerp(blade, 0.6));
        }
    }

    let at = |zi: usize, xi: usize| zi * cols + xi;
    for zi in 0..divisions {
        for xi in 0..divisions {
            mesh.add_face(vec![at(zi, xi), at(zi + 1, xi), at(zi + 1, xi + 1), at(zi, xi + 1)]);
        }
    }
    mesh
}

/// Extrude a convex CCW profile (XY plane) symmetrically along Z.
pub fn extrude_convex(profile: &[Vec2], half_depth: f32, color: Color) -> PolyMesh {
    let mut mesh = PolyMesh::new();
    let c = color.to_vec3();
    let n = profile.len();
    let front: Vec<usize> = profile
        .iter()
        .map(|p| mesh.add_colored_vertex(p.extend(half_depth), c))
        .collect();
    let back: Vec<usize> = profile
        .iter()
        .map(|p| mesh.add_colored_vertex(p.extend(-half_depth), c))
        .collect();

    mesh.add_face(front.clone());
    mesh.add_face(back.iter().rev().copied().collect());
    for i in 0..n {
        let j = (i + 1) % n;
        mesh.add_face(vec![front[i], back[i], back[j], front[j]]);
    }
    mesh
}

// ============================================================================
// AXES
// ============================================================================

const HANDLE_COLOR: u32 = 0x8b5a2b;
const HEAD_COLOR: u32 = 0x9aa0a6;

/// Two-box axe. The grip sits at the origin, the handle runs up +Y and the
/// blade points along +X.
pub fn primitive_axe() -> PolyMesh {
    let mut axe = cuboid(Vec3::new(0.02, 0.375, 0.02), Color::from_hex(HANDLE_COLOR))
        .translated(Vec3::new(0.0, 0.175, 0.0));
    axe.merge(
        &cuboid(Vec3::new(0.11, 0.06, 0.015), Color::from_hex(HEAD_COLOR))
            .translated(Vec3::new(0.08, 0.5, 0.0)),
    );
    axe
}

/// Octagonal handle with a flared, extruded blade.
pub fn procedural_axe() -> PolyMesh {
    let mut axe = cylinder(0.02, 0.024, 0.78, 8, Color::from_hex(HANDLE_COLOR))
        .translated(Vec3::new(0.0, 0.17, 0.0));
    let blade = [
        Vec2::new(0.0, 0.42),
        Vec2::new(0.2, 0.34),
        Vec2::new(0.25, 0.5),
        Vec2::new(0.2, 0.66),
        Vec2::new(0.0, 0.58),
    ];
    axe.merge(&extrude_convex(&blade, 0.014, Color::from_hex(HEAD_COLOR)));
    // Poll on the back of the head.
    axe.merge(
        &cuboid(Vec3::new(0.035, 0.05, 0.02), Color::from_hex(HEAD_COLOR))
            .translated(Vec3::new(-0.03, 0.5, 0.0)),
    );
    axe
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::mesh::{triangulate_flat, triangulate_smooth};
    use rand::SeedableRng;

    fn face_normal(mesh: &PolyMesh, face: &[usize]) -> Vec3 {
        let a = mesh.positions[face[0]];
        (mesh.positions[face[1]] - a).cross(mesh.positions[face[2]] - a)
    }

    /// Every face normal of a convex, origin-centred shape points away from the center.
    fn assert_outward(mesh: &PolyMesh) {
        let (lo, hi) = mesh.bounds();
        let center = (lo + hi) * 0.5;
        for face in &mesh.faces {
            let n = face_normal(mesh, face);
            if n.length_squared() < 1e-12 {
                continue;
            }
            let centroid = face.iter().map(|&i| mesh.positions[i]).sum::<Vec3>() / face.len() as f32;
            assert!(n.dot(centroid - center) > 0.0, "inward face {:?}", face);
        }
    }

    #[test]
    fn cuboid_is_closed_and_outward() {
        let m = cuboid(Vec3::new(1.0, 2.0, 3.0), Color::WHITE);
        assert_eq!(m.vertex_count(), 8);
        assert_eq!(m.face_count(), 6);
        assert_outward(&m);
        assert_eq!(triangulate_flat(&m).index_count(), 36);
    }

    #[test]
    fn cylinder_and_cone_are_outward() {
        let trunk = cylinder(0.25, 0.35, 2.2, 8, Color::WHITE);
        assert_eq!(trunk.face_count(), 8 + 2);
        assert_outward(&trunk);
        let (lo, hi) = trunk.bounds();
        assert!((lo.y + 1.1).abs() < 1e-6 && (hi.y - 1.1).abs() < 1e-6);

        let leaves = cone(1.2, 2.4, 10, Color::WHITE);
        assert_eq!(leaves.face_count(), 10 + 1);
        assert_outward(&leaves);
    }

    #[test]
    fn sphere_normals_point_out() {
        let s = sphere(0.6, 10, 10, Color::WHITE);
        assert_outward(&s);
        let rm = triangulate_smooth(&s);
        for v in &rm.vertices {
            let p = Vec3::from(v.position);
            let n = Vec3::from(v.normal);
            if n != Vec3::ZERO {
                assert!(n.dot(p) > 0.0);
            }
        }
    }

    #[test]
    fn grass_plane_faces_up() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        let g = grass_plane(20.0, 4, &mut rng);
        assert_eq!(g.vertex_count(), 25);
        assert_eq!(g.face_count(), 16);
        for face in &g.faces {
            assert!(face_normal(&g, face).y > 0.0);
        }
        let (lo, hi) = g.bounds();
        assert_eq!(lo.x, -10.0);
        assert_eq!(hi.z, 10.0);
    }

    #[test]
    fn extruded_blade_is_outward() {
        let profile = [Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(1.0, 1.0), Vec2::new(0.0, 1.0)];
        let m = extrude_convex(&profile, 0.1, Color::WHITE);
        assert_eq!(m.face_count(), 6);
        assert_outward(&m);
    }

    #[test]
    fn axes_grip_at_origin() {
        for axe in [primitive_axe(), procedural_axe()] {
            let (lo, hi) = axe.bounds();
            assert!(lo.y < 0.0 && hi.y > 0.5);
            assert!(hi.x > 0.15, "blade should point along +X");
        }
    }
}
