// Procedural mesh types and triangulation.
//
// Two-layer architecture:
//   primitives::* → PolyMesh → triangulate_{smooth,flat}() → RenderMesh → GPU

use glam::Vec3;

// ============================================================================
// GPU VERTEX
// ============================================================================

/// GPU-ready vertex with position, normal and a tint multiplied with the
/// per-instance color.
///   @location(0) position: vec3<f32>
///   @location(1) normal:   vec3<f32>
///   @location(2) color:    vec3<f32>
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuVertex {
    pub position: [f32; 3],
    pub normal:   [f32; 3],
    pub color:    [f32; 3],
}

impl GpuVertex {
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        const F3: wgpu::BufferAddress = std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress;
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<GpuVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: F3,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: F3 * 2,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

// ============================================================================
// POLY MESH
// ============================================================================

/// Intermediate polygon mesh for procedural construction.
/// Faces are convex n-gons with CCW winding viewed from outside.
/// NOT GPU-ready — use `RenderMesh` for rendering.
#[derive(Debug, Clone, Default)]
pub struct PolyMesh {
    pub positions: Vec<Vec3>,
    pub colors:    Vec<Vec3>,
    pub faces:     Vec<Vec<usize>>,
}

impl PolyMesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a white vertex and return its index.
    #[cfg(test)]
    pub fn add_vertex(&mut self, pos: Vec3) -> usize {
        self.add_colored_vertex(pos, Vec3::ONE)
    }

    pub fn add_colored_vertex(&mut self, pos: Vec3, color: Vec3) -> usize {
        let idx = self.positions.len();
        self.positions.push(pos);
        self.colors.push(color);
        idx
    }

    /// Add a face by vertex indices (CCW order).
    pub fn add_face(&mut self, indices: Vec<usize>) {
        debug_assert!(indices.len() >= 3, "Face must have at least 3 vertices");
        self.faces.push(indices);
    }

    /// Append another mesh, offsetting its indices.
    pub fn merge(&mut self, other: &PolyMesh) {
        let base = self.positions.len();
        self.positions.extend_from_slice(&other.positions);
        self.colors.extend_from_slice(&other.colors);
        for face in &other.faces {
            self.faces.push(face.iter().map(|i| i + base).collect());
        }
    }

    /// Translate every vertex.
    pub fn translated(mut self, offset: Vec3) -> Self {
        for p in &mut self.positions {
            *p += offset;
        }
        self
    }

    pub fn vertex_count(&self) -> usize { self.positions.len() }
    #[cfg(test)]
    pub fn face_count(&self) -> usize { self.faces.len() }

    /// Axis-aligned bounds as (min, max). Empty meshes return (ZERO, ZERO).
    #[cfg(test)]
    pub fn bounds(&self) -> (Vec3, Vec3) {
        if self.positions.is_empty() {
            return (Vec3::ZERO, Vec3::ZERO);
        }
        self.positions.iter().fold(
            (Vec3::splat(f32::INFINITY), Vec3::splat(f32::NEG_INFINITY)),
            |(lo, hi), p| (lo.min(*p), hi.max(*p)),
        )
    }
}

// ============================================================================
// RENDER MESH
// ============================================================================

/// GPU-ready triangulated mesh.
/// Upload vertex_bytes() to a VERTEX buffer, index_bytes() to an INDEX buffer.
#[derive(Debug, Clone)]
pub struct RenderMesh {
    pub vertices: Vec<GpuVertex>,
    pub indices:  Vec<u32>,
}

impl RenderMesh {
    /// Cast vertex slice to raw bytes for wgpu buffer upload.
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Cast index slice to raw bytes for wgpu buffer upload.
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    pub fn index_count(&self) -> usize  { self.indices.len() }
}

// ============================================================================
// TRIANGULATION
// ============================================================================

/// Shared-vertex triangulation with area-weighted smooth normals.
/// Used for rounded shapes (sphere, cone, ground) where facets should not show.
///
/// The cross product of a fan triangle has magnitude 2×area, so summing the
/// raw products weights each face by its area.
pub fn triangulate_smooth(poly: &PolyMesh) -> RenderMesh {
    let mut normal_accum: Vec<Vec3> = vec![Vec3::ZERO; poly.vertex_count()];

    for face in &poly.faces {
        for i in 1..(face.len() - 1) {
            let a = poly.positions[face[0]];
            let b = poly.positions[face[i]];
            let c = poly.positions[face[i + 1]];
            let weighted_normal = (b - a).cross(c - a);
            normal_accum[face[0]]     += weighted_normal;
            normal_accum[face[i]]     += weighted_normal;
            normal_accum[face[i + 1]] += weighted_normal;
        }
    }

    let vertices: Vec<GpuVertex> = poly.positions.iter()
        .zip(normal_accum.iter())
        .zip(poly.colors.iter())
        .map(|((pos, n), color)| GpuVertex {
            position: pos.to_array(),
            normal:   n.normalize_or_zero().to_array(),
            color:    color.to_array(),
        })
        .collect();

    let mut indices: Vec<u32> = Vec::new();
    for face in &poly.faces {
        for i in 1..(face.len() - 1) {
            indices.push(face[0]     as u32);
            indices.push(face[i]     as u32);
            indices.push(face[i + 1] as u32);
        }
    }

    RenderMesh { vertices, indices }
}

/// Per-face vertices with one flat normal each. Boxes and the axe blade use
/// this so their edges stay crisp.
pub fn triangulate_flat(poly: &PolyMesh) -> RenderMesh {
    let mut vertices = Vec::new();
    let mut indices = Vec::new();

    for face in &poly.faces {
        let a = poly.positions[face[0]];
        let mut normal = Vec3::ZERO;
        for i in 1..(face.len() - 1) {
            normal += (poly.positions[face[i]] - a).cross(poly.positions[face[i + 1]] - a);
        }
        let normal = normal.normalize_or_zero().to_array();

        let base = vertices.len() as u32;
        for &vi in face {
            vertices.push(GpuVertex {
                position: poly.positions[vi].to_array(),
                normal,
                color: poly.colors[vi].to_array(),
            });
        }
        for i in 1..(face.len() as u32 - 1) {
            indices.extend_from_slice(&[base, base + i, base + i + 1]);
        }
    }

    RenderMesh { vertices, indices }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> PolyMesh {
        let mut m = PolyMesh::new();
        let a = m.add_vertex(Vec3::new(0.0, 0.0, 0.0));
        let b = m.add_vertex(Vec3::new(1.0, 0.0, 0.0));
        let c = m.add_vertex(Vec3::new(1.0, 1.0, 0.0));
        let d = m.add_vertex(Vec3::new(0.0, 1.0, 0.0));
        m.add_face(vec![a, b, c, d]);
        m
    }

    #[test]
    fn smooth_shares_vertices() {
        let rm = triangulate_smooth(&quad());
        assert_eq!(rm.vertices.len(), 4);
        assert_eq!(rm.index_count(), 6);
        assert!((Vec3::from(rm.vertices[0].normal) - Vec3::Z).length() < 1e-6);
    }

    #[test]
    fn flat_duplicates_per_face() {
        let mut m = quad();
        let other = quad().translated(Vec3::Z);
        m.merge(&other);
        let rm = triangulate_flat(&m);
        assert_eq!(rm.vertices.len(), 8);
        assert_eq!(rm.index_count(), 12);
        assert_eq!(*rm.indices.iter().max().unwrap(), 7);
    }

    #[test]
    fn bounds_cover_all_points() {
        let (lo, hi) = quad().translated(Vec3::new(-1.0, 0.0, 2.0)).bounds();
        assert_eq!(lo, Vec3::new(-1.0, 0.0, 2.0));
        assert_eq!(hi, Vec3::new(0.0, 1.0, 2.0));
    }
}
