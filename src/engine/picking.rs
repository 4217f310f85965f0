// Ray picking against simple bounding volumes.

use glam::{Mat4, Vec3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Always unit length
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction: direction.normalize_or_zero() }
    }

    /// Express the ray in the local space of an object with the given world matrix.
    /// Distances along the result are only comparable with other local-space hits
    /// when the matrix has no scale.
    pub fn to_local(&self, world: &Mat4) -> Ray {
        let inv = world.inverse();
        Ray::new(inv.transform_point3(self.origin), inv.transform_vector3(self.direction))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min: min.min(max), max: min.max(max) }
    }

    pub fn from_center_half(center: Vec3, half: Vec3) -> Self {
        Self::new(center - half, center + half)
    }

    /// Slab test. Returns the entry distance (0 when the origin is inside).
    pub fn intersect(&self, ray: &Ray) -> Option<f32> {
        let inv = ray.direction.recip();
        let t1 = (self.min - ray.origin) * inv;
        let t2 = (self.max - ray.origin) * inv;
        let t_near = t1.min(t2).max_element();
        let t_far = t1.max(t2).min_element();
        if t_near.is_nan() || t_far.is_nan() || t_far < t_near.max(0.0) {
            return None;
        }
        Some(t_near.max(0.0))
    }
}

/// Entry distance of a ray into a sphere.
pub fn intersect_sphere(ray: &Ray, center: Vec3, radius: f32) -> Option<f32> {
    let oc = ray.origin - center;
    let b = oc.dot(ray.direction);
    let c = oc.length_squared() - radius * radius;
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let sq = disc.sqrt();
    let t = -b - sq;
    if t >= 0.0 {
        Some(t)
    } else if -b + sq >= 0.0 {
        Some(0.0)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aabb_hit_and_miss() {
        let b = Aabb::from_center_half(Vec3::ZERO, Vec3::ONE);
        let hit = b.intersect(&Ray::new(Vec3::new(0.0, 0.0, 5.0), -Vec3::Z));
        assert_eq!(hit, Some(4.0));
        assert!(b.intersect(&Ray::new(Vec3::new(3.0, 0.0, 5.0), -Vec3::Z)).is_none());
        // Pointing away
        assert!(b.intersect(&Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::Z)).is_none());
        // Inside
        assert_eq!(b.intersect(&Ray::new(Vec3::ZERO, Vec3::X)), Some(0.0));
    }

    #[test]
    fn axis_parallel_rays_use_infinite_slabs() {
        let b = Aabb::new(Vec3::new(-1.0, 0.0, -1.0), Vec3::new(1.0, 2.0, 1.0));
        assert!(b.intersect(&Ray::new(Vec3::new(0.5, 1.0, -4.0), Vec3::Z)).is_some());
        assert!(b.intersect(&Ray::new(Vec3::new(0.5, 3.0, -4.0), Vec3::Z)).is_none());
    }

    #[test]
    fn sphere_hits() {
        let r = Ray::new(Vec3::new(0.0, 0.0, -10.0), Vec3::Z);
        let t = intersect_sphere(&r, Vec3::ZERO, 2.0).unwrap();
        assert!((t - 8.0).abs() < 1e-5);
        assert!(intersect_sphere(&r, Vec3::new(5.0, 0.0, 0.0), 2.0).is_none());
    }

    #[test]
    fn local_ray_follows_rotation() {
        let world = Mat4::from_rotation_z(std::f32::consts::FRAC_PI_2) * Mat4::from_translation(Vec3::X);
        let r = Ray::new(Vec3::new(0.0, 1.0, 5.0), -Vec3::Z).to_local(&world);
        assert!((r.origin - Vec3::new(0.0, 0.0, 5.0)).length() < 1e-5);
        assert!((r.direction + Vec3::Z).length() < 1e-5);
    }
}
