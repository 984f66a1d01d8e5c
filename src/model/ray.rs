use glam::Vec3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Always unit length.
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction: direction.normalize_or_zero() }
    }

    pub fn at(&self, distance: f32) -> Vec3 {
        self.origin + self.direction * distance
    }
}

/// Axis-aligned box in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn from_center_size(center: Vec3, size: Vec3) -> Self {
        let half = size * 0.5;
        Self { min: center - half, max: center + half }
    }

    pub fn contains(&self, p: Vec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    /// Slab test. Returns the distance along the ray to the first surface
    /// crossing in front of the origin; from inside the box that is the exit.
    pub fn intersect(&self, ray: &Ray) -> Option<f32> {
        let inv = ray.direction.recip();
        let t0 = (self.min - ray.origin) * inv;
        let t1 = (self.max - ray.origin) * inv;

        // NaN shows up when the ray is parallel to a slab and starts on its
        // plane; min/max ignore it, which treats the slab as unbounded there.
        let near = t0.min(t1).max_element();
        let far = t0.max(t1).min_element();

        if far < near || far < 0.0 {
            return None;
        }
        Some(if near >= 0.0 { near } else { far })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box() -> Aabb {
        Aabb::from_center_size(Vec3::ZERO, Vec3::splat(2.0))
    }

    #[test]
    fn hit_from_outside_returns_entry_distance() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, 10.0), Vec3::NEG_Z);
        assert_eq!(unit_box().intersect(&ray), Some(9.0));
    }

    #[test]
    fn miss_beside_box() {
        let ray = Ray::new(Vec3::new(3.0, 0.0, 10.0), Vec3::NEG_Z);
        assert_eq!(unit_box().intersect(&ray), None);
    }

    #[test]
    fn box_behind_origin_is_not_hit() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, 10.0), Vec3::Z);
        assert_eq!(unit_box().intersect(&ray), None);
    }

    #[test]
    fn from_inside_returns_exit_distance() {
        let ray = Ray::new(Vec3::ZERO, Vec3::X);
        assert_eq!(unit_box().intersect(&ray), Some(1.0));
        assert!(unit_box().contains(Vec3::ZERO));
    }

    #[test]
    fn axis_parallel_ray_inside_slab() {
        let ray = Ray::new(Vec3::new(0.5, 0.5, -5.0), Vec3::Z);
        assert_eq!(unit_box().intersect(&ray), Some(4.0));
    }

    #[test]
    fn direction_is_normalized() {
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 3.0, 4.0));
        assert!((ray.direction.length() - 1.0).abs() < 1e-6);
        assert!((ray.at(5.0) - Vec3::new(0.0, 3.0, 4.0)).length() < 1e-5);
    }
}
