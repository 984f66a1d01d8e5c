use glam::{Quat, Vec3};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpolation {
    Step,
    Linear,
    /// Values are stored as (in-tangent, value, out-tangent) triplets.
    CubicSpline,
}

pub trait Interpolate: Copy {
    fn lerp_to(self, other: Self, t: f32) -> Self;
    fn hermite(v0: Self, out0: Self, in1: Self, v1: Self, t: f32, dt: f32) -> Self;
}

fn hermite_weights(t: f32) -> (f32, f32, f32, f32) {
    let t2 = t * t;
    let t3 = t2 * t;
    let s2 = -2.0 * t3 + 3.0 * t2;
    let s3 = t3 - t2;
    let s0 = 1.0 - s2;
    let s1 = s3 - t2 + t;
    (s0, s1, s2, s3)
}

impl Interpolate for Vec3 {
    fn lerp_to(self, other: Self, t: f32) -> Self {
        self.lerp(other, t)
    }

    fn hermite(v0: Self, out0: Self, in1: Self, v1: Self, t: f32, dt: f32) -> Self {
        let (s0, s1, s2, s3) = hermite_weights(t);
        v0 * s0 + out0 * dt * s1 + v1 * s2 + in1 * dt * s3
    }
}

impl Interpolate for Quat {
    fn lerp_to(self, other: Self, t: f32) -> Self {
        self.slerp(other, t)
    }

    fn hermite(v0: Self, out0: Self, in1: Self, v1: Self, t: f32, dt: f32) -> Self {
        let (s0, s1, s2, s3) = hermite_weights(t);
        let v = glam::Vec4::from(v0) * s0
            + glam::Vec4::from(out0) * dt * s1
            + glam::Vec4::from(v1) * s2
            + glam::Vec4::from(in1) * dt * s3;
        Quat::from_vec4(v).normalize()
    }
}

/// Keyframes for one animated property.
#[derive(Debug, Clone, PartialEq)]
pub struct Keyframes<T: Interpolate> {
    pub times: Vec<f32>,
    pub values: Vec<T>,
    pub interpolation: Interpolation,
}

impl<T: Interpolate> Keyframes<T> {
    pub fn new(times: Vec<f32>, values: Vec<T>, interpolation: Interpolation) -> Self {
        Self { times, values, interpolation }
    }

    /// True when there are enough values for the number of keys.
    pub fn is_well_formed(&self) -> bool {
        let per_key = if self.interpolation == Interpolation::CubicSpline { 3 } else { 1 };
        !self.times.is_empty() && self.values.len() == self.times.len() * per_key
    }

    pub fn end_time(&self) -> f32 {
        self.times.last().copied().unwrap_or(0.0)
    }

    fn value_at(&self, key: usize) -> T {
        match self.interpolation {
            Interpolation::CubicSpline => self.values[key * 3 + 1],
            _ => self.values[key],
        }
    }

    /// Value at `time`, clamped to the first and last key.
    pub fn sample(&self, time: f32) -> Option<T> {
        if !self.is_well_formed() {
            return None;
        }
        let last = self.times.len() - 1;
        let next = self.times.partition_point(|&t| t <= time);
        if next == 0 {
            return Some(self.value_at(0));
        }
        if next > last {
            return Some(self.value_at(last));
        }

        let prev = next - 1;
        let (t0, t1) = (self.times[prev], self.times[next]);
        let dt = t1 - t0;
        let t = if dt > 1e-6 { ((time - t0) / dt).clamp(0.0, 1.0) } else { 0.0 };

        Some(match self.interpolation {
            Interpolation::Step => self.value_at(prev),
            Interpolation::Linear => self.value_at(prev).lerp_to(self.value_at(next), t),
            Interpolation::CubicSpline => T::hermite(
                self.values[prev * 3 + 1],
                self.values[prev * 3 + 2],
                self.values[next * 3],
                self.values[next * 3 + 1],
                t,
                dt,
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear() -> Keyframes<Vec3> {
        Keyframes::new(vec![0.0, 1.0, 2.0], vec![Vec3::ZERO, Vec3::X, Vec3::new(1.0, 2.0, 0.0)], Interpolation::Linear)
    }

    #[test]
    fn linear_midpoint() {
        assert_eq!(linear().sample(0.5), Some(Vec3::new(0.5, 0.0, 0.0)));
        assert_eq!(linear().sample(1.5), Some(Vec3::new(1.0, 1.0, 0.0)));
    }

    #[test]
    fn clamps_outside_range() {
        assert_eq!(linear().sample(-1.0), Some(Vec3::ZERO));
        assert_eq!(linear().sample(5.0), Some(Vec3::new(1.0, 2.0, 0.0)));
    }

    #[test]
    fn step_holds_previous_key() {
        let mut k = linear();
        k.interpolation = Interpolation::Step;
        assert_eq!(k.sample(0.99), Some(Vec3::ZERO));
        assert_eq!(k.sample(1.0), Some(Vec3::X));
    }

    #[test]
    fn cubic_spline_hits_keys_exactly() {
        let k = Keyframes::new(
            vec![0.0, 1.0],
            vec![Vec3::ZERO, Vec3::ZERO, Vec3::ONE, Vec3::ONE, Vec3::splat(2.0), Vec3::ONE],
            Interpolation::CubicSpline,
        );
        assert_eq!(k.sample(0.0), Some(Vec3::ZERO));
        assert_eq!(k.sample(1.0), Some(Vec3::splat(2.0)));
    }

    #[test]
    fn quaternion_slerp_is_unit() {
        let k = Keyframes::new(
            vec![0.0, 1.0],
            vec![Quat::IDENTITY, Quat::from_rotation_y(std::f32::consts::PI)],
            Interpolation::Linear,
        );
        let q = k.sample(0.5).unwrap();
        assert!((q.length() - 1.0).abs() < 1e-5);
        assert!(q.angle_between(Quat::from_rotation_y(std::f32::consts::FRAC_PI_2)) < 1e-3);
    }

    #[test]
    fn malformed_track_samples_nothing() {
        let k: Keyframes<Vec3> = Keyframes::new(vec![0.0, 1.0], vec![Vec3::ZERO], Interpolation::Linear);
        assert!(!k.is_well_formed());
        assert_eq!(k.sample(0.5), None);
    }
}
