use std::time::Duration;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::config::TargetConfig;
use crate::model::ray::{Aabb, Ray};

/// The fixed set of hit volumes stacked along the character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetId {
    Lower,
    Middle,
    Upper,
}

impl TargetId {
    pub fn name(self) -> &'static str {
        match self {
            TargetId::Lower => "lower",
            TargetId::Middle => "middle",
            TargetId::Upper => "upper",
        }
    }
}

/// Invisible box that plays one animation clip when clicked.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionTarget {
    pub id: TargetId,
    pub bounds: Aabb,
    pub animation_index: usize,
    pub stop_after: Duration,
}

impl From<&TargetConfig> for InteractionTarget {
    fn from(cfg: &TargetConfig) -> Self {
        Self {
            id: cfg.id,
            bounds: Aabb::from_center_size(Vec3::from_array(cfg.center), Vec3::from_array(cfg.size)),
            animation_index: cfg.animation_index,
            stop_after: Duration::from_millis(cfg.stop_after_ms),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetHit<'a> {
    pub target: &'a InteractionTarget,
    pub distance: f32,
}

#[derive(Debug, Clone, Default)]
pub struct InteractionTargets {
    targets: Vec<InteractionTarget>,
}

impl InteractionTargets {
    pub fn from_config(configs: &[TargetConfig]) -> Self {
        Self { targets: configs.iter().map(InteractionTarget::from).collect() }
    }

    pub fn iter(&self) -> impl Iterator<Item = &InteractionTarget> {
        self.targets.iter()
    }

    pub fn get(&self, id: TargetId) -> Option<&InteractionTarget> {
        self.targets.iter().find(|t| t.id == id)
    }

    /// Nearest target along the ray, if any. Stacked boxes overlap, so a
    /// ray can enter two of them at the same distance; the one listed last
    /// (the higher box in the stock layout) wins the tie.
    pub fn pick(&self, ray: &Ray) -> Option<TargetHit<'_>> {
        self.targets
            .iter()
            .rev()
            .filter_map(|target| target.bounds.intersect(ray).map(|distance| TargetHit { target, distance }))
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> InteractionTargets {
        InteractionTargets::from_config(&TargetConfig::default_layout())
    }

    #[test]
    fn horizontal_ray_hits_the_box_at_its_height() {
        let targets = layout();
        for (y, expected) in [(1.0, TargetId::Lower), (9.0, TargetId::Middle), (18.0, TargetId::Upper)] {
            let ray = Ray::new(Vec3::new(30.0, y, 0.0), Vec3::NEG_X);
            assert_eq!(targets.pick(&ray).map(|h| h.target.id), Some(expected));
        }
    }

    #[test]
    fn overlapping_boxes_resolve_to_nearest() {
        // Lower spans y -1..7 and middle 6..14. This ray enters lower's side
        // face at y = 5 and then climbs into middle's bottom face.
        let targets = layout();
        let ray = Ray::new(Vec3::new(10.0, 0.0, 0.0), Vec3::new(-7.5, 5.0, 0.0));
        let hit = targets.pick(&ray).unwrap();
        assert_eq!(hit.target.id, TargetId::Lower);

        let middle = targets.get(TargetId::Middle).unwrap();
        let middle_distance = middle.bounds.intersect(&ray).unwrap();
        assert!(middle_distance > hit.distance);
    }

    #[test]
    fn equal_distance_goes_to_the_higher_box() {
        // y = 6.5 lies in both lower (-1..7) and middle (6..14); both side
        // faces sit at x = 2.5.
        let targets = layout();
        let ray = Ray::new(Vec3::new(10.0, 6.5, 0.0), Vec3::NEG_X);
        assert_eq!(targets.pick(&ray).map(|h| h.target.id), Some(TargetId::Middle));

        let ray = Ray::new(Vec3::new(10.0, 13.0, 0.0), Vec3::NEG_X);
        assert_eq!(targets.pick(&ray).map(|h| h.target.id), Some(TargetId::Upper));
    }

    #[test]
    fn ray_above_everything_misses() {
        let ray = Ray::new(Vec3::new(30.0, 40.0, 0.0), Vec3::NEG_X);
        assert!(layout().pick(&ray).is_none());
    }

    #[test]
    fn targets_keep_configured_indices_and_durations() {
        let targets = layout();
        let upper = targets.get(TargetId::Upper).unwrap();
        assert_eq!(upper.animation_index, 2);
        assert_eq!(upper.stop_after, Duration::from_millis(4000));
        assert_eq!(targets.get(TargetId::Lower).unwrap().stop_after, Duration::from_millis(7000));
    }
}
