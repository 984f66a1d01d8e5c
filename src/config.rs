//! Viewer configuration.
//!
//! Every field defaults to the layout the viewer ships with, so an empty JSON
//! object (or no config file at all) yields a working scene.

use std::f32::consts::{FRAC_PI_2, FRAC_PI_4};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::targets::TargetId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub assets: AssetManifest,
    pub camera: CameraConfig,
    pub orbit: OrbitConfig,
    pub targets: Vec<TargetConfig>,
    pub tracking: TrackingConfig,
    pub character: Placement,
    pub ground: Placement,
    pub hand: Placement,
    /// Fixed animation step applied every frame, in seconds.
    pub frame_step_seconds: f32,
    /// Start clip 0 as soon as the character finishes loading.
    pub autoplay_first_clip: bool,
    pub stop_policy: StopPolicy,
    pub clear_color: [f64; 4],
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            assets: AssetManifest::default(),
            camera: CameraConfig::default(),
            orbit: OrbitConfig::default(),
            targets: TargetConfig::default_layout(),
            tracking: TrackingConfig::default(),
            character: Placement { scale: 10.0, translation: [0.0; 3], rotation_y: FRAC_PI_2 },
            ground: Placement::scaled(10.0),
            hand: Placement::scaled(10.0),
            frame_step_seconds: 0.016,
            autoplay_first_clip: true,
            stop_policy: StopPolicy::Stack,
            clear_color: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

impl ViewerConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Asset file names, resolved against `root` (a directory natively, a URL
/// prefix on the web).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetManifest {
    pub root: String,
    pub environment: String,
    pub character: String,
    pub ground: String,
    pub hand: String,
}

impl Default for AssetManifest {
    fn default() -> Self {
        Self {
            root: "assets".to_string(),
            environment: "back.hdr".to_string(),
            character: "model3.glb".to_string(),
            ground: "road.glb".to_string(),
            hand: "hand.glb".to_string(),
        }
    }
}

impl AssetManifest {
    pub fn resolve(&self, file: &str) -> String {
        if self.root.is_empty() {
            file.to_string()
        } else {
            format!("{}/{}", self.root.trim_end_matches('/'), file)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub fov_y_degrees: f32,
    pub z_near: f32,
    pub z_far: f32,
    pub position: [f32; 3],
    pub target: [f32; 3],
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_y_degrees: 75.0,
            z_near: 0.1,
            z_far: 1000.0,
            position: [20.0, 20.0, -20.0],
            target: [0.0, 0.0, 0.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbitConfig {
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub enable_rotate: bool,
    pub enable_zoom: bool,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    /// Polar angle measured from +Y, radians.
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,
}

impl Default for OrbitConfig {
    fn default() -> Self {
        Self {
            enable_damping: true,
            damping_factor: 0.25,
            enable_rotate: true,
            enable_zoom: true,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            min_distance: 10.0,
            max_distance: 50.0,
            min_polar_angle: FRAC_PI_4,
            max_polar_angle: FRAC_PI_2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetConfig {
    pub id: TargetId,
    pub center: [f32; 3],
    pub size: [f32; 3],
    pub animation_index: usize,
    pub stop_after_ms: u64,
}

impl TargetConfig {
    pub fn default_layout() -> Vec<Self> {
        let size = [5.0, 8.0, 5.0];
        vec![
            Self { id: TargetId::Lower, center: [0.0, 3.0, 0.0], size, animation_index: 0, stop_after_ms: 7000 },
            Self { id: TargetId::Middle, center: [0.0, 10.0, 0.0], size, animation_index: 1, stop_after_ms: 4000 },
            Self { id: TargetId::Upper, center: [0.0, 16.0, 0.0], size, animation_index: 2, stop_after_ms: 4000 },
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// Distance from the camera along the pointer ray.
    pub distance: f32,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self { distance: 17.0 }
    }
}

/// Where a loaded model is put in the world.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Placement {
    pub scale: f32,
    pub translation: [f32; 3],
    pub rotation_y: f32,
}

impl Placement {
    pub fn scaled(scale: f32) -> Self {
        Self { scale, translation: [0.0; 3], rotation_y: 0.0 }
    }
}

impl Default for Placement {
    fn default() -> Self {
        Self::scaled(1.0)
    }
}

/// What a repeated click does to a stop that is still pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopPolicy {
    /// Every click schedules its own stop; none are cancelled.
    #[default]
    Stack,
    /// A click cancels the pending stop of the same target first, so the
    /// clip always runs its full duration after the latest click.
    Replace,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_yields_defaults() {
        let cfg = ViewerConfig::from_json("{}").unwrap();
        assert_eq!(cfg, ViewerConfig::default());
        assert_eq!(cfg.targets.len(), 3);
        assert_eq!(cfg.stop_policy, StopPolicy::Stack);
    }

    #[test]
    fn partial_json_overrides_only_named_fields() {
        let cfg = ViewerConfig::from_json(
            r#"{ "tracking": { "distance": 5.0 }, "stop_policy": "replace", "assets": { "root": "https://cdn.example/x/" } }"#,
        )
        .unwrap();
        assert_eq!(cfg.tracking.distance, 5.0);
        assert_eq!(cfg.stop_policy, StopPolicy::Replace);
        assert_eq!(cfg.assets.hand, "hand.glb");
        assert_eq!(cfg.assets.resolve("hand.glb"), "https://cdn.example/x/hand.glb");
    }

    #[test]
    fn lower_target_has_longest_stop() {
        let layout = TargetConfig::default_layout();
        let lower = layout.iter().find(|t| t.id == TargetId::Lower).unwrap();
        assert!(layout.iter().all(|t| t.stop_after_ms <= lower.stop_after_ms));
        assert_eq!(lower.stop_after_ms, 7000);
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        let err = ViewerConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, crate::error::ViewerError::Config(_)));
    }
}
