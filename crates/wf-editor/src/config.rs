//! Editor tunables, loadable from JSON. Missing keys take defaults.

use serde::{Deserialize, Serialize};
use wf_core::{DimensionCache, Dimensions, GeometryConfig, WAYPOINT_EPSILON};
use wf_render::HitConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Size assumed for states the renderer has not measured yet.
    pub default_state_size: Dimensions,
    #[serde(flatten)]
    pub geometry: GeometryConfig,
    #[serde(flatten)]
    pub hit: HitConfig,
    pub waypoint_epsilon: f32,
    /// Maximum undo steps kept.
    pub undo_depth: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            default_state_size: Dimensions::default(),
            geometry: GeometryConfig::default(),
            hit: HitConfig::default(),
            waypoint_epsilon: WAYPOINT_EPSILON,
            undo_depth: 100,
        }
    }
}

impl EditorConfig {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn dimension_cache(&self) -> DimensionCache {
        DimensionCache::new(self.default_state_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = EditorConfig::from_json(r#"{ "curve_offset": 45, "undo_depth": 10 }"#).unwrap();
        assert_eq!(cfg.geometry.curve_offset, 45.0);
        assert_eq!(cfg.geometry.loop_radius, GeometryConfig::default().loop_radius);
        assert_eq!(cfg.undo_depth, 10);
        assert_eq!(cfg.hit, HitConfig::default());
    }

    #[test]
    fn empty_object_is_default() {
        assert_eq!(EditorConfig::from_json("{}").unwrap(), EditorConfig::default());
    }

    #[test]
    fn nested_state_size() {
        let cfg = EditorConfig::from_json(r#"{ "default_state_size": { "width": 120, "height": 48 } }"#).unwrap();
        assert_eq!(cfg.dimension_cache().fallback(), Dimensions::new(120.0, 48.0));
    }
}
