use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::camera::CameraConfig;
use crate::coords::IsoProjection;
use crate::hit_test::HitTestConfig;
use crate::overlay::OverlayConfig;

/// Pixels the pointer must travel while pressed before a click becomes a drag.
pub const DRAG_THRESHOLD: f32 = 5.0;

/// Tunables for one isometric view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IsoConfig {
    pub projection: IsoProjection,
    pub camera: CameraConfig,
    pub hit_test: HitTestConfig,
    pub overlay: OverlayConfig,
    pub drag_threshold: f32,
    /// Extra world-plane margin the camera may pan past the grid edge.
    pub pan_margin: f32,
}

impl Default for IsoConfig {
    fn default() -> Self {
        Self {
            projection: IsoProjection::default(),
            camera: CameraConfig::default(),
            hit_test: HitTestConfig::default(),
            overlay: OverlayConfig::default(),
            drag_threshold: DRAG_THRESHOLD,
            pan_margin: 128.0,
        }
    }
}

impl IsoConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Parse a config, logging a warning and returning defaults on malformed input.
    pub fn from_json_or_default(json: &str) -> Self {
        match Self::from_json(json) {
            Ok(config) => config,
            Err(e) => {
                warn!("IsoConfig: failed to parse JSON, falling back to defaults: {}", e);
                Self::default()
            }
        }
    }
}
