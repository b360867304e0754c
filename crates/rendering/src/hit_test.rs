//! Screen point -> tile resolution under elevation.
//!
//! A tall tile's top face can cover the screen diamond of the tile in front
//! of it, so a flat inverse projection picks the wrong tile. The picker
//! slices the heightfield from the top down: at each probe height it asks
//! which tile would be under the point if that tile stood at the probe
//! height, and accepts the first one that actually stands at least that tall.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use simulation::config::MAX_ELEVATION;
use simulation::grid::TileGrid;

use crate::coords::IsoProjection;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HitTestConfig {
    /// Elevation units between probes.
    pub probe_step: f32,
    /// Highest probe height. The grid's own maximum is used when lower.
    pub max_probe_elevation: f32,
}

impl Default for HitTestConfig {
    fn default() -> Self {
        Self {
            probe_step: 1.0,
            max_probe_elevation: MAX_ELEVATION as f32,
        }
    }
}

/// Resolve a world-plane point to the tile whose visible top face covers it.
///
/// Returns `None` when no probe lands on an in-bounds tile.
pub fn pick_tile(
    projection: &IsoProjection,
    grid: &TileGrid,
    point: Vec2,
    config: &HitTestConfig,
) -> Option<IVec2> {
    let step = if config.probe_step > 0.0 && config.probe_step.is_finite() {
        config.probe_step
    } else {
        1.0
    };
    let top = (grid.max_elevation() as f32).min(config.max_probe_elevation.max(0.0));

    let mut h = top;
    loop {
        let candidate = projection.screen_to_tile_at_height(point, h);
        if let Some(elevation) = grid.elevation_at(candidate.x, candidate.y) {
            if elevation as f32 >= h {
                return Some(candidate);
            }
        }
        if h <= 0.0 {
            return None;
        }
        h = (h - step).max(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use simulation::grid::TileType;

    fn raised_grid(at: (i32, i32), elevation: u8) -> TileGrid {
        TileGrid::from_fn(8, 8, |x, y| {
            let e = if (x, y) == at { elevation } else { 0 };
            (TileType::Grass, e, None)
        })
    }

    #[test]
    fn test_flat_grid_matches_inverse_projection() {
        let proj = IsoProjection::default();
        let grid = TileGrid::new(8, 8);
        let cfg = HitTestConfig::default();
        for y in 0..8 {
            for x in 0..8 {
                let centre = proj.tile_to_screen(x, y);
                assert_eq!(pick_tile(&proj, &grid, centre, &cfg), Some(IVec2::new(x, y)));
            }
        }
    }

    #[test]
    fn test_raised_top_face_resolves_to_raised_tile() {
        let proj = IsoProjection::default();
        let grid = raised_grid((3, 3), 4);
        let cfg = HitTestConfig::default();

        // Centre of the top face of (3,3), 32px above its ground diamond.
        let top_face = proj.elevated_to_screen(3.0, 3.0, 4.0);
        assert_eq!(proj.screen_to_tile(top_face), IVec2::new(2, 2));
        assert_eq!(pick_tile(&proj, &grid, top_face, &cfg), Some(IVec2::new(3, 3)));
    }

    #[test]
    fn test_side_face_skips_flat_neighbour() {
        let proj = IsoProjection::default();
        let grid = raised_grid((3, 3), 4);
        let cfg = HitTestConfig::default();

        // On the front-right wall of (3,3). The tallest probe lands on the
        // flat (4,3), which must be rejected rather than returned.
        let wall = Vec2::new(24.0, 72.0);
        assert_eq!(proj.screen_to_tile_at_height(wall, 4.0), IVec2::new(4, 3));
        assert_eq!(proj.screen_to_tile(wall), IVec2::new(3, 2));
        assert_eq!(pick_tile(&proj, &grid, wall, &cfg), Some(IVec2::new(3, 3)));
    }

    #[test]
    fn test_tile_next_to_raised_one_still_reachable() {
        let proj = IsoProjection::default();
        let grid = raised_grid((3, 3), 4);
        let cfg = HitTestConfig::default();
        // (5,3) is well clear of the raised face.
        let centre = proj.tile_to_screen(5, 3);
        assert_eq!(pick_tile(&proj, &grid, centre, &cfg), Some(IVec2::new(5, 3)));
    }

    #[test]
    fn test_outside_grid_is_none() {
        let proj = IsoProjection::default();
        let grid = raised_grid((3, 3), 4);
        let cfg = HitTestConfig::default();
        assert_eq!(pick_tile(&proj, &grid, Vec2::new(-5000.0, -5000.0), &cfg), None);
    }

    #[test]
    fn test_zero_step_does_not_hang() {
        let proj = IsoProjection::default();
        let grid = raised_grid((3, 3), 4);
        let cfg = HitTestConfig {
            probe_step: 0.0,
            max_probe_elevation: 8.0,
        };
        let centre = proj.tile_to_screen(1, 1);
        assert_eq!(pick_tile(&proj, &grid, centre, &cfg), Some(IVec2::new(1, 1)));
    }

    #[test]
    fn test_probe_ceiling_caps_search() {
        let proj = IsoProjection::default();
        let grid = raised_grid((3, 3), 4);
        let cfg = HitTestConfig {
            probe_step: 1.0,
            max_probe_elevation: 0.0,
        };
        let wall = Vec2::new(24.0, 72.0);
        assert_eq!(pick_tile(&proj, &grid, wall, &cfg), Some(IVec2::new(3, 2)));
    }
}
