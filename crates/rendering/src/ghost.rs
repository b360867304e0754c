//! Blueprint preview that follows the pointer in build mode.
//!
//! `Absent` until the pointer hovers an in-bounds tile with a building
//! selected; `Tracking` owns exactly one node tinted by placement validity.

use bevy::prelude::*;

use simulation::grid::TileGrid;
use simulation::snapshot::BuildingCategory;

use crate::coords::IsoProjection;
use crate::placement::Footprint;
use crate::scene::{NodeKind, NodeSpec, SceneBackend};
use crate::style::VisualStyle;
use crate::visual_sync::z_order;

const GHOST_Z_OFFSET: f32 = 0.9;
const VALID_COLOR: Color = Color::srgba(0.2, 0.9, 0.3, 0.5);
const INVALID_COLOR: Color = Color::srgba(0.95, 0.2, 0.2, 0.5);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GhostState<N> {
    Absent,
    Tracking {
        node: N,
        tile: IVec2,
        category: BuildingCategory,
        placeable: bool,
    },
}

#[derive(Debug)]
pub struct BuildGhost<N> {
    state: GhostState<N>,
}

impl<N> Default for BuildGhost<N> {
    fn default() -> Self {
        Self {
            state: GhostState::Absent,
        }
    }
}

impl<N: Copy> BuildGhost<N> {
    pub fn new() -> Self {
        Self {
            state: GhostState::Absent,
        }
    }

    pub fn state(&self) -> &GhostState<N> {
        &self.state
    }

    pub fn is_tracking(&self) -> bool {
        matches!(self.state, GhostState::Tracking { .. })
    }

    /// Follow `tile` with a ghost of `category`. An off-map tile hides the ghost.
    #[allow(clippy::too_many_arguments)]
    pub fn track<B>(
        &mut self,
        category: BuildingCategory,
        tile: IVec2,
        placeable: bool,
        style: &VisualStyle,
        grid: &TileGrid,
        projection: &IsoProjection,
        backend: &mut B,
    ) where
        B: SceneBackend<Node = N>,
    {
        let Some(elevation) = grid.elevation_at(tile.x, tile.y) else {
            self.clear(backend);
            return;
        };
        let spec = ghost_spec(category, tile, elevation as f32, placeable, style, projection);
        let node = match self.state {
            GhostState::Tracking {
                node,
                tile: prev_tile,
                category: prev_category,
                placeable: prev_placeable,
            } => {
                if prev_tile != tile || prev_category != category || prev_placeable != placeable {
                    backend.update_node(node, &spec);
                }
                node
            }
            GhostState::Absent => backend.create_node(&spec),
        };
        self.state = GhostState::Tracking {
            node,
            tile,
            category,
            placeable,
        };
    }

    /// Destroy the ghost node, if any.
    pub fn clear<B>(&mut self, backend: &mut B)
    where
        B: SceneBackend<Node = N>,
    {
        if let GhostState::Tracking { node, .. } =
            std::mem::replace(&mut self.state, GhostState::Absent)
        {
            backend.destroy_node(node);
        }
    }
}

fn ghost_spec(
    category: BuildingCategory,
    tile: IVec2,
    elevation: f32,
    placeable: bool,
    style: &VisualStyle,
    projection: &IsoProjection,
) -> NodeSpec {
    let centre = Footprint::new(tile, category.footprint_size()).center();
    let screen = projection.elevated_to_screen(centre.x, centre.y, elevation);
    let lift = style.height * projection.elevation_unit;
    let base = Vec2::new(
        projection.half_tile_width * 2.0,
        projection.half_tile_height * 2.0,
    ) * style.scale;
    NodeSpec {
        kind: NodeKind::Ghost,
        position: Vec2::new(screen.x, screen.y - lift * 0.5),
        z: z_order(centre.x, centre.y, elevation, GHOST_Z_OFFSET),
        size: Vec2::new(base.x, base.y + lift),
        color: if placeable { VALID_COLOR } else { INVALID_COLOR },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{NodeId, RecordingBackend};

    fn track(
        ghost: &mut BuildGhost<NodeId>,
        backend: &mut RecordingBackend,
        tile: IVec2,
        placeable: bool,
    ) {
        let grid = TileGrid::new(6, 6);
        let style = VisualStyle::for_category(BuildingCategory::Warehouse);
        ghost.track(
            BuildingCategory::Warehouse,
            tile,
            placeable,
            &style,
            &grid,
            &IsoProjection::default(),
            backend,
        );
    }

    #[test]
    fn test_tracking_reuses_one_node() {
        let mut ghost = BuildGhost::new();
        let mut backend = RecordingBackend::new();
        track(&mut ghost, &mut backend, IVec2::new(1, 1), true);
        track(&mut ghost, &mut backend, IVec2::new(2, 1), true);
        track(&mut ghost, &mut backend, IVec2::new(2, 1), true);
        assert_eq!(backend.created, 1);
        assert_eq!(backend.updated, 1);
        assert_eq!(backend.count_kind(NodeKind::Ghost), 1);
    }

    #[test]
    fn test_validity_changes_tint() {
        let mut ghost = BuildGhost::new();
        let mut backend = RecordingBackend::new();
        track(&mut ghost, &mut backend, IVec2::new(1, 1), false);
        let GhostState::Tracking { node, .. } = *ghost.state() else {
            panic!("ghost should be tracking");
        };
        assert_eq!(backend.node(node).map(|n| n.color), Some(INVALID_COLOR));
        track(&mut ghost, &mut backend, IVec2::new(1, 1), true);
        assert_eq!(backend.node(node).map(|n| n.color), Some(VALID_COLOR));
    }

    #[test]
    fn test_off_map_hides_ghost() {
        let mut ghost = BuildGhost::new();
        let mut backend = RecordingBackend::new();
        track(&mut ghost, &mut backend, IVec2::new(1, 1), true);
        track(&mut ghost, &mut backend, IVec2::new(-1, 3), true);
        assert!(!ghost.is_tracking());
        assert!(backend.is_empty());

        ghost.clear(&mut backend);
        assert_eq!(backend.stale_destroys, 0);
    }
}
