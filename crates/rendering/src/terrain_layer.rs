//! Scene nodes for the ground: one node per tile plus one per tree.
//!
//! Built in one pass when a world loads; afterwards only tiles marked dirty
//! by an edit are pushed to the backend again.

use std::collections::BTreeSet;

use bevy::prelude::*;

use simulation::grid::{Decoration, Tile, TileGrid, TileType};

use crate::coords::IsoProjection;
use crate::scene::{NodeKind, NodeSpec, SceneBackend};
use crate::visual_sync::z_order;

const TREE_Z_OFFSET: f32 = 0.3;

pub fn tile_color(tile_type: TileType, elevation: u8) -> Color {
    let [r, g, b] = match tile_type {
        TileType::Grass => [0.42, 0.66, 0.30],
        TileType::Forest => [0.22, 0.48, 0.22],
        TileType::Water => [0.20, 0.42, 0.75],
        TileType::Sand => [0.86, 0.80, 0.56],
        TileType::Concrete => [0.62, 0.62, 0.64],
        TileType::Dirt => [0.55, 0.42, 0.28],
        TileType::Road => [0.30, 0.30, 0.32],
        TileType::Plaza => [0.80, 0.74, 0.66],
    };
    // Higher ground catches more light.
    let shade = (0.85 + elevation as f32 * 0.03).min(1.2);
    Color::srgb(
        (r * shade).min(1.0),
        (g * shade).min(1.0),
        (b * shade).min(1.0),
    )
}

pub fn tile_spec(projection: &IsoProjection, tile: &Tile) -> NodeSpec {
    let e = tile.elevation as f32;
    let top = projection.elevated_to_screen(tile.x as f32, tile.y as f32, e);
    let column = e * projection.elevation_unit;
    NodeSpec {
        kind: NodeKind::Tile,
        // The node covers the top face and the column below it.
        position: Vec2::new(top.x, top.y + column * 0.5),
        z: z_order(tile.x as f32, tile.y as f32, e, 0.0),
        size: Vec2::new(
            projection.half_tile_width * 2.0,
            projection.half_tile_height * 2.0 + column,
        ),
        color: tile_color(tile.tile_type, tile.elevation),
    }
}

pub fn tree_spec(projection: &IsoProjection, tile: &Tile) -> Option<NodeSpec> {
    let Some(Decoration::Tree { variant }) = tile.decoration else {
        return None;
    };
    let e = tile.elevation as f32;
    let top = projection.elevated_to_screen(tile.x as f32, tile.y as f32, e);
    let grow = 1.0 + variant as f32 * 0.15;
    let green = [[0.16, 0.40, 0.16], [0.20, 0.46, 0.18], [0.26, 0.50, 0.20]];
    let [r, g, b] = green[variant as usize % green.len()];
    Some(NodeSpec {
        kind: NodeKind::Tree,
        position: Vec2::new(top.x, top.y - projection.half_tile_height * 0.6 * grow),
        z: z_order(tile.x as f32, tile.y as f32, e, TREE_Z_OFFSET),
        size: Vec2::new(
            projection.half_tile_width * 0.5 * grow,
            projection.half_tile_height * 1.5 * grow,
        ),
        color: Color::srgb(r, g, b),
    })
}

#[derive(Debug)]
pub struct TerrainLayer<N> {
    tiles: Vec<Option<N>>,
    trees: Vec<Option<N>>,
    dirty: BTreeSet<usize>,
}

impl<N> Default for TerrainLayer<N> {
    fn default() -> Self {
        Self {
            tiles: Vec::new(),
            trees: Vec::new(),
            dirty: BTreeSet::new(),
        }
    }
}

impl<N: Copy> TerrainLayer<N> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tile_node(&self, index: usize) -> Option<N> {
        self.tiles.get(index).copied().flatten()
    }

    pub fn tree_count(&self) -> usize {
        self.trees.iter().filter(|t| t.is_some()).count()
    }

    /// Destroy any existing nodes and create one per tile and tree.
    pub fn rebuild<B>(&mut self, grid: &TileGrid, projection: &IsoProjection, backend: &mut B)
    where
        B: SceneBackend<Node = N>,
    {
        self.clear(backend);
        for tile in grid.tiles() {
            self.tiles
                .push(Some(backend.create_node(&tile_spec(projection, tile))));
            self.trees.push(
                tree_spec(projection, tile).map(|spec| backend.create_node(&spec)),
            );
        }
        debug!(
            "Terrain layer built: {} tiles, {} trees",
            self.tiles.len(),
            self.tree_count()
        );
    }

    pub fn mark_dirty(&mut self, grid: &TileGrid, x: i32, y: i32) {
        if let Some(idx) = grid.index(x, y) {
            self.dirty.insert(idx);
        }
    }

    pub fn has_pending(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Push every dirty tile to the backend. Returns the number of tiles refreshed.
    pub fn flush<B>(&mut self, grid: &TileGrid, projection: &IsoProjection, backend: &mut B) -> usize
    where
        B: SceneBackend<Node = N>,
    {
        let dirty = std::mem::take(&mut self.dirty);
        let mut refreshed = 0;
        for idx in dirty {
            let (x, y) = ((idx % grid.width()) as i32, (idx / grid.width()) as i32);
            let Some(tile) = grid.get(x, y) else {
                continue;
            };
            if let Some(node) = self.tile_node(idx) {
                backend.update_node(node, &tile_spec(projection, tile));
            }
            let Some(tree_slot) = self.trees.get_mut(idx) else {
                continue;
            };
            match (*tree_slot, tree_spec(projection, tile)) {
                (Some(node), Some(spec)) => backend.update_node(node, &spec),
                (None, Some(spec)) => *tree_slot = Some(backend.create_node(&spec)),
                (Some(node), None) => {
                    backend.destroy_node(node);
                    *tree_slot = None;
                }
                (None, None) => {}
            }
            refreshed += 1;
        }
        refreshed
    }

    pub fn clear<B>(&mut self, backend: &mut B)
    where
        B: SceneBackend<Node = N>,
    {
        for node in self.tiles.drain(..).chain(self.trees.drain(..)).flatten() {
            backend.destroy_node(node);
        }
        self.dirty.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{NodeId, RecordingBackend};

    fn grid() -> TileGrid {
        TileGrid::from_fn(4, 4, |x, y| {
            if x == 1 && y == 1 {
                (TileType::Forest, 2, Some(Decoration::Tree { variant: 1 }))
            } else {
                (TileType::Grass, 0, None)
            }
        })
    }

    #[test]
    fn test_rebuild_creates_tiles_and_trees() {
        let grid = grid();
        let proj = IsoProjection::default();
        let mut backend = RecordingBackend::new();
        let mut layer: TerrainLayer<NodeId> = TerrainLayer::new();
        layer.rebuild(&grid, &proj, &mut backend);
        assert_eq!(backend.count_kind(NodeKind::Tile), 16);
        assert_eq!(backend.count_kind(NodeKind::Tree), 1);

        layer.rebuild(&grid, &proj, &mut backend);
        assert_eq!(backend.len(), 17);
        assert_eq!(backend.stale_destroys, 0);
    }

    #[test]
    fn test_flush_only_touches_dirty_tiles() {
        let mut grid = grid();
        let proj = IsoProjection::default();
        let mut backend = RecordingBackend::new();
        let mut layer: TerrainLayer<NodeId> = TerrainLayer::new();
        layer.rebuild(&grid, &proj, &mut backend);
        backend.reset_counters();

        assert!(grid.set_tile_type(1, 1, TileType::Road));
        layer.mark_dirty(&grid, 1, 1);
        layer.mark_dirty(&grid, 99, 99);
        assert_eq!(layer.flush(&grid, &proj, &mut backend), 1);
        assert_eq!(backend.updated, 1);
        assert_eq!(backend.destroyed, 1);
        assert_eq!(backend.count_kind(NodeKind::Tree), 0);

        let idx = grid.index(1, 1).expect("in bounds");
        let node = layer.tile_node(idx).expect("tile node");
        let spec = backend.node(node).expect("live node");
        assert_eq!(spec.color, tile_color(TileType::Road, 2));
        assert!(!layer.has_pending());
    }

    #[test]
    fn test_tile_z_matches_painter_order() {
        let proj = IsoProjection::default();
        let grid = grid();
        let raised = grid.get(1, 1).expect("tile");
        let spec = tile_spec(&proj, raised);
        assert_eq!(spec.z, 4.0);
        let tree = tree_spec(&proj, raised).expect("tree");
        assert!(tree.z > spec.z);
    }

    #[test]
    fn test_clear_releases_everything() {
        let grid = grid();
        let proj = IsoProjection::default();
        let mut backend = RecordingBackend::new();
        let mut layer: TerrainLayer<NodeId> = TerrainLayer::new();
        layer.rebuild(&grid, &proj, &mut backend);
        layer.clear(&mut backend);
        assert!(backend.is_empty());
        assert_eq!(layer.tile_node(0), None);
        assert_eq!(layer.tree_count(), 0);
    }
}
