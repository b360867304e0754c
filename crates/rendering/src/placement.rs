//! Footprint-aware placement checks and occupancy queries.
//!
//! Both queries scan every tracked footprint; at the scale of a single city
//! (hundreds of buildings) that is cheaper than keeping a tile index in sync.

use bevy::prelude::*;
use serde::Serialize;

use simulation::grid::TileGrid;
use simulation::snapshot::EntityId;

/// Square tile span occupied by a building, anchored at its origin tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Footprint {
    pub origin: IVec2,
    pub size: i32,
}

impl Footprint {
    /// Sizes below one are treated as one.
    pub fn new(origin: IVec2, size: i32) -> Self {
        Self {
            origin,
            size: size.max(1),
        }
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.origin.x
            && y >= self.origin.y
            && x < self.origin.x + self.size
            && y < self.origin.y + self.size
    }

    /// Tiles in row-major order.
    pub fn tiles(&self) -> impl Iterator<Item = IVec2> {
        let Footprint { origin, size } = *self;
        (0..size).flat_map(move |dy| (0..size).map(move |dx| origin + IVec2::new(dx, dy)))
    }

    /// Grid point at the centre of the footprint.
    pub fn center(&self) -> Vec2 {
        self.origin.as_vec2() + Vec2::splat((self.size - 1) as f32 * 0.5)
    }
}

/// Anything that can list the footprints currently on the map.
pub trait Occupancy {
    fn footprints(&self) -> impl Iterator<Item = (EntityId, Footprint)> + '_;
}

impl Occupancy for Vec<(EntityId, Footprint)> {
    fn footprints(&self) -> impl Iterator<Item = (EntityId, Footprint)> + '_ {
        self.iter().copied()
    }
}

/// Why a placement was refused. The first failing tile in row-major order is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum PlacementRejection {
    OutOfBounds { x: i32, y: i32 },
    Water { x: i32, y: i32 },
    Occupied { x: i32, y: i32, by: EntityId },
}

impl std::fmt::Display for PlacementRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlacementRejection::OutOfBounds { x, y } => write!(f, "({x}, {y}) is off the map"),
            PlacementRejection::Water { x, y } => write!(f, "({x}, {y}) is water"),
            PlacementRejection::Occupied { x, y, by } => {
                write!(f, "({x}, {y}) is occupied by entity {}", by.0)
            }
        }
    }
}

/// First building whose footprint contains `(x, y)`.
pub fn building_at<O: Occupancy>(occupancy: &O, x: i32, y: i32) -> Option<EntityId> {
    occupancy
        .footprints()
        .find(|(_, fp)| fp.contains(x, y))
        .map(|(id, _)| id)
}

/// Check a `size x size` footprint at `(x, y)`. Buildings with id `ignore`
/// do not count as occupants, so a building can be tested against its own spot.
pub fn check_placement<O: Occupancy>(
    grid: &TileGrid,
    occupancy: &O,
    x: i32,
    y: i32,
    size: i32,
    ignore: Option<EntityId>,
) -> Result<(), PlacementRejection> {
    let footprint = Footprint::new(IVec2::new(x, y), size);
    for tile in footprint.tiles() {
        let Some(tile_type) = grid.tile_type(tile.x, tile.y) else {
            return Err(PlacementRejection::OutOfBounds {
                x: tile.x,
                y: tile.y,
            });
        };
        if tile_type.is_water() {
            return Err(PlacementRejection::Water {
                x: tile.x,
                y: tile.y,
            });
        }
        let occupant = occupancy
            .footprints()
            .find(|(id, fp)| Some(*id) != ignore && fp.contains(tile.x, tile.y));
        if let Some((by, _)) = occupant {
            return Err(PlacementRejection::Occupied {
                x: tile.x,
                y: tile.y,
                by,
            });
        }
    }
    Ok(())
}

pub fn can_place_building<O: Occupancy>(
    grid: &TileGrid,
    occupancy: &O,
    x: i32,
    y: i32,
    size: i32,
    ignore: Option<EntityId>,
) -> bool {
    check_placement(grid, occupancy, x, y, size, ignore).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use simulation::grid::TileType;

    fn scenario() -> (TileGrid, Vec<(EntityId, Footprint)>) {
        let mut grid = TileGrid::new(5, 5);
        grid.set_tile_type(2, 2, TileType::Water);
        let buildings = vec![(EntityId(7), Footprint::new(IVec2::new(1, 1), 2))];
        (grid, buildings)
    }

    #[test]
    fn test_five_by_five_scenario() {
        let (grid, occ) = scenario();
        assert!(can_place_building(&grid, &occ, 0, 0, 1, None));
        assert!(!can_place_building(&grid, &occ, 1, 1, 2, None));
        assert!(!can_place_building(&grid, &occ, 4, 4, 2, None));
        assert!(can_place_building(&grid, &occ, 3, 0, 1, None));
    }

    #[test]
    fn test_rejection_reasons() {
        let (grid, occ) = scenario();
        assert_eq!(
            check_placement(&grid, &occ, 1, 1, 2, None),
            Err(PlacementRejection::Occupied {
                x: 1,
                y: 1,
                by: EntityId(7)
            })
        );
        assert_eq!(
            check_placement(&grid, &occ, 4, 4, 2, None),
            Err(PlacementRejection::OutOfBounds { x: 5, y: 4 })
        );
        assert_eq!(
            check_placement(&grid, &occ, -1, 0, 1, None),
            Err(PlacementRejection::OutOfBounds { x: -1, y: 0 })
        );
    }

    #[test]
    fn test_ignore_own_footprint() {
        let (grid, occ) = scenario();
        // Ignoring the occupant still leaves the water tile in the way.
        assert_eq!(
            check_placement(&grid, &occ, 1, 1, 2, Some(EntityId(7))),
            Err(PlacementRejection::Water { x: 2, y: 2 })
        );
        assert!(can_place_building(&grid, &occ, 1, 1, 1, Some(EntityId(7))));
        assert!(!can_place_building(&grid, &occ, 1, 1, 1, Some(EntityId(8))));
    }

    #[test]
    fn test_building_at_inside_and_outside_footprint() {
        let (_, occ) = scenario();
        for (x, y) in [(1, 1), (2, 1), (1, 2), (2, 2)] {
            assert_eq!(building_at(&occ, x, y), Some(EntityId(7)), "({x},{y})");
        }
        for (x, y) in [(0, 0), (0, 1), (3, 1), (1, 3), (3, 3), (-1, -1), (9, 9)] {
            assert_eq!(building_at(&occ, x, y), None, "({x},{y})");
        }
    }

    #[test]
    fn test_size_below_one_is_single_tile() {
        let (grid, occ) = scenario();
        assert!(can_place_building(&grid, &occ, 0, 0, 0, None));
        assert!(!can_place_building(&grid, &occ, 2, 2, -3, None));
        assert_eq!(Footprint::new(IVec2::ZERO, 0).tiles().count(), 1);
    }

    #[test]
    fn test_footprint_tiles_row_major() {
        let fp = Footprint::new(IVec2::new(3, 4), 2);
        let tiles: Vec<_> = fp.tiles().collect();
        assert_eq!(
            tiles,
            vec![
                IVec2::new(3, 4),
                IVec2::new(4, 4),
                IVec2::new(3, 5),
                IVec2::new(4, 5)
            ]
        );
        assert_eq!(fp.center(), Vec2::new(3.5, 4.5));
        assert_eq!(Footprint::new(IVec2::new(2, 2), 1).center(), Vec2::new(2.0, 2.0));
    }
}
