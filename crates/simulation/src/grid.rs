use serde::{Deserialize, Serialize};
use xxhash_rust::xxh32::Xxh32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TileType {
    #[default]
    Grass,
    Forest,
    Water,
    Sand,
    Concrete,
    Dirt,
    Road,
    Plaza,
}

impl TileType {
    pub const ALL: [TileType; 8] = [
        TileType::Grass,
        TileType::Forest,
        TileType::Water,
        TileType::Sand,
        TileType::Concrete,
        TileType::Dirt,
        TileType::Road,
        TileType::Plaza,
    ];

    pub fn is_water(self) -> bool {
        matches!(self, TileType::Water)
    }

    /// Only natural ground keeps tree decorations.
    pub fn supports_trees(self) -> bool {
        matches!(self, TileType::Grass | TileType::Forest)
    }

    pub fn is_paved(self) -> bool {
        matches!(self, TileType::Concrete | TileType::Road | TileType::Plaza)
    }

    pub fn key(self) -> &'static str {
        match self {
            TileType::Grass => "grass",
            TileType::Forest => "forest",
            TileType::Water => "water",
            TileType::Sand => "sand",
            TileType::Concrete => "concrete",
            TileType::Dirt => "dirt",
            TileType::Road => "road",
            TileType::Plaza => "plaza",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.key().eq_ignore_ascii_case(key))
    }

    /// Stable byte code used by the grid fingerprint.
    pub fn code(self) -> u8 {
        match self {
            TileType::Grass => 0,
            TileType::Forest => 1,
            TileType::Water => 2,
            TileType::Sand => 3,
            TileType::Concrete => 4,
            TileType::Dirt => 5,
            TileType::Road => 6,
            TileType::Plaza => 7,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Decoration {
    Tree { variant: u8 },
}

impl Decoration {
    fn code(self) -> u8 {
        match self {
            Decoration::Tree { variant } => 1 + variant,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub x: i32,
    pub y: i32,
    pub tile_type: TileType,
    /// Height in elevation units. Always 0 for water.
    pub elevation: u8,
    pub decoration: Option<Decoration>,
}

/// Row-major tile grid. Tiles are only mutated through [`TileGrid::set_tile_type`];
/// a new world replaces the whole grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileGrid {
    tiles: Vec<Tile>,
    width: usize,
    height: usize,
}

impl TileGrid {
    /// Flat grass grid.
    pub fn new(width: usize, height: usize) -> Self {
        Self::from_fn(width, height, |_, _| (TileType::Grass, 0, None))
    }

    /// Build a grid from a per-tile function returning `(type, elevation, decoration)`.
    ///
    /// Water tiles are forced flat and decorations on ground that cannot carry
    /// them are dropped, so every constructed grid satisfies the tile invariants.
    pub fn from_fn<F>(width: usize, height: usize, mut f: F) -> Self
    where
        F: FnMut(i32, i32) -> (TileType, u8, Option<Decoration>),
    {
        let mut tiles = Vec::with_capacity(width * height);
        for y in 0..height as i32 {
            for x in 0..width as i32 {
                let (tile_type, elevation, decoration) = f(x, y);
                tiles.push(Tile {
                    x,
                    y,
                    tile_type,
                    elevation: if tile_type.is_water() { 0 } else { elevation },
                    decoration: decoration.filter(|_| tile_type.supports_trees()),
                });
            }
        }
        Self {
            tiles,
            width,
            height,
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    #[inline]
    pub fn index(&self, x: i32, y: i32) -> Option<usize> {
        if self.in_bounds(x, y) {
            Some(y as usize * self.width + x as usize)
        } else {
            None
        }
    }

    #[inline]
    pub fn get(&self, x: i32, y: i32) -> Option<&Tile> {
        self.index(x, y).map(|i| &self.tiles[i])
    }

    pub fn tile_type(&self, x: i32, y: i32) -> Option<TileType> {
        self.get(x, y).map(|t| t.tile_type)
    }

    pub fn elevation_at(&self, x: i32, y: i32) -> Option<u8> {
        self.get(x, y).map(|t| t.elevation)
    }

    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter()
    }

    pub fn max_elevation(&self) -> u8 {
        self.tiles.iter().map(|t| t.elevation).max().unwrap_or(0)
    }

    pub fn count(&self, tile_type: TileType) -> usize {
        self.tiles.iter().filter(|t| t.tile_type == tile_type).count()
    }

    /// Change a tile's type. Returns `false` when out of bounds or unchanged.
    pub fn set_tile_type(&mut self, x: i32, y: i32, tile_type: TileType) -> bool {
        let Some(idx) = self.index(x, y) else {
            return false;
        };
        let tile = &mut self.tiles[idx];
        if tile.tile_type == tile_type {
            return false;
        }
        tile.tile_type = tile_type;
        if tile_type.is_water() {
            tile.elevation = 0;
        }
        if !tile_type.supports_trees() {
            tile.decoration = None;
        }
        true
    }

    /// xxh32 over every tile's type, elevation and decoration in row-major order.
    pub fn fingerprint(&self) -> u32 {
        let mut hasher = Xxh32::new(0);
        hasher.update(&(self.width as u32).to_le_bytes());
        hasher.update(&(self.height as u32).to_le_bytes());
        for tile in &self.tiles {
            hasher.update(&[
                tile.tile_type.code(),
                tile.elevation,
                tile.decoration.map_or(0, Decoration::code),
            ]);
        }
        hasher.digest()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_reject_negative_and_overflow() {
        let grid = TileGrid::new(4, 3);
        assert!(grid.in_bounds(0, 0));
        assert!(grid.in_bounds(3, 2));
        assert!(!grid.in_bounds(-1, 0));
        assert!(!grid.in_bounds(4, 0));
        assert!(!grid.in_bounds(0, 3));
        assert!(grid.get(7, 7).is_none());
        assert_eq!(grid.elevation_at(-3, 1), None);
    }

    #[test]
    fn test_tiles_know_their_coordinates() {
        let grid = TileGrid::new(5, 5);
        let tile = grid.get(3, 1).unwrap();
        assert_eq!((tile.x, tile.y), (3, 1));
    }

    #[test]
    fn test_set_tile_type_reports_change() {
        let mut grid = TileGrid::new(4, 4);
        assert!(grid.set_tile_type(1, 1, TileType::Road));
        assert!(!grid.set_tile_type(1, 1, TileType::Road));
        assert!(!grid.set_tile_type(9, 1, TileType::Road));
        assert_eq!(grid.tile_type(1, 1), Some(TileType::Road));
    }

    #[test]
    fn test_water_is_flat_and_paving_clears_trees() {
        let mut grid = TileGrid::from_fn(3, 3, |_, _| {
            (TileType::Forest, 4, Some(Decoration::Tree { variant: 1 }))
        });
        assert!(grid.set_tile_type(0, 0, TileType::Water));
        assert_eq!(grid.elevation_at(0, 0), Some(0));
        assert_eq!(grid.get(0, 0).unwrap().decoration, None);

        assert!(grid.set_tile_type(1, 0, TileType::Grass));
        assert!(grid.get(1, 0).unwrap().decoration.is_some());
        assert!(grid.set_tile_type(2, 0, TileType::Road));
        assert_eq!(grid.get(2, 0).unwrap().decoration, None);
        assert_eq!(grid.elevation_at(2, 0), Some(4));
    }

    #[test]
    fn test_from_fn_enforces_invariants() {
        let grid = TileGrid::from_fn(2, 1, |x, _| {
            if x == 0 {
                (TileType::Water, 5, Some(Decoration::Tree { variant: 0 }))
            } else {
                (TileType::Sand, 2, Some(Decoration::Tree { variant: 0 }))
            }
        });
        assert_eq!(grid.elevation_at(0, 0), Some(0));
        assert_eq!(grid.get(0, 0).unwrap().decoration, None);
        assert_eq!(grid.get(1, 0).unwrap().decoration, None);
        assert_eq!(grid.elevation_at(1, 0), Some(2));
    }

    #[test]
    fn test_fingerprint_tracks_edits() {
        let mut grid = TileGrid::new(8, 8);
        let before = grid.fingerprint();
        assert_eq!(before, TileGrid::new(8, 8).fingerprint());
        grid.set_tile_type(2, 3, TileType::Plaza);
        assert_ne!(before, grid.fingerprint());
    }

    #[test]
    fn test_tile_type_keys_roundtrip() {
        for t in TileType::ALL {
            assert_eq!(TileType::from_key(t.key()), Some(t));
        }
        assert_eq!(TileType::from_key("ROAD"), Some(TileType::Road));
        assert_eq!(TileType::from_key("lava"), None);
    }
}
