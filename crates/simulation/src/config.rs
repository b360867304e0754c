pub const DEFAULT_GRID_WIDTH: usize = 128;
pub const DEFAULT_GRID_HEIGHT: usize = 128;

/// Screen-space size of one diamond tile (2:1 isometric).
pub const TILE_WIDTH: f32 = 64.0;
pub const TILE_HEIGHT: f32 = 32.0;
pub const HALF_TILE_WIDTH: f32 = TILE_WIDTH * 0.5;
pub const HALF_TILE_HEIGHT: f32 = TILE_HEIGHT * 0.5;

/// Screen pixels a tile is raised per unit of elevation.
pub const ELEVATION_UNIT: f32 = 8.0;
/// Tallest extrusion the generator produces, in elevation units.
pub const MAX_ELEVATION: u8 = 8;

pub const WATER_THRESHOLD: f32 = 0.38;
pub const SAND_BAND: f32 = 0.04;
pub const ISLAND_FALLOFF: f32 = 0.35;

pub const TERRAIN_OCTAVES: i32 = 5;
pub const TERRAIN_PERSISTENCE: f32 = 0.5;
pub const TERRAIN_LACUNARITY: f32 = 2.0;
pub const TERRAIN_BASE_FREQUENCY: f32 = 0.035;
pub const MOISTURE_FREQUENCY: f32 = 0.05;
/// The urban field is deliberately high-frequency so it produces small patches.
pub const URBAN_FREQUENCY: f32 = 0.18;

pub const CITY_PLAZA_RADIUS: f32 = 2.5;
pub const CITY_CONCRETE_RADIUS: f32 = 6.0;
pub const CITY_ROAD_RADIUS: f32 = 11.0;
pub const CITY_ROAD_SPACING: i32 = 4;

pub const FOREST_TREE_CHANCE: f32 = 0.6;
pub const GRASS_TREE_CHANCE: f32 = 0.06;
pub const TREE_VARIANTS: u32 = 3;
