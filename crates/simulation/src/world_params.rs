//! Data-driven world parameters.
//!
//! Everything that influences terrain generation lives in [`WorldParams`]:
//! the seed, the grid size, the city anchors and the terrain tunables. The
//! same params always generate the same grid, so a world is "saved" simply
//! by keeping its params around.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::{
    CITY_CONCRETE_RADIUS, CITY_PLAZA_RADIUS, CITY_ROAD_RADIUS, CITY_ROAD_SPACING,
    DEFAULT_GRID_HEIGHT, DEFAULT_GRID_WIDTH, FOREST_TREE_CHANCE, GRASS_TREE_CHANCE,
    ISLAND_FALLOFF, MAX_ELEVATION, MOISTURE_FREQUENCY, SAND_BAND, TERRAIN_BASE_FREQUENCY,
    TERRAIN_LACUNARITY, TERRAIN_OCTAVES, TERRAIN_PERSISTENCE, URBAN_FREQUENCY,
    WATER_THRESHOLD,
};

/// A declared city centre. Tiles around it are paved over during generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityAnchor {
    #[serde(default)]
    pub name: String,
    pub x: i32,
    pub y: i32,
}

impl CityAnchor {
    pub fn new(name: impl Into<String>, x: i32, y: i32) -> Self {
        Self {
            name: name.into(),
            x,
            y,
        }
    }
}

/// Terrain classifier and noise tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainTuning {
    /// Normalized elevation below which a tile is water.
    pub water_threshold: f32,
    /// Width of the beach band just above the water threshold.
    pub sand_band: f32,
    /// How strongly elevation is pulled down towards the map edge.
    pub island_falloff: f32,
    /// Elevation units assigned to the highest land sample.
    pub max_elevation: u8,
    pub base_frequency: f32,
    pub octaves: i32,
    pub persistence: f32,
    pub lacunarity: f32,
    pub moisture_frequency: f32,
    pub urban_frequency: f32,
    pub plaza_radius: f32,
    pub concrete_radius: f32,
    pub road_radius: f32,
    /// Road stripes run every `road_spacing` tiles in the outer city ring.
    pub road_spacing: i32,
    pub forest_tree_chance: f32,
    pub grass_tree_chance: f32,
}

impl Default for TerrainTuning {
    fn default() -> Self {
        Self {
            water_threshold: WATER_THRESHOLD,
            sand_band: SAND_BAND,
            island_falloff: ISLAND_FALLOFF,
            max_elevation: MAX_ELEVATION,
            base_frequency: TERRAIN_BASE_FREQUENCY,
            octaves: TERRAIN_OCTAVES,
            persistence: TERRAIN_PERSISTENCE,
            lacunarity: TERRAIN_LACUNARITY,
            moisture_frequency: MOISTURE_FREQUENCY,
            urban_frequency: URBAN_FREQUENCY,
            plaza_radius: CITY_PLAZA_RADIUS,
            concrete_radius: CITY_CONCRETE_RADIUS,
            road_radius: CITY_ROAD_RADIUS,
            road_spacing: CITY_ROAD_SPACING,
            forest_tree_chance: FOREST_TREE_CHANCE,
            grass_tree_chance: GRASS_TREE_CHANCE,
        }
    }
}

/// Everything needed to reproduce a world.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldParams {
    pub seed: u64,
    pub width: usize,
    pub height: usize,
    pub cities: Vec<CityAnchor>,
    pub terrain: TerrainTuning,
}

impl Default for WorldParams {
    fn default() -> Self {
        Self {
            seed: 42,
            width: DEFAULT_GRID_WIDTH,
            height: DEFAULT_GRID_HEIGHT,
            cities: vec![CityAnchor::new(
                "Capital",
                (DEFAULT_GRID_WIDTH / 2) as i32,
                (DEFAULT_GRID_HEIGHT / 2) as i32,
            )],
            terrain: TerrainTuning::default(),
        }
    }
}

impl WorldParams {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Default::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Parse params, logging a warning and returning defaults on malformed input.
    pub fn from_json_or_default(json: &str) -> Self {
        match Self::from_json(json) {
            Ok(params) => params,
            Err(e) => {
                warn!("WorldParams: failed to parse JSON, falling back to defaults: {}", e);
                Self::default()
            }
        }
    }

    pub fn tile_count(&self) -> usize {
        self.width * self.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let params = WorldParams::from_json(r#"{"seed": 7, "width": 32}"#).unwrap();
        assert_eq!(params.seed, 7);
        assert_eq!(params.width, 32);
        assert_eq!(params.height, DEFAULT_GRID_HEIGHT);
        assert_eq!(params.terrain, TerrainTuning::default());
    }

    #[test]
    fn test_cities_parse() {
        let params = WorldParams::from_json(
            r#"{"cities": [{"name": "Harbor", "x": 10, "y": 12}, {"x": 40, "y": 3}]}"#,
        )
        .unwrap();
        assert_eq!(params.cities.len(), 2);
        assert_eq!(params.cities[0], CityAnchor::new("Harbor", 10, 12));
        assert_eq!(params.cities[1].name, "");
    }

    #[test]
    fn test_malformed_json_falls_back() {
        let params = WorldParams::from_json_or_default("{not json");
        assert_eq!(params, WorldParams::default());
    }

    #[test]
    fn test_terrain_tuning_override() {
        let params =
            WorldParams::from_json(r#"{"terrain": {"max_elevation": 3, "road_spacing": 6}}"#)
                .unwrap();
        assert_eq!(params.terrain.max_elevation, 3);
        assert_eq!(params.terrain.road_spacing, 6);
        assert_eq!(params.terrain.water_threshold, WATER_THRESHOLD);
    }
}
