//! Procedural tile-world generation from a seed and a list of city anchors.
//!
//! Three fBm fields are sampled per tile (elevation, moisture and a
//! high-frequency "urban" field) together with the normalized distance from
//! the map centre. A deterministic classifier turns those samples into a
//! [`TileType`], city anchors pave over their surroundings, non-water tiles
//! are extruded in proportion to their elevation sample, and trees are
//! scattered with a seeded per-tile hash.
//!
//! The whole pass is a pure function of [`WorldParams`]: the same params
//! always produce the same grid, decorations included.

use bevy::prelude::*;
use bevy::utils::Instant;
use fastnoise_lite::{FastNoiseLite, FractalType, NoiseType};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use xxhash_rust::xxh32::xxh32;

use crate::config::TREE_VARIANTS;
use crate::grid::{Decoration, TileGrid, TileType};
use crate::world_params::{CityAnchor, TerrainTuning, WorldParams};

// ---------------------------------------------------------------------------
// Noise fields
// ---------------------------------------------------------------------------

/// Per-field noise seeds derived from the world seed.
///
/// Deriving them from one ChaCha stream keeps the fields independent of each
/// other while still being fully determined by the world seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSeeds {
    pub elevation: i32,
    pub moisture: i32,
    pub urban: i32,
}

impl FieldSeeds {
    pub fn derive(seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        Self {
            elevation: rng.gen(),
            moisture: rng.gen(),
            urban: rng.gen(),
        }
    }
}

fn fbm_noise(
    seed: i32,
    frequency: f32,
    octaves: i32,
    gain: f32,
    lacunarity: f32,
) -> FastNoiseLite {
    let mut noise = FastNoiseLite::with_seed(seed);
    noise.set_noise_type(Some(NoiseType::OpenSimplex2));
    noise.set_frequency(Some(frequency));
    noise.set_fractal_type(Some(FractalType::FBm));
    noise.set_fractal_octaves(Some(octaves));
    noise.set_fractal_gain(Some(gain));
    noise.set_fractal_lacunarity(Some(lacunarity));
    noise
}

struct NoiseFields {
    elevation: FastNoiseLite,
    moisture: FastNoiseLite,
    urban: FastNoiseLite,
}

impl NoiseFields {
    fn new(seeds: FieldSeeds, tuning: &TerrainTuning) -> Self {
        Self {
            elevation: fbm_noise(
                seeds.elevation,
                tuning.base_frequency,
                tuning.octaves,
                tuning.persistence,
                tuning.lacunarity,
            ),
            moisture: fbm_noise(seeds.moisture, tuning.moisture_frequency, 4, 0.5, 2.0),
            urban: fbm_noise(seeds.urban, tuning.urban_frequency, 2, 0.5, 2.0),
        }
    }
}

/// fBm with OpenSimplex2 outputs in [-1, 1]; normalize to [0, 1].
#[inline]
fn normalized(noise: &FastNoiseLite, x: i32, y: i32) -> f32 {
    ((noise.get_noise_2d(x as f32, y as f32) + 1.0) * 0.5).clamp(0.0, 1.0)
}

/// Raw samples the classifier works from, all in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileSample {
    /// Elevation after the radial island falloff has been applied.
    pub elevation: f32,
    pub moisture: f32,
    pub urban: f32,
    /// Distance from the map centre, 0 at the centre and 1 at the corners.
    pub radial: f32,
}

fn radial_distance(x: i32, y: i32, width: usize, height: usize) -> f32 {
    let cx = (width as f32 - 1.0) * 0.5;
    let cy = (height as f32 - 1.0) * 0.5;
    let max = (cx * cx + cy * cy).sqrt();
    if max <= 0.0 {
        return 0.0;
    }
    let dx = x as f32 - cx;
    let dy = y as f32 - cy;
    ((dx * dx + dy * dy).sqrt() / max).clamp(0.0, 1.0)
}

fn sample_tile(
    fields: &NoiseFields,
    tuning: &TerrainTuning,
    x: i32,
    y: i32,
    width: usize,
    height: usize,
) -> TileSample {
    let radial = radial_distance(x, y, width, height);
    let raw = normalized(&fields.elevation, x, y);
    TileSample {
        elevation: (raw - tuning.island_falloff * radial * radial).clamp(0.0, 1.0),
        moisture: normalized(&fields.moisture, x, y),
        urban: normalized(&fields.urban, x, y),
        radial,
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Map noise samples to a tile type. Pure and deterministic.
pub fn classify_tile(sample: &TileSample, tuning: &TerrainTuning) -> TileType {
    if sample.elevation < tuning.water_threshold {
        TileType::Water
    } else if sample.elevation < tuning.water_threshold + tuning.sand_band {
        TileType::Sand
    } else if sample.radial < 0.5 && sample.urban > 0.68 {
        TileType::Concrete
    } else if sample.urban > 0.74 {
        TileType::Dirt
    } else if sample.moisture > 0.6 {
        TileType::Forest
    } else if sample.moisture < 0.28 {
        TileType::Dirt
    } else {
        TileType::Grass
    }
}

/// City paving applied on top of the natural classification.
///
/// The strongest override of any anchor wins: plaza, then concrete, then
/// road striping in the outer ring.
pub fn city_override(
    x: i32,
    y: i32,
    cities: &[CityAnchor],
    tuning: &TerrainTuning,
) -> Option<TileType> {
    let spacing = i64::from(tuning.road_spacing.max(1));
    let mut best: Option<(u8, TileType)> = None;
    for city in cities {
        // Anchors may sit anywhere in i32 space, so widen before subtracting.
        let dx = i64::from(x) - i64::from(city.x);
        let dy = i64::from(y) - i64::from(city.y);
        let dist = (dx as f64).hypot(dy as f64) as f32;
        let candidate = if dist <= tuning.plaza_radius {
            Some((3, TileType::Plaza))
        } else if dist <= tuning.concrete_radius {
            Some((2, TileType::Concrete))
        } else if dist <= tuning.road_radius
            && (dx.rem_euclid(spacing) == 0 || dy.rem_euclid(spacing) == 0)
        {
            Some((1, TileType::Road))
        } else {
            None
        };
        if let Some(c) = candidate {
            if best.map_or(true, |b| c.0 > b.0) {
                best = Some(c);
            }
        }
    }
    best.map(|(_, t)| t)
}

/// Elevation units proportional to how far the sample sits above the water line.
pub fn extrusion(sample_elevation: f32, tile_type: TileType, tuning: &TerrainTuning) -> u8 {
    if tile_type.is_water() {
        return 0;
    }
    let span = (1.0 - tuning.water_threshold).max(f32::EPSILON);
    let above = ((sample_elevation - tuning.water_threshold) / span).clamp(0.0, 1.0);
    (above * tuning.max_elevation as f32).round() as u8
}

// ---------------------------------------------------------------------------
// Decoration
// ---------------------------------------------------------------------------

/// Seeded hash of a tile coordinate. Same inputs always give the same value.
#[inline]
pub fn tile_hash(seed: u64, salt: u32, x: i32, y: i32) -> u32 {
    let mut bytes = [0u8; 8];
    bytes[..4].copy_from_slice(&x.to_le_bytes());
    bytes[4..].copy_from_slice(&y.to_le_bytes());
    let folded = (seed ^ (seed >> 32)) as u32;
    xxh32(&bytes, folded.wrapping_add(salt))
}

#[inline]
fn hash_to_unit(h: u32) -> f32 {
    (h & 0x00FF_FFFF) as f32 / 0x00FF_FFFF as f32
}

pub fn decorate(
    seed: u64,
    x: i32,
    y: i32,
    tile_type: TileType,
    tuning: &TerrainTuning,
) -> Option<Decoration> {
    let chance = match tile_type {
        TileType::Forest => tuning.forest_tree_chance,
        TileType::Grass => tuning.grass_tree_chance,
        _ => return None,
    };
    if hash_to_unit(tile_hash(seed, 0, x, y)) >= chance {
        return None;
    }
    let variant = (tile_hash(seed, 1, x, y) % TREE_VARIANTS) as u8;
    Some(Decoration::Tree { variant })
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Generate a complete tile grid. One synchronous pass over every tile.
pub fn generate_terrain(params: &WorldParams) -> TileGrid {
    let start = Instant::now();
    let tuning = &params.terrain;
    let fields = NoiseFields::new(FieldSeeds::derive(params.seed), tuning);

    let grid = TileGrid::from_fn(params.width, params.height, |x, y| {
        let sample = sample_tile(&fields, tuning, x, y, params.width, params.height);
        let natural = classify_tile(&sample, tuning);
        let tile_type = city_override(x, y, &params.cities, tuning).unwrap_or(natural);
        let elevation = extrusion(sample.elevation, tile_type, tuning);
        let decoration = decorate(params.seed, x, y, tile_type, tuning);
        (tile_type, elevation, decoration)
    });

    info!(
        "Generated {}x{} terrain (seed {}, {} cities) in {:.1}ms, fingerprint {:08x}",
        params.width,
        params.height,
        params.seed,
        params.cities.len(),
        start.elapsed().as_secs_f64() * 1000.0,
        grid.fingerprint()
    );
    grid
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_params(seed: u64) -> WorldParams {
        WorldParams {
            seed,
            width: 48,
            height: 48,
            cities: vec![CityAnchor::new("A", 24, 24), CityAnchor::new("B", 8, 36)],
            ..Default::default()
        }
    }

    #[test]
    fn test_same_params_same_grid() {
        let a = generate_terrain(&small_params(1234));
        let b = generate_terrain(&small_params(1234));
        assert_eq!(a, b);
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn test_different_seed_changes_grid() {
        let a = generate_terrain(&small_params(1));
        let b = generate_terrain(&small_params(2));
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn test_field_seeds_are_independent() {
        let seeds = FieldSeeds::derive(99);
        assert_ne!(seeds.elevation, seeds.moisture);
        assert_ne!(seeds.moisture, seeds.urban);
        assert_eq!(seeds, FieldSeeds::derive(99));
    }

    #[test]
    fn test_city_anchor_is_plaza_with_concrete_ring() {
        let grid = generate_terrain(&small_params(7));
        assert_eq!(grid.tile_type(24, 24), Some(TileType::Plaza));
        assert_eq!(grid.tile_type(25, 25), Some(TileType::Plaza));
        assert_eq!(grid.tile_type(28, 24), Some(TileType::Concrete));
        // Outer ring: a stripe column (dx = 8) is road, an off-stripe tile is not forced.
        assert_eq!(grid.tile_type(32, 26), Some(TileType::Road));
    }

    #[test]
    fn test_city_override_priority() {
        let tuning = TerrainTuning::default();
        let cities = [CityAnchor::new("A", 10, 10), CityAnchor::new("B", 16, 10)];
        // (13, 10) is concrete for both but plaza for neither.
        assert_eq!(city_override(13, 10, &cities, &tuning), Some(TileType::Concrete));
        // (16, 10) sits in A's concrete ring and on B's plaza: plaza wins.
        assert_eq!(city_override(16, 10, &cities, &tuning), Some(TileType::Plaza));
        assert_eq!(city_override(60, 60, &cities, &tuning), None);
    }

    #[test]
    fn test_road_striping_is_periodic() {
        let tuning = TerrainTuning::default();
        let cities = [CityAnchor::new("A", 20, 20)];
        assert_eq!(city_override(28, 21, &cities, &tuning), Some(TileType::Road));
        assert_eq!(city_override(27, 21, &cities, &tuning), None);
        assert_eq!(city_override(27, 28, &cities, &tuning), Some(TileType::Road));
    }

    #[test]
    fn test_far_off_map_anchor_is_ignored() {
        let tuning = TerrainTuning::default();
        let cities = [
            CityAnchor::new("Far", 60_000, 8),
            CityAnchor::new("Corner", i32::MIN, i32::MAX),
        ];
        assert_eq!(city_override(0, 0, &cities, &tuning), None);

        let params = WorldParams {
            seed: 3,
            width: 16,
            height: 16,
            cities: cities.to_vec(),
            ..Default::default()
        };
        let with_far = generate_terrain(&params);
        let without = generate_terrain(&WorldParams {
            cities: Vec::new(),
            ..params
        });
        assert_eq!(with_far, without);
    }

    #[test]
    fn test_water_is_flat_and_land_bounded() {
        let params = small_params(555);
        let grid = generate_terrain(&params);
        for tile in grid.tiles() {
            if tile.tile_type.is_water() {
                assert_eq!(tile.elevation, 0, "water at ({}, {}) not flat", tile.x, tile.y);
            }
            assert!(tile.elevation <= params.terrain.max_elevation);
        }
    }

    #[test]
    fn test_trees_only_on_natural_ground() {
        let grid = generate_terrain(&small_params(31));
        for tile in grid.tiles() {
            if tile.decoration.is_some() {
                assert!(tile.tile_type.supports_trees());
            }
        }
    }

    #[test]
    fn test_classifier_bands() {
        let tuning = TerrainTuning::default();
        let base = TileSample {
            elevation: 0.6,
            moisture: 0.45,
            urban: 0.3,
            radial: 0.2,
        };
        assert_eq!(classify_tile(&base, &tuning), TileType::Grass);
        let water = TileSample { elevation: 0.1, ..base };
        assert_eq!(classify_tile(&water, &tuning), TileType::Water);
        let beach = TileSample {
            elevation: tuning.water_threshold + 0.01,
            ..base
        };
        assert_eq!(classify_tile(&beach, &tuning), TileType::Sand);
        let wet = TileSample { moisture: 0.8, ..base };
        assert_eq!(classify_tile(&wet, &tuning), TileType::Forest);
        let urban = TileSample { urban: 0.7, ..base };
        assert_eq!(classify_tile(&urban, &tuning), TileType::Concrete);
        let rural = TileSample { urban: 0.7, radial: 0.9, ..base };
        assert_eq!(classify_tile(&rural, &tuning), TileType::Grass);
    }

    #[test]
    fn test_extrusion_is_proportional() {
        let tuning = TerrainTuning::default();
        assert_eq!(extrusion(0.9, TileType::Water, &tuning), 0);
        assert_eq!(extrusion(tuning.water_threshold, TileType::Grass, &tuning), 0);
        assert_eq!(extrusion(1.0, TileType::Grass, &tuning), tuning.max_elevation);
        let high = extrusion(0.8, TileType::Grass, &tuning);
        let low = extrusion(0.6, TileType::Grass, &tuning);
        assert!(high >= low);
    }

    #[test]
    fn test_tile_hash_deterministic_and_salted() {
        assert_eq!(tile_hash(42, 0, 10, 20), tile_hash(42, 0, 10, 20));
        assert_ne!(tile_hash(42, 0, 10, 20), tile_hash(42, 0, 10, 21));
        assert_ne!(tile_hash(42, 0, 10, 20), tile_hash(42, 1, 10, 20));
    }
}
