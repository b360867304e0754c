//! 2:1 diamond isometric projection between grid and screen space.
//!
//! Screen space here is the renderer's world plane: x grows to the right and
//! y grows downward, before any camera pan or zoom is applied. A tile's
//! centre at grid `(x, y)` lands at `((x - y) * hw, (x + y) * hh)`; raising a
//! tile by `e` elevation units moves it up the screen by `e * unit`.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use simulation::config::{ELEVATION_UNIT, HALF_TILE_HEIGHT, HALF_TILE_WIDTH};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IsoProjection {
    pub half_tile_width: f32,
    pub half_tile_height: f32,
    /// Screen pixels per elevation unit.
    pub elevation_unit: f32,
}

impl Default for IsoProjection {
    fn default() -> Self {
        Self {
            half_tile_width: HALF_TILE_WIDTH,
            half_tile_height: HALF_TILE_HEIGHT,
            elevation_unit: ELEVATION_UNIT,
        }
    }
}

impl IsoProjection {
    #[inline]
    pub fn map_to_screen(&self, x: f32, y: f32) -> Vec2 {
        Vec2::new(
            (x - y) * self.half_tile_width,
            (x + y) * self.half_tile_height,
        )
    }

    #[inline]
    pub fn tile_to_screen(&self, x: i32, y: i32) -> Vec2 {
        self.map_to_screen(x as f32, y as f32)
    }

    /// Screen position of a grid point raised by `elevation` units.
    #[inline]
    pub fn elevated_to_screen(&self, x: f32, y: f32, elevation: f32) -> Vec2 {
        let p = self.map_to_screen(x, y);
        Vec2::new(p.x, p.y - elevation * self.elevation_unit)
    }

    /// Exact inverse of [`Self::map_to_screen`], returning fractional grid coordinates.
    ///
    /// A degenerate projection (zero tile size) maps everything to the origin.
    pub fn screen_to_map(&self, screen: Vec2) -> Vec2 {
        if self.half_tile_width <= 0.0 || self.half_tile_height <= 0.0 {
            return Vec2::ZERO;
        }
        let a = screen.x / self.half_tile_width; // x - y
        let b = screen.y / self.half_tile_height; // x + y
        Vec2::new((a + b) * 0.5, (b - a) * 0.5)
    }

    /// Tile whose diamond contains `screen`, assuming ground level.
    #[inline]
    pub fn screen_to_tile(&self, screen: Vec2) -> IVec2 {
        let m = self.screen_to_map(screen);
        IVec2::new((m.x + 0.5).floor() as i32, (m.y + 0.5).floor() as i32)
    }

    /// Tile whose top face would contain `screen` if that tile stood at `elevation`.
    #[inline]
    pub fn screen_to_tile_at_height(&self, screen: Vec2, elevation: f32) -> IVec2 {
        self.screen_to_tile(Vec2::new(
            screen.x,
            screen.y + elevation * self.elevation_unit,
        ))
    }

    /// Screen-space rectangle covering a `width x height` grid, including the
    /// extrusion of tiles up to `max_elevation`.
    pub fn grid_screen_bounds(&self, width: usize, height: usize, max_elevation: u8) -> Rect {
        if width == 0 || height == 0 {
            return Rect::default();
        }
        let w = width as f32 - 1.0;
        let h = height as f32 - 1.0;
        let left = self.map_to_screen(0.0, h).x - self.half_tile_width;
        let right = self.map_to_screen(w, 0.0).x + self.half_tile_width;
        let top = -self.half_tile_height - max_elevation as f32 * self.elevation_unit;
        let bottom = self.map_to_screen(w, h).y + self.half_tile_height;
        Rect::new(left, top, right, bottom)
    }
}
