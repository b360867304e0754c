//! ASCII rendering of the tile grid, one character per tile.
//!
//! Built on demand from `&TileGrid`; used by the headless agent mode and
//! handy when eyeballing generator changes.

use crate::grid::{Decoration, Tile, TileGrid, TileType};

pub fn tile_to_char(tile: &Tile) -> char {
    match (tile.tile_type, tile.decoration) {
        (TileType::Water, _) => '~',
        (TileType::Sand, _) => ':',
        (TileType::Forest, Some(Decoration::Tree { .. })) => 'T',
        (TileType::Forest, None) => 'f',
        (TileType::Grass, Some(Decoration::Tree { .. })) => 't',
        (TileType::Grass, None) => '.',
        (TileType::Dirt, _) => ',',
        (TileType::Concrete, _) => '=',
        (TileType::Road, _) => '#',
        (TileType::Plaza, _) => '@',
    }
}

/// Full-resolution map, rows separated by `\n`.
pub fn render_ascii(grid: &TileGrid) -> String {
    render_region(grid, 0, 0, grid.width(), grid.height())
}

/// A `w x h` window starting at `(x0, y0)`; tiles outside the grid print as spaces.
pub fn render_region(grid: &TileGrid, x0: i32, y0: i32, w: usize, h: usize) -> String {
    let mut out = String::with_capacity((w + 1) * h);
    for dy in 0..h as i32 {
        for dx in 0..w as i32 {
            out.push(grid.get(x0 + dx, y0 + dy).map_or(' ', tile_to_char));
        }
        if dy + 1 < h as i32 {
            out.push('\n');
        }
    }
    out
}

/// Elevation as digits (`0`-`9`, `+` above nine), water as `~`.
pub fn render_elevation(grid: &TileGrid) -> String {
    let mut out = String::with_capacity((grid.width() + 1) * grid.height());
    for (i, tile) in grid.tiles().enumerate() {
        if i > 0 && i % grid.width() == 0 {
            out.push('\n');
        }
        out.push(if tile.tile_type.is_water() {
            '~'
        } else {
            char::from_digit(tile.elevation as u32, 10).unwrap_or('+')
        });
    }
    out
}
