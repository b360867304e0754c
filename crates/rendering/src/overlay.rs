//! Translucent per-tile data overlay.
//!
//! An [`OverlayField`] turns a tile into a scalar in `[0, 1]`; the renderer
//! colours one quad per tile from a ramp. While no field is set the renderer
//! owns no nodes and `refresh` returns immediately.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use simulation::grid::{Decoration, Tile, TileGrid, TileType};

use crate::color_ramps::RampKind;
use crate::coords::IsoProjection;
use crate::scene::{NodeKind, NodeSpec, SceneBackend};
use crate::visual_sync::z_order;

const OVERLAY_Z_OFFSET: f32 = 0.05;

pub trait OverlayField: Send + Sync {
    fn label(&self) -> &str;
    /// Normalized value for `tile`; clamped to `[0, 1]` by the renderer.
    fn sample(&self, tile: &Tile) -> f32;
}

/// Elevation divided by the tallest tile the terrain tuning allows.
pub struct ElevationField {
    max_elevation: u8,
}

impl ElevationField {
    pub fn new(max_elevation: u8) -> Self {
        Self {
            max_elevation: max_elevation.max(1),
        }
    }
}

impl OverlayField for ElevationField {
    fn label(&self) -> &str {
        "Elevation"
    }

    fn sample(&self, tile: &Tile) -> f32 {
        tile.elevation as f32 / self.max_elevation as f32
    }
}

/// Field backed by a closure, for data the caller owns.
pub struct FnField<F> {
    label: String,
    f: F,
}

impl<F> FnField<F>
where
    F: Fn(&Tile) -> f32 + Send + Sync,
{
    pub fn new(label: impl Into<String>, f: F) -> Self {
        Self {
            label: label.into(),
            f,
        }
    }
}

impl<F> OverlayField for FnField<F>
where
    F: Fn(&Tile) -> f32 + Send + Sync,
{
    fn label(&self) -> &str {
        &self.label
    }

    fn sample(&self, tile: &Tile) -> f32 {
        (self.f)(tile)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlayMode {
    #[default]
    None,
    Elevation,
    Paving,
    Greenery,
    /// A caller-supplied field. Not part of the Tab cycle.
    Custom,
}

/// Ordered list of all overlay modes for Tab/Shift+Tab cycling.
const ALL_OVERLAYS: [OverlayMode; 4] = [
    OverlayMode::None,
    OverlayMode::Elevation,
    OverlayMode::Paving,
    OverlayMode::Greenery,
];

impl OverlayMode {
    pub fn next(self) -> Self {
        let idx = ALL_OVERLAYS.iter().position(|&m| m == self).unwrap_or(0);
        ALL_OVERLAYS[(idx + 1) % ALL_OVERLAYS.len()]
    }

    pub fn prev(self) -> Self {
        let idx = ALL_OVERLAYS.iter().position(|&m| m == self).unwrap_or(0);
        ALL_OVERLAYS[(idx + ALL_OVERLAYS.len() - 1) % ALL_OVERLAYS.len()]
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Elevation => "Elevation",
            Self::Paving => "Paving",
            Self::Greenery => "Greenery",
            Self::Custom => "Custom",
        }
    }

    /// The built-in field drawn for this mode. `None` and `Custom` have none.
    pub fn field(self, max_elevation: u8) -> Option<Box<dyn OverlayField>> {
        match self {
            Self::None | Self::Custom => None,
            Self::Elevation => Some(Box::new(ElevationField::new(max_elevation))),
            Self::Paving => Some(Box::new(FnField::new("Paving", |t: &Tile| {
                if t.tile_type.is_paved() {
                    1.0
                } else {
                    0.0
                }
            }))),
            Self::Greenery => Some(Box::new(FnField::new("Greenery", |t: &Tile| {
                match (t.tile_type, t.decoration) {
                    (_, Some(Decoration::Tree { .. })) => 1.0,
                    (TileType::Forest, None) => 0.7,
                    (TileType::Grass, None) => 0.4,
                    _ => 0.0,
                }
            }))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    pub opacity: f32,
    /// Minimum seconds between recomputations while nothing is marked dirty.
    pub refresh_interval_secs: f32,
    pub ramp: RampKind,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            opacity: 0.55,
            refresh_interval_secs: 0.5,
            ramp: RampKind::Viridis,
        }
    }
}

pub struct OverlayRenderer<N> {
    field: Option<Box<dyn OverlayField>>,
    nodes: Vec<N>,
    config: OverlayConfig,
    since_refresh: f32,
    dirty: bool,
    refreshes: usize,
}

impl<N: Copy> OverlayRenderer<N> {
    pub fn new(config: OverlayConfig) -> Self {
        Self {
            field: None,
            nodes: Vec::new(),
            config,
            since_refresh: 0.0,
            dirty: false,
            refreshes: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.field.is_some()
    }

    pub fn label(&self) -> Option<&str> {
        self.field.as_deref().map(|f| f.label())
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of full recomputations so far.
    pub fn refreshes(&self) -> usize {
        self.refreshes
    }

    /// Show `field`. Colours are computed on the next refresh.
    pub fn set_field(&mut self, field: Box<dyn OverlayField>) {
        info!("Overlay: {}", field.label());
        self.field = Some(field);
        self.dirty = true;
    }

    /// Turn the overlay off and release its nodes.
    pub fn clear_field<B>(&mut self, backend: &mut B)
    where
        B: SceneBackend<Node = N>,
    {
        self.field = None;
        self.release(backend);
    }

    /// Force a recomputation on the next refresh.
    pub fn mark_dirty(&mut self) {
        if self.field.is_some() {
            self.dirty = true;
        }
    }

    /// Destroy owned nodes, keeping the field. The next refresh rebuilds them.
    pub fn release<B>(&mut self, backend: &mut B)
    where
        B: SceneBackend<Node = N>,
    {
        for node in self.nodes.drain(..) {
            backend.destroy_node(node);
        }
        self.dirty = self.field.is_some();
    }

    /// Recompute colours when dirty or when the refresh interval has elapsed.
    /// Returns whether a recomputation happened.
    pub fn refresh<B>(
        &mut self,
        dt: f32,
        grid: &TileGrid,
        projection: &IsoProjection,
        backend: &mut B,
    ) -> bool
    where
        B: SceneBackend<Node = N>,
    {
        let Some(field) = self.field.as_deref() else {
            return false;
        };
        self.since_refresh += dt.max(0.0);
        if !self.dirty && self.since_refresh < self.config.refresh_interval_secs {
            return false;
        }

        let tile_count = grid.width() * grid.height();
        if self.nodes.len() != tile_count {
            for node in self.nodes.drain(..) {
                backend.destroy_node(node);
            }
            for tile in grid.tiles() {
                let spec = overlay_spec(projection, tile, field, &self.config);
                self.nodes.push(backend.create_node(&spec));
            }
        } else {
            for (node, tile) in self.nodes.iter().zip(grid.tiles()) {
                let spec = overlay_spec(projection, tile, field, &self.config);
                backend.update_node(*node, &spec);
            }
        }

        self.since_refresh = 0.0;
        self.dirty = false;
        self.refreshes += 1;
        true
    }
}

fn overlay_spec(
    projection: &IsoProjection,
    tile: &Tile,
    field: &dyn OverlayField,
    config: &OverlayConfig,
) -> NodeSpec {
    let e = tile.elevation as f32;
    let mut color = config.ramp.ramp().sample(field.sample(tile)).to_srgba();
    color.alpha = config.opacity.clamp(0.0, 1.0);
    NodeSpec {
        kind: NodeKind::Overlay,
        position: projection.elevated_to_screen(tile.x as f32, tile.y as f32, e),
        z: z_order(tile.x as f32, tile.y as f32, e, OVERLAY_Z_OFFSET),
        size: Vec2::new(
            projection.half_tile_width * 2.0,
            projection.half_tile_height * 2.0,
        ),
        color: Color::Srgba(color),
    }
}
