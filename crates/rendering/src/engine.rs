//! The isometric core behind one view.
//!
//! [`IsoEngine`] owns the tile grid, the camera and every scene node it has
//! asked a [`SceneBackend`] to create. The host queues pointer input at any
//! time and calls [`IsoEngine::advance`] once per frame; all state changes
//! happen inside that call, in this order:
//!
//! 1. build terrain nodes if a world was just loaded
//! 2. apply queued input (camera drag/zoom/pan, clicks)
//! 3. smooth the camera
//! 4. reconcile building visuals with the simulation snapshot
//! 5. move the build ghost under the pointer
//! 6. push edited tiles and refresh the overlay

use bevy::prelude::*;

use simulation::grid::{TileGrid, TileType};
use simulation::snapshot::{EntityId, SimulationSnapshot};
use simulation::terrain_generation::generate_terrain;
use simulation::world_params::WorldParams;

use crate::camera::IsoCamera;
use crate::config::IsoConfig;
use crate::ghost::BuildGhost;
use crate::hit_test::pick_tile;
use crate::notices::{EngineNotice, NoticeSender};
use crate::overlay::{OverlayField, OverlayMode, OverlayRenderer};
use crate::placement::{self, PlacementRejection};
use crate::pointer::{InputQueue, PointerAction, PointerEvent, PointerTracker};
use crate::scene::SceneBackend;
use crate::style::StyleRegistry;
use crate::terrain_layer::TerrainLayer;
use crate::visual_sync::{SyncStats, VisualEntitySync};

pub struct IsoEngine<N> {
    config: IsoConfig,
    params: WorldParams,
    grid: TileGrid,
    camera: IsoCamera,
    tracker: PointerTracker,
    input: InputQueue,
    terrain: TerrainLayer<N>,
    visuals: VisualEntitySync<N>,
    ghost: BuildGhost<N>,
    overlay: OverlayRenderer<N>,
    overlay_mode: OverlayMode,
    notices: NoticeSender,
    hover: Option<Vec2>,
    hover_tile: Option<IVec2>,
    /// Tile of the last confirmed placement. No ghost is drawn there until
    /// the pointer moves to another tile or build mode ends.
    confirmed_tile: Option<IVec2>,
    selected: Option<EntityId>,
    terrain_pending: bool,
}

impl<N: Copy + Eq + std::hash::Hash + std::fmt::Debug> IsoEngine<N> {
    /// Generate the world for `params`. Terrain nodes are created on the first `advance`.
    pub fn new(config: IsoConfig, params: WorldParams, viewport: Vec2) -> Self {
        let grid = generate_terrain(&params);
        let camera = IsoCamera::new(config.camera.clone(), viewport);
        let mut engine = Self {
            tracker: PointerTracker::new(config.drag_threshold),
            input: InputQueue::default(),
            terrain: TerrainLayer::new(),
            visuals: VisualEntitySync::new(StyleRegistry::new()),
            ghost: BuildGhost::new(),
            overlay: OverlayRenderer::new(config.overlay),
            overlay_mode: OverlayMode::None,
            notices: NoticeSender::disconnected(),
            hover: None,
            hover_tile: None,
            confirmed_tile: None,
            selected: None,
            terrain_pending: true,
            config,
            params,
            grid,
            camera,
        };
        engine.frame_camera();
        engine
    }

    pub fn set_notice_sender(&mut self, notices: NoticeSender) {
        self.notices = notices;
    }

    /// Replace the world. Every node the engine owns is destroyed, the grid
    /// is regenerated and the camera is reset.
    pub fn load_world<B>(&mut self, params: WorldParams, backend: &mut B)
    where
        B: SceneBackend<Node = N>,
    {
        self.clear_scene(backend);
        self.grid = generate_terrain(&params);
        self.params = params;
        self.selected = None;
        self.hover_tile = None;
        self.confirmed_tile = None;
        self.frame_camera();
        self.terrain_pending = true;
    }

    /// Destroy every node the engine owns. The next `advance` rebuilds terrain.
    pub fn clear_scene<B>(&mut self, backend: &mut B)
    where
        B: SceneBackend<Node = N>,
    {
        self.ghost.clear(backend);
        self.visuals.clear(backend);
        self.overlay.release(backend);
        self.terrain.clear(backend);
        self.terrain_pending = true;
    }

    pub fn queue_input(&mut self, event: PointerEvent) {
        self.input.push(event);
    }

    pub fn set_viewport(&mut self, viewport: Vec2) {
        self.camera.set_viewport(viewport);
    }

    /// Run one frame.
    pub fn advance<B>(&mut self, dt: f32, snapshot: &SimulationSnapshot, backend: &mut B) -> SyncStats
    where
        B: SceneBackend<Node = N>,
    {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };

        if self.terrain_pending {
            self.terrain.rebuild(&self.grid, &self.config.projection, backend);
            self.overlay.release(backend);
            self.terrain_pending = false;
            // The fingerprint hashes every tile, so skip it when nobody listens.
            if self.notices.is_connected() {
                self.notices.send(EngineNotice::WorldLoaded {
                    seed: self.params.seed,
                    width: self.grid.width(),
                    height: self.grid.height(),
                    fingerprint: self.grid.fingerprint(),
                });
            }
        }

        let events: Vec<PointerEvent> = self.input.drain().collect();
        let mut actions = Vec::new();
        for event in &events {
            match *event {
                PointerEvent::Wheel { position, steps } => self.camera.zoom_at(position, steps),
                PointerEvent::Pinch { position, factor } => {
                    self.camera.zoom_by_factor(position, factor)
                }
                PointerEvent::Pan { direction, dt } => self.camera.pan_direction(direction, dt),
                _ => self.tracker.handle(event, &mut actions),
            }
        }
        for action in actions {
            self.apply_action(action, snapshot, backend);
        }

        self.camera.update(dt);

        let stats = self
            .visuals
            .sync(snapshot, &self.grid, &self.config.projection, backend);

        self.hover_tile = self.hover.and_then(|p| self.pick_tile(p));
        if snapshot.placement_selection.is_none() || self.hover_tile != self.confirmed_tile {
            self.confirmed_tile = None;
        }
        match (snapshot.placement_selection, self.hover_tile) {
            (Some(category), Some(tile)) if self.confirmed_tile.is_none() => {
                let placeable = self.can_place_building(tile.x, tile.y, category.footprint_size(), None);
                let style = self.visuals.styles_mut().get(category);
                self.ghost.track(
                    category,
                    tile,
                    placeable,
                    &style,
                    &self.grid,
                    &self.config.projection,
                    backend,
                );
            }
            _ => self.ghost.clear(backend),
        }

        self.terrain
            .flush(&self.grid, &self.config.projection, backend);
        self.overlay
            .refresh(dt, &self.grid, &self.config.projection, backend);

        if let Some(id) = self.selected {
            if self.visuals.get(id).is_none() {
                self.selected = None;
                self.notices
                    .send(EngineNotice::SelectionChanged { entity: None });
            }
        }

        stats
    }

    fn apply_action<B>(&mut self, action: PointerAction, snapshot: &SimulationSnapshot, backend: &mut B)
    where
        B: SceneBackend<Node = N>,
    {
        match action {
            PointerAction::Hover(p) => self.hover = Some(p),
            PointerAction::BeginDrag(p) => self.camera.begin_drag(p),
            PointerAction::DragTo(p) => self.camera.drag_to(p),
            PointerAction::EndDrag => self.camera.end_drag(),
            PointerAction::Leave => self.hover = None,
            PointerAction::Click(p) => self.click(p, snapshot, backend),
            PointerAction::SecondaryClick(_) => {
                if snapshot.placement_selection.is_some() {
                    self.ghost.clear(backend);
                    self.notices.send(EngineNotice::PlacementCancelled);
                } else if self.selected.take().is_some() {
                    self.notices
                        .send(EngineNotice::SelectionChanged { entity: None });
                }
            }
        }
    }

    fn click<B>(&mut self, viewport: Vec2, snapshot: &SimulationSnapshot, backend: &mut B)
    where
        B: SceneBackend<Node = N>,
    {
        let tile = self.pick_tile(viewport);

        if let Some(category) = snapshot.placement_selection {
            let result = match tile {
                Some(t) => self.check_placement(t.x, t.y, category.footprint_size(), None),
                None => {
                    let t = self
                        .config
                        .projection
                        .screen_to_tile(self.camera.screen_to_world(viewport));
                    Err(PlacementRejection::OutOfBounds { x: t.x, y: t.y })
                }
            };
            match (result, tile) {
                (Ok(()), Some(t)) => {
                    // The ghost goes first so it never overlaps the new building.
                    self.ghost.clear(backend);
                    self.confirmed_tile = Some(t);
                    self.notices.send(EngineNotice::PlacementConfirmed {
                        category,
                        x: t.x,
                        y: t.y,
                    });
                }
                (Err(rejection), _) => {
                    debug!("Placement of {} refused: {}", category.key(), rejection);
                    self.notices.send(EngineNotice::PlacementRejected {
                        category,
                        rejection,
                    });
                }
                (Ok(()), None) => {}
            }
            return;
        }

        let hit = tile.and_then(|t| self.building_at(t.x, t.y));
        if hit != self.selected {
            self.selected = hit;
            self.notices
                .send(EngineNotice::SelectionChanged { entity: hit });
        }
    }

    fn frame_camera(&mut self) {
        let projection = &self.config.projection;
        let (w, h) = (self.grid.width(), self.grid.height());
        let bounds = projection.grid_screen_bounds(w, h, self.grid.max_elevation());
        let margin = self.config.pan_margin.max(0.0);
        self.camera.set_bounds(Rect::from_corners(
            bounds.min - Vec2::splat(margin),
            bounds.max + Vec2::splat(margin),
        ));
        let centre = projection.map_to_screen(
            (w.max(1) - 1) as f32 * 0.5,
            (h.max(1) - 1) as f32 * 0.5,
        );
        self.camera.set_home(centre);
        self.camera.reset();
    }

    // -----------------------------------------------------------------------
    // Coordinates
    // -----------------------------------------------------------------------

    /// Grid point to world plane, ignoring elevation.
    pub fn map_to_screen(&self, x: f32, y: f32) -> Vec2 {
        self.config.projection.map_to_screen(x, y)
    }

    /// World plane to fractional grid point, ignoring elevation.
    pub fn screen_to_map(&self, screen: Vec2) -> Vec2 {
        self.config.projection.screen_to_map(screen)
    }

    /// Viewport pixel of a tile's top face centre, for anchoring tooltips.
    pub fn tile_to_viewport(&self, x: i32, y: i32) -> Option<Vec2> {
        let elevation = self.grid.elevation_at(x, y)?;
        let world = self
            .config
            .projection
            .elevated_to_screen(x as f32, y as f32, elevation as f32);
        Some(self.camera.world_to_screen(world))
    }

    /// Tile under a viewport pixel, accounting for elevation.
    pub fn pick_tile(&self, viewport: Vec2) -> Option<IVec2> {
        let world = self.camera.screen_to_world(viewport);
        pick_tile(
            &self.config.projection,
            &self.grid,
            world,
            &self.config.hit_test,
        )
    }

    // -----------------------------------------------------------------------
    // Placement
    // -----------------------------------------------------------------------

    pub fn building_at(&self, x: i32, y: i32) -> Option<EntityId> {
        placement::building_at(&self.visuals, x, y)
    }

    pub fn check_placement(
        &self,
        x: i32,
        y: i32,
        size: i32,
        ignore: Option<EntityId>,
    ) -> Result<(), PlacementRejection> {
        placement::check_placement(&self.grid, &self.visuals, x, y, size, ignore)
    }

    pub fn can_place_building(&self, x: i32, y: i32, size: i32, ignore: Option<EntityId>) -> bool {
        self.check_placement(x, y, size, ignore).is_ok()
    }

    // -----------------------------------------------------------------------
    // Terrain edits
    // -----------------------------------------------------------------------

    /// Change one tile. Returns whether anything changed; nodes refresh on the next frame.
    pub fn set_tile_type(&mut self, x: i32, y: i32, tile_type: TileType) -> bool {
        if !self.grid.set_tile_type(x, y, tile_type) {
            return false;
        }
        self.terrain.mark_dirty(&self.grid, x, y);
        self.overlay.mark_dirty();
        self.notices
            .send(EngineNotice::TileChanged { x, y, tile_type });
        true
    }

    // -----------------------------------------------------------------------
    // Camera
    // -----------------------------------------------------------------------

    pub fn camera(&self) -> &IsoCamera {
        &self.camera
    }

    pub fn pan_by(&mut self, world_delta: Vec2) {
        self.camera.pan_by(world_delta);
    }

    pub fn zoom_at(&mut self, viewport: Vec2, steps: f32) {
        self.camera.zoom_at(viewport, steps);
    }

    pub fn reset_camera(&mut self) {
        self.camera.reset();
    }

    pub fn visible_bounds(&self) -> Rect {
        self.camera.visible_bounds()
    }

    // -----------------------------------------------------------------------
    // Overlay
    // -----------------------------------------------------------------------

    /// Show a caller-supplied scalar field. The mode reads `Custom` until
    /// a built-in mode or `clear_overlay` replaces it.
    pub fn set_overlay(&mut self, field: Box<dyn OverlayField>) {
        self.overlay_mode = OverlayMode::Custom;
        self.overlay.set_field(field);
    }

    pub fn clear_overlay<B>(&mut self, backend: &mut B)
    where
        B: SceneBackend<Node = N>,
    {
        self.overlay_mode = OverlayMode::None;
        self.overlay.clear_field(backend);
    }

    /// Switch to one of the built-in overlays.
    pub fn set_overlay_mode<B>(&mut self, mode: OverlayMode, backend: &mut B)
    where
        B: SceneBackend<Node = N>,
    {
        if mode == OverlayMode::Custom {
            debug!("Custom overlays are set with set_overlay");
            return;
        }
        match mode.field(self.params.terrain.max_elevation) {
            Some(field) => {
                self.overlay_mode = mode;
                self.overlay.set_field(field);
            }
            None => self.clear_overlay(backend),
        }
    }

    pub fn overlay_mode(&self) -> OverlayMode {
        self.overlay_mode
    }

    pub fn overlay(&self) -> &OverlayRenderer<N> {
        &self.overlay
    }

    // -----------------------------------------------------------------------
    // Read-only state
    // -----------------------------------------------------------------------

    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    pub fn params(&self) -> &WorldParams {
        &self.params
    }

    pub fn config(&self) -> &IsoConfig {
        &self.config
    }

    pub fn visuals(&self) -> &VisualEntitySync<N> {
        &self.visuals
    }

    pub fn terrain(&self) -> &TerrainLayer<N> {
        &self.terrain
    }

    pub fn ghost(&self) -> &BuildGhost<N> {
        &self.ghost
    }

    pub fn selected(&self) -> Option<EntityId> {
        self.selected
    }

    pub fn hover_tile(&self) -> Option<IVec2> {
        self.hover_tile
    }
}
