//! Pan/zoom camera with drag inertia and exponential smoothing.
//!
//! Input writes to the *target* state (`target_position`, `target_zoom`);
//! [`IsoCamera::update`] moves the actual state toward it each frame using
//! frame-rate independent exponential interpolation:
//!
//!   `value += (target - value) * (1 - exp(-speed * dt))`
//!
//! `position` is the world point at the centre of the viewport. Screen
//! coordinates are viewport pixels with the origin in the top-left corner.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub min_zoom: f32,
    pub max_zoom: f32,
    pub default_zoom: f32,
    /// Zoom multiplier per wheel notch.
    pub zoom_step: f32,
    /// Smoothing speed for position (higher = snappier).
    pub position_speed: f32,
    /// Smoothing speed for zoom.
    pub zoom_speed: f32,
    /// Fraction of glide velocity kept per 1/60 s once the drag is released.
    pub inertia: f32,
    /// Glide velocity (world units/s) below which the camera stops.
    pub velocity_epsilon: f32,
    /// Keyboard pan speed in screen pixels per second.
    pub pan_speed: f32,
    /// Convergence threshold for smoothing.
    pub epsilon: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            min_zoom: 0.25,
            max_zoom: 4.0,
            default_zoom: 1.0,
            zoom_step: 1.1,
            position_speed: 10.0,
            zoom_speed: 10.0,
            inertia: 0.92,
            velocity_epsilon: 1.0,
            pan_speed: 600.0,
            epsilon: 0.001,
        }
    }
}

impl CameraConfig {
    /// Repair values that would break the zoom clamp or the smoothing math.
    /// Non-finite or non-positive limits fall back to the defaults and
    /// inverted limits are swapped.
    pub fn sanitized(self) -> Self {
        let defaults = Self::default();
        let positive = |v: f32, fallback: f32| if v.is_finite() && v > 0.0 { v } else { fallback };
        let non_negative = |v: f32, fallback: f32| if v.is_finite() && v >= 0.0 { v } else { fallback };

        let mut min_zoom = positive(self.min_zoom, defaults.min_zoom);
        let mut max_zoom = positive(self.max_zoom, defaults.max_zoom);
        if min_zoom > max_zoom {
            std::mem::swap(&mut min_zoom, &mut max_zoom);
        }
        let fixed = Self {
            min_zoom,
            max_zoom,
            default_zoom: positive(self.default_zoom, defaults.default_zoom).clamp(min_zoom, max_zoom),
            zoom_step: positive(self.zoom_step, defaults.zoom_step),
            position_speed: non_negative(self.position_speed, defaults.position_speed),
            zoom_speed: non_negative(self.zoom_speed, defaults.zoom_speed),
            inertia: if self.inertia.is_finite() {
                self.inertia.clamp(0.0, 0.999)
            } else {
                defaults.inertia
            },
            velocity_epsilon: non_negative(self.velocity_epsilon, defaults.velocity_epsilon),
            pan_speed: non_negative(self.pan_speed, defaults.pan_speed),
            epsilon: positive(self.epsilon, defaults.epsilon),
        };
        if fixed != self {
            warn!("CameraConfig: invalid values replaced: {:?}", fixed);
        }
        fixed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        last_screen: Vec2,
    },
}

/// Exponential interpolation factor for a given speed and delta time, in `[0, 1]`.
#[inline]
pub fn exp_lerp_factor(speed: f32, dt: f32) -> f32 {
    1.0 - (-speed * dt).exp()
}

/// Camera for one isometric view.
///
/// Zoom is kept inside `[min_zoom, max_zoom]` by every mutator, so fields are
/// private and exposed through getters.
#[derive(Debug, Clone)]
pub struct IsoCamera {
    position: Vec2,
    target_position: Vec2,
    zoom: f32,
    target_zoom: f32,
    /// Glide velocity in world units per second.
    velocity: Vec2,
    drag: DragState,
    /// World-space drag movement since the last `update`.
    pending_drag: Option<Vec2>,
    viewport: Vec2,
    bounds: Rect,
    home: Vec2,
    config: CameraConfig,
}

impl IsoCamera {
    pub fn new(config: CameraConfig, viewport: Vec2) -> Self {
        let config = config.sanitized();
        let zoom = config.default_zoom;
        Self {
            position: Vec2::ZERO,
            target_position: Vec2::ZERO,
            zoom,
            target_zoom: zoom,
            velocity: Vec2::ZERO,
            drag: DragState::Idle,
            pending_drag: None,
            viewport,
            bounds: Rect::new(-f32::MAX, -f32::MAX, f32::MAX, f32::MAX),
            home: Vec2::ZERO,
            config,
        }
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn target_position(&self) -> Vec2 {
        self.target_position
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn target_zoom(&self) -> f32 {
        self.target_zoom
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.drag, DragState::Dragging { .. })
    }

    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    pub fn set_viewport(&mut self, viewport: Vec2) {
        self.viewport = viewport.max(Vec2::ONE);
    }

    /// Rectangle the target position is kept inside.
    pub fn set_bounds(&mut self, bounds: Rect) {
        self.bounds = bounds;
        self.target_position = self.clamp_to_bounds(self.target_position);
    }

    /// Position restored by [`Self::reset`].
    pub fn set_home(&mut self, home: Vec2) {
        self.home = home;
    }

    /// Snap back to the home position at default zoom with no motion.
    pub fn reset(&mut self) {
        let zoom = self.config.default_zoom;
        self.position = self.clamp_to_bounds(self.home);
        self.target_position = self.position;
        self.zoom = zoom;
        self.target_zoom = zoom;
        self.velocity = Vec2::ZERO;
        self.drag = DragState::Idle;
        self.pending_drag = None;
    }

    /// Place the camera instantly, bypassing smoothing.
    pub fn jump_to(&mut self, world: Vec2) {
        self.position = self.clamp_to_bounds(world);
        self.target_position = self.position;
        self.velocity = Vec2::ZERO;
    }

    // -----------------------------------------------------------------------
    // Screen <-> world
    // -----------------------------------------------------------------------

    pub fn screen_to_world(&self, screen: Vec2) -> Vec2 {
        self.position + (screen - self.viewport * 0.5) / self.zoom
    }

    pub fn world_to_screen(&self, world: Vec2) -> Vec2 {
        (world - self.position) * self.zoom + self.viewport * 0.5
    }

    /// World-space rectangle currently on screen.
    pub fn visible_bounds(&self) -> Rect {
        Rect::from_center_size(self.position, self.viewport / self.zoom)
    }

    // -----------------------------------------------------------------------
    // Drag (Idle <-> Dragging)
    // -----------------------------------------------------------------------

    pub fn begin_drag(&mut self, screen: Vec2) {
        self.drag = DragState::Dragging {
            last_screen: screen,
        };
        self.velocity = Vec2::ZERO;
        self.pending_drag = None;
    }

    /// Move the pointer while dragging. The world follows the pointer, so the
    /// camera moves opposite to the screen delta, scaled by zoom.
    pub fn drag_to(&mut self, screen: Vec2) {
        let DragState::Dragging { last_screen } = self.drag else {
            return;
        };
        if screen == last_screen {
            return;
        }
        let world_delta = -(screen - last_screen) / self.zoom;
        self.target_position += world_delta;
        *self.pending_drag.get_or_insert(Vec2::ZERO) += world_delta;
        self.drag = DragState::Dragging {
            last_screen: screen,
        };
    }

    pub fn end_drag(&mut self) {
        self.drag = DragState::Idle;
    }

    // -----------------------------------------------------------------------
    // Pan / zoom
    // -----------------------------------------------------------------------

    pub fn pan_by(&mut self, world_delta: Vec2) {
        self.target_position += world_delta;
    }

    /// Keyboard pan: `direction` in screen axes, speed independent of zoom on screen.
    pub fn pan_direction(&mut self, direction: Vec2, dt: f32) {
        if direction == Vec2::ZERO || dt <= 0.0 {
            return;
        }
        self.target_position += direction.normalize() * self.config.pan_speed * dt / self.zoom;
    }

    /// Wheel zoom by `steps` notches around the cursor.
    pub fn zoom_at(&mut self, cursor: Vec2, steps: f32) {
        if steps == 0.0 || !steps.is_finite() {
            return;
        }
        self.zoom_by_factor(cursor, self.config.zoom_step.powf(steps));
    }

    /// Multiply the target zoom by `factor`, keeping the world point under
    /// `cursor` under the cursor once the camera settles.
    pub fn zoom_by_factor(&mut self, cursor: Vec2, factor: f32) {
        if !factor.is_finite() || factor <= 0.0 || (factor - 1.0).abs() < f32::EPSILON {
            return;
        }
        let new_zoom = (self.target_zoom * factor).clamp(self.config.min_zoom, self.config.max_zoom);
        if (new_zoom - self.target_zoom).abs() < f32::EPSILON {
            return;
        }
        let anchor = self.screen_to_world(cursor);
        let offset = cursor - self.viewport * 0.5;
        self.target_zoom = new_zoom;
        self.target_position = anchor - offset / new_zoom;
    }

    // -----------------------------------------------------------------------
    // Per-frame update
    // -----------------------------------------------------------------------

    /// Advance inertia, clamp the target and smooth toward it.
    pub fn update(&mut self, dt: f32) {
        if dt <= 0.0 {
            return;
        }

        if let Some(moved) = self.pending_drag.take() {
            self.velocity = moved / dt;
        } else if self.is_dragging() {
            // Holding still while dragging leaves nothing to glide with.
            self.velocity = Vec2::ZERO;
        } else if self.velocity != Vec2::ZERO {
            self.target_position += self.velocity * dt;
            self.velocity *= self.config.inertia.powf(dt * 60.0);
            if self.velocity.length() < self.config.velocity_epsilon {
                self.velocity = Vec2::ZERO;
            }
        }

        let clamped = self.clamp_to_bounds(self.target_position);
        if clamped.x != self.target_position.x {
            self.velocity.x = 0.0;
        }
        if clamped.y != self.target_position.y {
            self.velocity.y = 0.0;
        }
        self.target_position = clamped;

        let eps = self.config.epsilon;
        let pos_factor = exp_lerp_factor(self.config.position_speed, dt);
        let delta = self.target_position - self.position;
        if delta.length_squared() > eps * eps {
            self.position += delta * pos_factor;
        } else {
            self.position = self.target_position;
        }

        let zoom_factor = exp_lerp_factor(self.config.zoom_speed, dt);
        let zoom_delta = self.target_zoom - self.zoom;
        if zoom_delta.abs() > eps * 0.01 {
            self.zoom += zoom_delta * zoom_factor;
        } else {
            self.zoom = self.target_zoom;
        }
    }

    /// True once the actual state has caught up with the target and nothing glides.
    pub fn is_settled(&self) -> bool {
        self.position == self.target_position
            && self.zoom == self.target_zoom
            && self.velocity == Vec2::ZERO
    }

    fn clamp_to_bounds(&self, p: Vec2) -> Vec2 {
        Vec2::new(
            p.x.clamp(self.bounds.min.x, self.bounds.max.x.max(self.bounds.min.x)),
            p.y.clamp(self.bounds.min.y, self.bounds.max.y.max(self.bounds.min.y)),
        )
    }
}
