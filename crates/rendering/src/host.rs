//! Bevy glue: runs an [`IsoEngine`] inside an `App`.
//!
//! Scene nodes become sprite entities, window input is translated into
//! [`PointerEvent`]s, and engine notices are re-sent as Bevy events.

use std::sync::mpsc::Receiver;
use std::sync::Mutex;

use bevy::input::gestures::PinchGesture;
use bevy::input::mouse::{MouseScrollUnit, MouseWheel};
use bevy::prelude::*;
use bevy::window::{CursorLeft, CursorMoved};

use simulation::snapshot::SimulationSnapshot;
use simulation::world_params::WorldParams;
use simulation::NewWorldEvent;

use crate::config::IsoConfig;
use crate::engine::IsoEngine;
use crate::notices::{EngineNotice, NoticeSender};
use crate::pointer::{PointerButton, PointerEvent};
use crate::scene::{NodeKind, NodeSpec, SceneBackend};

const DEFAULT_VIEWPORT: Vec2 = Vec2::new(1280.0, 720.0);
const CAMERA_Z: f32 = 999.9;

#[derive(Resource)]
pub struct ActiveEngine(pub IsoEngine<Entity>);

#[derive(Resource, Clone, Default)]
pub struct IsoSettings(pub IsoConfig);

/// Receiving half of the engine's notice channel.
#[derive(Resource)]
pub struct NoticeInbox(Mutex<Receiver<EngineNotice>>);

/// Marks sprite entities owned by the engine.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct IsoNode {
    pub kind: NodeKind,
}

#[derive(Component)]
pub struct IsoViewCamera;

/// Painter's order to sprite depth, kept in front of the camera's far plane.
fn scene_z(z: f32) -> f32 {
    (1.0 + z * 0.5).clamp(0.0, CAMERA_Z - 10.0)
}

fn node_bundle(spec: &NodeSpec) -> (Sprite, Transform) {
    (
        Sprite::from_color(spec.color, spec.size),
        Transform::from_xyz(spec.position.x, -spec.position.y, scene_z(spec.z)),
    )
}

/// Scene backend that spawns sprites through `Commands`.
pub struct CommandsBackend<'a, 'w, 's> {
    commands: &'a mut Commands<'w, 's>,
}

impl<'a, 'w, 's> CommandsBackend<'a, 'w, 's> {
    pub fn new(commands: &'a mut Commands<'w, 's>) -> Self {
        Self { commands }
    }
}

impl SceneBackend for CommandsBackend<'_, '_, '_> {
    type Node = Entity;

    fn create_node(&mut self, spec: &NodeSpec) -> Entity {
        self.commands
            .spawn((node_bundle(spec), IsoNode { kind: spec.kind }))
            .id()
    }

    fn update_node(&mut self, node: Entity, spec: &NodeSpec) {
        if let Some(mut entity) = self.commands.get_entity(node) {
            entity.insert(node_bundle(spec));
        }
    }

    fn destroy_node(&mut self, node: Entity) {
        if let Some(mut entity) = self.commands.get_entity(node) {
            entity.despawn();
        }
    }
}

pub fn setup_camera(mut commands: Commands) {
    commands.spawn((
        Camera2d,
        Transform::from_xyz(0.0, 0.0, CAMERA_Z),
        IsoViewCamera,
    ));
}

pub fn init_engine(
    mut commands: Commands,
    params: Res<WorldParams>,
    settings: Res<IsoSettings>,
    windows: Query<&Window>,
) {
    let viewport = windows
        .get_single()
        .map(|w| w.size())
        .unwrap_or(DEFAULT_VIEWPORT);
    let mut engine = IsoEngine::new(settings.0.clone(), params.clone(), viewport);
    let (sender, receiver) = NoticeSender::channel();
    engine.set_notice_sender(sender);
    commands.insert_resource(ActiveEngine(engine));
    commands.insert_resource(NoticeInbox(Mutex::new(receiver)));
}

/// Regenerate the world when a `NewWorldEvent` arrives. Only the last request per frame counts.
pub fn handle_new_world(
    mut events: EventReader<NewWorldEvent>,
    mut engine: ResMut<ActiveEngine>,
    mut params: ResMut<WorldParams>,
    mut commands: Commands,
) {
    let Some(event) = events.read().last() else {
        return;
    };
    *params = event.params.clone();
    engine
        .0
        .load_world(event.params.clone(), &mut CommandsBackend::new(&mut commands));
}

#[allow(clippy::too_many_arguments)]
pub fn collect_pointer_input(
    windows: Query<&Window>,
    buttons: Res<ButtonInput<MouseButton>>,
    keys: Res<ButtonInput<KeyCode>>,
    time: Res<Time>,
    mut moved: EventReader<CursorMoved>,
    mut left: EventReader<CursorLeft>,
    mut wheel: EventReader<MouseWheel>,
    mut pinch: EventReader<PinchGesture>,
    mut engine: ResMut<ActiveEngine>,
) {
    let engine = &mut engine.0;
    let window = windows.get_single().ok();
    if let Some(window) = window {
        engine.set_viewport(window.size());
    }
    let cursor = window.and_then(|w| w.cursor_position());
    let anchor = cursor.unwrap_or(engine.camera().viewport() * 0.5);

    for evt in moved.read() {
        engine.queue_input(PointerEvent::Moved {
            position: evt.position,
        });
    }

    if let Some(position) = cursor {
        if buttons.just_pressed(MouseButton::Left) {
            engine.queue_input(PointerEvent::Down {
                button: PointerButton::Primary,
                position,
            });
        }
        if buttons.just_released(MouseButton::Left) {
            engine.queue_input(PointerEvent::Up {
                button: PointerButton::Primary,
                position,
            });
        }
        if buttons.just_pressed(MouseButton::Right) {
            engine.queue_input(PointerEvent::Down {
                button: PointerButton::Secondary,
                position,
            });
        }
    }

    if left.read().last().is_some() {
        engine.queue_input(PointerEvent::Left);
    }

    for evt in wheel.read() {
        let steps = match evt.unit {
            MouseScrollUnit::Line => evt.y,
            MouseScrollUnit::Pixel => evt.y / 100.0,
        };
        engine.queue_input(PointerEvent::Wheel {
            position: anchor,
            steps,
        });
    }

    for evt in pinch.read() {
        engine.queue_input(PointerEvent::Pinch {
            position: anchor,
            factor: 1.0 + evt.0,
        });
    }

    let mut dir = Vec2::ZERO;
    if keys.pressed(KeyCode::KeyW) || keys.pressed(KeyCode::ArrowUp) {
        dir.y -= 1.0;
    }
    if keys.pressed(KeyCode::KeyS) || keys.pressed(KeyCode::ArrowDown) {
        dir.y += 1.0;
    }
    if keys.pressed(KeyCode::KeyA) || keys.pressed(KeyCode::ArrowLeft) {
        dir.x -= 1.0;
    }
    if keys.pressed(KeyCode::KeyD) || keys.pressed(KeyCode::ArrowRight) {
        dir.x += 1.0;
    }
    if dir != Vec2::ZERO {
        engine.queue_input(PointerEvent::Pan {
            direction: dir,
            dt: time.delta_secs(),
        });
    }

    if keys.just_pressed(KeyCode::Home) {
        engine.reset_camera();
    }
}

/// Cycle overlays with Tab (forward) / Shift+Tab (backward).
pub fn toggle_overlay_keys(
    keys: Res<ButtonInput<KeyCode>>,
    mut engine: ResMut<ActiveEngine>,
    mut commands: Commands,
) {
    if !keys.just_pressed(KeyCode::Tab) {
        return;
    }
    let shift = keys.pressed(KeyCode::ShiftLeft) || keys.pressed(KeyCode::ShiftRight);
    let current = engine.0.overlay_mode();
    let next = if shift { current.prev() } else { current.next() };
    engine
        .0
        .set_overlay_mode(next, &mut CommandsBackend::new(&mut commands));
}

pub fn advance_engine(
    time: Res<Time>,
    snapshot: Res<SimulationSnapshot>,
    mut engine: ResMut<ActiveEngine>,
    mut commands: Commands,
) {
    engine.0.advance(
        time.delta_secs(),
        &snapshot,
        &mut CommandsBackend::new(&mut commands),
    );
}

/// Copy the engine camera onto the 2D camera. World-plane y points down, Bevy's y points up.
pub fn apply_camera_transform(
    engine: Res<ActiveEngine>,
    mut query: Query<(&mut Transform, &mut OrthographicProjection), With<IsoViewCamera>>,
) {
    let Ok((mut transform, mut projection)) = query.get_single_mut() else {
        return;
    };
    let camera = engine.0.camera();
    transform.translation.x = camera.position().x;
    transform.translation.y = -camera.position().y;
    projection.scale = 1.0 / camera.zoom();
}

pub fn forward_notices(inbox: Res<NoticeInbox>, mut writer: EventWriter<EngineNotice>) {
    let Ok(receiver) = inbox.0.lock() else {
        return;
    };
    for notice in receiver.try_iter() {
        writer.send(notice);
    }
}
