use bevy::prelude::*;

use crate::host;

/// Register the isometric view systems.
///
/// Startup creates the 2D camera and the engine; every frame input is
/// collected, the engine advances, and the camera and notices are published.
pub(crate) fn register_rendering_systems(app: &mut App) {
    app.add_systems(Startup, (host::setup_camera, host::init_engine));

    app.add_systems(
        Update,
        (
            host::handle_new_world,
            host::collect_pointer_input,
            host::toggle_overlay_keys,
            host::advance_engine,
            host::apply_camera_transform,
            host::forward_notices,
        )
            .chain(),
    );
}
