//! Isometric spatial core: projection, camera, hit testing, placement,
//! and the per-frame sync of simulation entities into scene nodes.
//!
//! Everything up to [`engine::IsoEngine`] is host independent and draws
//! through [`scene::SceneBackend`]; [`host`] runs the engine inside Bevy.

use bevy::prelude::*;

pub mod camera;
pub mod color_ramps;
pub mod config;
pub mod coords;
pub mod engine;
pub mod ghost;
pub mod hit_test;
pub mod host;
pub mod notices;
pub mod overlay;
pub mod placement;
pub mod pointer;
pub mod scene;
pub mod style;
pub mod terrain_layer;
pub mod visual_sync;

mod plugin_registration;

use config::IsoConfig;
use host::IsoSettings;
use notices::EngineNotice;

#[derive(Default)]
pub struct RenderingPlugin {
    pub config: IsoConfig,
}

impl Plugin for RenderingPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(IsoSettings(self.config.clone()))
            .add_event::<EngineNotice>();
        plugin_registration::register_rendering_systems(app);
    }
}
