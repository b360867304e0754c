//! World-side data for the isometric city core: the tile grid, its
//! procedural generator, and the entity snapshot the simulation publishes.

use bevy::prelude::*;

pub mod ascii_map;
pub mod config;
pub mod grid;
pub mod snapshot;
pub mod terrain_generation;
pub mod world_params;

use snapshot::SimulationSnapshot;
use world_params::WorldParams;

/// Request to replace the current world with one generated from `params`.
#[derive(Event, Debug, Clone)]
pub struct NewWorldEvent {
    pub params: WorldParams,
}

pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<WorldParams>()
            .init_resource::<SimulationSnapshot>()
            .add_event::<NewWorldEvent>();
    }
}
