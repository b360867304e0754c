//! Read-only view of simulation entities handed to the renderer each frame.
//!
//! The economic simulation lives elsewhere; this is the only shape of its
//! state the isometric core ever sees.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u64);

/// Deserialized by key through [`BuildingCategory::from_key`], so unknown
/// categories from the simulation render as generic buildings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(from = "String")]
pub enum BuildingCategory {
    Farm,
    Mine,
    Factory,
    Warehouse,
    Residential,
    Commercial,
    Office,
    Utility,
    #[default]
    Generic,
}

impl BuildingCategory {
    pub const ALL: [BuildingCategory; 9] = [
        BuildingCategory::Farm,
        BuildingCategory::Mine,
        BuildingCategory::Factory,
        BuildingCategory::Warehouse,
        BuildingCategory::Residential,
        BuildingCategory::Commercial,
        BuildingCategory::Office,
        BuildingCategory::Utility,
        BuildingCategory::Generic,
    ];

    pub fn key(self) -> &'static str {
        match self {
            BuildingCategory::Farm => "farm",
            BuildingCategory::Mine => "mine",
            BuildingCategory::Factory => "factory",
            BuildingCategory::Warehouse => "warehouse",
            BuildingCategory::Residential => "residential",
            BuildingCategory::Commercial => "commercial",
            BuildingCategory::Office => "office",
            BuildingCategory::Utility => "utility",
            BuildingCategory::Generic => "generic",
        }
    }

    /// Unknown keys fall back to [`BuildingCategory::Generic`] so a missing
    /// category never fails a frame.
    pub fn from_key(key: &str) -> Self {
        match Self::ALL
            .iter()
            .copied()
            .find(|c| c.key().eq_ignore_ascii_case(key))
        {
            Some(category) => category,
            None => {
                debug!("Unknown building category '{}', using generic", key);
                BuildingCategory::Generic
            }
        }
    }

    /// Side length in tiles of the square footprint this category occupies.
    pub fn footprint_size(self) -> i32 {
        match self {
            BuildingCategory::Farm | BuildingCategory::Mine => 3,
            BuildingCategory::Factory => 4,
            BuildingCategory::Warehouse => 2,
            _ => 1,
        }
    }

    /// Visual scale of the building node, in tiles. Single-tile buildings are
    /// drawn slightly larger than their tile.
    pub fn footprint_scale(self) -> f32 {
        match self.footprint_size() {
            1 => 1.2,
            n => n as f32,
        }
    }
}

impl From<String> for BuildingCategory {
    fn from(key: String) -> Self {
        Self::from_key(&key)
    }
}

/// One simulation entity as seen by the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimEntity {
    pub id: EntityId,
    /// Grid origin of the entity; `None` while it has no place on the map.
    pub position: Option<IVec2>,
    #[serde(default)]
    pub category: BuildingCategory,
    /// Whether the simulation considers this entity to have a visual at all.
    pub renderable: bool,
    pub operational: bool,
    pub visible: bool,
    /// Opacity in [0, 1] requested by the simulation.
    pub alpha: f32,
}

impl SimEntity {
    /// A visible, operational building at `(x, y)`.
    pub fn building(id: u64, x: i32, y: i32, category: BuildingCategory) -> Self {
        Self {
            id: EntityId(id),
            position: Some(IVec2::new(x, y)),
            category,
            renderable: true,
            operational: true,
            visible: true,
            alpha: 1.0,
        }
    }

    pub fn with_operational(mut self, operational: bool) -> Self {
        self.operational = operational;
        self
    }

    /// Positioned, renderable and visible: the entity should own a visual.
    pub fn wants_visual(&self) -> bool {
        self.position.is_some() && self.renderable && self.visible
    }
}

/// The per-frame snapshot published by the simulation.
#[derive(Resource, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationSnapshot {
    pub entities: Vec<SimEntity>,
    /// Building the UI has selected for placement, if build mode is active.
    pub placement_selection: Option<BuildingCategory>,
}

impl SimulationSnapshot {
    pub fn with_entities(entities: Vec<SimEntity>) -> Self {
        Self {
            entities,
            placement_selection: None,
        }
    }
}
