//! Notifications the engine sends to its host.
//!
//! The engine never reaches for a global event bus: the host hands it the
//! sending half of a channel and reads the other half at its own pace.

use std::sync::mpsc::{self, Receiver, Sender};

use bevy::prelude::*;
use serde::Serialize;

use simulation::grid::TileType;
use simulation::snapshot::{BuildingCategory, EntityId};

use crate::placement::PlacementRejection;

#[derive(Event, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "notice", rename_all = "snake_case")]
pub enum EngineNotice {
    WorldLoaded {
        seed: u64,
        width: usize,
        height: usize,
        fingerprint: u32,
    },
    TileChanged {
        x: i32,
        y: i32,
        tile_type: TileType,
    },
    /// A click selected a building, or cleared the selection with `None`.
    SelectionChanged { entity: Option<EntityId> },
    /// The user confirmed a valid placement; the simulation should create the building.
    PlacementConfirmed {
        category: BuildingCategory,
        x: i32,
        y: i32,
    },
    PlacementRejected {
        category: BuildingCategory,
        rejection: PlacementRejection,
    },
    /// Build mode was cancelled from the pointer (secondary click).
    PlacementCancelled,
}

/// Optional sending half. Sends are dropped silently once the receiver is gone.
#[derive(Debug, Default, Clone)]
pub struct NoticeSender(Option<Sender<EngineNotice>>);

impl NoticeSender {
    /// A connected sender and the receiver the host keeps.
    pub fn channel() -> (Self, Receiver<EngineNotice>) {
        let (tx, rx) = mpsc::channel();
        (Self(Some(tx)), rx)
    }

    pub fn disconnected() -> Self {
        Self(None)
    }

    pub fn is_connected(&self) -> bool {
        self.0.is_some()
    }

    pub fn send(&mut self, notice: EngineNotice) {
        let Some(tx) = &self.0 else {
            return;
        };
        if tx.send(notice).is_err() {
            debug!("Notice receiver dropped, disconnecting");
            self.0 = None;
        }
    }
}
