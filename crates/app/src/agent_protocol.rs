//! Agent text protocol for the `--agent` headless mode.
//!
//! External programs (scripts, test harnesses) drive the isometric core over
//! newline-delimited JSON on stdin/stdout. The I/O loop lives in
//! [`crate::agent_mode`].

use serde::{Deserialize, Serialize};

use rendering::notices::EngineNotice;
use rendering::overlay::OverlayMode;
use rendering::placement::PlacementRejection;
use simulation::grid::TileType;
use simulation::snapshot::{EntityId, SimEntity};

// ---------------------------------------------------------------------------
// Commands (stdin → engine)
// ---------------------------------------------------------------------------

/// A single command sent by the external agent over stdin. The `cmd` field
/// is the discriminator tag.
#[derive(Debug, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum AgentCommand {
    /// Regenerate the world. Missing size fields keep the current size.
    NewWorld {
        seed: u64,
        #[serde(default)]
        width: Option<usize>,
        #[serde(default)]
        height: Option<usize>,
    },

    /// Change one tile's terrain type.
    SetTile { x: i32, y: i32, tile: TileType },

    /// Would a square footprint of `size` fit with its origin at `(x, y)`?
    CanPlace {
        x: i32,
        y: i32,
        size: i32,
        #[serde(default)]
        ignore: Option<EntityId>,
    },

    /// Which building covers the tile, if any.
    BuildingAt { x: i32, y: i32 },

    /// Height-sliced pick of the tile under a viewport pixel.
    TileAtScreen { x: f32, y: f32 },

    /// Replace the entity snapshot and advance one frame.
    Snapshot { entities: Vec<SimEntity> },

    /// Advance `frames` frames at 60 Hz with the current snapshot.
    Step { frames: u32 },

    /// Switch to a built-in overlay (`none`, `elevation`, `paving`, `greenery`).
    Overlay { mode: OverlayMode },

    /// Show caller-supplied per-tile values in `[0, 1]`, row-major.
    OverlayValues { label: String, values: Vec<f32> },

    /// Dump the tile grid, one character per tile.
    Ascii {
        #[serde(default)]
        layer: AsciiLayer,
    },

    /// Gracefully shut down the agent session.
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AsciiLayer {
    #[default]
    Tiles,
    Elevation,
}

// ---------------------------------------------------------------------------
// Responses (engine → stdout)
// ---------------------------------------------------------------------------

/// Every response includes the protocol version and a tagged payload.
#[derive(Debug, Serialize)]
pub struct AgentResponse {
    pub protocol_version: u32,
    #[serde(flatten)]
    pub payload: ResponsePayload,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponsePayload {
    /// The engine is ready to accept commands.
    Ready,

    World {
        seed: u64,
        width: usize,
        height: usize,
        fingerprint: u32,
    },

    Placement {
        allowed: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        rejection: Option<PlacementRejection>,
    },

    Building { entity: Option<EntityId> },

    Tile { tile: Option<[i32; 2]> },

    /// Scene state after one or more frames.
    Frame { frames: u32, nodes: usize, visuals: usize },

    Ascii { map: String },

    /// Overlay state after the command took effect.
    Overlay {
        mode: OverlayMode,
        label: Option<String>,
        nodes: usize,
    },

    /// A notice the engine emitted while handling the previous command.
    Notice { notice: EngineNotice },

    /// Generic success acknowledgement.
    Ok,

    Error { message: String },

    /// The session is ending (response to `quit`).
    Goodbye,
}

/// Current protocol version. Bump when the command/response schema changes.
pub const PROTOCOL_VERSION: u32 = 1;

pub fn make_response(payload: ResponsePayload) -> AgentResponse {
    AgentResponse {
        protocol_version: PROTOCOL_VERSION,
        payload,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_new_world_with_and_without_size() {
        let cmd: AgentCommand = serde_json::from_str(r#"{"cmd":"new_world","seed":7}"#).unwrap();
        assert!(matches!(
            cmd,
            AgentCommand::NewWorld {
                seed: 7,
                width: None,
                height: None
            }
        ));

        let json = r#"{"cmd":"new_world","seed":7,"width":32,"height":16}"#;
        let cmd: AgentCommand = serde_json::from_str(json).unwrap();
        assert!(matches!(
            cmd,
            AgentCommand::NewWorld {
                width: Some(32),
                height: Some(16),
                ..
            }
        ));
    }

    #[test]
    fn deserialize_set_tile_command() {
        let json = r#"{"cmd":"set_tile","x":3,"y":4,"tile":"Water"}"#;
        let cmd: AgentCommand = serde_json::from_str(json).unwrap();
        if let AgentCommand::SetTile { x, y, tile } = cmd {
            assert_eq!((x, y, tile), (3, 4, TileType::Water));
        } else {
            panic!("expected SetTile");
        }
    }

    #[test]
    fn deserialize_can_place_with_ignore() {
        let json = r#"{"cmd":"can_place","x":1,"y":1,"size":2,"ignore":9}"#;
        let cmd: AgentCommand = serde_json::from_str(json).unwrap();
        if let AgentCommand::CanPlace { ignore, size, .. } = cmd {
            assert_eq!(ignore, Some(EntityId(9)));
            assert_eq!(size, 2);
        } else {
            panic!("expected CanPlace");
        }
    }

    #[test]
    fn deserialize_snapshot_command() {
        let json = r#"{"cmd":"snapshot","entities":[{"id":1,"position":[2,3],"category":"Farm","renderable":true,"operational":false,"visible":true,"alpha":1.0}]}"#;
        let cmd: AgentCommand = serde_json::from_str(json).unwrap();
        if let AgentCommand::Snapshot { entities } = cmd {
            assert_eq!(entities.len(), 1);
            assert!(!entities[0].operational);
        } else {
            panic!("expected Snapshot");
        }
    }

    #[test]
    fn deserialize_unit_commands() {
        let cmd: AgentCommand = serde_json::from_str(r#"{"cmd":"ascii"}"#).unwrap();
        assert!(matches!(
            cmd,
            AgentCommand::Ascii {
                layer: AsciiLayer::Tiles
            }
        ));
        let json = r#"{"cmd":"ascii","layer":"elevation"}"#;
        let cmd: AgentCommand = serde_json::from_str(json).unwrap();
        assert!(matches!(
            cmd,
            AgentCommand::Ascii {
                layer: AsciiLayer::Elevation
            }
        ));
        let cmd: AgentCommand = serde_json::from_str(r#"{"cmd":"quit"}"#).unwrap();
        assert!(matches!(cmd, AgentCommand::Quit));
    }

    #[test]
    fn deserialize_overlay_commands() {
        let cmd: AgentCommand =
            serde_json::from_str(r#"{"cmd":"overlay","mode":"greenery"}"#).unwrap();
        assert!(matches!(
            cmd,
            AgentCommand::Overlay {
                mode: OverlayMode::Greenery
            }
        ));
        let json = r#"{"cmd":"overlay_values","label":"Pollution","values":[0.0,0.5,1.0]}"#;
        let cmd: AgentCommand = serde_json::from_str(json).unwrap();
        if let AgentCommand::OverlayValues { label, values } = cmd {
            assert_eq!(label, "Pollution");
            assert_eq!(values.len(), 3);
        } else {
            panic!("expected OverlayValues");
        }
    }

    #[test]
    fn unknown_command_is_an_error() {
        assert!(serde_json::from_str::<AgentCommand>(r#"{"cmd":"observe"}"#).is_err());
        assert!(serde_json::from_str::<AgentCommand>("{not json").is_err());
    }

    #[test]
    fn serialize_placement_rejection() {
        let resp = make_response(ResponsePayload::Placement {
            allowed: false,
            rejection: Some(PlacementRejection::Water { x: 2, y: 2 }),
        });
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"protocol_version\":1"));
        assert!(json.contains("\"type\":\"placement\""));
        assert!(json.contains("\"reason\":\"water\""));
    }

    #[test]
    fn serialize_allowed_placement_omits_rejection() {
        let resp = make_response(ResponsePayload::Placement {
            allowed: true,
            rejection: None,
        });
        let json = serde_json::to_string(&resp).unwrap();
        assert!(!json.contains("rejection"));
    }

    #[test]
    fn serialize_notice_response() {
        let resp = make_response(ResponsePayload::Notice {
            notice: EngineNotice::PlacementCancelled,
        });
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"type\":\"notice\""));
        assert!(json.contains("\"notice\":\"placement_cancelled\""));
    }
}
