//! Headless `--agent` mode: a blocking loop that reads JSON commands from
//! stdin and writes JSON responses to stdout.
//!
//! The engine runs against the recording backend, so no window, GPU or Bevy
//! schedule is involved. Notices raised while handling a command are written
//! as extra `notice` lines before the command's own response. The tracing
//! subscriber installed in `main` writes to stderr, so stdout carries only
//! protocol lines.

use std::io::{BufRead, Write};
use std::sync::mpsc::Receiver;

use bevy::prelude::*;

use rendering::config::IsoConfig;
use rendering::engine::IsoEngine;
use rendering::notices::{EngineNotice, NoticeSender};
use rendering::overlay::FnField;
use rendering::scene::{NodeId, RecordingBackend};
use simulation::ascii_map::{render_ascii, render_elevation};
use simulation::grid::Tile;
use simulation::snapshot::SimulationSnapshot;
use simulation::world_params::WorldParams;

use crate::agent_protocol::{
    make_response, AgentCommand, AgentResponse, AsciiLayer, ResponsePayload,
};

const AGENT_VIEWPORT: Vec2 = Vec2::new(1280.0, 720.0);
const FRAME_DT: f32 = 1.0 / 60.0;
const MAX_STEP_FRAMES: u32 = 10_000;

pub struct AgentSession {
    engine: IsoEngine<NodeId>,
    backend: RecordingBackend,
    snapshot: SimulationSnapshot,
    notices: Receiver<EngineNotice>,
}

impl AgentSession {
    pub fn new(config: IsoConfig, params: WorldParams) -> Self {
        let mut engine = IsoEngine::new(config, params, AGENT_VIEWPORT);
        let (sender, notices) = NoticeSender::channel();
        engine.set_notice_sender(sender);
        let mut session = Self {
            engine,
            backend: RecordingBackend::new(),
            snapshot: SimulationSnapshot::default(),
            notices,
        };
        session.advance(1);
        session
    }

    /// Handle one command. The last response is the command's own; any
    /// notices come first.
    pub fn handle(&mut self, cmd: AgentCommand) -> Vec<AgentResponse> {
        let payload = self.process(cmd);
        let mut out: Vec<AgentResponse> = self
            .notices
            .try_iter()
            .map(|notice| make_response(ResponsePayload::Notice { notice }))
            .collect();
        out.push(make_response(payload));
        out
    }

    fn process(&mut self, cmd: AgentCommand) -> ResponsePayload {
        match cmd {
            AgentCommand::NewWorld {
                seed,
                width,
                height,
            } => {
                let current = self.engine.params();
                let params = WorldParams {
                    seed,
                    width: width.unwrap_or(current.width).max(1),
                    height: height.unwrap_or(current.height).max(1),
                    ..current.clone()
                };
                self.engine.load_world(params, &mut self.backend);
                self.advance(1);
                let grid = self.engine.grid();
                ResponsePayload::World {
                    seed,
                    width: grid.width(),
                    height: grid.height(),
                    fingerprint: grid.fingerprint(),
                }
            }

            AgentCommand::SetTile { x, y, tile } => {
                if !self.engine.grid().in_bounds(x, y) {
                    return ResponsePayload::Error {
                        message: format!("tile ({x}, {y}) is outside the map"),
                    };
                }
                if self.engine.set_tile_type(x, y, tile) {
                    self.advance(1);
                }
                ResponsePayload::Ok
            }

            AgentCommand::CanPlace { x, y, size, ignore } => {
                match self.engine.check_placement(x, y, size, ignore) {
                    Ok(()) => ResponsePayload::Placement {
                        allowed: true,
                        rejection: None,
                    },
                    Err(rejection) => ResponsePayload::Placement {
                        allowed: false,
                        rejection: Some(rejection),
                    },
                }
            }

            AgentCommand::BuildingAt { x, y } => ResponsePayload::Building {
                entity: self.engine.building_at(x, y),
            },

            AgentCommand::TileAtScreen { x, y } => ResponsePayload::Tile {
                tile: self.engine.pick_tile(Vec2::new(x, y)).map(|t| [t.x, t.y]),
            },

            AgentCommand::Snapshot { entities } => {
                self.snapshot = SimulationSnapshot::with_entities(entities);
                self.advance(1);
                self.frame_payload(1)
            }

            AgentCommand::Step { frames } => {
                let frames = frames.min(MAX_STEP_FRAMES);
                self.advance(frames);
                self.frame_payload(frames)
            }

            AgentCommand::Overlay { mode } => {
                self.engine.set_overlay_mode(mode, &mut self.backend);
                self.advance(1);
                self.overlay_payload()
            }

            AgentCommand::OverlayValues { label, values } => {
                let grid = self.engine.grid();
                let (width, expected) = (grid.width(), grid.width() * grid.height());
                if values.len() != expected {
                    return ResponsePayload::Error {
                        message: format!("expected {expected} values, got {}", values.len()),
                    };
                }
                // The field outlives this world; tiles of a later, larger world read 0.
                self.engine.set_overlay(Box::new(FnField::new(label, move |t: &Tile| {
                    let (x, y) = (t.x as usize, t.y as usize);
                    if x >= width {
                        return 0.0;
                    }
                    values.get(y * width + x).copied().unwrap_or(0.0)
                })));
                self.advance(1);
                self.overlay_payload()
            }

            AgentCommand::Ascii { layer } => ResponsePayload::Ascii {
                map: match layer {
                    AsciiLayer::Tiles => render_ascii(self.engine.grid()),
                    AsciiLayer::Elevation => render_elevation(self.engine.grid()),
                },
            },

            AgentCommand::Quit => ResponsePayload::Goodbye,
        }
    }

    fn advance(&mut self, frames: u32) {
        for _ in 0..frames {
            self.engine
                .advance(FRAME_DT, &self.snapshot, &mut self.backend);
        }
    }

    fn overlay_payload(&self) -> ResponsePayload {
        let overlay = self.engine.overlay();
        ResponsePayload::Overlay {
            mode: self.engine.overlay_mode(),
            label: overlay.label().map(str::to_owned),
            nodes: overlay.node_count(),
        }
    }

    fn frame_payload(&self, frames: u32) -> ResponsePayload {
        ResponsePayload::Frame {
            frames,
            nodes: self.backend.len(),
            visuals: self.engine.visuals().len(),
        }
    }
}

fn write_response(out: &mut impl Write, response: &AgentResponse) {
    match serde_json::to_string(response) {
        Ok(line) => {
            let _ = writeln!(out, "{line}");
        }
        Err(e) => error!("failed to serialize agent response: {e}"),
    }
}

pub fn run_agent_mode(config: IsoConfig, params: WorldParams) {
    let mut session = AgentSession::new(config, params);

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let mut stdout = stdout.lock();

    write_response(&mut stdout, &make_response(ResponsePayload::Ready));
    let _ = stdout.flush();
    info!("agent mode ready, waiting for commands on stdin");

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                error!("stdin read error: {e}");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let cmd: AgentCommand = match serde_json::from_str(&line) {
            Ok(c) => c,
            Err(e) => {
                let resp = make_response(ResponsePayload::Error {
                    message: format!("Parse error: {e}"),
                });
                write_response(&mut stdout, &resp);
                let _ = stdout.flush();
                continue;
            }
        };

        let is_quit = matches!(cmd, AgentCommand::Quit);
        for response in session.handle(cmd) {
            write_response(&mut stdout, &response);
        }
        let _ = stdout.flush();

        if is_quit {
            break;
        }
    }

    info!("agent mode shutting down");
}
