use bevy::log::LogPlugin;
use bevy::prelude::*;
use bevy::window::PresentMode;
use bevy::winit::{UpdateMode, WinitSettings};

use rendering::config::IsoConfig;
use simulation::world_params::WorldParams;
use tracing_subscriber::EnvFilter;

#[cfg(not(target_arch = "wasm32"))]
mod agent_mode;
#[cfg(not(target_arch = "wasm32"))]
mod agent_protocol;

/// Command-line options. `--params <file>` loads world params from JSON,
/// `--config <file>` loads view tunables, `--seed <n>` overrides the seed,
/// `--agent` runs the headless protocol.
struct LaunchOptions {
    agent: bool,
    config: IsoConfig,
    params: WorldParams,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> LaunchOptions {
    let mut agent = false;
    let mut params = WorldParams::default();
    let mut config = IsoConfig::default();
    let mut seed = None;

    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--agent" => agent = true,
            "--params" => match args.next().map(std::fs::read_to_string) {
                Some(Ok(json)) => params = WorldParams::from_json_or_default(&json),
                Some(Err(e)) => warn!("could not read world params file: {e}"),
                None => warn!("--params expects a file path"),
            },
            "--config" => match args.next().map(std::fs::read_to_string) {
                Some(Ok(json)) => config = IsoConfig::from_json_or_default(&json),
                Some(Err(e)) => warn!("could not read view config file: {e}"),
                None => warn!("--config expects a file path"),
            },
            "--seed" => match args.next().map(|s| s.parse::<u64>()) {
                Some(Ok(s)) => seed = Some(s),
                _ => warn!("--seed expects an unsigned integer"),
            },
            other => warn!("ignoring unknown argument {other}"),
        }
    }
    if let Some(seed) = seed {
        params.seed = seed;
    }
    LaunchOptions {
        agent,
        config,
        params,
    }
}

/// Logs go to stderr in both modes so stdout stays free for agent responses.
/// Stands in for Bevy's `LogPlugin` and runs before argument parsing.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,wgpu=error,naga=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

fn main() {
    init_tracing();
    let options = parse_args(std::env::args().skip(1));

    #[cfg(not(target_arch = "wasm32"))]
    if options.agent {
        agent_mode::run_agent_mode(options.config, options.params);
        return;
    }

    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "IsoCity".to_string(),
                resolution: (1280.0, 720.0).into(),
                present_mode: PresentMode::AutoVsync,
                ..default()
            }),
            ..default()
        })
        .disable::<LogPlugin>())
        .insert_resource(WinitSettings {
            focused_mode: UpdateMode::Continuous,
            unfocused_mode: UpdateMode::reactive_low_power(std::time::Duration::from_millis(100)),
        })
        .insert_resource(ClearColor(Color::srgb(0.07, 0.09, 0.12)))
        .insert_resource(options.params)
        .add_plugins((
            simulation::SimulationPlugin,
            rendering::RenderingPlugin {
                config: options.config,
            },
        ))
        .run();
}
