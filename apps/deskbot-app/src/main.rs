//! Deskbot manipulation engine CLI.
//!
//! Provides three modes of operation:
//! - `headless`: Run N scripted episodes locally and print statistics
//! - `calibrate`: Detect the desk bounds for a world and print them
//! - `info`: Print workspace crate versions and configuration

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use deskbot_core::config::EngineConfig;
use deskbot_env::DeskEnv;

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

/// Deskbot autonomous manipulation engine.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run episodes locally and print statistics.
    Headless {
        /// World id to load.
        #[arg(short, long, default_value_t = 2)]
        world: u32,

        /// Detect desk bounds with the raycast scanner instead of the
        /// compiled-in table.
        #[arg(long)]
        auto: bool,

        /// Command text issued at the start of each episode.
        #[arg(short, long, default_value = "clean my desk and then organize my desk")]
        command: String,

        /// Number of episodes to run.
        #[arg(short = 'n', long, default_value_t = 1)]
        episodes: u32,

        /// Maximum steps per episode (overrides the config value).
        #[arg(short, long)]
        max_steps: Option<u32>,

        /// Random seed.
        #[arg(short, long, default_value_t = 0)]
        seed: u64,

        /// Engine config TOML; defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Detect and print the desk bounds for a world.
    Calibrate {
        /// World id to load.
        #[arg(short, long, default_value_t = 2)]
        world: u32,

        /// Use the raycast scanner instead of the compiled-in table.
        #[arg(long)]
        auto: bool,
    },

    /// Print crate information.
    Info,
}

// ---------------------------------------------------------------------------
// Mode implementations
// ---------------------------------------------------------------------------

#[allow(clippy::too_many_arguments)]
fn run_headless(
    world: u32,
    auto: bool,
    command: &str,
    episodes: u32,
    max_steps: Option<u32>,
    seed: u64,
    config_path: Option<&PathBuf>,
) {
    let mut config = match config_path {
        Some(path) => EngineConfig::from_file(path).expect("failed to load config"),
        None => EngineConfig::default(),
    };
    if let Some(max_steps) = max_steps {
        config.max_episode_steps = max_steps;
    }
    let step_limit = config.max_episode_steps;

    let mut env = DeskEnv::new(config, world, auto, seed);

    let mut total_steps = 0u32;
    let mut total_reward = 0.0f32;
    for ep in 0..episodes {
        if let Err(err) = env.reset() {
            eprintln!("episode {}: calibration failed: {err}", ep + 1);
            return;
        }

        let queued = env.execute_command(command);
        let ticks = env.run_until_idle(step_limit);

        let episode = env.episode();
        println!(
            "episode {}: tasks={queued}, ticks={ticks}, steps={}, reward={:.3}, state={:?}",
            ep + 1,
            episode.step_count(),
            episode.total_reward(),
            episode.state(),
        );
        total_steps += episode.step_count();
        total_reward += episode.total_reward();
    }

    println!("\ntotal: episodes={episodes}, steps={total_steps}, reward={total_reward:.3}");
}

fn run_calibrate(world: u32, auto: bool) {
    let mut env = DeskEnv::new(EngineConfig::default(), world, auto, 0);
    match env.reset() {
        Ok(observation) => {
            let b = observation.desk_bounds;
            let strategy = if auto { "raycast" } else { "static" };
            println!("world {world} ({strategy}):");
            println!("  x: [{:.3}, {:.3}]", b.min_x, b.max_x);
            println!("  y: [{:.3}, {:.3}]", b.min_y, b.max_y);
            println!("  z: [{:.3}, {:.3}]", b.min_z, b.max_z);
            println!("  surface: {:.3}", b.surface_y());
        }
        Err(err) => eprintln!("calibration failed: {err}"),
    }
}

fn run_info() {
    println!("deskbot v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("crates:");
    println!("  deskbot-core    {}", env!("CARGO_PKG_VERSION"));
    println!("  deskbot-physics {}", env!("CARGO_PKG_VERSION"));
    println!("  deskbot-scene   {}", env!("CARGO_PKG_VERSION"));
    println!("  deskbot-calib   {}", env!("CARGO_PKG_VERSION"));
    println!("  deskbot-control {}", env!("CARGO_PKG_VERSION"));
    println!("  deskbot-env     {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("edition: 2024");
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Headless {
            world,
            auto,
            command,
            episodes,
            max_steps,
            seed,
            config,
        }) => run_headless(
            world,
            auto,
            &command,
            episodes,
            max_steps,
            seed,
            config.as_ref(),
        ),
        Some(Commands::Calibrate { world, auto }) => run_calibrate(world, auto),
        Some(Commands::Info) => run_info(),
        None => {
            // Default: one headless episode with defaults.
            run_headless(2, false, "clean my desk and then organize my desk", 1, None, 0, None);
        }
    }
}
