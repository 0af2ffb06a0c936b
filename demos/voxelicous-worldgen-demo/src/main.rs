//! Headless demo of the world streamer.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p voxelicous-worldgen-demo -- [SEED]
//! ```
//!
//! `SEED` is an optional integer world seed (default 1337). A non-numeric
//! value is an error.
//!
//! Steps a [`World`] centered at the origin for a fixed number of frames and
//! prints how many chunks ended up resident and how many mesh vertices they
//! produced.
//!
//! ## Environment Variables
//!
//! - `RUST_LOG`: Set log level (e.g., info, debug, trace)

use std::time::Duration;

use voxelicous_core::ChunkPos;
use voxelicous_world::{StreamingConfig, TerrainGenerationParams, World};

const FRAMES: u32 = 180;
const CENTER: ChunkPos = ChunkPos::new(0, 0);

fn main() -> anyhow::Result<()> {
    if std::env::args().any(|arg| arg == "-h" || arg == "--help") {
        print_help();
        return Ok(());
    }

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let seed = match std::env::args().nth(1) {
        Some(raw) => match raw.parse::<i32>() {
            Ok(seed) => seed,
            Err(_) => {
                eprintln!("error: seed must be an integer, got {raw:?}");
                std::process::exit(1);
            }
        },
        None => TerrainGenerationParams::default().seed,
    };

    let params = TerrainGenerationParams {
        seed,
        ..TerrainGenerationParams::default()
    };
    tracing::info!(seed, "starting world streamer demo");

    let mut world = World::new(params, StreamingConfig::default());
    for frame in 0..FRAMES {
        world.update(CENTER);
        if frame % 30 == 0 {
            tracing::info!(
                frame,
                loaded = world.loaded_chunk_count(),
                inflight = world.inflight_count(),
                "streaming"
            );
        }
        std::thread::sleep(Duration::from_millis(4));
    }

    println!("seed: {seed}");
    println!("chunks loaded: {}", world.loaded_chunk_count());
    println!("chunks in flight: {}", world.inflight_count());
    println!("total mesh vertices: {}", world.total_vertex_count());

    Ok(())
}

fn print_help() {
    eprintln!(
        "Voxelicous world streamer demo

USAGE:
    cargo run -p voxelicous-worldgen-demo -- [SEED]

ARGS:
    SEED    Optional integer world seed (default 1337)

OPTIONS:
    -h, --help    Print this help message

ENVIRONMENT:
    RUST_LOG      Log level (e.g. info, debug, trace)"
    );
}
