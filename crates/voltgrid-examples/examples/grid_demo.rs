//! Grid demo: a solar farm feeding a town through a cable trunk.
//!
//! Builds one electrical network through the registry, streams region load
//! events as the "player" walks east, and prints how much energy arrives
//! each tick. Optionally reads node templates and tuning from a data
//! directory.
//!
//! Run with: `cargo run -p voltgrid-examples --example grid_demo [DATA_DIR]`
//! Set `RUST_LOG=voltgrid_network=debug` to see cache and region activity.

use std::path::PathBuf;

use tracing::info;
use tracing_subscriber::EnvFilter;
use voltgrid_core::energy::EnergyType;
use voltgrid_core::position::{Position, Region};
use voltgrid_core::storage::{EnergyHandler, EnergyStorage, StorageTier};
use voltgrid_data::{VoltgridData, load_voltgrid_data};
use voltgrid_network::registry::NetworkRegistry;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let data = match std::env::args().nth(1).map(PathBuf::from) {
        Some(dir) => match load_voltgrid_data(&dir) {
            Ok(data) => data,
            Err(e) => {
                eprintln!("failed to load {}: {e}", dir.display());
                std::process::exit(1);
            }
        },
        None => VoltgridData::default(),
    };
    info!(?data.network, "configuration");

    let mut registry = NetworkRegistry::with_config(data.network.clone());

    // --- Solar farm: four full panels at the west end ---
    for z in 0..4 {
        let mut panel = data.tiers.build(EnergyType::Electrical, StorageTier::Advanced);
        panel.set_stored(panel.capacity());
        registry
            .connect_node(Position::new(0, 0, z), Box::new(panel))
            .expect("panel placement");
    }

    // --- Cable trunk running 40 blocks east, across three regions ---
    for x in 1..40 {
        let cable = EnergyStorage::new(EnergyType::Electrical, 0, 0, 0);
        registry
            .connect_node(Position::new(x, 0, 0), Box::new(cable))
            .expect("cable placement");
    }

    // --- Town: three consumers at the east end ---
    let houses = [Position::new(40, 0, 0), Position::new(40, 0, 1), Position::new(40, 1, 0)];
    for house in houses {
        let consumer = data
            .nodes
            .build("house")
            .unwrap_or_else(|| EnergyStorage::new(EnergyType::Electrical, 5_000, 400, 0));
        registry
            .connect_node(house, Box::new(consumer))
            .expect("house placement");
    }

    println!("networks: {}", registry.len());

    // The player walks east, loading one region every five ticks.
    for tick in 0..20u64 {
        if tick % 5 == 0 {
            let region = Region::new((tick / 5) as i32, 0);
            registry.queue_region_change(region, true);
        }
        let summary = registry.tick();
        println!(
            "tick {:>2}: delivered {:>5}, lost {:>3}",
            summary.tick,
            summary.delivered(),
            summary.lost()
        );
    }

    for (id, network) in registry.networks() {
        let stats = network.cache_stats();
        println!(
            "{id:?}: {} nodes, {} stored, cache hits {} / searches {} / invalidations {}",
            network.len(),
            network.total_stored(),
            stats.hits,
            stats.misses,
            stats.invalidations
        );
    }
}
