//! Transfer example: explicit point-to-point moves with typed failures.
//!
//! Run with: `cargo run -p voltgrid-examples --example transfers`

use tracing_subscriber::EnvFilter;
use voltgrid_core::energy::{EnergyType, EnergyUnit};
use voltgrid_core::fixed::fixed64_to_f64;
use voltgrid_core::position::Position;
use voltgrid_core::storage::{Action, EnergyStorage};
use voltgrid_network::network::EnergyNetwork;
use voltgrid_network::region::AllLoaded;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let mut net = EnergyNetwork::new(EnergyType::Steam);
    let boiler = Position::new(0, 0, 0);
    let turbine = Position::new(3, 0, 0);
    let far_turbine = Position::new(10, 0, 0);

    net.add_node(
        boiler,
        EnergyStorage::new(EnergyType::Steam, 8_000, 0, 2_000).with_stored(8_000),
    );
    for x in 1..3 {
        net.add_node(Position::new(x, 0, 0), EnergyStorage::new(EnergyType::Steam, 0, 0, 0));
    }
    net.add_node(turbine, EnergyStorage::new(EnergyType::Steam, 4_000, 4_000, 0));
    net.add_node(far_turbine, EnergyStorage::new(EnergyType::Steam, 4_000, 4_000, 0));

    let (su, geu) = (EnergyUnit::SteamUnit, EnergyUnit::GalacticEnergyUnit);

    // The boiler may send at most 1500 units per rate-limit window.
    net.set_transfer_rate_limit(boiler, 1_500);

    // A dry run first, then the real thing.
    for action in [Action::Simulate, Action::Execute] {
        match net.transfer(boiler, turbine, 5_000, action, &AllLoaded, 0) {
            Ok(receipt) => println!(
                "{action:?}: extracted {} {}, delivered {} {} ({} {}), lost {} over {} positions",
                receipt.extracted,
                su.abbreviation(),
                receipt.delivered,
                su.abbreviation(),
                su.convert_to(receipt.delivered, geu),
                geu.abbreviation(),
                receipt.lost,
                receipt.path_len
            ),
            Err(e) => println!("{action:?}: {e}"),
        }
    }

    // Budget spent for this window.
    if let Err(e) = net.transfer(boiler, turbine, 100, Action::Execute, &AllLoaded, 1) {
        println!("second transfer: {e}");
    }

    // No cable reaches the far turbine.
    if let Err(e) = net.transfer(boiler, far_turbine, 100, Action::Execute, &AllLoaded, 1) {
        println!("far turbine: {e}");
    }

    let path = net.find_path(boiler, turbine, &AllLoaded, 2);
    println!(
        "route {} hops, loss {:.1}%, rate {}",
        path.hops(),
        fixed64_to_f64(net.loss_rate(&path)) * 100.0,
        net.transfer_rate(&path)
    );
    let route: Vec<String> = path.into_positions().iter().map(ToString::to_string).collect();
    println!("via {}", route.join(" -> "));

    // Network-wide operations spread evenly over capable nodes.
    let vented = net.extract(1_000, Action::Execute);
    println!(
        "vented {vented} {}, {} of {} stored",
        su.abbreviation(),
        net.total_stored(),
        net.total_capacity()
    );
}
