//! # liftwell
//!
//! Runs the elevator simulation for one or more buildings and accepts floor
//! requests on standard input.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use liftwell_config::{ConfigLoad, ConfigLoader, ConfigWarnings};
use liftwell_core::{
    BuildingID, CancellationToken, DispatchOrchestrator, ElevatorRegistry, SimulationEngine,
};
use liftwell_server::bootstrap::{build_store, simulated_buildings};
use liftwell_server::intake::{self, Command, HELP};
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// CLI entry point
#[derive(Parser, Debug)]
#[command(name = "liftwell")]
#[command(about = "Elevator dispatch simulation with a request console on stdin")]
struct Cli {
    /// Path to a liftwell.toml configuration file
    #[arg(long, env = "LIFTWELL_CONFIG")]
    config: Option<PathBuf>,

    /// Path to a .env file applied before reading the environment
    #[arg(long)]
    env_file: Option<PathBuf>,

    /// Building to simulate (repeatable). Requests go to the first one.
    #[arg(long = "building")]
    buildings: Vec<BuildingID>,

    /// Simulation tick interval, e.g. "500ms" (overrides config)
    #[arg(long, value_parser = humantime::parse_duration)]
    tick_interval: Option<Duration>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut loader = ConfigLoader::new();
    if let Some(path) = &cli.config {
        loader = loader.with_config_path(path);
    }
    if let Some(path) = &cli.env_file {
        loader = loader.with_env_file(path);
    }
    let ConfigLoad {
        mut config,
        warnings,
    } = loader.load().context("failed to load configuration")?;

    if let Some(tick_interval) = cli.tick_interval {
        config.simulation.tick_interval = tick_interval;
    }
    if !cli.buildings.is_empty() {
        config.buildings = cli.buildings;
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_filter.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if config.metadata.env_file_loaded {
        info!("loaded .env file");
    }
    if let Some(path) = &config.metadata.config_path {
        info!(path = %path.display(), "configuration loaded from file");
    }
    log_warnings(&warnings);

    let store = build_store(&config.store).await?;
    let registry = Arc::new(ElevatorRegistry::new(store, config.registry.clone()));
    let orchestrator = DispatchOrchestrator::new(Arc::clone(&registry));
    let engine = Arc::new(SimulationEngine::new(
        Arc::clone(&registry),
        config.simulation.clone(),
    ));

    let buildings = simulated_buildings(&config.buildings);
    let shutdown = CancellationToken::new();
    let simulations = engine.spawn(buildings.iter().copied(), &shutdown);
    info!(
        store = config.store.kind(),
        buildings = buildings.len(),
        tick_interval = ?config.simulation.tick_interval,
        "liftwell started"
    );

    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("Ctrl-C received, shutting down"),
                Err(err) => error!("failed to listen for Ctrl-C: {}", err),
            }
            shutdown.cancel();
        });
    }

    run_console(&orchestrator, &registry, buildings[0], &shutdown).await;

    shutdown.cancel();
    for handle in simulations {
        if let Err(err) = handle.await {
            warn!("simulation task ended abnormally: {}", err);
        }
    }
    registry.flush().await;
    info!("liftwell stopped");
    Ok(())
}

fn log_warnings(warnings: &ConfigWarnings) {
    for warning in warnings.iter() {
        warn!(message = warning.message, hint = warning.hint, "configuration warning");
    }
}

/// Stdin is read on a plain thread so a pending read never holds up
/// runtime shutdown.
fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(16);
    std::thread::spawn(move || {
        for line in std::io::stdin().lines() {
            let Ok(line) = line else { break };
            if tx.blocking_send(line).is_err() {
                break;
            }
        }
    });
    rx
}

async fn run_console(
    orchestrator: &DispatchOrchestrator,
    registry: &ElevatorRegistry,
    building_id: BuildingID,
    shutdown: &CancellationToken,
) {
    println!("Requests go to building {building_id}. {HELP}");
    let mut lines = spawn_stdin_reader();

    loop {
        let line = tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            line = lines.recv() => match line {
                Some(line) => line,
                None => break,
            },
        };

        match intake::parse_command(&line) {
            Ok(Command::Empty) => {}
            Ok(Command::Help) => println!("{HELP}"),
            Ok(Command::Quit) => break,
            Ok(Command::Dispatch(floors)) => {
                for reply in
                    intake::dispatch_floors(orchestrator, building_id, &floors, shutdown).await
                {
                    println!("{reply}");
                }
            }
            Ok(Command::Status) => {
                let rendered = registry
                    .get_all_by_building(building_id, shutdown)
                    .await
                    .map_err(|err| err.user_message())
                    .and_then(|elevators| {
                        intake::render_status(&elevators).map_err(|err| err.to_string())
                    });
                match rendered {
                    Ok(rows) => rows.iter().for_each(|row| println!("{row}")),
                    Err(message) => println!("{message}"),
                }
            }
            Err(err) => println!("{err}"),
        }
    }
}
