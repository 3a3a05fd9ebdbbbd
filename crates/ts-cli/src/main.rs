//! tsim — distributed road-traffic microsimulation.
//!
//! Two positional arguments: the runtime configuration properties and the
//! model properties.  The model properties name the input files (`file.*`),
//! the simulation parameters (`par.*`), and optionally the output directory
//! (`out.dir`, default `output`).
//!
//! One worker thread is spawned per partition (`par.proc_x · par.proc_y`);
//! the workers advance the shared clock in lockstep over in-process
//! channels and each writes its own movement log, with worker 0 writing the
//! global output files.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};

use ts_agent::{Strategy, Trip};
use ts_core::{AgentId, NetworkFormat, SimParams};
use ts_engine::{Engine, NoopObserver, ThreadComm, TickObserver};
use ts_io::{matsim, output, sim_params, strategies, transims, Properties};
use ts_net::Network;

fn usage() {
    eprintln!("usage: tsim <runtime-config.properties> <model.properties>");
    eprintln!("  first argument : path to the runtime configuration properties file");
    eprintln!("  second argument: path to the model properties file");
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 {
        usage();
        return ExitCode::FAILURE;
    }
    match run(Path::new(&args[1]), Path::new(&args[2])) {
        Ok(()) => {
            println!("End of simulation!");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

/// Progress printer for worker 0: one line per termination check.
struct Progress;

impl TickObserver for Progress {
    fn on_progress(&mut self, _tick: u64, time: f64, remaining_agents: u64) {
        println!("Remaining agents = {remaining_agents}; time = {time}");
    }
}

fn run(config_path: &Path, model_path: &Path) -> Result<()> {
    // The runtime configuration carries launcher settings (logging etc.);
    // loading it also validates that the path is sane.
    let _runtime_config =
        Properties::load(config_path).context("reading the runtime configuration")?;
    let props = Properties::load(model_path).context("reading the model properties")?;
    let params = sim_params(&props).context("reading par.* options")?;
    let world = params.world_size();

    let timer = Instant::now();

    // ── Inputs ────────────────────────────────────────────────────────────
    let network = load_network(&props, &params)?;
    println!(
        "Network: {} nodes, {} links ({:.2}s)",
        network.node_count(),
        network.link_count(),
        timer.elapsed().as_secs_f64()
    );

    let catalog = Arc::new(load_catalog(&props, &params, &network)?);
    let strategy_set = Arc::new(load_strategies(&props)?);
    let total_trips: usize = catalog.iter().map(|(_, trips)| trips.len()).sum();
    println!(
        "Catalog: {} agents, {} trips, {} strategies ({:.2}s)",
        catalog.len(),
        total_trips,
        strategy_set.len(),
        timer.elapsed().as_secs_f64()
    );

    let out_dir = PathBuf::from(props.get("out.dir").unwrap_or("output"));
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating output directory {}", out_dir.display()))?;

    // ── Workers ───────────────────────────────────────────────────────────
    println!("Starting simulation on {world} worker(s)...");
    let mut handles = Vec::new();
    for comm in ThreadComm::create(world) {
        let network = network.clone();
        let catalog = Arc::clone(&catalog);
        let strategy_set = Arc::clone(&strategy_set);
        let params = params.clone();
        let out_dir = out_dir.clone();

        handles.push(thread::spawn(move || -> Result<()> {
            let mut engine = Engine::new(comm, params, network)?;
            engine.init(&catalog, &strategy_set)?;
            println!(
                "Worker {} starts with {} agents",
                engine.rank(),
                engine.local_agent_count()
            );

            if engine.rank() == 0 {
                engine.run(&mut Progress, None)?;
            } else {
                engine.run(&mut NoopObserver, None)?;
            }

            let report = engine.finish()?;
            output::write_report(&out_dir, &report)?;
            Ok(())
        }));
    }

    for handle in handles {
        handle
            .join()
            .map_err(|_| anyhow!("a worker thread panicked"))??;
    }

    println!(
        "Simulation complete in {:.2}s; outputs in {}",
        timer.elapsed().as_secs_f64(),
        out_dir.display()
    );
    Ok(())
}

// ── Input loading ─────────────────────────────────────────────────────────────

fn load_network(props: &Properties, params: &SimParams) -> Result<Network> {
    match params.network_format {
        NetworkFormat::Matsim => {
            let path = props.require("file.network_matsim")?;
            matsim::read_network_file(Path::new(path))
                .with_context(|| format!("reading MATSim network {path}"))
        }
        NetworkFormat::Transims => {
            let nodes = props.require("file.nodes_transims")?;
            let links = props.require("file.links_transims")?;
            transims::read_network_files(Path::new(nodes), Path::new(links))
                .with_context(|| format!("reading TRANSIMS network {nodes} + {links}"))
        }
    }
}

fn load_catalog(
    props: &Properties,
    params: &SimParams,
    network: &Network,
) -> Result<Vec<(AgentId, Vec<Trip>)>> {
    match params.network_format {
        NetworkFormat::Matsim => {
            let path = props.require("file.trips_matsim")?;
            matsim::read_plans_file(Path::new(path), network)
                .with_context(|| format!("reading MATSim plans {path}"))
        }
        NetworkFormat::Transims => {
            let locations_path = props.require("file.activities_transims")?;
            let locations: HashMap<String, String> =
                transims::read_activity_locations_file(Path::new(locations_path))
                    .with_context(|| format!("reading activity locations {locations_path}"))?;
            let path = props.require("file.trips_transims")?;
            transims::read_trips_file(
                Path::new(path),
                network,
                &locations,
                params.correct_start_time,
            )
            .with_context(|| format!("reading TRANSIMS trips {path}"))
        }
    }
}

fn load_strategies(props: &Properties) -> Result<Vec<Strategy>> {
    match props.get("file.strategies") {
        Some(path) => strategies::read_strategies_file(Path::new(path))
            .with_context(|| format!("reading strategies {path}")),
        None => Ok(Vec::new()),
    }
}
