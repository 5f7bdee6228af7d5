use mapf_cbs::common::{Agent, Path, Solution};
use mapf_cbs::config::{Cli, Config};
use mapf_cbs::map::Map;
use mapf_cbs::scenario::Scenario;
use mapf_cbs::solver::{Independent, Prioritized, SearchLimits, Solver, CBS};
use mapf_cbs::stat::Stats;
use mapf_cbs::SolveError;

use anyhow::Context;
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::fs;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Serialize)]
struct SolveReport {
    solver: String,
    status: String,
    cost: Option<usize>,
    paths: Option<Vec<Path>>,
    stats: Stats,
}

fn run_solver(
    name: &str,
    map: &Map,
    agents: &[Agent],
    limits: SearchLimits,
) -> (Result<Solution, SolveError>, Stats) {
    let starts: Vec<_> = agents.iter().map(|agent| agent.start).collect();
    let goals: Vec<_> = agents.iter().map(|agent| agent.goal).collect();

    let mut solver: Box<dyn Solver + '_> = match name {
        "cbs" => match CBS::new(map, &starts, &goals) {
            Ok(solver) => Box::new(solver.with_limits(limits)),
            Err(err) => return (Err(err), Stats::default()),
        },
        "prioritized" => match Prioritized::new(map, &starts, &goals) {
            Ok(solver) => Box::new(solver.with_limits(limits)),
            Err(err) => return (Err(err), Stats::default()),
        },
        "independent" => match Independent::new(map, &starts, &goals) {
            Ok(solver) => Box::new(solver.with_limits(limits)),
            Err(err) => return (Err(err), Stats::default()),
        },
        _ => unreachable!(),
    };

    let result = solver.find_solution();
    (result, solver.stats().clone())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let cli = Cli::parse();

    let config = if let Some(config_file) = cli.config.as_ref() {
        let config_str = fs::read_to_string(config_file)
            .with_context(|| format!("cannot read config file: {config_file}"))?;
        Config::from_yaml_str(&config_str)
            .with_context(|| format!("error with config file: {config_file}"))?
    } else {
        info!("No config file specified, using default config");
        Config::default()
    }
    .override_from_command_line(&cli)?;

    let map = Arc::new(
        Map::from_file(&config.map_path)
            .with_context(|| format!("error loading map: {}", config.map_path))?,
    );

    let agents = if let Some(agents_path) = config.agents_path.as_ref() {
        Scenario::load_agents_from_yaml(agents_path)?
    } else {
        let scenario = Scenario::load_from_scen(&config.scen_path)?;
        let mut rng = StdRng::seed_from_u64(config.seed as u64);
        if config.agents_dist.is_empty() {
            scenario.generate_agents_randomly(config.num_agents, &mut rng)?
        } else {
            scenario.generate_agents_by_buckets(config.num_agents, &config.agents_dist, &mut rng)?
        }
    };
    let agents = Arc::new(agents);

    // Each solve owns its own search state, so solvers can run side by side.
    let limits = config.limits();
    let handles: Vec<_> = config
        .solvers()
        .into_iter()
        .map(|name| {
            let name = name.to_string();
            let map = Arc::clone(&map);
            let agents = Arc::clone(&agents);
            tokio::task::spawn_blocking(move || {
                let (result, stats) = run_solver(&name, &map, &agents, limits);
                (name, result, stats)
            })
        })
        .collect();

    let mut reports = Vec::new();
    for handle in handles {
        let (name, result, stats) = handle.await?;
        let report = match result {
            Ok(solution) => {
                if name != "independent" && !solution.verify(&map, &agents) {
                    error!("{name} returned an invalid solution");
                }
                info!("{name} solution cost {}", solution.cost());
                SolveReport {
                    solver: name,
                    status: "solved".to_string(),
                    cost: Some(solution.cost()),
                    paths: Some(solution.paths),
                    stats,
                }
            }
            Err(err) => {
                error!("{name} solve fails: {err}");
                SolveReport {
                    solver: name,
                    status: err.to_string(),
                    cost: None,
                    paths: None,
                    stats,
                }
            }
        };
        reports.push(report);
    }

    let output_path = std::path::Path::new(&config.output_path);
    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)?;
    }

    // Selected agents, replayable with --agents-path.
    let agents_path = output_path.with_extension("agents.yaml");
    Scenario::write_agents_to_yaml(&agents_path, &agents)?;
    info!("Write agents to {}", agents_path.display());

    fs::write(&config.output_path, serde_json::to_string_pretty(&reports)?)
        .with_context(|| format!("cannot write result to {}", config.output_path))?;
    info!("Write results to {}", config.output_path);

    Ok(())
}
