use std::time::Duration;

use anyhow::anyhow;
use clap::Parser;
use serde::Deserialize;

use crate::solver::SearchLimits;

#[derive(Parser, Debug, Default)]
#[command(
    name = "Rust MAPF",
    about = "Independent, prioritized and conflict-based multi-agent path finding in Rust.",
    version = "1.0"
)]
pub struct Cli {
    #[arg(long, help = "Path to a YAML config file")]
    pub config: Option<String>,

    #[arg(long, help = "Path to the map file")]
    pub map_path: Option<String>,

    #[arg(long, help = "Path to the MovingAI scenario file")]
    pub scen_path: Option<String>,

    #[arg(long, help = "Path to a YAML agent list, used instead of the scenario")]
    pub agents_path: Option<String>,

    #[arg(long, help = "Path to the output file")]
    pub output_path: Option<String>,

    #[arg(long, help = "Number of agents")]
    pub num_agents: Option<usize>,

    #[arg(long, help = "Distribution of agents", value_delimiter = ',')]
    pub agents_dist: Vec<usize>,

    #[arg(long, help = "Seed for the random number generator")]
    pub seed: Option<usize>,

    #[arg(long, help = "Solver to use: cbs, prioritized, independent or all")]
    pub solver: Option<String>,

    #[arg(long, help = "Maximum number of high-level expansions")]
    pub max_expansions: Option<usize>,

    #[arg(long, help = "Time limit per solve in milliseconds")]
    pub time_limit_ms: Option<u64>,

    #[arg(long, help = "Latest arrival time considered by the low-level search")]
    pub horizon: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub map_path: String,
    pub scen_path: String,
    pub agents_path: Option<String>,
    pub output_path: String,
    pub num_agents: usize,
    pub agents_dist: Vec<usize>,
    pub seed: usize,
    pub solver: String,
    pub max_expansions: Option<usize>,
    pub time_limit_ms: Option<u64>,
    pub horizon: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            map_path: "map_file/test/test.map".to_string(),
            scen_path: "map_file/test/test.scen".to_string(),
            agents_path: None,
            output_path: "result/result.json".to_string(),
            num_agents: 2,
            agents_dist: Vec::new(),
            seed: 0,
            solver: "cbs".to_string(),
            max_expansions: None,
            time_limit_ms: None,
            horizon: None,
        }
    }
}

pub const SOLVERS: [&str; 3] = ["cbs", "prioritized", "independent"];

impl Config {
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    pub fn override_from_command_line(mut self, cli: &Cli) -> anyhow::Result<Self> {
        if let Some(map_path) = &cli.map_path {
            self.map_path = map_path.clone();
        }
        if let Some(scen_path) = &cli.scen_path {
            self.scen_path = scen_path.clone();
        }
        if cli.agents_path.is_some() {
            self.agents_path = cli.agents_path.clone();
        }
        if let Some(output_path) = &cli.output_path {
            self.output_path = output_path.clone();
        }
        if let Some(num_agents) = cli.num_agents {
            self.num_agents = num_agents;
        }
        if !cli.agents_dist.is_empty() {
            self.agents_dist = cli.agents_dist.clone();
        }
        if let Some(seed) = cli.seed {
            self.seed = seed;
        }
        if let Some(solver) = &cli.solver {
            self.solver = solver.clone();
        }
        if cli.max_expansions.is_some() {
            self.max_expansions = cli.max_expansions;
        }
        if cli.time_limit_ms.is_some() {
            self.time_limit_ms = cli.time_limit_ms;
        }
        if cli.horizon.is_some() {
            self.horizon = cli.horizon;
        }

        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.solver != "all" && !SOLVERS.contains(&self.solver.as_str()) {
            return Err(anyhow!(
                "Unknown solver {:?}, expected one of {SOLVERS:?} or \"all\"",
                self.solver
            ));
        }

        if !self.agents_dist.is_empty() && self.agents_dist.len() != self.num_agents {
            return Err(anyhow!(
                "Agent distribution has {} buckets but {} agents were requested",
                self.agents_dist.len(),
                self.num_agents
            ));
        }

        if self.max_expansions == Some(0) {
            return Err(anyhow!("Maximum expansions must be greater than 0"));
        }

        Ok(())
    }

    /// Solver names to run, in a fixed order.
    pub fn solvers(&self) -> Vec<&str> {
        if self.solver == "all" {
            SOLVERS.to_vec()
        } else {
            vec![self.solver.as_str()]
        }
    }

    pub fn limits(&self) -> SearchLimits {
        SearchLimits {
            max_expansions: self.max_expansions,
            time_limit: self.time_limit_ms.map(Duration::from_millis),
            horizon: self.horizon,
        }
    }
}
