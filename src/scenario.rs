use anyhow::{anyhow, Context, Result};
use rand::prelude::*;
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;
use tracing::info;

use crate::common::Agent;

#[derive(Debug, Deserialize, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Route {
    pub start_row: usize,
    pub start_col: usize,
    pub goal_row: usize,
    pub goal_col: usize,
}

type Bucket = Vec<Route>;

/// Start/goal pairs of a MovingAI `.scen` file, grouped by bucket.
#[derive(Debug, Default)]
pub struct Scenario {
    pub map: String,
    pub map_width: usize,
    pub map_height: usize,
    pub buckets: BTreeMap<usize, Bucket>,
}

impl Scenario {
    pub fn load_from_scen(path: &str) -> Result<Scenario> {
        let file = File::open(path).with_context(|| format!("cannot open scenario {path}"))?;
        let reader = BufReader::new(file);
        let mut lines = reader.lines();

        // First line is "version x.x" which we can skip
        let _version = lines.next().transpose()?;

        let mut scenario = Scenario::default();

        for (line_number, line) in lines.enumerate() {
            let line = line?;
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.is_empty() {
                continue;
            }
            if parts.len() < 8 {
                return Err(anyhow!(
                    "{path}:{}: expected at least 8 columns, got {}",
                    line_number + 2,
                    parts.len()
                ));
            }
            let field = |index: usize| -> Result<usize> {
                parts[index].parse().with_context(|| {
                    format!("{path}:{}: bad column {index}", line_number + 2)
                })
            };

            // Scenario columns give x before y, i.e. col before row.
            let route = Route {
                start_row: field(5)?,
                start_col: field(4)?,
                goal_row: field(7)?,
                goal_col: field(6)?,
            };

            if scenario.map.is_empty() {
                // Initialize map details from the first route entry
                scenario.map = parts[1].to_string();
                scenario.map_width = field(2)?;
                scenario.map_height = field(3)?;
            }

            scenario.buckets.entry(field(0)?).or_default().push(route);
        }

        Ok(scenario)
    }

    /// Picks one unused route per agent from the requested buckets.
    pub fn generate_agents_by_buckets<R: Rng + ?Sized>(
        &self,
        num_agents: usize,
        agent_buckets: &[usize],
        rng: &mut R,
    ) -> Result<Vec<Agent>> {
        if agent_buckets.len() != num_agents {
            return Err(anyhow!(
                "Number of agents does not match the length of agent_buckets"
            ));
        }

        let mut agents: Vec<Agent> = Vec::new();
        let mut used_routes: HashSet<(usize, usize)> = HashSet::new();

        for (agent_id, &bucket_index) in agent_buckets.iter().enumerate() {
            let bucket = self
                .buckets
                .get(&bucket_index)
                .ok_or_else(|| anyhow!("Bucket {bucket_index} not found"))?;

            // Find unused routes
            let available_routes: Vec<usize> = (0..bucket.len())
                .filter(|idx| !used_routes.contains(&(bucket_index, *idx)))
                .collect();

            let route_index = *available_routes
                .choose(rng)
                .ok_or_else(|| anyhow!("No available routes left in bucket {bucket_index}"))?;

            let route = &bucket[route_index];
            agents.push(route_to_agent(agent_id, route));

            // Mark this route as used
            used_routes.insert((bucket_index, route_index));
        }

        info!("Generate scen: {agents:?}");
        Ok(agents)
    }

    pub fn generate_agents_randomly<R: Rng + ?Sized>(
        &self,
        num_agents: usize,
        rng: &mut R,
    ) -> Result<Vec<Agent>> {
        let mut available_routes: Vec<Route> = self.buckets.values().flatten().cloned().collect();
        available_routes.sort();
        available_routes.dedup();

        if available_routes.len() < num_agents {
            return Err(anyhow!(
                "Not enough unique routes available to match the number of agents"
            ));
        }

        // Shuffle the available routes to randomize the route selection
        available_routes.shuffle(rng);

        let agents: Vec<Agent> = available_routes
            .iter()
            .take(num_agents)
            .enumerate()
            .map(|(agent_id, route)| route_to_agent(agent_id, route))
            .collect();

        info!("Generate scen: {agents:?}");
        Ok(agents)
    }

    pub fn load_agents_from_yaml(path: &str) -> Result<Vec<Agent>> {
        let file = File::open(path).with_context(|| format!("cannot open agents {path}"))?;
        let reader = BufReader::new(file);
        let agents = serde_yaml::from_reader(reader)?;
        Ok(agents)
    }

    pub fn write_agents_to_yaml(path: impl AsRef<Path>, agents: &[Agent]) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path)
            .with_context(|| format!("cannot write agents to {}", path.display()))?;
        let mut writer = io::BufWriter::new(file);
        let yaml_data = serde_yaml::to_string(&agents)?;
        writer.write_all(yaml_data.as_bytes())?;

        Ok(())
    }
}

fn route_to_agent(id: usize, route: &Route) -> Agent {
    Agent {
        id,
        start: (route.start_row, route.start_col),
        goal: (route.goal_row, route.goal_col),
    }
}
