use anyhow::{anyhow, bail, Context};
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use tracing::{debug, info};

use crate::common::Point;
use crate::grid::Grid;

/// One start/goal pair to search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Query {
    pub start: Point,
    pub goal: Point,
}

impl Query {
    pub fn new(start: Point, goal: Point) -> Self {
        Query { start, goal }
    }

    /// Both endpoints are free cells of `grid`.
    pub fn verify(&self, grid: &Grid) -> bool {
        grid.is_valid(self.start) && grid.is_valid(self.goal)
    }
}

type Bucket = Vec<Query>;

/// Routes of a MovingAI `.scen` file, grouped by bucket.
#[derive(Debug, Default)]
pub struct Scenario {
    pub map: String,
    pub map_width: usize,
    pub map_height: usize,
    pub buckets: BTreeMap<usize, Bucket>,
}

impl Scenario {
    pub fn load_from_scen(path: &str) -> anyhow::Result<Scenario> {
        let content =
            fs::read_to_string(path).with_context(|| format!("cannot read scenario {path}"))?;
        Self::from_scen_str(&content).with_context(|| format!("malformed scenario {path}"))
    }

    /// Parse the `.scen` format: a `version` line, then one route per line:
    /// `bucket map width height start_x start_y goal_x goal_y optimal_length`.
    pub fn from_scen_str(content: &str) -> anyhow::Result<Scenario> {
        let mut lines = content.lines();
        match lines.next() {
            Some(line) if line.starts_with("version") => {}
            other => bail!("expected a version line, got {other:?}"),
        }

        let mut scenario = Scenario::default();
        for (number, line) in lines.enumerate() {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.is_empty() {
                continue;
            }
            if parts.len() < 9 {
                bail!("route {number} has {} fields, expected 9", parts.len());
            }
            let field = |i: usize| -> anyhow::Result<i32> {
                parts[i]
                    .parse()
                    .with_context(|| format!("route {number}: invalid field {:?}", parts[i]))
            };

            let bucket: usize = parts[0]
                .parse()
                .with_context(|| format!("route {number}: invalid bucket {:?}", parts[0]))?;
            let query = Query::new(
                Point::new(field(4)?, field(5)?),
                Point::new(field(6)?, field(7)?),
            );

            if scenario.map.is_empty() {
                let size = |i: usize| -> anyhow::Result<usize> {
                    parts[i]
                        .parse()
                        .with_context(|| format!("route {number}: invalid size {:?}", parts[i]))
                };
                scenario.map = parts[1].to_string();
                scenario.map_width = size(2)?;
                scenario.map_height = size(3)?;
            }
            scenario.buckets.entry(bucket).or_default().push(query);
        }

        debug!(
            "loaded {} routes in {} buckets for {}",
            scenario.buckets.values().map(Vec::len).sum::<usize>(),
            scenario.buckets.len(),
            scenario.map
        );
        Ok(scenario)
    }

    pub fn bucket(&self, index: usize) -> Option<&[Query]> {
        self.buckets.get(&index).map(Vec::as_slice)
    }

    /// Pick `count` distinct routes across all buckets.
    pub fn sample_queries<R: Rng + ?Sized>(
        &self,
        count: usize,
        rng: &mut R,
    ) -> anyhow::Result<Vec<Query>> {
        let mut available: Vec<Query> = self.buckets.values().flatten().copied().collect();
        available.sort();
        available.dedup();

        if available.len() < count {
            bail!(
                "scenario has {} unique routes, {count} requested",
                available.len()
            );
        }

        available.shuffle(rng);
        available.truncate(count);
        info!("sampled {count} routes from {}", self.map);
        Ok(available)
    }
}

/// Random start/goal pairs between free cells of `grid`.
pub fn random_queries<R: Rng + ?Sized>(
    grid: &Grid,
    count: usize,
    rng: &mut R,
) -> anyhow::Result<Vec<Query>> {
    let free: Vec<Point> = grid.free_cells().collect();
    if free.is_empty() {
        return Err(anyhow!("grid has no free cell to place queries on"));
    }

    let queries = (0..count)
        .filter_map(|_| {
            let start = *free.choose(rng)?;
            let goal = *free.choose(rng)?;
            Some(Query::new(start, goal))
        })
        .collect();
    Ok(queries)
}
