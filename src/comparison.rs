//! Drivers that run several algorithms over the same workload and collect
//! [`Stats`] for each.

use anyhow::anyhow;
use rand::prelude::*;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::algorithm::{AlgorithmKind, SearchAlgorithm};
use crate::common::{Point, SearchError, SearchResult};
use crate::grid::Grid;
use crate::heuristic::HeuristicKind;
use crate::scenario::Query;
use crate::stat::Stats;

const NEIGHBORHOOD: [(i32, i32); 8] = [
    (0, -1),
    (0, 1),
    (-1, 0),
    (1, 0),
    (1, 1),
    (1, -1),
    (-1, 1),
    (-1, -1),
];

fn timed_search(
    algorithm: &mut dyn SearchAlgorithm,
    grid: &mut Grid,
    start: Point,
    goal: Point,
    stats: &mut Stats,
) -> Result<SearchResult, SearchError> {
    let begin = Instant::now();
    algorithm.prepare(grid, goal);
    let result = algorithm.search(grid, start, goal);
    match &result {
        Ok(found) => stats.record(found, begin.elapsed()),
        Err(err) => {
            warn!("{} failed from {start} to {goal}: {err}", algorithm.name());
            stats.record_error(begin.elapsed());
        }
    }
    result
}

/// Run every algorithm over every query. One instance per algorithm serves
/// all queries, so incremental planners keep their state between them.
#[instrument(skip_all, name = "compare_queries", fields(queries = queries.len()))]
pub fn compare_queries(
    grid: &mut Grid,
    queries: &[Query],
    kinds: &[AlgorithmKind],
    heuristic: HeuristicKind,
) -> Vec<Stats> {
    kinds
        .iter()
        .map(|kind| {
            let mut algorithm = kind.build(heuristic);
            let mut stats = Stats::new(algorithm.name());
            for query in queries {
                // Errors are already logged and counted.
                let _ = timed_search(
                    algorithm.as_mut(),
                    grid,
                    query.start,
                    query.goal,
                    &mut stats,
                );
            }
            debug!("{kind} done");
            stats
        })
        .collect()
}

struct Pursuer {
    algorithm: Box<dyn SearchAlgorithm>,
    position: Point,
    stats: Stats,
    catches: usize,
}

/// One pursuer per algorithm chases a target that takes a random legal step
/// every `target_move_every` ticks. Each pursuer re-plans from its current
/// cell every tick and advances one cell along the new path; on reaching the
/// target it restarts from a random free cell.
#[instrument(skip_all, name = "pursuit", fields(ticks = ticks))]
pub fn simulate_pursuit<R: Rng + ?Sized>(
    grid: &mut Grid,
    kinds: &[AlgorithmKind],
    heuristic: HeuristicKind,
    ticks: usize,
    target_move_every: usize,
    rng: &mut R,
) -> anyhow::Result<Vec<Stats>> {
    let no_room = || anyhow!("grid has no free cell for the pursuit");
    let mut target = grid.random_free_point(rng).ok_or_else(no_room)?;
    let origin = grid.random_free_point(rng).ok_or_else(no_room)?;

    let mut pursuers: Vec<Pursuer> = kinds
        .iter()
        .map(|kind| {
            let algorithm = kind.build(heuristic);
            let stats = Stats::new(algorithm.name());
            Pursuer {
                algorithm,
                position: origin,
                stats,
                catches: 0,
            }
        })
        .collect();

    for tick in 0..ticks {
        if tick > 0 && tick % target_move_every == 0 {
            let steps: Vec<Point> = NEIGHBORHOOD
                .iter()
                .map(|&(dx, dy)| target.offset(dx, dy))
                .filter(|&next| grid.is_legal_move(target, next))
                .collect();
            if let Some(&next) = steps.choose(rng) {
                target = next;
            }
        }

        for pursuer in pursuers.iter_mut() {
            let Ok(result) = timed_search(
                pursuer.algorithm.as_mut(),
                grid,
                pursuer.position,
                target,
                &mut pursuer.stats,
            ) else {
                continue;
            };
            if let Some(&next) = result.path.get(1) {
                pursuer.position = next;
            }
            if pursuer.position == target {
                pursuer.catches += 1;
                debug!(
                    "{} caught the target at tick {tick}",
                    pursuer.algorithm.name()
                );
                pursuer.position = grid.random_free_point(rng).ok_or_else(no_room)?;
            }
        }
    }

    for pursuer in &pursuers {
        info!(
            "{} caught the target {} times in {ticks} ticks",
            pursuer.algorithm.name(),
            pursuer.catches
        );
    }
    Ok(pursuers.into_iter().map(|p| p.stats).collect())
}
