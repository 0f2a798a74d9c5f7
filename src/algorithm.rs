mod astar;
mod bfs;
mod dstar;
mod floodfill;
mod iddfs;
mod jps;

pub use astar::AStar;
pub use bfs::BreadthFirst;
pub use dstar::DStarLite;
pub use floodfill::FloodFill;
pub use iddfs::IterativeDeepening;
pub use jps::JumpPointSearch;

use clap::ValueEnum;
use serde::Deserialize;
use std::collections::HashMap;
use std::f64::consts::SQRT_2;
use std::fmt;

use crate::common::{Path, Point, SearchError, SearchNode, SearchResult};
use crate::grid::Grid;
use crate::heuristic::HeuristicKind;

/// Shared contract of every search strategy.
pub trait SearchAlgorithm {
    fn name(&self) -> &'static str;

    /// Called by drivers before `search` whenever they may have moved the
    /// goal. Only strategies that keep grid-wide state need it.
    fn prepare(&mut self, _grid: &mut Grid, _goal: Point) {}

    fn search(
        &mut self,
        grid: &Grid,
        start: Point,
        goal: Point,
    ) -> Result<SearchResult, SearchError>;
}

/// Strategy selectable from the command line or the YAML config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlgorithmKind {
    Bfs,
    Iddfs,
    Astar,
    Jps,
    Dstar,
    Floodfill,
}

impl AlgorithmKind {
    pub fn build(self, heuristic: HeuristicKind) -> Box<dyn SearchAlgorithm> {
        match self {
            AlgorithmKind::Bfs => Box::new(BreadthFirst::new()),
            AlgorithmKind::Iddfs => Box::new(IterativeDeepening::new()),
            AlgorithmKind::Astar => Box::new(AStar::new(heuristic)),
            AlgorithmKind::Jps => Box::new(JumpPointSearch::new(heuristic)),
            AlgorithmKind::Dstar => Box::new(DStarLite::new(heuristic)),
            AlgorithmKind::Floodfill => Box::new(FloodFill::new()),
        }
    }

    pub fn all() -> [AlgorithmKind; 6] {
        [
            AlgorithmKind::Bfs,
            AlgorithmKind::Iddfs,
            AlgorithmKind::Astar,
            AlgorithmKind::Jps,
            AlgorithmKind::Dstar,
            AlgorithmKind::Floodfill,
        ]
    }
}

impl fmt::Display for AlgorithmKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AlgorithmKind::Bfs => "bfs",
            AlgorithmKind::Iddfs => "iddfs",
            AlgorithmKind::Astar => "astar",
            AlgorithmKind::Jps => "jps",
            AlgorithmKind::Dstar => "dstar",
            AlgorithmKind::Floodfill => "floodfill",
        };
        f.write_str(name)
    }
}

// Up, down, left, right.
const ORTHOGONAL: [(i32, i32); 4] = [(0, -1), (0, 1), (-1, 0), (1, 0)];
const DIAGONAL: [(i32, i32); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

/// Predecessor map; `None` marks the start.
type Trace = HashMap<Point, Option<Point>>;

fn construct_path(trace: &Trace, current: Point) -> Path {
    let mut path = vec![current];
    let mut current = current;
    while let Some(&Some(prev)) = trace.get(&current) {
        path.push(prev);
        current = prev;
    }
    path.reverse();
    path
}

/// Fail fast on endpoints outside the grid or on an obstacle.
fn check_endpoints(grid: &Grid, start: Point, goal: Point) -> Result<(), SearchError> {
    for point in [start, goal] {
        if !grid.contains(point) {
            return Err(SearchError::OutOfBounds { point });
        }
        if grid.has_obstacle(point) {
            return Err(SearchError::Blocked { point });
        }
    }
    Ok(())
}

fn orthogonal_successors(grid: &Grid, p: Point) -> Vec<Point> {
    ORTHOGONAL
        .iter()
        .map(|&(dx, dy)| p.offset(dx, dy))
        .filter(|n| grid.is_valid(*n))
        .collect()
}

/// 8-connected successors, orthogonal ones first. Diagonal moves cost
/// `diagonal_cost` and must not cut a blocked corner.
fn successors(grid: &Grid, p: Point, diagonal_cost: f64) -> Vec<SearchNode> {
    let mut nodes = Vec::with_capacity(8);
    for &(dx, dy) in &ORTHOGONAL {
        let n = p.offset(dx, dy);
        if grid.is_valid(n) {
            nodes.push(SearchNode::new(n, 1.0));
        }
    }
    for &(dx, dy) in &DIAGONAL {
        let n = p.offset(dx, dy);
        if grid.is_valid(n) && grid.is_diagonally_accessible(n, p) {
            nodes.push(SearchNode::new(n, diagonal_cost));
        }
    }
    nodes
}

fn euclidean_successors(grid: &Grid, p: Point) -> Vec<SearchNode> {
    successors(grid, p, SQRT_2)
}
