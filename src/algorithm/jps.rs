//! Jump Point Search.
//!
//! A* whose successors are *jump points*: instead of pushing every adjacent
//! cell, each candidate direction is followed in a straight line until the
//! goal, a cell with a forced neighbor, or an obstacle. Diagonal moves follow
//! the same rule as the rest of the crate: allowed unless both corner cells
//! are blocked.

use std::collections::BTreeSet;
use std::f64::consts::SQRT_2;
use tracing::{debug, instrument, trace};

use super::{check_endpoints, construct_path, successors, SearchAlgorithm, Trace};
use crate::common::{OpenEntry, Path, Point, SearchError, SearchNode, SearchResult};
use crate::grid::Grid;
use crate::heuristic::Heuristic;

#[derive(Debug)]
pub struct JumpPointSearch<H> {
    heuristic: H,
}

impl<H: Heuristic> JumpPointSearch<H> {
    pub fn new(heuristic: H) -> Self {
        JumpPointSearch { heuristic }
    }
}

impl<H: Heuristic> SearchAlgorithm for JumpPointSearch<H> {
    fn name(&self) -> &'static str {
        "JPS"
    }

    #[instrument(skip_all, name = "jps", fields(start = %start, goal = %goal), level = "debug")]
    fn search(
        &mut self,
        grid: &Grid,
        start: Point,
        goal: Point,
    ) -> Result<SearchResult, SearchError> {
        check_endpoints(grid, start, goal)?;
        if start == goal {
            return Ok(SearchResult::found(vec![start], 0));
        }

        let mut open_list = BTreeSet::new();
        let mut trace = Trace::new();
        let mut seq = 0;

        let mut start_node = SearchNode::new(start, 0.0);
        start_node.estimate = self.heuristic.estimate(start, goal);
        open_list.insert(OpenEntry {
            node: start_node,
            g_cost: 0.0,
            seq,
        });
        trace.insert(start, None);

        let mut expansions = 0;
        while let Some(current) = open_list.pop_first() {
            expansions += 1;
            let position = current.node.position;
            trace!("expand jump point: {position} f {}", current.f_cost());

            if position == goal {
                return Ok(SearchResult::found(
                    fill(&construct_path(&trace, position)),
                    expansions,
                ));
            }

            let parent = trace.get(&position).copied().flatten();
            for mut successor in jump_successors(grid, position, parent, goal) {
                if trace.contains_key(&successor.position) {
                    continue;
                }
                successor.estimate = self.heuristic.estimate(successor.position, goal);
                trace.insert(successor.position, Some(position));
                seq += 1;
                open_list.insert(OpenEntry {
                    node: successor,
                    g_cost: current.g_cost + successor.edge_cost,
                    seq,
                });
            }
        }

        debug!("cannot find solution after {expansions} expansions");
        Ok(SearchResult::not_found(expansions))
    }
}

/// Jump points reachable from `p`, each carrying the cost of the straight or
/// diagonal leap that reaches it.
fn jump_successors(grid: &Grid, p: Point, parent: Option<Point>, goal: Point) -> Vec<SearchNode> {
    pruned_neighbors(grid, p, parent)
        .into_iter()
        .filter_map(|n| jump(grid, n, p, goal))
        .map(|jp| {
            let dx = (jp.x - p.x).abs();
            let dy = (jp.y - p.y).abs();
            let cost = if dx != 0 && dy != 0 {
                dx as f64 * SQRT_2
            } else {
                (dx + dy) as f64
            };
            SearchNode::new(jp, cost)
        })
        .collect()
}

/// Neighbors worth jumping towards: all of them for the start, otherwise the
/// natural and forced neighbors for the direction of travel from `parent`.
fn pruned_neighbors(grid: &Grid, p: Point, parent: Option<Point>) -> Vec<Point> {
    let Some(parent) = parent else {
        return successors(grid, p, SQRT_2)
            .into_iter()
            .map(|n| n.position)
            .collect();
    };

    let valid = |dx: i32, dy: i32| grid.is_valid(p.offset(dx, dy));
    let dx = (p.x - parent.x).signum();
    let dy = (p.y - parent.y).signum();
    let mut candidates = Vec::with_capacity(5);

    if dx != 0 && dy != 0 {
        if valid(0, dy) {
            candidates.push(p.offset(0, dy));
        }
        if valid(dx, 0) {
            candidates.push(p.offset(dx, 0));
        }
        if valid(0, dy) || valid(dx, 0) {
            candidates.push(p.offset(dx, dy));
        }
        if !valid(-dx, 0) && valid(0, dy) {
            candidates.push(p.offset(-dx, dy));
        }
        if !valid(0, -dy) && valid(dx, 0) {
            candidates.push(p.offset(dx, -dy));
        }
    } else if dx == 0 {
        if valid(0, dy) {
            candidates.push(p.offset(0, dy));
            if !valid(1, 0) {
                candidates.push(p.offset(1, dy));
            }
            if !valid(-1, 0) {
                candidates.push(p.offset(-1, dy));
            }
        }
    } else if valid(dx, 0) {
        candidates.push(p.offset(dx, 0));
        if !valid(0, 1) {
            candidates.push(p.offset(dx, 1));
        }
        if !valid(0, -1) {
            candidates.push(p.offset(dx, -1));
        }
    }

    candidates.retain(|n| {
        grid.is_valid(*n) && (!n.is_diagonal_to(p) || grid.is_diagonally_accessible(*n, p))
    });
    candidates
}

/// Follow the direction `from -> node` until a jump point is found.
///
/// A cell is a jump point when it is the goal, when it has a forced neighbor,
/// or, moving diagonally, when one of its horizontal or vertical probes finds
/// a jump point.
fn jump(grid: &Grid, node: Point, from: Point, goal: Point) -> Option<Point> {
    let dx = node.x - from.x;
    let dy = node.y - from.y;
    let valid = |ox: i32, oy: i32| grid.is_valid(node.offset(ox, oy));

    if !grid.is_valid(node) {
        return None;
    }
    if node == goal {
        return Some(node);
    }

    if dx != 0 && dy != 0 {
        if (valid(-dx, dy) && !valid(-dx, 0)) || (valid(dx, -dy) && !valid(0, -dy)) {
            return Some(node);
        }
        if jump(grid, node.offset(dx, 0), node, goal).is_some()
            || jump(grid, node.offset(0, dy), node, goal).is_some()
        {
            return Some(node);
        }
    } else if dx != 0 {
        if (valid(dx, 1) && !valid(0, 1)) || (valid(dx, -1) && !valid(0, -1)) {
            return Some(node);
        }
    } else if (valid(1, dy) && !valid(1, 0)) || (valid(-1, dy) && !valid(-1, 0)) {
        return Some(node);
    }

    if valid(dx, 0) || valid(0, dy) {
        jump(grid, node.offset(dx, dy), node, goal)
    } else {
        None
    }
}

/// Expand consecutive jump points into unit steps.
fn fill(jump_points: &[Point]) -> Path {
    let mut path = Vec::new();
    for pair in jump_points.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let step_x = (b.x - a.x).signum();
        let step_y = (b.y - a.y).signum();
        let mut p = a;
        while p != b {
            path.push(p);
            p = p.offset(step_x, step_y);
        }
    }
    if let Some(&last) = jump_points.last() {
        path.push(last);
    }
    path
}
