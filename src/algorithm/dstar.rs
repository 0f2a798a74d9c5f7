//! D*-Lite incremental replanning.
//!
//! The planner searches backwards from the goal and keeps its vertex table
//! and frontier between calls. Successive searches toward the same goal only
//! repair what changed: the start moving (absorbed by the `k_m` key offset)
//! or cells becoming blocked or free.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::iter;
use tracing::{debug, instrument, trace};

use super::{check_endpoints, successors, SearchAlgorithm, DIAGONAL, ORTHOGONAL};
use crate::common::{Path, Point, SearchError, SearchResult};
use crate::grid::Grid;
use crate::heuristic::Heuristic;

/// Traversal cost of a free cell. Diagonal moves cost the same.
const MOVE_COST: f64 = 1.0;

/// Frontier priority `(k1, k2)`, compared lexicographically.
#[derive(Debug, Clone, Copy)]
struct Key(f64, f64);

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Key {}

impl PartialOrd for Key {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Key {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .total_cmp(&other.0)
            .then_with(|| self.1.total_cmp(&other.1))
    }
}

#[derive(Debug, Clone, Copy)]
struct Vertex {
    g: f64,
    rhs: f64,
}

/// Obstacle layer as of the previous call.
#[derive(Debug, Clone)]
struct Snapshot {
    width: usize,
    obstacles: Vec<bool>,
}

#[derive(Debug)]
pub struct DStarLite<H> {
    heuristic: H,
    vertices: HashMap<Point, Vertex>,
    open_list: BTreeSet<(Key, Point)>,
    open_index: HashMap<Point, Key>,
    k_m: f64,
    last_start: Option<Point>,
    goal: Option<Point>,
    snapshot: Option<Snapshot>,
}

impl<H: Heuristic> DStarLite<H> {
    pub fn new(heuristic: H) -> Self {
        DStarLite {
            heuristic,
            vertices: HashMap::new(),
            open_list: BTreeSet::new(),
            open_index: HashMap::new(),
            k_m: 0.0,
            last_start: None,
            goal: None,
            snapshot: None,
        }
    }

    /// Cost-to-goal estimate of `p`, infinite when undiscovered.
    pub fn g(&self, p: Point) -> f64 {
        self.vertices.get(&p).map_or(f64::INFINITY, |v| v.g)
    }

    /// One-step lookahead of `p`, infinite when undiscovered.
    pub fn rhs(&self, p: Point) -> f64 {
        self.vertices.get(&p).map_or(f64::INFINITY, |v| v.rhs)
    }

    pub fn k_m(&self) -> f64 {
        self.k_m
    }

    /// Number of inconsistent vertices waiting in the frontier.
    pub fn open_len(&self) -> usize {
        self.open_index.len()
    }

    fn reset(&mut self) {
        self.vertices.clear();
        self.open_list.clear();
        self.open_index.clear();
        self.k_m = 0.0;
        self.last_start = None;
        self.snapshot = None;
    }

    fn vertex_mut(&mut self, p: Point) -> &mut Vertex {
        self.vertices.entry(p).or_insert(Vertex {
            g: f64::INFINITY,
            rhs: f64::INFINITY,
        })
    }

    fn calculate_key(&self, p: Point, start: Point) -> Key {
        let k2 = self.g(p).min(self.rhs(p));
        Key(k2 + self.heuristic.estimate(start, p) + self.k_m, k2)
    }

    /// Keep `p` in the frontier exactly while it is inconsistent, under its
    /// current key.
    fn update_membership(&mut self, p: Point, start: Point) {
        if let Some(key) = self.open_index.remove(&p) {
            self.open_list.remove(&(key, p));
        }
        if self.g(p) != self.rhs(p) {
            let key = self.calculate_key(p, start);
            self.open_list.insert((key, p));
            self.open_index.insert(p, key);
        }
    }

    fn recompute_rhs(&mut self, grid: &Grid, p: Point, goal: Point) {
        let rhs = if p == goal {
            0.0
        } else if !grid.is_valid(p) {
            f64::INFINITY
        } else {
            neighbors(grid, p)
                .into_iter()
                .map(|s| MOVE_COST + self.g(s))
                .fold(f64::INFINITY, f64::min)
        };
        self.vertex_mut(p).rhs = rhs;
    }

    /// Diff the obstacle layer against the previous call and re-examine
    /// every cell that changed, together with its 8 neighbors. A grid of
    /// different dimensions invalidates the whole table.
    fn apply_grid_changes(&mut self, grid: &Grid, start: Point, goal: Point) {
        let current = grid.obstacle_layer();
        let same_shape = self.snapshot.as_ref().map(|prev| {
            prev.width == grid.width() && prev.obstacles.len() == current.len()
        });
        if same_shape == Some(false) {
            debug!("grid dimensions changed, discarding vertex table");
            let last_start = self.last_start;
            self.reset();
            self.last_start = last_start;
        }

        let changed: Vec<Point> = match &self.snapshot {
            Some(prev) => prev
                .obstacles
                .iter()
                .zip(current)
                .enumerate()
                .filter(|(_, (was, is))| was != is)
                .map(|(i, _)| Point::new((i % prev.width) as i32, (i / prev.width) as i32))
                .collect(),
            None => Vec::new(),
        };
        if self.snapshot.is_none() || !changed.is_empty() {
            self.snapshot = Some(Snapshot {
                width: grid.width(),
                obstacles: current.to_vec(),
            });
        }
        if changed.is_empty() {
            return;
        }
        debug!("{} cells changed occupancy", changed.len());

        for p in changed {
            let around = ORTHOGONAL
                .iter()
                .chain(DIAGONAL.iter())
                .map(|&(dx, dy)| p.offset(dx, dy));
            for s in iter::once(p).chain(around) {
                if s == goal || !grid.contains(s) {
                    continue;
                }
                self.recompute_rhs(grid, s, goal);
                self.update_membership(s, start);
            }
        }
    }

    /// Process the frontier until `start` is consistent and no queued key is
    /// below its key. Returns the number of pops.
    fn compute_shortest_path(&mut self, grid: &Grid, start: Point, goal: Point) -> usize {
        let mut pops = 0;
        while let Some(&(key, u)) = self.open_list.first() {
            let start_key = self.calculate_key(start, start);
            if key >= start_key && self.g(start) == self.rhs(start) {
                break;
            }
            self.open_list.pop_first();
            self.open_index.remove(&u);
            pops += 1;

            let fresh = self.calculate_key(u, start);
            if key < fresh {
                trace!("re-key {u}");
                self.open_list.insert((fresh, u));
                self.open_index.insert(u, fresh);
                continue;
            }

            let (g_old, rhs) = (self.g(u), self.rhs(u));
            if g_old > rhs {
                trace!("over-consistent {u}: g {g_old} -> {rhs}");
                self.vertex_mut(u).g = rhs;
                for s in neighbors(grid, u) {
                    if s == goal {
                        continue;
                    }
                    let vertex = self.vertex_mut(s);
                    vertex.rhs = vertex.rhs.min(MOVE_COST + rhs);
                    self.update_membership(s, start);
                }
            } else {
                trace!("under-consistent {u}: g {g_old} -> inf");
                self.vertex_mut(u).g = f64::INFINITY;
                for s in iter::once(u).chain(neighbors(grid, u)) {
                    if s != goal && (s == u || self.rhs(s) == MOVE_COST + g_old) {
                        self.recompute_rhs(grid, s, goal);
                    }
                    self.update_membership(s, start);
                }
            }
        }
        pops
    }

    /// Walk from `start` to `goal`, always stepping to the discovered,
    /// unvisited neighbor with the smallest `c + rhs`.
    fn reconstruct(
        &self,
        grid: &Grid,
        start: Point,
        goal: Point,
    ) -> Result<Path, SearchError> {
        let mut path = vec![start];
        let mut visited = HashSet::from([start]);
        let mut current = start;

        while current != goal {
            let next = neighbors(grid, current)
                .into_iter()
                .filter(|s| !visited.contains(s))
                .filter_map(|s| self.vertices.get(&s).map(|v| (s, MOVE_COST + v.rhs)))
                .filter(|(_, cost)| cost.is_finite())
                .min_by(|(a, cost_a), (b, cost_b)| {
                    cost_a.total_cmp(cost_b).then_with(|| {
                        self.calculate_key(*a, start)
                            .0
                            .total_cmp(&self.calculate_key(*b, start).0)
                    })
                });
            let Some((next, _)) = next else {
                return Err(SearchError::InconsistentState { at: current });
            };
            visited.insert(next);
            path.push(next);
            current = next;
        }

        Ok(path)
    }
}

impl<H: Heuristic> SearchAlgorithm for DStarLite<H> {
    fn name(&self) -> &'static str {
        "D*"
    }

    #[instrument(skip_all, name = "d_star_lite", fields(start = %start, goal = %goal), level = "debug")]
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

        if self.goal != Some(goal) {
            if self.goal.is_some() {
                debug!("goal moved, discarding vertex table");
            }
            self.reset();
            self.goal = Some(goal);
        } else if let Some(last) = self.last_start.filter(|&last| last != start) {
            self.k_m += self.heuristic.estimate(last, start);
            trace!("start moved from {last}, k_m = {}", self.k_m);
        }
        self.last_start = Some(start);

        self.apply_grid_changes(grid, start, goal);
        self.vertex_mut(start);
        self.vertex_mut(goal).rhs = 0.0;
        self.update_membership(goal, start);

        let pops = self.compute_shortest_path(grid, start, goal);
        if self.rhs(start).is_infinite() {
            debug!("cannot find solution after {pops} frontier pops");
            return Ok(SearchResult::not_found(0));
        }

        let path = self.reconstruct(grid, start, goal)?;
        Ok(SearchResult::found(path, pops))
    }
}

fn neighbors(grid: &Grid, p: Point) -> Vec<Point> {
    successors(grid, p, MOVE_COST)
        .into_iter()
        .map(|n| n.position)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::test_utils::*;
    use crate::algorithm::FloodFill;
    use crate::heuristic::Chebyshev;

    #[test]
    fn test_d_star_open_grid() {
        init_tracing();
        let grid = open_grid();
        let start = Point::new(0, 0);
        let goal = Point::new(4, 4);
        let mut planner = DStarLite::new(Chebyshev);
        let result = planner.search(&grid, start, goal).unwrap();

        assert_valid_path(&grid, &result.path, start, goal);
        assert_eq!(result.moves(), 4);
        assert!(result.expansions > 0);
        assert_eq!(planner.g(start), 4.0);
        assert_eq!(planner.rhs(goal), 0.0);
    }

    #[test]
    fn test_d_star_walled_off() {
        let grid = walled_grid();
        let start = Point::new(0, 0);
        let mut planner = DStarLite::new(Chebyshev);
        let result = planner.search(&grid, start, Point::new(4, 4)).unwrap();

        assert!(result.path.is_empty());
        assert_eq!(result.expansions, 0);
        assert_eq!(planner.rhs(start), f64::INFINITY);
        assert_eq!(planner.open_len(), 0);
    }

    // ......
    // .@@@..
    // ...@..
    // .@.@.@
    // ......
    #[test]
    fn test_d_star_moving_start_matches_fresh_search() {
        let mut grid = grid(&["......", ".@@@..", "...@..", ".@.@.@", "......"]);
        let goal = Point::new(2, 2);
        FloodFill::refresh(&mut grid, goal);

        let mut planner = DStarLite::new(Chebyshev);
        let mut start = Point::new(5, 0);
        let mut steps = 0;
        while start != goal {
            let result = planner.search(&grid, start, goal).unwrap();
            assert_valid_path(&grid, &result.path, start, goal);
            assert_eq!(result.moves(), grid.cost_of(start) as usize, "from {start}");

            start = result.path[1];
            steps += 1;
            assert!(steps <= 30, "agent never reached the goal");
        }
        assert!(planner.k_m() > 0.0);
    }

    #[test]
    fn test_d_star_goal_change_resets() {
        let grid = open_grid();
        let mut planner = DStarLite::new(Chebyshev);
        planner
            .search(&grid, Point::new(0, 0), Point::new(4, 4))
            .unwrap();
        planner
            .search(&grid, Point::new(1, 1), Point::new(4, 4))
            .unwrap();
        assert_eq!(planner.k_m(), 1.0);

        let result = planner
            .search(&grid, Point::new(1, 1), Point::new(0, 4))
            .unwrap();
        assert_eq!(planner.k_m(), 0.0);
        assert_eq!(planner.rhs(Point::new(0, 4)), 0.0);
        assert_ne!(planner.rhs(Point::new(4, 4)), 0.0);
        assert_eq!(result.moves(), 3);
    }

    #[test]
    fn test_d_star_replans_around_new_obstacle() {
        let mut grid = open_grid();
        let start = Point::new(0, 0);
        let goal = Point::new(4, 4);
        let mut planner = DStarLite::new(Chebyshev);
        let result = planner.search(&grid, start, goal).unwrap();
        assert_eq!(result.moves(), 4);

        // The only 4-move route is the main diagonal.
        grid.set_obstacle(Point::new(2, 2));
        FloodFill::refresh(&mut grid, goal);
        let result = planner.search(&grid, start, goal).unwrap();
        assert_valid_path(&grid, &result.path, start, goal);
        assert!(!result.path.contains(&Point::new(2, 2)));
        assert_eq!(result.moves(), grid.cost_of(start) as usize);
        assert_eq!(result.moves(), 5);

        grid.clear_obstacle(Point::new(2, 2));
        let result = planner.search(&grid, start, goal).unwrap();
        assert_eq!(result.moves(), 4);
    }

    // .....
    // .....
    // @@@@.
    // .....
    // .....
    #[test]
    fn test_d_star_uses_cleared_obstacle() {
        init_tracing();
        let mut grid = grid(&[".....", ".....", "@@@@.", ".....", "....."]);
        let start = Point::new(0, 0);
        let goal = Point::new(0, 4);
        let mut planner = DStarLite::new(Chebyshev);
        let result = planner.search(&grid, start, goal).unwrap();
        assert_eq!(result.moves(), 8);

        // (0,2) was blocked on the first call, so it never entered the table.
        grid.clear_obstacle(Point::new(0, 2));
        FloodFill::refresh(&mut grid, goal);
        let result = planner.search(&grid, start, goal).unwrap();
        assert_valid_path(&grid, &result.path, start, goal);
        assert_eq!(result.moves(), 4);
        assert_eq!(result.moves(), grid.cost_of(start) as usize);
        let fresh = DStarLite::new(Chebyshev).search(&grid, start, goal).unwrap();
        assert_eq!(result.moves(), fresh.moves());

        // Close both gaps, then open one the planner has never seen free.
        grid.set_obstacle(Point::new(0, 2));
        grid.set_obstacle(Point::new(4, 2));
        let result = planner.search(&grid, start, goal).unwrap();
        assert!(result.path.is_empty());
        assert_eq!(planner.open_len(), 0);

        grid.clear_obstacle(Point::new(2, 2));
        FloodFill::refresh(&mut grid, goal);
        let result = planner.search(&grid, start, goal).unwrap();
        assert_valid_path(&grid, &result.path, start, goal);
        assert!(result.path.contains(&Point::new(2, 2)));
        assert_eq!(result.moves(), grid.cost_of(start) as usize);
    }

    #[test]
    fn test_d_star_resets_on_resized_grid() {
        let start = Point::new(0, 0);
        let goal = Point::new(2, 2);
        let mut planner = DStarLite::new(Chebyshev);
        planner.search(&open_grid(), start, goal).unwrap();

        let small = grid(&["...", ".@.", "..."]);
        let result = planner.search(&small, start, goal).unwrap();
        assert_valid_path(&small, &result.path, start, goal);
        assert_eq!(result.moves(), 3);
        assert_eq!(planner.k_m(), 0.0);
    }

    #[test]
    fn test_key_order() {
        assert!(Key(3.0, 1.0) < Key(3.0, 2.0));
        assert!(Key(2.0, 9.0) < Key(3.0, 0.0));
        assert!(Key(1.0, 1.0) < Key(f64::INFINITY, f64::INFINITY));
        assert_eq!(Key(1.0, 2.0), Key(1.0, 2.0));
    }
}
