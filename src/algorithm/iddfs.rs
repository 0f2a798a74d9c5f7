use std::collections::VecDeque;
use tracing::{debug, instrument, trace};

use super::{check_endpoints, construct_path, orthogonal_successors, SearchAlgorithm, Trace};
use crate::common::{Point, SearchError, SearchResult};
use crate::grid::Grid;

/// Deepest bound tried before giving up.
pub const MAX_DEPTH: usize = 100;

/// Depth-bounded breadth-first search over the 4-connected neighborhood,
/// restarted from scratch with bound 1, 2, ... up to [`MAX_DEPTH`].
///
/// Expansions accumulate across restarts.
#[derive(Debug)]
pub struct IterativeDeepening {
    max_depth: usize,
}

impl Default for IterativeDeepening {
    fn default() -> Self {
        IterativeDeepening {
            max_depth: MAX_DEPTH,
        }
    }
}

impl IterativeDeepening {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_depth(max_depth: usize) -> Self {
        IterativeDeepening { max_depth }
    }
}

impl SearchAlgorithm for IterativeDeepening {
    fn name(&self) -> &'static str {
        "ID"
    }

    #[instrument(skip_all, name = "iddfs", fields(start = %start, goal = %goal), level = "debug")]
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

        let mut trace = Trace::new();
        let mut frontier: VecDeque<(Point, usize)> = VecDeque::new();
        let mut expansions = 0;

        for depth_limit in 1..=self.max_depth {
            trace.clear();
            frontier.clear();

            trace.insert(start, None);
            frontier.push_back((start, 0));

            while let Some((current, depth)) = frontier.pop_front() {
                expansions += 1;
                if depth > depth_limit {
                    break;
                }
                trace!("expand node: {current} at depth {depth}");

                for successor in orthogonal_successors(grid, current) {
                    if trace.contains_key(&successor) {
                        continue;
                    }
                    trace.insert(successor, Some(current));
                    if successor == goal {
                        debug!("found goal with depth limit {depth_limit}");
                        return Ok(SearchResult::found(
                            construct_path(&trace, successor),
                            expansions,
                        ));
                    }
                    frontier.push_back((successor, depth + 1));
                }
            }
        }

        debug!("depth limit {} exhausted", self.max_depth);
        Ok(SearchResult::not_found(expansions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::test_utils::*;
    use crate::algorithm::BreadthFirst;

    #[test]
    fn test_iddfs_open_grid() {
        init_tracing();
        let grid = open_grid();
        let start = Point::new(0, 0);
        let goal = Point::new(4, 4);
        let result = IterativeDeepening::new().search(&grid, start, goal).unwrap();

        assert_eq!(result.path.len(), 9);
        assert_valid_path(&grid, &result.path, start, goal);
        assert_orthogonal(&result.path);
    }

    #[test]
    fn test_iddfs_costs_more_than_bfs() {
        let grid = open_grid();
        let start = Point::new(0, 0);
        let goal = Point::new(4, 4);
        let bfs = BreadthFirst::new().search(&grid, start, goal).unwrap();
        let iddfs = IterativeDeepening::new().search(&grid, start, goal).unwrap();

        assert_eq!(bfs.path.len(), iddfs.path.len());
        assert!(iddfs.expansions > bfs.expansions);
    }

    #[test]
    fn test_iddfs_depth_ceiling() {
        // A straight corridor of 6 moves cannot be found with bounds below 5.
        let grid = grid(&["......."]);
        let start = Point::new(0, 0);
        let goal = Point::new(6, 0);

        let result = IterativeDeepening::with_max_depth(4)
            .search(&grid, start, goal)
            .unwrap();
        assert!(result.path.is_empty());
        assert!(result.expansions > 0);

        let result = IterativeDeepening::with_max_depth(5)
            .search(&grid, start, goal)
            .unwrap();
        assert_eq!(result.moves(), 6);
    }

    #[test]
    fn test_iddfs_walled_off() {
        let grid = walled_grid();
        let result = IterativeDeepening::new()
            .search(&grid, Point::new(0, 0), Point::new(0, 4))
            .unwrap();
        assert!(result.path.is_empty());
    }
}
