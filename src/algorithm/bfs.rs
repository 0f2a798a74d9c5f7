use std::collections::VecDeque;
use tracing::{debug, instrument, trace};

use super::{check_endpoints, construct_path, orthogonal_successors, SearchAlgorithm, Trace};
use crate::common::{Point, SearchError, SearchResult};
use crate::grid::Grid;

/// Uninformed breadth-first search over the 4-connected neighborhood.
///
/// The goal test happens when a successor is generated, so the returned path
/// has the fewest possible orthogonal moves.
#[derive(Debug, Default)]
pub struct BreadthFirst;

impl BreadthFirst {
    pub fn new() -> Self {
        BreadthFirst
    }
}

impl SearchAlgorithm for BreadthFirst {
    fn name(&self) -> &'static str {
        "BFS"
    }

    #[instrument(skip_all, name = "bfs", fields(start = %start, goal = %goal), level = "debug")]
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
        let mut frontier = VecDeque::new();
        trace.insert(start, None);
        frontier.push_back(start);

        let mut expansions = 0;
        while let Some(current) = frontier.pop_front() {
            expansions += 1;
            trace!("expand node: {current}");

            for successor in orthogonal_successors(grid, current) {
                if trace.contains_key(&successor) {
                    continue;
                }
                trace.insert(successor, Some(current));
                if successor == goal {
                    return Ok(SearchResult::found(
                        construct_path(&trace, successor),
                        expansions,
                    ));
                }
                frontier.push_back(successor);
            }
        }

        debug!("cannot find solution after {expansions} expansions");
        Ok(SearchResult::not_found(expansions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::test_utils::*;

    #[test]
    fn test_bfs_open_grid() {
        init_tracing();
        let grid = open_grid();
        let start = Point::new(0, 0);
        let goal = Point::new(4, 4);
        let result = BreadthFirst::new().search(&grid, start, goal).unwrap();

        assert_eq!(result.path.len(), 9);
        assert_valid_path(&grid, &result.path, start, goal);
        assert_orthogonal(&result.path);
        assert!(result.expansions > 0);
    }

    // .....
    // .@@@.
    // .@...
    // .@.@@
    // ...@.
    #[test]
    fn test_bfs_shortest_orthogonal_detour() {
        let grid = grid(&[".....", ".@@@.", ".@...", ".@.@@", "...@."]);
        let start = Point::new(2, 2);
        let goal = Point::new(0, 0);
        let result = BreadthFirst::new().search(&grid, start, goal).unwrap();

        // Down and around the left column: (2,2) (2,3) (2,4) (1,4) (0,4) (0,3) ... (0,0),
        // or right and over the top, both 8 moves.
        assert_eq!(result.moves(), 8);
        assert_valid_path(&grid, &result.path, start, goal);
        assert_orthogonal(&result.path);

        // (4,4) is boxed in.
        let result = BreadthFirst::new()
            .search(&grid, start, Point::new(4, 4))
            .unwrap();
        assert!(result.path.is_empty());
    }

    #[test]
    fn test_bfs_walled_off() {
        let grid = walled_grid();
        let result = BreadthFirst::new()
            .search(&grid, Point::new(0, 0), Point::new(0, 4))
            .unwrap();
        assert!(result.path.is_empty());
        // Every cell above the wall is dequeued once.
        assert_eq!(result.expansions, 10);
    }
}
