use std::collections::BTreeSet;
use tracing::{debug, instrument, trace};

use super::{check_endpoints, construct_path, euclidean_successors, SearchAlgorithm, Trace};
use crate::common::{OpenEntry, Point, SearchError, SearchNode, SearchResult};
use crate::grid::Grid;
use crate::heuristic::Heuristic;

/// A* over the 8-connected grid, ordered by `estimate + accumulated cost`.
///
/// A cell counts as visited as soon as it enters the predecessor map; a
/// cheaper route discovered later is ignored.
#[derive(Debug)]
pub struct AStar<H> {
    heuristic: H,
}

impl<H: Heuristic> AStar<H> {
    pub fn new(heuristic: H) -> Self {
        AStar { heuristic }
    }
}

impl<H: Heuristic> SearchAlgorithm for AStar<H> {
    fn name(&self) -> &'static str {
        "A*"
    }

    #[instrument(skip_all, name = "a_star", fields(start = %start, goal = %goal), level = "debug")]
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
            trace!("expand node: {position} f {}", current.f_cost());

            if position == goal {
                return Ok(SearchResult::found(
                    construct_path(&trace, position),
                    expansions,
                ));
            }

            for mut successor in euclidean_successors(grid, position) {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::test_utils::*;
    use crate::heuristic::{Manhattan, Octile};
    use std::f64::consts::SQRT_2;

    #[test]
    fn test_a_star_open_grid_goes_diagonal() {
        init_tracing();
        let grid = open_grid();
        let start = Point::new(0, 0);
        let goal = Point::new(4, 4);
        let result = AStar::new(Manhattan).search(&grid, start, goal).unwrap();

        assert_eq!(
            result.path,
            vec![
                Point::new(0, 0),
                Point::new(1, 1),
                Point::new(2, 2),
                Point::new(3, 3),
                Point::new(4, 4),
            ]
        );
        assert!((result.length() - 4.0 * SQRT_2).abs() < 1e-9);
        assert_eq!(result.expansions, 5);
    }

    // ..@..
    // ..@..
    // ..@..
    // .....
    #[test]
    fn test_a_star_around_wall() {
        let grid = grid(&["..@..", "..@..", "..@..", "....."]);
        let start = Point::new(0, 0);
        let goal = Point::new(4, 0);
        let result = AStar::new(Octile).search(&grid, start, goal).unwrap();

        assert_valid_path(&grid, &result.path, start, goal);
        assert!(result.path.contains(&Point::new(2, 3)));
        // Down two diagonals, through the gap, up two diagonals.
        assert!((result.length() - (4.0 * SQRT_2 + 2.0)).abs() < 1e-9);
    }

    #[test]
    fn test_a_star_no_corner_cutting() {
        // The only gap between the two halves is a diagonal squeeze between
        // (1,0) and (0,1), which is forbidden.
        let grid = grid(&[".@", "@."]);
        let result = AStar::new(Manhattan)
            .search(&grid, Point::new(0, 0), Point::new(1, 1))
            .unwrap();
        assert!(result.path.is_empty());
        assert_eq!(result.expansions, 1);
    }

    #[test]
    fn test_a_star_walled_off() {
        let grid = walled_grid();
        let result = AStar::new(Manhattan)
            .search(&grid, Point::new(2, 0), Point::new(2, 4))
            .unwrap();
        assert!(result.path.is_empty());
        assert_eq!(result.expansions, 10);
    }
}
