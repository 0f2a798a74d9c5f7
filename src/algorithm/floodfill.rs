use std::collections::VecDeque;
use std::f64::consts::SQRT_2;
use tracing::{debug, instrument, trace};

use super::{check_endpoints, successors, SearchAlgorithm};
use crate::common::{Point, SearchError, SearchResult};
use crate::grid::{Grid, UNREACHABLE};

/// Routes agents down a grid-wide distance field toward a single target.
///
/// The field is computed once per target position by [`FloodFill::refresh`];
/// each search afterwards only walks downhill from the agent's cell, so many
/// agents chasing the same target share one sweep.
#[derive(Debug, Default)]
pub struct FloodFill;

impl FloodFill {
    pub fn new() -> Self {
        FloodFill
    }

    /// Recompute the cost field as unit-step distances to `target` over the
    /// 8-connected neighborhood. Cells that cannot reach it stay
    /// [`UNREACHABLE`].
    #[instrument(skip_all, name = "flood_fill_refresh", fields(target = %target), level = "debug")]
    pub fn refresh(grid: &mut Grid, target: Point) {
        let mut costs = vec![UNREACHABLE; grid.cell_count()];
        let mut frontier = VecDeque::new();

        if let Some(i) = grid.cell_index(target).filter(|_| grid.is_valid(target)) {
            costs[i] = 0;
            frontier.push_back((target, 0));
        }

        let mut reached = 0;
        while let Some((current, cost)) = frontier.pop_front() {
            reached += 1;
            for successor in successors(grid, current, 1.0) {
                let Some(i) = grid.cell_index(successor.position) else {
                    continue;
                };
                if costs[i] == UNREACHABLE {
                    costs[i] = cost + 1;
                    frontier.push_back((successor.position, cost + 1));
                }
            }
        }

        debug!("cost field reaches {reached} cells");
        grid.install_cost_field(target, costs);
    }
}

impl SearchAlgorithm for FloodFill {
    fn name(&self) -> &'static str {
        "FloodFill"
    }

    fn prepare(&mut self, grid: &mut Grid, goal: Point) {
        if grid.field_target() != Some(goal) {
            Self::refresh(grid, goal);
        }
    }

    #[instrument(skip_all, name = "flood_fill", fields(start = %start, goal = %goal), level = "debug")]
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
        if grid.field_target() != Some(goal) {
            return Err(SearchError::StaleCostField {
                goal,
                field_target: grid.field_target(),
            });
        }
        if grid.cost_of(start) == UNREACHABLE {
            debug!("start is outside the cost field");
            return Ok(SearchResult::not_found(0));
        }

        let mut path = vec![start];
        let mut current = start;
        let mut expansions = 0;
        while grid.cost_of(current) != 0 {
            let here = grid.cost_of(current);
            // Cheapest field cost first, then the cheaper move.
            let next = successors(grid, current, SQRT_2)
                .into_iter()
                .filter(|n| grid.cost_of(n.position) < here)
                .min_by(|a, b| {
                    grid.cost_of(a.position)
                        .cmp(&grid.cost_of(b.position))
                        .then_with(|| a.edge_cost.total_cmp(&b.edge_cost))
                });
            let Some(next) = next else {
                return Err(SearchError::InconsistentState { at: current });
            };

            expansions += 1;
            current = next.position;
            trace!("step to {current}, field cost {}", grid.cost_of(current));
            path.push(current);
        }

        Ok(SearchResult::found(path, expansions))
    }
}
