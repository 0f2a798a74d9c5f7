use std::error::Error;
use std::fmt;

use super::Point;

/// Failures a search reports instead of a path.
///
/// An unreachable goal is not one of them: that is an `Ok` result with an
/// empty path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SearchError {
    /// Start or goal lies outside the grid.
    OutOfBounds { point: Point },
    /// Start or goal lies on an obstacle.
    Blocked { point: Point },
    /// The flood-fill cost field was computed for a different target
    /// (or never computed).
    StaleCostField {
        goal: Point,
        field_target: Option<Point>,
    },
    /// The incremental planner found a finite `rhs(start)` but no successor
    /// chain leading to the goal.
    InconsistentState { at: Point },
}

impl fmt::Display for SearchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfBounds { point } => write!(f, "point {point} is outside the grid"),
            Self::Blocked { point } => write!(f, "point {point} is occupied by an obstacle"),
            Self::StaleCostField {
                goal,
                field_target: Some(target),
            } => write!(
                f,
                "cost field was computed for {target}, but the search goal is {goal}"
            ),
            Self::StaleCostField {
                goal,
                field_target: None,
            } => write!(f, "cost field was never computed (search goal is {goal})"),
            Self::InconsistentState { at } => write!(
                f,
                "vertex table is inconsistent: no viable successor from {at}"
            ),
        }
    }
}

impl Error for SearchError {}
