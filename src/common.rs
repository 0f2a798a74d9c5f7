mod error;
mod node;

pub use error::SearchError;
pub(crate) use node::OpenEntry;
pub use node::SearchNode;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Integer grid coordinate. Compared and hashed by value everywhere,
/// including inside frontier orderings.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Point { x, y }
    }

    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Point {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// True when `other` is one of the 8 cells around `self`.
    pub fn is_adjacent(self, other: Point) -> bool {
        self != other && (self.x - other.x).abs() <= 1 && (self.y - other.y).abs() <= 1
    }

    pub fn is_diagonal_to(self, other: Point) -> bool {
        self.x != other.x && self.y != other.y
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Point { x, y }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

pub type Path = Vec<Point>;

/// Outcome of a single search: the cell-by-cell route (empty when the goal is
/// unreachable) and the number of frontier pops it took.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SearchResult {
    pub path: Path,
    pub expansions: usize,
}

impl SearchResult {
    pub(crate) fn found(path: Path, expansions: usize) -> Self {
        SearchResult { path, expansions }
    }

    pub(crate) fn not_found(expansions: usize) -> Self {
        SearchResult {
            path: Vec::new(),
            expansions,
        }
    }

    pub fn is_found(&self) -> bool {
        !self.path.is_empty()
    }

    /// Number of moves in the path.
    pub fn moves(&self) -> usize {
        self.path.len().saturating_sub(1)
    }

    /// Euclidean length of the path: 1 per orthogonal step, sqrt(2) per diagonal step.
    pub fn length(&self) -> f64 {
        self.path
            .windows(2)
            .map(|step| {
                if step[0].is_diagonal_to(step[1]) {
                    std::f64::consts::SQRT_2
                } else {
                    1.0
                }
            })
            .sum()
    }
}
