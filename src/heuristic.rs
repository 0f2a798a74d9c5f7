use clap::ValueEnum;
use serde::Deserialize;

use crate::common::Point;

/// Estimate of the remaining cost between two cells.
///
/// A* and Jump Point Search are only optimal when the estimate never
/// overestimates the true cost; that is left to the caller.
pub trait Heuristic {
    fn estimate(&self, from: Point, to: Point) -> f64;
}

impl<H: Heuristic + ?Sized> Heuristic for &H {
    fn estimate(&self, from: Point, to: Point) -> f64 {
        (**self).estimate(from, to)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Manhattan;

impl Heuristic for Manhattan {
    fn estimate(&self, from: Point, to: Point) -> f64 {
        ((from.x - to.x).abs() + (from.y - to.y).abs()) as f64
    }
}

/// Consistent for 8-connected moves that all cost 1.
#[derive(Debug, Clone, Copy, Default)]
pub struct Chebyshev;

impl Heuristic for Chebyshev {
    fn estimate(&self, from: Point, to: Point) -> f64 {
        (from.x - to.x).abs().max((from.y - to.y).abs()) as f64
    }
}

/// Exact distance on an empty 8-connected grid with sqrt(2) diagonals.
#[derive(Debug, Clone, Copy, Default)]
pub struct Octile;

impl Heuristic for Octile {
    fn estimate(&self, from: Point, to: Point) -> f64 {
        let dx = (from.x - to.x).abs() as f64;
        let dy = (from.y - to.y).abs() as f64;
        dx.max(dy) + (std::f64::consts::SQRT_2 - 1.0) * dx.min(dy)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Euclidean;

impl Heuristic for Euclidean {
    fn estimate(&self, from: Point, to: Point) -> f64 {
        let dx = (from.x - to.x) as f64;
        let dy = (from.y - to.y) as f64;
        dx.hypot(dy)
    }
}

/// Heuristic selectable from the command line or the YAML config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeuristicKind {
    #[default]
    Manhattan,
    Chebyshev,
    Octile,
    Euclidean,
}

impl Heuristic for HeuristicKind {
    fn estimate(&self, from: Point, to: Point) -> f64 {
        match self {
            HeuristicKind::Manhattan => Manhattan.estimate(from, to),
            HeuristicKind::Chebyshev => Chebyshev.estimate(from, to),
            HeuristicKind::Octile => Octile.estimate(from, to),
            HeuristicKind::Euclidean => Euclidean.estimate(from, to),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimates() {
        let a = Point::new(0, 0);
        let b = Point::new(3, 4);
        assert_eq!(Manhattan.estimate(a, b), 7.0);
        assert_eq!(Chebyshev.estimate(a, b), 4.0);
        assert!((Octile.estimate(a, b) - (4.0 + 3.0 * (2f64.sqrt() - 1.0))).abs() < 1e-9);
        assert_eq!(Euclidean.estimate(a, b), 5.0);
        assert_eq!(HeuristicKind::Chebyshev.estimate(b, a), 4.0);
    }

    #[test]
    fn test_estimate_is_zero_at_goal() {
        let p = Point::new(5, -2);
        for kind in HeuristicKind::value_variants() {
            assert_eq!(kind.estimate(p, p), 0.0);
        }
    }
}
