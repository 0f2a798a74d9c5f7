//! Interchangeable path-finding strategies over an 8-connected occupancy
//! grid: breadth-first, iterative deepening, A*, Jump Point Search,
//! D*-Lite incremental replanning and a shared flood-fill distance field.

pub mod algorithm;
pub mod common;
pub mod comparison;
pub mod config;
pub mod grid;
pub mod heuristic;
pub mod scenario;
pub mod stat;

pub use algorithm::{AlgorithmKind, SearchAlgorithm};
pub use common::{Path, Point, SearchError, SearchResult};
pub use grid::Grid;
pub use heuristic::{Heuristic, HeuristicKind};
