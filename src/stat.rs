use serde::Serialize;
use std::time::Duration;
use tracing::info;

use crate::common::SearchResult;

/// Running totals for one algorithm.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Stats {
    pub algorithm: String,
    pub searches: usize,
    pub failures: usize,
    pub errors: usize,
    pub expansions: usize,
    pub path_cells: usize,
    pub path_length: f64,
    pub time_us: u128,
}

impl Stats {
    pub fn new(algorithm: &str) -> Self {
        Stats {
            algorithm: algorithm.to_string(),
            ..Stats::default()
        }
    }

    pub fn record(&mut self, result: &SearchResult, elapsed: Duration) {
        self.searches += 1;
        if !result.is_found() {
            self.failures += 1;
        }
        self.expansions += result.expansions;
        self.path_cells += result.path.len();
        self.path_length += result.length();
        self.time_us += elapsed.as_micros();
    }

    pub fn record_error(&mut self, elapsed: Duration) {
        self.searches += 1;
        self.errors += 1;
        self.time_us += elapsed.as_micros();
    }

    pub fn mean_expansions(&self) -> f64 {
        if self.searches == 0 {
            0.0
        } else {
            self.expansions as f64 / self.searches as f64
        }
    }

    pub fn print(&self) {
        info!(
            "{:<10} searches {:>5} failures {:>5} errors {:>3} expansions {:>9} (mean {:>9.1}) path cells {:>7} length {:>10.2} time(us) {:>9}",
            self.algorithm,
            self.searches,
            self.failures,
            self.errors,
            self.expansions,
            self.mean_expansions(),
            self.path_cells,
            self.path_length,
            self.time_us
        );
    }
}

/// Statistics of a whole run, as written to the JSON output.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Report {
    pub queries: Vec<Stats>,
    pub pursuit: Vec<Stats>,
}

impl Report {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Point;

    #[test]
    fn test_record() {
        let mut stats = Stats::new("A*");
        let found = SearchResult {
            path: vec![Point::new(0, 0), Point::new(1, 0), Point::new(2, 1)],
            expansions: 4,
        };
        stats.record(&found, Duration::from_micros(10));
        stats.record(&SearchResult::default(), Duration::from_micros(5));
        stats.record_error(Duration::from_micros(1));

        assert_eq!(stats.searches, 3);
        assert_eq!(stats.failures, 1);
        assert_eq!(stats.errors, 1);
        assert_eq!(stats.expansions, 4);
        assert_eq!(stats.path_cells, 3);
        assert!((stats.path_length - (1.0 + std::f64::consts::SQRT_2)).abs() < 1e-9);
        assert_eq!(stats.time_us, 16);
        assert!((stats.mean_expansions() - 4.0 / 3.0).abs() < 1e-9);
        stats.print();
    }

    #[test]
    fn test_report_json() {
        let report = Report {
            queries: vec![Stats::new("BFS")],
            pursuit: vec![],
        };
        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["queries"][0]["algorithm"], "BFS");
        assert_eq!(json["queries"][0]["searches"], 0);
        assert!(json["pursuit"].as_array().unwrap().is_empty());
    }
}
