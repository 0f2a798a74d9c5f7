use anyhow::{bail, Context};
use clap::Parser;
use serde::Deserialize;

use crate::algorithm::AlgorithmKind;
use crate::heuristic::HeuristicKind;

#[derive(Parser, Debug, Default)]
#[command(
    name = "grid_search",
    about = "Compare grid path-finding algorithms on random or MovingAI maps.",
    version = "1.0"
)]
pub struct Cli {
    #[arg(long, help = "Path to a YAML config file")]
    pub config: Option<String>,

    #[arg(long, help = "Path to a MovingAI .map file (random grid when absent)")]
    pub map_path: Option<String>,

    #[arg(long, help = "Path to a MovingAI .scen file (random queries when absent)")]
    pub scen_path: Option<String>,

    #[arg(long, help = "Path of the JSON statistics output")]
    pub output_path: Option<String>,

    #[arg(long, help = "Random grid width")]
    pub width: Option<usize>,

    #[arg(long, help = "Random grid height")]
    pub height: Option<usize>,

    #[arg(long, help = "Probability of a random grid cell being blocked")]
    pub obstacle_density: Option<f64>,

    #[arg(long, help = "Seed for the random number generator")]
    pub seed: Option<u64>,

    #[arg(long, help = "Number of start/goal queries")]
    pub num_queries: Option<usize>,

    #[arg(
        long,
        value_enum,
        value_delimiter = ',',
        help = "Algorithms to compare, comma separated"
    )]
    pub algorithms: Vec<AlgorithmKind>,

    #[arg(long, value_enum, help = "Heuristic for the informed searches")]
    pub heuristic: Option<HeuristicKind>,

    #[arg(long, help = "Ticks of the pursuit simulation (0 disables it)")]
    pub pursuit_ticks: Option<usize>,

    #[arg(long, help = "The pursued target moves once every this many ticks")]
    pub target_move_every: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub map_path: Option<String>,
    pub scen_path: Option<String>,
    pub output_path: Option<String>,
    pub width: usize,
    pub height: usize,
    pub obstacle_density: f64,
    pub seed: u64,
    pub num_queries: usize,
    pub algorithms: Vec<AlgorithmKind>,
    pub heuristic: HeuristicKind,
    pub pursuit_ticks: usize,
    pub target_move_every: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            map_path: None,
            scen_path: None,
            output_path: None,
            width: 64,
            height: 64,
            obstacle_density: 0.2,
            seed: 0,
            num_queries: 100,
            algorithms: AlgorithmKind::all().to_vec(),
            heuristic: HeuristicKind::default(),
            pursuit_ticks: 200,
            target_move_every: 3,
        }
    }
}

impl Config {
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        serde_yaml::from_str(yaml).context("invalid config")
    }

    /// Flags given on the command line win over the file.
    pub fn override_from_command_line(mut self, cli: &Cli) -> anyhow::Result<Self> {
        if let Some(map_path) = &cli.map_path {
            self.map_path = Some(map_path.clone());
        }
        if let Some(scen_path) = &cli.scen_path {
            self.scen_path = Some(scen_path.clone());
        }
        if let Some(output_path) = &cli.output_path {
            self.output_path = Some(output_path.clone());
        }
        if let Some(width) = cli.width {
            self.width = width;
        }
        if let Some(height) = cli.height {
            self.height = height;
        }
        if let Some(density) = cli.obstacle_density {
            self.obstacle_density = density;
        }
        if let Some(seed) = cli.seed {
            self.seed = seed;
        }
        if let Some(num_queries) = cli.num_queries {
            self.num_queries = num_queries;
        }
        if !cli.algorithms.is_empty() {
            self.algorithms = cli.algorithms.clone();
        }
        if let Some(heuristic) = cli.heuristic {
            self.heuristic = heuristic;
        }
        if let Some(ticks) = cli.pursuit_ticks {
            self.pursuit_ticks = ticks;
        }
        if let Some(every) = cli.target_move_every {
            self.target_move_every = every;
        }

        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if !(0.0..1.0).contains(&self.obstacle_density) {
            bail!(
                "obstacle density must be in [0, 1), got {}",
                self.obstacle_density
            );
        }
        if self.map_path.is_none() && (self.width == 0 || self.height == 0) {
            bail!(
                "random grid needs non-zero dimensions, got {}x{}",
                self.width,
                self.height
            );
        }
        if self.algorithms.is_empty() {
            bail!("at least one algorithm must be selected");
        }
        if self.num_queries == 0 {
            bail!("number of queries must be positive");
        }
        if self.target_move_every == 0 {
            bail!("target_move_every must be positive");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_yaml() {
        let config = Config::from_yaml_str(
            "width: 32\nheight: 16\nalgorithms: [astar, jps, dstar]\nheuristic: octile\n",
        )
        .unwrap();
        assert_eq!(config.width, 32);
        assert_eq!(config.height, 16);
        assert_eq!(
            config.algorithms,
            vec![AlgorithmKind::Astar, AlgorithmKind::Jps, AlgorithmKind::Dstar]
        );
        assert_eq!(config.heuristic, HeuristicKind::Octile);
        // Untouched fields keep their defaults.
        assert_eq!(config.num_queries, 100);
        assert!(config.validate().is_ok());

        assert!(Config::from_yaml_str("widht: 32\n").is_err());
        assert!(Config::from_yaml_str("algorithms: [dijkstra]\n").is_err());
    }

    #[test]
    fn test_command_line_overrides() {
        let cli = Cli::parse_from([
            "grid_search",
            "--seed",
            "42",
            "--algorithms",
            "bfs,floodfill",
            "--heuristic",
            "chebyshev",
        ]);
        let config = Config::from_yaml_str("seed: 7\nwidth: 10\n")
            .unwrap()
            .override_from_command_line(&cli)
            .unwrap();

        assert_eq!(config.seed, 42);
        assert_eq!(config.width, 10);
        assert_eq!(
            config.algorithms,
            vec![AlgorithmKind::Bfs, AlgorithmKind::Floodfill]
        );
        assert_eq!(config.heuristic, HeuristicKind::Chebyshev);
    }

    #[test]
    fn test_validate() {
        assert!(Config::default().validate().is_ok());

        let config = Config {
            obstacle_density: 1.0,
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            width: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            width: 0,
            map_path: Some("maze.map".to_string()),
            ..Config::default()
        };
        assert!(config.validate().is_ok());

        let config = Config {
            algorithms: vec![],
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let cli = Cli {
            num_queries: Some(0),
            ..Cli::default()
        };
        assert!(Config::default().override_from_command_line(&cli).is_err());
    }
}
