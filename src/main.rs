use grid_search::comparison::{compare_queries, simulate_pursuit};
use grid_search::config::{Cli, Config};
use grid_search::grid::Grid;
use grid_search::scenario::{random_queries, Query, Scenario};
use grid_search::stat::Report;

use anyhow::Context;
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    let cli = Cli::parse();

    let config = if let Some(config_file) = cli.config.as_ref() {
        let config_str = std::fs::read_to_string(config_file)
            .with_context(|| format!("cannot read config file {config_file}"))?;
        Config::from_yaml_str(&config_str)
            .with_context(|| format!("error with config file: {config_file}"))?
    } else {
        info!("No config file specified, using default config");
        Config::default()
    }
    .override_from_command_line(&cli)?;

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut grid = match &config.map_path {
        Some(path) => Grid::from_file(path)?,
        None => Grid::generate(
            config.width,
            config.height,
            config.obstacle_density,
            &mut rng,
        )?,
    };
    info!("grid {}x{}", grid.width(), grid.height());

    let queries: Vec<Query> = match &config.scen_path {
        Some(path) => {
            let scenario = Scenario::load_from_scen(path)?;
            let queries = scenario.sample_queries(config.num_queries, &mut rng)?;
            let (valid, invalid): (Vec<Query>, Vec<Query>) =
                queries.into_iter().partition(|q| q.verify(&grid));
            if !invalid.is_empty() {
                warn!("skipping {} routes off the free cells", invalid.len());
            }
            valid
        }
        None => random_queries(&grid, config.num_queries, &mut rng)?,
    };

    info!(
        "comparing {} algorithms on {} queries with the {:?} heuristic",
        config.algorithms.len(),
        queries.len(),
        config.heuristic
    );
    let mut report = Report {
        queries: compare_queries(&mut grid, &queries, &config.algorithms, config.heuristic),
        pursuit: Vec::new(),
    };
    report.queries.iter().for_each(|stats| stats.print());

    if config.pursuit_ticks > 0 {
        info!("pursuit over {} ticks", config.pursuit_ticks);
        report.pursuit = simulate_pursuit(
            &mut grid,
            &config.algorithms,
            config.heuristic,
            config.pursuit_ticks,
            config.target_move_every,
            &mut rng,
        )?;
        report.pursuit.iter().for_each(|stats| stats.print());
    }

    if let Some(output_path) = &config.output_path {
        let json = report.to_json()?;
        std::fs::write(output_path, json)
            .with_context(|| format!("cannot write statistics to {output_path}"))?;
        info!("statistics written to {output_path}");
    }

    Ok(())
}
