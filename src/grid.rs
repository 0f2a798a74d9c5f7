use anyhow::{anyhow, bail, Context};
use rand::Rng;
use std::fmt;
use std::fs;

use crate::common::Point;

/// Cost-field value of cells the flood fill has not reached.
pub const UNREACHABLE: u32 = u32::MAX;

/// Obstacle occupancy for a `width x height` field plus the flood-fill cost
/// field.
///
/// Searches only ever read the obstacle layer. The cost field is written by
/// [`crate::algorithm::FloodFill::refresh`] and nothing else.
#[derive(Debug, Clone)]
pub struct Grid {
    width: usize,
    height: usize,
    obstacles: Vec<bool>,
    costs: Vec<u32>,
    field_target: Option<Point>,
}

impl Grid {
    pub fn new(width: usize, height: usize) -> Self {
        Grid {
            width,
            height,
            obstacles: vec![false; width * height],
            costs: vec![UNREACHABLE; width * height],
            field_target: None,
        }
    }

    /// Random obstacle field: every cell is blocked with probability `density`,
    /// which must lie in `[0, 1]`.
    pub fn generate<R: Rng + ?Sized>(
        width: usize,
        height: usize,
        density: f64,
        rng: &mut R,
    ) -> anyhow::Result<Self> {
        if !(0.0..=1.0).contains(&density) {
            bail!("obstacle density must be in [0, 1], got {density}");
        }
        let mut grid = Grid::new(width, height);
        for blocked in grid.obstacles.iter_mut() {
            *blocked = rng.gen_bool(density);
        }
        Ok(grid)
    }

    /// Parse a MovingAI `.map` file.
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content =
            fs::read_to_string(path).with_context(|| format!("cannot read map file {path}"))?;
        Self::from_map_str(&content).with_context(|| format!("malformed map file {path}"))
    }

    /// Parse the MovingAI map format:
    ///
    /// ```text
    /// type octile
    /// height 3
    /// width 4
    /// map
    /// ....
    /// .@@.
    /// ....
    /// ```
    pub fn from_map_str(content: &str) -> anyhow::Result<Self> {
        let mut lines = content.lines();

        let _type = lines.next().ok_or_else(|| anyhow!("missing type line"))?;
        let height = parse_header(lines.next(), "height")?;
        let width = parse_header(lines.next(), "width")?;
        match lines.next().map(str::trim) {
            Some("map") => {}
            other => bail!("expected `map` line, got {other:?}"),
        }

        let rows: Vec<&str> = lines.take(height).collect();
        if rows.len() != height {
            bail!("expected {height} rows, found {}", rows.len());
        }
        let grid = Self::from_rows(&rows)?;
        if grid.width != width {
            bail!("header width {width} does not match row width {}", grid.width);
        }
        Ok(grid)
    }

    /// Build a grid from text rows, `y` growing downwards. `.`, `G` and `S`
    /// are passable, every other character is an obstacle.
    pub fn from_rows<S: AsRef<str>>(rows: &[S]) -> anyhow::Result<Self> {
        let height = rows.len();
        let width = rows.first().map_or(0, |row| row.as_ref().trim_end().len());
        let mut grid = Grid::new(width, height);

        for (y, row) in rows.iter().enumerate() {
            let row = row.as_ref().trim_end();
            if row.len() != width {
                bail!("row {y} has width {}, expected {width}", row.len());
            }
            for (x, ch) in row.chars().enumerate() {
                grid.obstacles[y * width + x] = !matches!(ch, '.' | 'G' | 'S');
            }
        }

        Ok(grid)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    fn index(&self, p: Point) -> Option<usize> {
        if self.contains(p) {
            Some(p.y as usize * self.width + p.x as usize)
        } else {
            None
        }
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= 0 && p.y >= 0 && (p.x as usize) < self.width && (p.y as usize) < self.height
    }

    pub fn has_obstacle(&self, p: Point) -> bool {
        self.index(p).is_some_and(|i| self.obstacles[i])
    }

    /// In bounds and unoccupied.
    pub fn is_valid(&self, p: Point) -> bool {
        self.index(p).is_some_and(|i| !self.obstacles[i])
    }

    /// Whether a diagonal step from `source` to `target` avoids cutting
    /// between two blocked corner cells. Only meaningful for diagonal
    /// neighbors.
    pub fn is_diagonally_accessible(&self, target: Point, source: Point) -> bool {
        self.is_valid(Point::new(source.x, target.y))
            || self.is_valid(Point::new(target.x, source.y))
    }

    /// A single legal move: orthogonal into a valid cell, or diagonal into a
    /// valid cell without corner cutting.
    pub fn is_legal_move(&self, from: Point, to: Point) -> bool {
        from.is_adjacent(to)
            && self.is_valid(to)
            && (!from.is_diagonal_to(to) || self.is_diagonally_accessible(to, from))
    }

    pub fn set_obstacle(&mut self, p: Point) {
        if let Some(i) = self.index(p) {
            self.obstacles[i] = true;
            self.field_target = None;
        }
    }

    pub fn clear_obstacle(&mut self, p: Point) {
        if let Some(i) = self.index(p) {
            self.obstacles[i] = false;
            self.field_target = None;
        }
    }

    /// Flood-fill distance to the current field target, [`UNREACHABLE`] when
    /// the field has not reached `p`.
    pub fn cost_of(&self, p: Point) -> u32 {
        self.index(p).map_or(UNREACHABLE, |i| self.costs[i])
    }

    /// Target the cost field was last computed for. Reset whenever obstacles
    /// change.
    pub fn field_target(&self) -> Option<Point> {
        self.field_target
    }

    pub(crate) fn install_cost_field(&mut self, target: Point, costs: Vec<u32>) {
        debug_assert_eq!(costs.len(), self.width * self.height);
        self.costs = costs;
        self.field_target = Some(target);
    }

    pub(crate) fn cell_count(&self) -> usize {
        self.width * self.height
    }

    pub(crate) fn cell_index(&self, p: Point) -> Option<usize> {
        self.index(p)
    }

    /// Row-major obstacle flags.
    pub(crate) fn obstacle_layer(&self) -> &[bool] {
        &self.obstacles
    }

    pub fn free_cells(&self) -> impl Iterator<Item = Point> + '_ {
        (0..self.height).flat_map(move |y| {
            (0..self.width)
                .map(move |x| Point::new(x as i32, y as i32))
                .filter(|p| self.is_valid(*p))
        })
    }

    pub fn random_free_point<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Point> {
        let free: Vec<Point> = self.free_cells().collect();
        if free.is_empty() {
            return None;
        }
        Some(free[rng.gen_range(0..free.len())])
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..self.height {
            for x in 0..self.width {
                let ch = if self.obstacles[y * self.width + x] { '@' } else { '.' };
                write!(f, "{ch}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

fn parse_header(line: Option<&str>, key: &str) -> anyhow::Result<usize> {
    let line = line.ok_or_else(|| anyhow!("missing `{key}` line"))?;
    let mut parts = line.split_whitespace();
    if parts.next() != Some(key) {
        bail!("expected `{key} <n>`, got {line:?}");
    }
    parts
        .next()
        .ok_or_else(|| anyhow!("missing value in {line:?}"))?
        .parse::<usize>()
        .with_context(|| format!("invalid {key} in {line:?}"))
}
